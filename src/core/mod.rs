//! Core chat pipeline
//!
//! Request composition, stream reduction, session state and persistence.

pub mod chat;
pub mod composer;
pub mod reducer;
pub mod session;
pub mod store;

pub use chat::{ChatEngine, ChatError, TurnEvent, STREAM_ERROR_MESSAGE};
pub use reducer::Accumulation;
pub use session::{Session, Settings, Theme};
pub use store::KvStore;
