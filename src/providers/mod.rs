//! Model provider integrations

pub mod gemini;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use thiserror::Error;

use crate::core::composer::ComposedRequest;
use crate::core::reducer::Accumulation;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid stream payload: {0}")]
    InvalidPayload(String),

    #[error("stream transport error: {0}")]
    Stream(String),
}

/// One unit of an incremental text-generation event. Absent text is a
/// keep-alive tick and is folded away by the reducer.
#[derive(Debug, Clone, Default)]
pub struct StreamFragment {
    pub text: Option<String>,
}

pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<StreamFragment, ProviderError>> + Send>>;

/// A streaming chat model provider.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// The fragment shape this provider emits, so the reducer folds with
    /// the matching strategy.
    fn accumulation(&self) -> Accumulation;

    /// Open a streaming generation call for the composed request.
    async fn stream_chat(&self, request: &ComposedRequest) -> Result<FragmentStream, ProviderError>;
}
