//! Chat engine
//!
//! Owns the session and drives one turn at a time:
//! 1. Rejects the send if a stream is already in flight.
//! 2. Composes the outbound request from history, the active persona and
//!    the temperature setting.
//! 3. Appends the user message and an assistant placeholder, then opens the
//!    provider stream.
//! 4. Folds fragments through the reducer and publishes every cumulative
//!    value, persisting after each state change.
//! 5. Finalizes the assistant message on stream end, or swaps the
//!    placeholder for a fixed error message on any failure. No retries;
//!    every failure is terminal for its turn.
//!
//! The turn runs in a spawned task, so it proceeds to completion even if
//! the subscriber goes away. There is no cancellation and no timeout.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::{mpsc, Mutex};

use crate::conversation::Conversation;
use crate::modes::ModeKey;
use crate::providers::{ChatProvider, ProviderError};

use super::composer::{compose, ComposedRequest};
use super::reducer::StreamReducer;
use super::session::{Session, Settings};
use super::store::KvStore;

/// Fixed user-visible text that replaces the in-flight assistant message
/// when a turn fails.
pub const STREAM_ERROR_MESSAGE: &str = "⚠️ **CRITICAL SYSTEM ERROR**: neural orchestration failure. Check token limits or API key integrity.";

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message is empty")]
    EmptyMessage,

    #[error("a response stream is already in flight")]
    Busy,

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}

/// One published step of an in-flight turn.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    /// New cumulative content of the in-flight assistant message.
    Update(String),
    /// The stream ended; this is the final assistant message content.
    Done(String),
    /// The turn failed; the payload is the fixed error message that now
    /// stands in for the assistant response.
    Failed(String),
}

struct Inner {
    provider: Arc<dyn ChatProvider>,
    store: Arc<KvStore>,
    session: Mutex<Session>,
}

/// Cheaply cloneable handle to the shared chat state.
#[derive(Clone)]
pub struct ChatEngine {
    inner: Arc<Inner>,
}

impl ChatEngine {
    pub fn new(provider: Arc<dyn ChatProvider>, store: Arc<KvStore>, session: Session) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                store,
                session: Mutex::new(session),
            }),
        }
    }

    /// Start a turn. Returns the stream of published steps; the caller is
    /// expected to forward them to the UI in order.
    pub async fn send(&self, message: &str) -> Result<impl Stream<Item = TurnEvent>, ChatError> {
        let trimmed = message.trim().to_string();
        if trimmed.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let request = {
            let mut session = self.inner.session.lock().await;
            if session.loading {
                return Err(ChatError::Busy);
            }
            let request = compose(
                &trimmed,
                session.conversation.messages(),
                session.mode,
                session.settings.temperature,
            );
            session.conversation = session.conversation.with_turn_started(&trimmed);
            session.loading = true;
            request
        };
        self.inner.persist_history().await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.run_turn(request, tx).await;
        });

        Ok(async_stream::stream! {
            while let Some(event) = rx.recv().await {
                yield event;
            }
        })
    }

    pub async fn history(&self) -> Conversation {
        self.inner.session.lock().await.conversation.clone()
    }

    /// Clear the conversation atomically and remove its persisted entry.
    pub async fn clear_history(&self) -> Result<(), ChatError> {
        {
            let mut session = self.inner.session.lock().await;
            session.conversation = session.conversation.cleared();
        }
        self.inner.store.clear_history().await?;
        Ok(())
    }

    pub async fn settings(&self) -> Settings {
        self.inner.session.lock().await.settings
    }

    pub async fn update_settings(&self, settings: Settings) -> Result<(), ChatError> {
        self.inner.session.lock().await.settings = settings;
        self.inner.store.save_settings(settings.into()).await?;
        Ok(())
    }

    pub async fn mode(&self) -> ModeKey {
        self.inner.session.lock().await.mode
    }

    /// O(1) state update; never touches existing messages.
    pub async fn set_mode(&self, mode: ModeKey) {
        self.inner.session.lock().await.mode = mode;
    }
}

impl Inner {
    async fn run_turn(&self, request: ComposedRequest, tx: mpsc::UnboundedSender<TurnEvent>) {
        let mut fragments = match self.provider.stream_chat(&request).await {
            Ok(fragments) => fragments,
            Err(e) => {
                tracing::warn!(error = %e, "provider call failed");
                self.fail_turn().await;
                let _ = tx.send(TurnEvent::Failed(STREAM_ERROR_MESSAGE.to_string()));
                return;
            }
        };

        let mut reducer = StreamReducer::new(self.provider.accumulation());
        while let Some(item) = fragments.next().await {
            match item {
                Ok(fragment) => {
                    if let Some(cumulative) = reducer.apply(fragment.text.as_deref()) {
                        let cumulative = cumulative.to_string();
                        self.publish(&cumulative).await;
                        let _ = tx.send(TurnEvent::Update(cumulative));
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "stream failed mid-turn");
                    self.fail_turn().await;
                    let _ = tx.send(TurnEvent::Failed(STREAM_ERROR_MESSAGE.to_string()));
                    return;
                }
            }
        }

        let final_text = reducer.into_text();
        self.finish_turn(&final_text).await;
        let _ = tx.send(TurnEvent::Done(final_text));
    }

    /// Replace the in-flight message content with the latest cumulative
    /// value and persist the snapshot.
    async fn publish(&self, cumulative: &str) {
        {
            let mut session = self.session.lock().await;
            session.conversation = session.conversation.with_streamed(cumulative);
        }
        self.persist_history().await;
    }

    async fn finish_turn(&self, final_text: &str) {
        {
            let mut session = self.session.lock().await;
            session.conversation = session.conversation.with_streamed(final_text);
            session.loading = false;
        }
        self.persist_history().await;
    }

    async fn fail_turn(&self) {
        {
            let mut session = self.session.lock().await;
            session.conversation = session.conversation.with_turn_failed(STREAM_ERROR_MESSAGE);
            session.loading = false;
        }
        self.persist_history().await;
    }

    /// Persistence failures never abort a turn; the in-memory session stays
    /// authoritative and the write is retried on the next state change.
    async fn persist_history(&self) {
        let conversation = self.session.lock().await.conversation.clone();
        if let Err(e) = self.store.save_history(&conversation).await {
            tracing::warn!(error = %e, "failed to persist conversation history");
        }
    }
}
