//! API routes

use std::convert::Infallible;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::conversation::{Message, Role};
use crate::core::{ChatError, Settings, TurnEvent};
use crate::modes::{Icon, ModeKey};
use crate::render::{render_markdown, SafeHtml};
use crate::AppState;

pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn unprocessable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.into(),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(e: ChatError) -> Self {
        let status = match e {
            ChatError::EmptyMessage => StatusCode::UNPROCESSABLE_ENTITY,
            ChatError::Busy => StatusCode::CONFLICT,
            ChatError::Provider(_) | ChatError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub message: String,
}

/// Content payload of one SSE event: the raw cumulative text plus its
/// rendered markup.
#[derive(Serialize)]
struct ContentPayload<'a> {
    content: &'a str,
    html: SafeHtml,
}

fn payload(content: &str) -> String {
    serde_json::to_string(&ContentPayload {
        content,
        html: render_markdown(content),
    })
    .unwrap_or_default()
}

/// Start a turn and stream its published steps to the client as SSE.
/// `message` events carry cumulative snapshots, `done` the final content,
/// `error` the fixed failure text. Rejected with 409 while a stream is in
/// flight and 422 for empty input.
async fn chat(
    State(state): State<AppState>,
    Json(request): Json<SendRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let turn = state.engine.send(&request.message).await?;

    let events = turn.map(|event| {
        let event = match event {
            TurnEvent::Update(content) => Event::default().event("message").data(payload(&content)),
            TurnEvent::Done(content) => Event::default().event("done").data(payload(&content)),
            TurnEvent::Failed(content) => Event::default().event("error").data(payload(&content)),
        };
        Ok(event)
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

#[derive(Debug, Serialize)]
struct MessageView {
    role: Role,
    content: String,
    created_at: DateTime<Utc>,
    html: SafeHtml,
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
            created_at: message.created_at,
            html: render_markdown(&message.content),
        }
    }
}

async fn history(State(state): State<AppState>) -> Json<Vec<MessageView>> {
    let conversation = state.engine.history().await;
    Json(conversation.messages().iter().map(MessageView::from).collect())
}

async fn clear_history(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.engine.clear_history().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
struct ModeView {
    id: ModeKey,
    name: &'static str,
    icon: Icon,
    color: &'static str,
    description: &'static str,
}

async fn list_modes() -> Json<Vec<ModeView>> {
    Json(
        ModeKey::ALL
            .iter()
            .map(|key| {
                let mode = key.mode();
                ModeView {
                    id: mode.key,
                    name: mode.name,
                    icon: mode.icon,
                    color: mode.color,
                    description: mode.description,
                }
            })
            .collect(),
    )
}

#[derive(Debug, Serialize, Deserialize)]
struct ActiveMode {
    mode: ModeKey,
}

async fn active_mode(State(state): State<AppState>) -> Json<ActiveMode> {
    Json(ActiveMode {
        mode: state.engine.mode().await,
    })
}

/// An unknown mode id never reaches the engine: deserialization of the
/// closed [`ModeKey`] enum rejects it at the boundary.
async fn set_mode(
    State(state): State<AppState>,
    Json(request): Json<ActiveMode>,
) -> Json<ActiveMode> {
    state.engine.set_mode(request.mode).await;
    Json(request)
}

async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    Json(state.engine.settings().await)
}

async fn put_settings(
    State(state): State<AppState>,
    Json(settings): Json<Settings>,
) -> Result<Json<Settings>, ApiError> {
    if !(0.0..=1.0).contains(&settings.temperature) {
        return Err(ApiError::unprocessable("temperature must be within 0..=1"));
    }
    state.engine.update_settings(settings).await?;
    Ok(Json(settings))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/v1/chat", post(chat))
        .route("/v1/history", get(history).delete(clear_history))
        .route("/v1/modes", get(list_modes))
        .route("/v1/mode", get(active_mode).put(set_mode))
        .route("/v1/settings", get(get_settings).put(put_settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_errors_map_to_status_codes() {
        assert_eq!(
            ApiError::from(ChatError::EmptyMessage).status,
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ApiError::from(ChatError::Busy).status, StatusCode::CONFLICT);
    }

    #[test]
    fn sse_payload_carries_raw_and_rendered_content() {
        let data = payload("**hi**");
        let value: serde_json::Value = serde_json::from_str(&data).unwrap();
        assert_eq!(value["content"], "**hi**");
        assert_eq!(value["html"], "<p><strong>hi</strong></p>");
    }

    #[test]
    fn unknown_mode_id_is_rejected_at_deserialization() {
        assert!(serde_json::from_str::<ActiveMode>(r#"{"mode":"sorcerer"}"#).is_err());
        let ok: ActiveMode = serde_json::from_str(r#"{"mode":"mentor"}"#).unwrap();
        assert_eq!(ok.mode, ModeKey::Mentor);
    }
}
