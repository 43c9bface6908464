//! Gemini provider
//!
//! Talks to the Google Generative Language API's streaming endpoint
//! (`models/{model}:streamGenerateContent?alt=sse`). Each SSE event carries
//! a JSON chunk whose candidate parts hold an increment of the generated
//! text, so this integration selects [`Accumulation::Delta`]. Thought parts
//! (internal reasoning, present when a thinking budget is requested) carry
//! no user-visible text and are skipped.

use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::composer::ComposedRequest;
use crate::core::reducer::Accumulation;

use super::{ChatProvider, FragmentStream, ProviderError, StreamFragment};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

// ── Wire types ────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction")]
    system_instruction: Content,
    #[serde(rename = "generationConfig")]
    generation_config: WireGenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
    thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ChunkContent>,
}

#[derive(Debug, Deserialize)]
struct ChunkContent {
    #[serde(default)]
    parts: Vec<ChunkPart>,
}

#[derive(Debug, Deserialize)]
struct ChunkPart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

impl GenerateContentChunk {
    /// Concatenated visible text of the first candidate, if any.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter(|p| !p.thought)
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

fn build_request(request: &ComposedRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: request
            .turns
            .iter()
            .map(|turn| Content {
                role: Some(turn.role.as_str()),
                parts: vec![Part {
                    text: turn.text.clone(),
                }],
            })
            .collect(),
        system_instruction: Content {
            role: None,
            parts: vec![Part {
                text: request.system_instruction.clone(),
            }],
        },
        generation_config: WireGenerationConfig {
            temperature: request.config.temperature,
            top_p: request.config.top_p,
            top_k: request.config.top_k,
            max_output_tokens: request.config.max_output_tokens,
            thinking_config: ThinkingConfig {
                thinking_budget: request.config.thinking_budget,
            },
        },
    }
}

// ── Provider ──────────────────────────────────────────────────

pub struct GeminiProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiProvider {
    /// No request timeout: a hung provider call hangs the turn, and that is
    /// the documented behavior of this core.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait::async_trait]
impl ChatProvider for GeminiProvider {
    fn accumulation(&self) -> Accumulation {
        Accumulation::Delta
    }

    async fn stream_chat(&self, request: &ComposedRequest) -> Result<FragmentStream, ProviderError> {
        let url = format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, request.model
        );
        let body = build_request(request);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let fragments = response.bytes_stream().eventsource().map(|result| {
            match result {
                Ok(event) => serde_json::from_str::<GenerateContentChunk>(&event.data)
                    .map(|chunk| StreamFragment { text: chunk.text() })
                    .map_err(|e| {
                        ProviderError::InvalidPayload(format!(
                            "failed to parse stream chunk: {e}"
                        ))
                    }),
                Err(e) => Err(ProviderError::Stream(e.to_string())),
            }
        });

        Ok(Box::pin(fragments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::composer::compose;
    use crate::conversation::Message;
    use crate::modes::ModeKey;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn wire_request_uses_camel_case_and_model_role() {
        let history = vec![Message::user("q"), Message::assistant("a")];
        let composed = compose("hello", &history, ModeKey::Creative, 0.7);
        let wire = serde_json::to_value(build_request(&composed)).unwrap();

        assert_eq!(wire["contents"][0]["role"], "user");
        assert_eq!(wire["contents"][1]["role"], "model");
        assert_eq!(wire["contents"][2]["role"], "user");
        assert_eq!(wire["contents"][2]["parts"][0]["text"], "hello");
        assert!(wire["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("SELECTED OPERATING MODE:"));
        assert_eq!(wire["generationConfig"]["temperature"], 0.7);
        assert_eq!(wire["generationConfig"]["topP"], 0.95);
        assert_eq!(wire["generationConfig"]["topK"], 64);
        assert_eq!(wire["generationConfig"]["maxOutputTokens"], 32768);
        assert_eq!(
            wire["generationConfig"]["thinkingConfig"]["thinkingBudget"],
            16000
        );
        // The system instruction content has no role field.
        assert!(wire["systemInstruction"].get("role").is_none());
    }

    #[test]
    fn chunk_text_skips_thought_parts() {
        let chunk: GenerateContentChunk = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[
                {"text":"hidden reasoning","thought":true},
                {"text":"visible"}
            ]}}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.text().as_deref(), Some("visible"));
    }

    #[test]
    fn chunk_without_text_is_a_tick() {
        let chunk: GenerateContentChunk =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"STOP"}]}"#).unwrap();
        assert_eq!(chunk.text(), None);

        let empty: GenerateContentChunk = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.text(), None);
    }

    #[tokio::test]
    async fn streams_delta_fragments_from_sse() {
        let server = MockServer::start().await;

        let sse_body = concat!(
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hel\"}]}}]}\n\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"lo\"}]}}]}\n\n",
            "data: {\"candidates\":[{\"finishReason\":\"STOP\"}]}\n\n",
        );

        Mock::given(method("POST"))
            .and(path(
                "/v1beta/models/gemini-3-pro-preview:streamGenerateContent",
            ))
            .and(query_param("alt", "sse"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_body),
            )
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("test-key").with_base_url(server.uri());
        let composed = compose("hi", &[], ModeKey::Code, 0.5);

        let mut stream = provider.stream_chat(&composed).await.unwrap();

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.text.as_deref(), Some("Hel"));
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second.text.as_deref(), Some("lo"));
        let tick = stream.next().await.unwrap().unwrap();
        assert_eq!(tick.text, None);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn non_success_status_is_an_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("test-key").with_base_url(server.uri());
        let composed = compose("hi", &[], ModeKey::Code, 0.5);

        match provider.stream_chat(&composed).await {
            Err(ProviderError::Api { status, body }) => {
                assert_eq!(status, 429);
                assert_eq!(body, "quota exceeded");
            }
            Err(other) => panic!("expected Api error, got {other:?}"),
            Ok(_) => panic!("expected Api error, got a stream"),
        }
    }

    #[tokio::test]
    async fn malformed_chunk_is_an_invalid_payload_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string("data: not json\n\n"),
            )
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("test-key").with_base_url(server.uri());
        let composed = compose("hi", &[], ModeKey::Code, 0.5);

        let mut stream = provider.stream_chat(&composed).await.unwrap();
        match stream.next().await.unwrap() {
            Err(ProviderError::InvalidPayload(_)) => {}
            other => panic!("expected InvalidPayload, got {other:?}"),
        }
    }
}
