//! Request composition
//!
//! Builds the single outbound request descriptor for a turn: the system
//! instruction (master block + active persona prompt), the ordered
//! conversation turns translated into the provider's role vocabulary, and
//! the generation parameters. Only the temperature is user-controlled; the
//! remaining sampling values are fixed design constants.

use crate::conversation::{Message, Role};
use crate::modes::{ModeKey, MASTER_SYSTEM_PROMPT, MODE_HEADER};

/// Fixed model identifier for every request.
pub const MODEL_NAME: &str = "gemini-3-pro-preview";

pub const TOP_P: f32 = 0.95;
pub const TOP_K: u32 = 64;

/// Total output budget. Must cover the thinking budget plus the visible
/// answer, so it is set well above [`THINKING_BUDGET`].
pub const MAX_OUTPUT_TOKENS: u32 = 32_768;

/// Token allowance for internal deliberation before visible output.
pub const THINKING_BUDGET: u32 = 16_000;

/// Role vocabulary of the provider. Assistant turns are sent as `model`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Model,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Model => "model",
        }
    }
}

impl From<Role> for TurnRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => TurnRole::User,
            Role::Assistant => TurnRole::Model,
        }
    }
}

/// One conversation turn in provider vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub thinking_budget: u32,
}

/// Fully composed outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedRequest {
    pub model: &'static str,
    pub system_instruction: String,
    pub turns: Vec<Turn>,
    pub config: GenerationConfig,
}

/// Compose the request for a new turn.
///
/// `user_text` must already be trimmed and non-empty; empty input is
/// rejected at the boundary, not here. `history` is the conversation as it
/// stood before this turn (the new user message is appended as the final
/// turn by this function).
pub fn compose(
    user_text: &str,
    history: &[Message],
    mode: ModeKey,
    temperature: f32,
) -> ComposedRequest {
    let mut turns: Vec<Turn> = history
        .iter()
        .map(|m| Turn {
            role: m.role.into(),
            text: m.content.clone(),
        })
        .collect();
    turns.push(Turn {
        role: TurnRole::User,
        text: user_text.to_string(),
    });

    let system_instruction = format!(
        "{}\n\n{}\n{}",
        MASTER_SYSTEM_PROMPT,
        MODE_HEADER,
        mode.mode().prompt
    );

    ComposedRequest {
        model: MODEL_NAME,
        system_instruction,
        turns,
        config: GenerationConfig {
            temperature,
            top_p: TOP_P,
            top_k: TOP_K,
            max_output_tokens: MAX_OUTPUT_TOKENS,
            thinking_budget: THINKING_BUDGET,
        },
    }
}
