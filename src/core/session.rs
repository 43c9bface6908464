//! Session state: conversation, settings and the active mode
//!
//! One session per running instance. The session is the single owner of all
//! mutable chat state; everything else receives it by reference through the
//! engine, and the `loading` flag enforces the one-stream-in-flight rule.

use serde::{Deserialize, Serialize};

use crate::conversation::Conversation;
use crate::modes::ModeKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub theme: Theme,
    pub temperature: f32,
    #[serde(default)]
    pub show_settings: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            temperature: 0.7,
            show_settings: false,
        }
    }
}

/// The slice of [`Settings`] that survives restarts. Panel visibility is
/// ephemeral UI state and is deliberately not part of it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersistedSettings {
    pub theme: Theme,
    pub temperature: f32,
}

impl From<Settings> for PersistedSettings {
    fn from(settings: Settings) -> Self {
        Self {
            theme: settings.theme,
            temperature: settings.temperature,
        }
    }
}

impl PersistedSettings {
    /// Merge the persisted slice back over defaults.
    pub fn into_settings(self) -> Settings {
        Settings {
            theme: self.theme,
            temperature: self.temperature,
            ..Settings::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub conversation: Conversation,
    pub settings: Settings,
    pub mode: ModeKey,
    /// True while a response stream is open; further sends are rejected
    /// until the turn terminates.
    pub loading: bool,
}

impl Session {
    pub fn new(conversation: Conversation, settings: Settings) -> Self {
        Self {
            conversation,
            settings,
            mode: ModeKey::Creative,
            loading: false,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Conversation::new(), Settings::default())
    }
}
