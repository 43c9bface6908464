//! Application configuration
//!
//! Settings come from an optional TOML file pointed at by
//! `OMNISENSE_CONFIG`, with environment variables taking precedence over
//! file values. Everything has a default, so the server also runs with no
//! configuration at all (the provider then rejects requests, which surfaces
//! as a normal turn failure).

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Gemini API key. Checked against `GEMINI_API_KEY`, then `API_KEY`.
    pub gemini_api_key: Option<String>,
    /// Override for the Generative Language API base URL.
    pub gemini_base_url: Option<String>,
    /// Directory holding the SQLite database.
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            gemini_api_key: None,
            gemini_base_url: None,
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl Config {
    /// Load configuration: TOML file if `OMNISENSE_CONFIG` is set, then
    /// environment overrides on top.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match env::var("OMNISENSE_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    fn apply_env(&mut self) {
        if let Ok(host) = env::var("HOST") {
            self.host = host;
        }
        if let Some(port) = env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            self.port = port;
        }
        if let Ok(key) = env::var("GEMINI_API_KEY").or_else(|_| env::var("API_KEY")) {
            self.gemini_api_key = Some(key);
        }
        if let Ok(url) = env::var("GEMINI_BASE_URL") {
            self.gemini_base_url = Some(url);
        }
        if let Ok(dir) = env::var("OMNISENSE_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
    }
}
