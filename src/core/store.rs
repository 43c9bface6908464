//! Local persistence using SQLite
//!
//! A small key-value table holds string-serialized JSON payloads: the
//! conversation history and the persisted settings slice. Values are
//! written after every state change and read once at startup. A corrupt or
//! unparseable payload is treated as absent; losing stale state is
//! preferred over refusing to start.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use crate::conversation::Conversation;
use crate::core::session::PersistedSettings;

/// Key under which the conversation history is stored.
pub const HISTORY_KEY: &str = "omnisense-messages";

/// Key under which the persisted settings slice is stored.
pub const SETTINGS_KEY: &str = "omnisense-settings";

pub struct KvStore {
    pool: SqlitePool,
}

impl KvStore {
    /// Open (or create) the store at the given SQLite database path.
    pub async fn new(db_path: &Path) -> Result<Self, sqlx::Error> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// In-memory store for tests.
    pub async fn new_in_memory() -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO kv (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(value,)| value))
    }

    async fn delete(&self, key: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Persist the full conversation history.
    pub async fn save_history(&self, conversation: &Conversation) -> Result<(), sqlx::Error> {
        let json = serde_json::to_string(conversation.messages())
            .unwrap_or_else(|_| "[]".to_string());
        self.put(HISTORY_KEY, &json).await
    }

    /// Load the conversation history. Missing or corrupt data yields an
    /// empty conversation.
    pub async fn load_history(&self) -> Result<Conversation, sqlx::Error> {
        let Some(json) = self.get(HISTORY_KEY).await? else {
            return Ok(Conversation::new());
        };

        match serde_json::from_str(&json) {
            Ok(messages) => Ok(Conversation::from_messages(messages)),
            Err(e) => {
                tracing::debug!(error = %e, "discarding corrupt stored history");
                Ok(Conversation::new())
            }
        }
    }

    /// Remove the persisted history entry entirely.
    pub async fn clear_history(&self) -> Result<(), sqlx::Error> {
        self.delete(HISTORY_KEY).await
    }

    pub async fn save_settings(&self, settings: PersistedSettings) -> Result<(), sqlx::Error> {
        let json = serde_json::to_string(&settings).unwrap_or_else(|_| "{}".to_string());
        self.put(SETTINGS_KEY, &json).await
    }

    /// Load the persisted settings slice, if present and parseable.
    pub async fn load_settings(&self) -> Result<Option<PersistedSettings>, sqlx::Error> {
        let Some(json) = self.get(SETTINGS_KEY).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&json) {
            Ok(settings) => Ok(Some(settings)),
            Err(e) => {
                tracing::debug!(error = %e, "discarding corrupt stored settings");
                Ok(None)
            }
        }
    }

    #[cfg(test)]
    pub(crate) async fn put_raw(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
        self.put(key, value).await
    }

    #[cfg(test)]
    pub(crate) async fn get_raw(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        self.get(key).await
    }
}
