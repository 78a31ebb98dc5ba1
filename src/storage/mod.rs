//! Durable chat storage
//!
//! SQLite-backed mirror of authenticated users' conversations: a
//! `user_chats` table keyed by id with owner, title, and timestamps,
//! and a related, ordered `chat_messages` table. The core treats this
//! purely as a durable mirror of the in-memory session state; guest
//! conversations never land here.

use crate::error::{DeskmindError, Result};
use crate::session::ExchangeMetadata;
use anyhow::Context;
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use ulid::Ulid;
use uuid::Uuid;

pub mod types;
pub use types::{ChatMessage, ChatRecord, MessageRole};

/// Maximum stored title length, in characters
const MAX_TITLE_CHARS: usize = 100;

/// Storage backend for durable chats
pub struct ChatStorage {
    db_path: PathBuf,
}

impl ChatStorage {
    /// Create a new storage instance
    ///
    /// Initializes the database file in the user's data directory. The
    /// `DESKMIND_CHATS_DB` environment variable overrides the location,
    /// which makes it easy to point the binary at a test DB or an
    /// alternate file without changing the application data dir.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var("DESKMIND_CHATS_DB") {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("com", "deskmind", "deskmind")
            .ok_or_else(|| DeskmindError::Storage("Could not determine data directory".into()))?;

        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .context("Failed to create data directory")
            .map_err(|e| DeskmindError::Storage(e.to_string()))?;

        let db_path = data_dir.join("chats.db");
        let storage = Self { db_path };
        storage.init()?;
        Ok(storage)
    }

    /// Create a storage instance using the specified database path
    ///
    /// Primarily useful for tests where the default application data
    /// directory is not desirable.
    ///
    /// # Examples
    ///
    /// ```
    /// use deskmind::storage::ChatStorage;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let storage = ChatStorage::new_with_path(dir.path().join("chats.db")).unwrap();
    /// # let _ = storage;
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| DeskmindError::Storage(e.to_string()))?;
        }

        let storage = Self { db_path };
        storage.init()?;
        Ok(storage)
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| DeskmindError::Storage(e.to_string()).into())
    }

    /// Initialize the database schema
    fn init(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS user_chats (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create user_chats table")
        .map_err(|e| DeskmindError::Storage(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS chat_messages (
                id TEXT PRIMARY KEY,
                chat_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                metadata JSON
            )",
            [],
        )
        .context("Failed to create chat_messages table")
        .map_err(|e| DeskmindError::Storage(e.to_string()))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_chat_messages_chat_id
                ON chat_messages (chat_id)",
            [],
        )
        .context("Failed to create message index")
        .map_err(|e| DeskmindError::Storage(e.to_string()))?;

        Ok(())
    }

    /// Create a new chat for a user
    ///
    /// The title is clamped to 100 characters.
    pub fn create_chat(&self, user_id: &str, title: &str) -> Result<ChatRecord> {
        let conn = self.open()?;

        let id = Uuid::new_v4().to_string();
        let title: String = title.chars().take(MAX_TITLE_CHARS).collect();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO user_chats (id, user_id, title, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?)",
            params![id, user_id, title, now.to_rfc3339(), now.to_rfc3339()],
        )
        .context("Failed to insert chat")
        .map_err(|e| DeskmindError::Storage(e.to_string()))?;

        tracing::debug!(chat_id = %id, user_id, "Created durable chat");

        Ok(ChatRecord {
            id,
            user_id: user_id.to_string(),
            title,
            created_at: now,
            updated_at: now,
        })
    }

    /// List a user's chats, most recently updated first
    pub fn user_chats(&self, user_id: &str) -> Result<Vec<ChatRecord>> {
        let conn = self.open()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, title, created_at, updated_at
                FROM user_chats
                WHERE user_id = ?
                ORDER BY updated_at DESC",
            )
            .context("Failed to prepare statement")
            .map_err(|e| DeskmindError::Storage(e.to_string()))?;

        let chats = stmt
            .query_map(params![user_id], |row| {
                Ok(ChatRecord {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    title: row.get(2)?,
                    created_at: parse_timestamp(row.get::<_, String>(3)?),
                    updated_at: parse_timestamp(row.get::<_, String>(4)?),
                })
            })
            .context("Failed to query chats")
            .map_err(|e| DeskmindError::Storage(e.to_string()))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to read chat rows")
            .map_err(|e| DeskmindError::Storage(e.to_string()))?;

        Ok(chats)
    }

    /// Look up a single chat by id
    pub fn get_chat(&self, chat_id: &str) -> Result<Option<ChatRecord>> {
        let conn = self.open()?;

        conn.query_row(
            "SELECT id, user_id, title, created_at, updated_at
                FROM user_chats WHERE id = ?",
            params![chat_id],
            |row| {
                Ok(ChatRecord {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    title: row.get(2)?,
                    created_at: parse_timestamp(row.get::<_, String>(3)?),
                    updated_at: parse_timestamp(row.get::<_, String>(4)?),
                })
            },
        )
        .optional()
        .context("Failed to query chat")
        .map_err(|e| DeskmindError::Storage(e.to_string()).into())
    }

    /// List a chat's messages in insertion order
    pub fn chat_messages(&self, chat_id: &str) -> Result<Vec<ChatMessage>> {
        let conn = self.open()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, chat_id, role, content, timestamp, metadata
                FROM chat_messages
                WHERE chat_id = ?
                ORDER BY timestamp ASC, id ASC",
            )
            .context("Failed to prepare statement")
            .map_err(|e| DeskmindError::Storage(e.to_string()))?;

        let messages = stmt
            .query_map(params![chat_id], |row| {
                let role_str: String = row.get(2)?;
                let metadata_json: Option<String> = row.get(5)?;
                Ok(ChatMessage {
                    id: row.get(0)?,
                    chat_id: row.get(1)?,
                    role: MessageRole::parse(&role_str).unwrap_or(MessageRole::Assistant),
                    content: row.get(3)?,
                    timestamp: parse_timestamp(row.get::<_, String>(4)?),
                    metadata: metadata_json
                        .and_then(|json| serde_json::from_str::<ExchangeMetadata>(&json).ok()),
                })
            })
            .context("Failed to query messages")
            .map_err(|e| DeskmindError::Storage(e.to_string()))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to read message rows")
            .map_err(|e| DeskmindError::Storage(e.to_string()))?;

        Ok(messages)
    }

    /// Append a message to a chat, bumping the chat's updated_at
    pub fn add_message(
        &self,
        chat_id: &str,
        role: MessageRole,
        content: &str,
        metadata: Option<ExchangeMetadata>,
    ) -> Result<ChatMessage> {
        let mut conn = self.open()?;

        let id = Ulid::new().to_string();
        let now = Utc::now();
        let metadata_json = metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .context("Failed to serialize metadata")
            .map_err(|e| DeskmindError::Storage(e.to_string()))?;

        let tx = conn
            .transaction()
            .context("Failed to start transaction")
            .map_err(|e| DeskmindError::Storage(e.to_string()))?;

        tx.execute(
            "INSERT INTO chat_messages (id, chat_id, role, content, timestamp, metadata)
                VALUES (?, ?, ?, ?, ?, ?)",
            params![
                id,
                chat_id,
                role.as_str(),
                content,
                now.to_rfc3339(),
                metadata_json
            ],
        )
        .context("Failed to insert message")
        .map_err(|e| DeskmindError::Storage(e.to_string()))?;

        tx.execute(
            "UPDATE user_chats SET updated_at = ? WHERE id = ?",
            params![now.to_rfc3339(), chat_id],
        )
        .context("Failed to bump chat timestamp")
        .map_err(|e| DeskmindError::Storage(e.to_string()))?;

        tx.commit()
            .context("Failed to commit transaction")
            .map_err(|e| DeskmindError::Storage(e.to_string()))?;

        Ok(ChatMessage {
            id,
            chat_id: chat_id.to_string(),
            role,
            content: content.to_string(),
            timestamp: now,
            metadata,
        })
    }

    /// Update a chat's title (clamped to 100 characters)
    pub fn update_chat_title(&self, chat_id: &str, title: &str) -> Result<()> {
        let conn = self.open()?;

        let title: String = title.chars().take(MAX_TITLE_CHARS).collect();
        let updated = conn
            .execute(
                "UPDATE user_chats SET title = ?, updated_at = ? WHERE id = ?",
                params![title, Utc::now().to_rfc3339(), chat_id],
            )
            .context("Failed to update title")
            .map_err(|e| DeskmindError::Storage(e.to_string()))?;

        if updated == 0 {
            return Err(DeskmindError::Storage(format!("Chat not found: {}", chat_id)).into());
        }

        Ok(())
    }

    /// Delete a chat and all of its messages
    pub fn delete_chat(&self, chat_id: &str) -> Result<()> {
        let mut conn = self.open()?;

        let tx = conn
            .transaction()
            .context("Failed to start transaction")
            .map_err(|e| DeskmindError::Storage(e.to_string()))?;

        tx.execute(
            "DELETE FROM chat_messages WHERE chat_id = ?",
            params![chat_id],
        )
        .context("Failed to delete messages")
        .map_err(|e| DeskmindError::Storage(e.to_string()))?;

        tx.execute("DELETE FROM user_chats WHERE id = ?", params![chat_id])
            .context("Failed to delete chat")
            .map_err(|e| DeskmindError::Storage(e.to_string()))?;

        tx.commit()
            .context("Failed to commit transaction")
            .map_err(|e| DeskmindError::Storage(e.to_string()))?;

        Ok(())
    }
}

/// Parse a stored RFC-3339 timestamp, falling back to now on corruption
fn parse_timestamp(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
