//! SQLite store backed by sqlx.
//!
//! One database file with four tables:
//! - `records` — the append-only channel log, keyed by
//!   (protocol, channel, ts) with a monotonic `seq` breaking
//!   same-millisecond ties
//! - `profiles` — last-write-wins user descriptions keyed (protocol, uid)
//! - `profile_names` — lower-cased display names pointing at profile keys
//! - `blobs` — path-keyed small text documents
//!
//! WAL journaling lets concurrent readers proceed while a writer appends;
//! every operation is a single statement or a single explicit transaction.

use crate::token::estimate_record_tokens;
use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use ponder_core::error::MemoryError;
use ponder_core::memory::MemoryStore;
use ponder_core::message::Role;
use ponder_core::record::{ConversationRecord, Moderation, UserProfile};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// A durable SQLite memory store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    ///
    /// Pass `":memory:"` for an in-process ephemeral database; in that
    /// case the pool is pinned to a single connection, since every SQLite
    /// in-memory connection is its own database.
    pub async fn new(path: &str) -> Result<Self, MemoryError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| MemoryError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let max_connections = if path.contains(":memory:") { 1 } else { 4 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite memory store initialized at {path}");
        Ok(store)
    }

    /// Run schema migrations — creates all tables and indexes.
    async fn run_migrations(&self) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                seq        INTEGER PRIMARY KEY AUTOINCREMENT,
                protocol   TEXT NOT NULL,
                channel    TEXT NOT NULL,
                uid        TEXT NOT NULL,
                author     TEXT NOT NULL,
                role       TEXT NOT NULL,
                content    TEXT NOT NULL,
                ts         INTEGER NOT NULL,
                moderation TEXT NOT NULL DEFAULT 'unknown'
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("records table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_records_channel
             ON records(protocol, channel, ts DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("channel index: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                protocol     TEXT NOT NULL,
                uid          TEXT NOT NULL,
                description  TEXT NOT NULL,
                display_name TEXT,
                updated_at   TEXT NOT NULL,
                PRIMARY KEY (protocol, uid)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("profiles table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profile_names (
                protocol   TEXT NOT NULL,
                name_lower TEXT NOT NULL,
                uid        TEXT NOT NULL,
                PRIMARY KEY (protocol, name_lower)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("profile_names table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS blobs (
                path       TEXT PRIMARY KEY,
                content    TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("blobs table: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Parse a `ConversationRecord` from a SQLite row.
    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<ConversationRecord, MemoryError> {
        let protocol: String = row
            .try_get("protocol")
            .map_err(|e| MemoryError::QueryFailed(format!("protocol column: {e}")))?;
        let channel: String = row
            .try_get("channel")
            .map_err(|e| MemoryError::QueryFailed(format!("channel column: {e}")))?;
        let uid: String = row
            .try_get("uid")
            .map_err(|e| MemoryError::QueryFailed(format!("uid column: {e}")))?;
        let author: String = row
            .try_get("author")
            .map_err(|e| MemoryError::QueryFailed(format!("author column: {e}")))?;
        let role_str: String = row
            .try_get("role")
            .map_err(|e| MemoryError::QueryFailed(format!("role column: {e}")))?;
        let content: String = row
            .try_get("content")
            .map_err(|e| MemoryError::QueryFailed(format!("content column: {e}")))?;
        let timestamp: i64 = row
            .try_get("ts")
            .map_err(|e| MemoryError::QueryFailed(format!("ts column: {e}")))?;
        let moderation_str: String = row
            .try_get("moderation")
            .map_err(|e| MemoryError::QueryFailed(format!("moderation column: {e}")))?;

        let role = role_str
            .parse::<Role>()
            .map_err(|e| MemoryError::QueryFailed(e.to_string()))?;

        Ok(ConversationRecord {
            protocol,
            channel,
            uid,
            author,
            role,
            content,
            timestamp,
            moderation: Moderation::parse(&moderation_str),
        })
    }

    /// Parse a `UserProfile` from a SQLite row.
    fn row_to_profile(row: &sqlx::sqlite::SqliteRow) -> Result<UserProfile, MemoryError> {
        let protocol: String = row
            .try_get("protocol")
            .map_err(|e| MemoryError::QueryFailed(format!("protocol column: {e}")))?;
        let uid: String = row
            .try_get("uid")
            .map_err(|e| MemoryError::QueryFailed(format!("uid column: {e}")))?;
        let description: String = row
            .try_get("description")
            .map_err(|e| MemoryError::QueryFailed(format!("description column: {e}")))?;
        let display_name: Option<String> = row
            .try_get("display_name")
            .map_err(|e| MemoryError::QueryFailed(format!("display_name column: {e}")))?;

        Ok(UserProfile {
            protocol,
            uid,
            description,
            display_name,
        })
    }

    async fn fetch_profile(
        &self,
        protocol: &str,
        uid: &str,
    ) -> Result<Option<UserProfile>, MemoryError> {
        let row = sqlx::query(
            "SELECT protocol, uid, description, display_name
             FROM profiles WHERE protocol = ? AND uid = ?",
        )
        .bind(protocol)
        .bind(uid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| MemoryError::QueryFailed(format!("profile lookup: {e}")))?;

        row.as_ref().map(Self::row_to_profile).transpose()
    }
}

#[async_trait]
impl MemoryStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn append(&self, record: ConversationRecord) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            INSERT INTO records (protocol, channel, uid, author, role, content, ts, moderation)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.protocol)
        .bind(&record.channel)
        .bind(&record.uid)
        .bind(&record.author)
        .bind(record.role.as_str())
        .bind(&record.content)
        .bind(record.timestamp)
        .bind(record.moderation.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::Storage(format!("append: {e}")))?;
        Ok(())
    }

    async fn get_channel(
        &self,
        protocol: &str,
        channel: &str,
        token_budget: usize,
    ) -> Result<Vec<ConversationRecord>, MemoryError> {
        let mut rows = sqlx::query(
            r#"
            SELECT protocol, channel, uid, author, role, content, ts, moderation
            FROM records
            WHERE protocol = ? AND channel = ?
            ORDER BY ts DESC, seq DESC
            "#,
        )
        .bind(protocol)
        .bind(channel)
        .fetch(&self.pool);

        let mut window: Vec<ConversationRecord> = Vec::new();
        let mut tokens = 0usize;

        while let Some(row) = rows
            .try_next()
            .await
            .map_err(|e| MemoryError::QueryFailed(format!("channel scan: {e}")))?
        {
            let record = Self::row_to_record(&row)?;
            tokens += estimate_record_tokens(&record);
            window.push(record);
            if tokens >= token_budget {
                break;
            }
        }

        window.reverse();
        debug!(
            protocol,
            channel,
            records = window.len(),
            tokens,
            "Loaded channel window"
        );
        Ok(window)
    }

    async fn set_user(&self, profile: UserProfile) -> Result<(), MemoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| MemoryError::Storage(format!("set_user begin: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO profiles (protocol, uid, description, display_name, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (protocol, uid) DO UPDATE SET
                description = excluded.description,
                display_name = excluded.display_name,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&profile.protocol)
        .bind(&profile.uid)
        .bind(&profile.description)
        .bind(&profile.display_name)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| MemoryError::Storage(format!("set_user: {e}")))?;

        if let Some(name) = &profile.display_name {
            sqlx::query(
                r#"
                INSERT INTO profile_names (protocol, name_lower, uid)
                VALUES (?, ?, ?)
                ON CONFLICT (protocol, name_lower) DO UPDATE SET uid = excluded.uid
                "#,
            )
            .bind(&profile.protocol)
            .bind(name.to_lowercase())
            .bind(&profile.uid)
            .execute(&mut *tx)
            .await
            .map_err(|e| MemoryError::Storage(format!("set_user name index: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| MemoryError::Storage(format!("set_user commit: {e}")))?;
        Ok(())
    }

    async fn get_user(
        &self,
        protocol: &str,
        uid: &str,
    ) -> Result<Option<UserProfile>, MemoryError> {
        self.fetch_profile(protocol, uid).await
    }

    async fn search_user(
        &self,
        protocol: &str,
        query: &str,
    ) -> Result<Option<UserProfile>, MemoryError> {
        if let Some(profile) = self.fetch_profile(protocol, query).await? {
            return Ok(Some(profile));
        }

        // instr() gives plain substring matching regardless of LIKE
        // wildcards in the query; name_lower ordering makes the first
        // match deterministic.
        let row = sqlx::query(
            r#"
            SELECT uid FROM profile_names
            WHERE protocol = ? AND instr(name_lower, ?) > 0
            ORDER BY name_lower ASC
            LIMIT 1
            "#,
        )
        .bind(protocol)
        .bind(query.to_lowercase())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| MemoryError::QueryFailed(format!("name index scan: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let uid: String = row
            .try_get("uid")
            .map_err(|e| MemoryError::QueryFailed(format!("uid column: {e}")))?;
        self.fetch_profile(protocol, &uid).await
    }

    async fn put_blob(&self, path: &str, content: &str) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            INSERT INTO blobs (path, content, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT (path) DO UPDATE SET
                content = excluded.content,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(path)
        .bind(content)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::Storage(format!("put_blob: {e}")))?;
        Ok(())
    }

    async fn get_blob(&self, path: &str) -> Result<Option<String>, MemoryError> {
        let row = sqlx::query("SELECT content FROM blobs WHERE path = ?")
            .bind(path)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| MemoryError::QueryFailed(format!("get_blob: {e}")))?;

        row.map(|r| {
            r.try_get::<String, _>("content")
                .map_err(|e| MemoryError::QueryFailed(format!("content column: {e}")))
        })
        .transpose()
    }

    async fn list_blobs(&self) -> Result<Vec<String>, MemoryError> {
        let rows = sqlx::query("SELECT path FROM blobs ORDER BY path ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MemoryError::QueryFailed(format!("list_blobs: {e}")))?;

        rows.iter()
            .map(|r| {
                r.try_get::<String, _>("path")
                    .map_err(|e| MemoryError::QueryFailed(format!("path column: {e}")))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_store() -> (TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.db");
        let store = SqliteStore::new(path.to_str().unwrap()).await.unwrap();
        (dir, store)
    }

    fn record(channel: &str, content: &str, ts: i64) -> ConversationRecord {
        ConversationRecord::new("discord", channel, "7", "telamohn", Role::User, content).at(ts)
    }

    #[tokio::test]
    async fn budget_window_keeps_newest_records() {
        let (_dir, store) = open_store().await;
        store.append(record("20", "a", 1)).await.unwrap();
        store.append(record("20", "b", 2)).await.unwrap();
        store.append(record("20", "c", 3)).await.unwrap();

        let window = store.get_channel("discord", "20", 2).await.unwrap();
        let contents: Vec<&str> = window.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn window_is_chronological_and_complete_under_large_budget() {
        let (_dir, store) = open_store().await;
        store.append(record("20", "a", 1)).await.unwrap();
        store
            .append(
                ConversationRecord::new("discord", "20", "0", "Alice", Role::Assistant, "b").at(2),
            )
            .await
            .unwrap();
        store.append(record("20", "c", 3)).await.unwrap();

        let window = store.get_channel("discord", "20", 512).await.unwrap();
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].content, "a");
        assert_eq!(window[0].role, Role::User);
        assert_eq!(window[1].role, Role::Assistant);
        assert_eq!(window[2].content, "c");
    }

    #[tokio::test]
    async fn appending_elsewhere_leaves_channel_untouched() {
        let (_dir, store) = open_store().await;
        store.append(record("20", "in twenty", 1)).await.unwrap();
        let before = store.get_channel("discord", "20", 512).await.unwrap();

        store.append(record("21", "meow", 2)).await.unwrap();
        let after = store.get_channel("discord", "20", 512).await.unwrap();

        assert_eq!(before.len(), after.len());
        assert_eq!(after[0].content, "in twenty");
    }

    #[tokio::test]
    async fn same_millisecond_keeps_insertion_order() {
        let (_dir, store) = open_store().await;
        store.append(record("20", "first", 99)).await.unwrap();
        store.append(record("20", "second", 99)).await.unwrap();
        store.append(record("20", "third", 99)).await.unwrap();

        let window = store.get_channel("discord", "20", 512).await.unwrap();
        let contents: Vec<&str> = window.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn tiny_budget_still_returns_newest_record() {
        let (_dir, store) = open_store().await;
        store
            .append(record("20", "a rather long opening message", 1))
            .await
            .unwrap();
        store
            .append(record("20", "an even longer closing message", 2))
            .await
            .unwrap();

        let window = store.get_channel("discord", "20", 1).await.unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].content, "an even longer closing message");
    }

    #[tokio::test]
    async fn moderation_roundtrips() {
        let (_dir, store) = open_store().await;
        let mut rec = record("20", "spam spam", 1);
        rec.moderation = Moderation::Banned;
        store.append(rec).await.unwrap();

        let window = store.get_channel("discord", "20", 512).await.unwrap();
        assert_eq!(window[0].moderation, Moderation::Banned);
    }

    #[tokio::test]
    async fn profile_last_write_wins() {
        let (_dir, store) = open_store().await;
        store
            .set_user(UserProfile::new("discord", "42", "likes coffee").named("Amy"))
            .await
            .unwrap();
        store
            .set_user(UserProfile::new("discord", "42", "likes tea").named("Amy"))
            .await
            .unwrap();

        let profile = store.get_user("discord", "42").await.unwrap().unwrap();
        assert_eq!(profile.description, "likes tea");
        assert_eq!(profile.display_name.as_deref(), Some("Amy"));
    }

    #[tokio::test]
    async fn search_by_partial_name() {
        let (_dir, store) = open_store().await;
        store
            .set_user(UserProfile::new("discord", "42", "likes tea").named("Amy"))
            .await
            .unwrap();

        let profile = store.search_user("discord", "am").await.unwrap().unwrap();
        assert_eq!(profile.description, "likes tea");
    }

    #[tokio::test]
    async fn search_prefers_exact_uid() {
        let (_dir, store) = open_store().await;
        store
            .set_user(UserProfile::new("discord", "amy", "the uid match"))
            .await
            .unwrap();
        store
            .set_user(UserProfile::new("discord", "42", "the name match").named("amy"))
            .await
            .unwrap();

        let profile = store.search_user("discord", "amy").await.unwrap().unwrap();
        assert_eq!(profile.description, "the uid match");
    }

    #[tokio::test]
    async fn search_tie_break_is_lexicographic() {
        let (_dir, store) = open_store().await;
        store
            .set_user(UserProfile::new("discord", "1", "amy's profile").named("Amy"))
            .await
            .unwrap();
        store
            .set_user(UserProfile::new("discord", "2", "amber's profile").named("Amber"))
            .await
            .unwrap();

        let profile = store.search_user("discord", "am").await.unwrap().unwrap();
        assert_eq!(profile.description, "amber's profile");
    }

    #[tokio::test]
    async fn search_miss_returns_none() {
        let (_dir, store) = open_store().await;
        assert!(store.search_user("discord", "nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn like_wildcards_are_inert_in_queries() {
        let (_dir, store) = open_store().await;
        store
            .set_user(UserProfile::new("discord", "42", "likes tea").named("Amy"))
            .await
            .unwrap();

        // '%' has no special meaning in the substring scan.
        assert!(store.search_user("discord", "%").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn blobs_roundtrip_and_stable_order() {
        let (_dir, store) = open_store().await;
        store.put_blob("notes/b", "beta").await.unwrap();
        store.put_blob("notes/a", "alpha").await.unwrap();
        store.put_blob("notes/b", "beta two").await.unwrap();

        assert_eq!(
            store.get_blob("notes/b").await.unwrap().as_deref(),
            Some("beta two")
        );
        assert_eq!(
            store.list_blobs().await.unwrap(),
            vec!["notes/a".to_string(), "notes/b".to_string()]
        );
    }

    #[tokio::test]
    async fn reopening_preserves_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.db");
        {
            let store = SqliteStore::new(path.to_str().unwrap()).await.unwrap();
            store.append(record("20", "persisted", 1)).await.unwrap();
        }

        let store = SqliteStore::new(path.to_str().unwrap()).await.unwrap();
        let window = store.get_channel("discord", "20", 512).await.unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].content, "persisted");
    }
}
