//! MemoryStore trait — durable conversation log, profiles, and blobs.
//!
//! The store is consumed by the engine's caller, not by the engine: the
//! caller fetches a token-budgeted window of history before an invocation
//! and appends what came out of it afterwards.
//!
//! Guarantees every implementation must uphold:
//! - `append` is atomic per record; a reader never sees a partial record.
//! - Within one channel, records come back in timestamp order; records
//!   appended in the same millisecond keep their insertion order.
//! - Reads of different channels do not block each other.

use crate::error::MemoryError;
use crate::record::{ConversationRecord, UserProfile};
use async_trait::async_trait;

/// The core MemoryStore trait.
///
/// Implementations: SQLite (durable), in-memory (tests, ephemeral).
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// The store name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Append one record to the channel log. Atomic; never mutates
    /// existing records.
    async fn append(&self, record: ConversationRecord) -> Result<(), MemoryError>;

    /// Return as much recent history as fits the token budget.
    ///
    /// Scans the channel newest-first accumulating an estimated token
    /// count over content, includes the record that makes the count reach
    /// the budget, then stops. The window is returned oldest-first. A
    /// non-empty channel always yields at least one record, however small
    /// the budget.
    async fn get_channel(
        &self,
        protocol: &str,
        channel: &str,
        token_budget: usize,
    ) -> Result<Vec<ConversationRecord>, MemoryError>;

    /// Upsert a profile, last write wins. A display name, when present,
    /// also updates the lower-cased name index.
    async fn set_user(&self, profile: UserProfile) -> Result<(), MemoryError>;

    /// Exact lookup by (protocol, uid).
    async fn get_user(
        &self,
        protocol: &str,
        uid: &str,
    ) -> Result<Option<UserProfile>, MemoryError>;

    /// Fuzzy lookup: exact uid first; on miss, the name index is scanned
    /// for entries containing the lower-cased query as a substring, in
    /// lexicographic order of the indexed name, and the first match wins.
    async fn search_user(
        &self,
        protocol: &str,
        query: &str,
    ) -> Result<Option<UserProfile>, MemoryError>;

    /// Write a small text document under a path key.
    async fn put_blob(&self, path: &str, content: &str) -> Result<(), MemoryError>;

    /// Read a document back.
    async fn get_blob(&self, path: &str) -> Result<Option<String>, MemoryError>;

    /// List all document keys in ascending path order.
    async fn list_blobs(&self) -> Result<Vec<String>, MemoryError>;
}
