//! In-memory store — useful for testing and ephemeral sessions.

use crate::token::estimate_record_tokens;
use async_trait::async_trait;
use ponder_core::error::MemoryError;
use ponder_core::memory::MemoryStore;
use ponder_core::record::{ConversationRecord, UserProfile};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

/// An in-memory store holding everything in plain collections.
///
/// Records keep insertion order in a Vec, which doubles as the tie-break
/// sequence for same-millisecond appends. Useful for tests and sessions
/// where persistence isn't needed.
pub struct InMemoryStore {
    records: RwLock<Vec<ConversationRecord>>,
    profiles: RwLock<HashMap<(String, String), UserProfile>>,
    /// (protocol, lower-cased display name) → uid
    name_index: RwLock<BTreeMap<(String, String), String>>,
    blobs: RwLock<BTreeMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            profiles: RwLock::new(HashMap::new()),
            name_index: RwLock::new(BTreeMap::new()),
            blobs: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn append(&self, record: ConversationRecord) -> Result<(), MemoryError> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn get_channel(
        &self,
        protocol: &str,
        channel: &str,
        token_budget: usize,
    ) -> Result<Vec<ConversationRecord>, MemoryError> {
        let records = self.records.read().await;

        // Newest first: timestamp descending, insertion order breaking ties.
        let mut window: Vec<ConversationRecord> = Vec::new();
        let mut tokens = 0usize;
        let mut channel_records: Vec<&ConversationRecord> = records
            .iter()
            .filter(|r| r.protocol == protocol && r.channel == channel)
            .collect();
        channel_records.sort_by_key(|r| r.timestamp);

        for record in channel_records.into_iter().rev() {
            tokens += estimate_record_tokens(record);
            window.push(record.clone());
            if tokens >= token_budget {
                break;
            }
        }

        window.reverse();
        Ok(window)
    }

    async fn set_user(&self, profile: UserProfile) -> Result<(), MemoryError> {
        if let Some(name) = &profile.display_name {
            self.name_index.write().await.insert(
                (profile.protocol.clone(), name.to_lowercase()),
                profile.uid.clone(),
            );
        }
        self.profiles
            .write()
            .await
            .insert((profile.protocol.clone(), profile.uid.clone()), profile);
        Ok(())
    }

    async fn get_user(
        &self,
        protocol: &str,
        uid: &str,
    ) -> Result<Option<UserProfile>, MemoryError> {
        let profiles = self.profiles.read().await;
        Ok(profiles
            .get(&(protocol.to_string(), uid.to_string()))
            .cloned())
    }

    async fn search_user(
        &self,
        protocol: &str,
        query: &str,
    ) -> Result<Option<UserProfile>, MemoryError> {
        if let Some(profile) = self.get_user(protocol, query).await? {
            return Ok(Some(profile));
        }

        let needle = query.to_lowercase();
        let index = self.name_index.read().await;
        // BTreeMap keys are sorted, so the scan visits names in
        // lexicographic order and the first substring match wins.
        let uid = index
            .iter()
            .filter(|((proto, _), _)| proto == protocol)
            .find(|((_, name), _)| name.contains(&needle))
            .map(|(_, uid)| uid.clone());
        drop(index);

        match uid {
            Some(uid) => self.get_user(protocol, &uid).await,
            None => Ok(None),
        }
    }

    async fn put_blob(&self, path: &str, content: &str) -> Result<(), MemoryError> {
        self.blobs
            .write()
            .await
            .insert(path.to_string(), content.to_string());
        Ok(())
    }

    async fn get_blob(&self, path: &str) -> Result<Option<String>, MemoryError> {
        Ok(self.blobs.read().await.get(path).cloned())
    }

    async fn list_blobs(&self) -> Result<Vec<String>, MemoryError> {
        Ok(self.blobs.read().await.keys().cloned().collect())
    }
}
