//! Conversation store
//!
//! Holds every known chat keyed by the backend-assigned id, plus the little
//! bits of client state that go with it (chat order, selection, model name,
//! API key). All state lives in one [`StoreSnapshot`] that is written through
//! a [`ChatPersistence`] port after every mutation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use std::{fs, io};

use crate::types::{ChatMessage, ChatRecord, now_millis};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] io::Error),

    #[error("storage format error: {0}")]
    Format(#[from] serde_json::Error),

    #[error("unknown chat: {0}")]
    UnknownChat(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    #[serde(default)]
    pub chat_list: Vec<String>,
    #[serde(default)]
    pub chats: HashMap<String, ChatRecord>,
    #[serde(default)]
    pub selected_chat: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Where the store reads and writes its snapshot.
pub trait ChatPersistence {
    fn load(&self) -> StoreResult<StoreSnapshot>;
    fn save(&self, snapshot: &StoreSnapshot) -> StoreResult<()>;
}

// ============================================
// File-backed persistence
// ============================================

const STATE_FILE: &str = "chat_state.json";

#[derive(Clone, Debug)]
pub struct FilePersistence {
    path: PathBuf,
}

impl FilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<local data dir>/deepchat/chat_state.json`, or `cache/` when there is none.
    pub fn default_location() -> Self {
        let dir = dirs::data_local_dir()
            .map(|dir| dir.join("deepchat"))
            .unwrap_or_else(|| PathBuf::from("cache"));
        Self::new(dir.join(STATE_FILE))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl ChatPersistence for FilePersistence {
    fn load(&self) -> StoreResult<StoreSnapshot> {
        if !self.path.exists() {
            return Ok(StoreSnapshot::default());
        }
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, snapshot: &StoreSnapshot) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

// ============================================
// In-memory persistence
// ============================================

/// Shared in-memory slot; clones observe the same saved snapshot.
#[derive(Clone, Debug, Default)]
pub struct MemoryPersistence {
    slot: Arc<Mutex<MemorySlot>>,
}

#[derive(Debug, Default)]
struct MemorySlot {
    snapshot: Option<StoreSnapshot>,
    saves: usize,
}

impl MemoryPersistence {
    pub fn with_snapshot(snapshot: StoreSnapshot) -> Self {
        let persistence = Self::default();
        persistence.lock().snapshot = Some(snapshot);
        persistence
    }

    pub fn saved(&self) -> Option<StoreSnapshot> {
        self.lock().snapshot.clone()
    }

    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemorySlot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ChatPersistence for MemoryPersistence {
    fn load(&self) -> StoreResult<StoreSnapshot> {
        Ok(self.lock().snapshot.clone().unwrap_or_default())
    }

    fn save(&self, snapshot: &StoreSnapshot) -> StoreResult<()> {
        let mut slot = self.lock();
        slot.snapshot = Some(snapshot.clone());
        slot.saves += 1;
        Ok(())
    }
}

// ============================================
// Store
// ============================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvictionPolicy {
    pub max_age: Duration,
    pub max_chats: usize,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(24 * 60 * 60),
            max_chats: 50,
        }
    }
}

pub struct ChatStore<P> {
    port: P,
    state: StoreSnapshot,
    policy: EvictionPolicy,
}

impl<P: ChatPersistence> ChatStore<P> {
    /// Loads saved state; unreadable state is logged and replaced with an empty store.
    pub fn open(port: P) -> Self {
        let state = match port.load() {
            Ok(state) => state,
            Err(err) => {
                tracing::warn!("failed to load chat state, starting empty: {err}");
                StoreSnapshot::default()
            }
        };
        Self {
            port,
            state,
            policy: EvictionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: EvictionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    pub fn snapshot(&self) -> &StoreSnapshot {
        &self.state
    }

    pub fn get(&self, chat_id: &str) -> Option<&[ChatMessage]> {
        self.state
            .chats
            .get(chat_id)
            .map(|record| record.messages.as_slice())
    }

    pub fn record(&self, chat_id: &str) -> Option<&ChatRecord> {
        self.state.chats.get(chat_id)
    }

    /// Chat ids in creation order.
    pub fn list_chats(&self) -> &[String] {
        &self.state.chat_list
    }

    /// Replaces the message list of an existing chat.
    pub fn put(&mut self, chat_id: &str, messages: Vec<ChatMessage>) -> StoreResult<()> {
        self.record_mut(chat_id)?.messages = messages;
        self.save()
    }

    pub fn insert_chat(&mut self, chat_id: impl Into<String>, record: ChatRecord) -> StoreResult<()> {
        let chat_id = chat_id.into();
        if !self.state.chat_list.contains(&chat_id) {
            self.state.chat_list.push(chat_id.clone());
        }
        self.state.chats.insert(chat_id, record);
        self.save()
    }

    pub fn remove_chat(&mut self, chat_id: &str) -> StoreResult<bool> {
        let removed = self.drop_chat(chat_id);
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    pub fn select(&mut self, chat_id: &str) -> StoreResult<()> {
        if !self.state.chats.contains_key(chat_id) {
            return Err(StoreError::UnknownChat(chat_id.to_string()));
        }
        self.state.selected_chat = Some(chat_id.to_string());
        self.save()
    }

    pub fn selected(&self) -> Option<&str> {
        self.state.selected_chat.as_deref()
    }

    pub fn model_name(&self) -> Option<&str> {
        self.state.model_name.as_deref()
    }

    pub fn set_model_name(&mut self, model: impl Into<String>) -> StoreResult<()> {
        self.state.model_name = Some(model.into());
        self.save()
    }

    pub fn api_key(&self) -> Option<&str> {
        self.state.api_key.as_deref()
    }

    pub fn set_api_key(&mut self, api_key: impl Into<String>) -> StoreResult<()> {
        self.state.api_key = Some(api_key.into());
        self.save()
    }

    /// Optimistically appends the user's message and a pending assistant placeholder.
    pub fn begin_send(&mut self, chat_id: &str, user_message: impl Into<String>) -> StoreResult<()> {
        let record = self.record_mut(chat_id)?;
        record.messages.push(ChatMessage::user(user_message));
        record.messages.push(ChatMessage::placeholder());
        self.save()
    }

    /// Overwrites the chat with the server's list. Last response to arrive wins.
    pub fn commit_send(&mut self, chat_id: &str, messages: Vec<ChatMessage>) -> StoreResult<()> {
        self.put(chat_id, messages)
    }

    /// Drops pending placeholders after a failed send. The user's message stays.
    pub fn rollback_send(&mut self, chat_id: &str) -> StoreResult<usize> {
        let record = self.record_mut(chat_id)?;
        let before = record.messages.len();
        record.messages.retain(|m| !m.temp);
        let removed = before - record.messages.len();
        tracing::debug!("rolled back {removed} pending message(s) in chat {chat_id}");
        self.save()?;
        Ok(removed)
    }

    pub fn evict_stale(&mut self) -> StoreResult<Vec<String>> {
        self.evict_stale_at(now_millis())
    }

    /// Drops chats older than `max_age`, then the oldest chats beyond `max_chats`.
    pub fn evict_stale_at(&mut self, now_ms: i64) -> StoreResult<Vec<String>> {
        let max_age_ms = i64::try_from(self.policy.max_age.as_millis()).unwrap_or(i64::MAX);

        let mut evicted: Vec<String> = self
            .state
            .chat_list
            .iter()
            .filter(|id| match self.state.chats.get(id.as_str()) {
                Some(record) => now_ms.saturating_sub(record.created) > max_age_ms,
                None => true,
            })
            .cloned()
            .collect();
        for id in &evicted {
            self.drop_chat(id);
        }

        let overflow = self.state.chat_list.len().saturating_sub(self.policy.max_chats);
        if overflow > 0 {
            let mut by_age: Vec<(i64, usize, String)> = self
                .state
                .chat_list
                .iter()
                .enumerate()
                .filter_map(|(pos, id)| {
                    self.state
                        .chats
                        .get(id)
                        .map(|record| (record.created, pos, id.clone()))
                })
                .collect();
            by_age.sort();
            for (_, _, id) in by_age.into_iter().take(overflow) {
                self.drop_chat(&id);
                evicted.push(id);
            }
        }

        // Records not referenced by the ordered list are unreachable.
        let listed: Vec<String> = self.state.chat_list.clone();
        let orphans: Vec<String> = self
            .state
            .chats
            .keys()
            .filter(|id| !listed.contains(id))
            .cloned()
            .collect();
        for id in orphans {
            self.state.chats.remove(&id);
            evicted.push(id);
        }

        if !evicted.is_empty() {
            tracing::info!("evicted {} chat(s)", evicted.len());
            self.save()?;
        }
        Ok(evicted)
    }

    fn drop_chat(&mut self, chat_id: &str) -> bool {
        let listed = self.state.chat_list.len();
        self.state.chat_list.retain(|id| id != chat_id);
        let removed =
            self.state.chats.remove(chat_id).is_some() || listed != self.state.chat_list.len();
        if self.state.selected_chat.as_deref() == Some(chat_id) {
            self.state.selected_chat = None;
        }
        removed
    }

    fn record_mut(&mut self, chat_id: &str) -> StoreResult<&mut ChatRecord> {
        self.state
            .chats
            .get_mut(chat_id)
            .ok_or_else(|| StoreError::UnknownChat(chat_id.to_string()))
    }

    fn save(&self) -> StoreResult<()> {
        self.port.save(&self.state)?;
        tracing::debug!("saved {} chat(s)", self.state.chat_list.len());
        Ok(())
    }
}
