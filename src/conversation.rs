//! # Conversation store
//!
//! Holds the list of conversation summaries (newest first), one message
//! history per conversation, and the currently active conversation.
//!
//! Every mutation re-serializes the whole list, summaries and histories
//! together, under [`CONVERSATIONS_KEY`]. On [`ConversationStore::open`] the
//! blob is split back into the summary list and an id → history map. A write
//! that fails is logged and otherwise ignored; a blob that fails to parse is
//! logged and treated as an empty store.
//!
//! ## Summaries
//! - `title` starts as `"New Chat"` and is set exactly once, from the first
//!   user message (30 characters, `"..."` appended when truncated).
//! - `lastMessage` is the first 50 characters of the newest message and is
//!   refreshed, together with `timestamp`, on every append.
//!
//! ```rust
//! use chat_relay::conversation::ConversationStore;
//! use chat_relay::message::Message;
//! use chat_relay::storage::MemoryStorage;
//!
//! let mut store = ConversationStore::open(MemoryStorage::new());
//! let id = store.create().id.clone();
//! store.append_message(&id, Message::user("How do I read a file in Rust?")).unwrap();
//! assert_eq!(store.get(&id).unwrap().title, "How do I read a file in Rust?");
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::message::{Message, Role, take_chars};
use crate::storage::{CONVERSATIONS_KEY, Storage};

pub const NEW_CHAT_TITLE: &str = "New Chat";
pub const NEW_CHAT_PREVIEW: &str = "Start a conversation...";

const TITLE_CHARS: usize = 30;
const PREVIEW_CHARS: usize = 50;

/// Summary of one conversation, as shown in a conversation list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub last_message: String,
    pub timestamp: DateTime<Utc>,
}

/// Persisted shape: a summary plus its history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredConversation {
    #[serde(flatten)]
    pub conversation: Conversation,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("no conversation with id {0}")]
    NotFound(String),
}

/// Title for a conversation whose first user message is `content`.
pub fn derive_title(content: &str) -> String {
    let mut title = take_chars(content, TITLE_CHARS);
    if content.chars().count() > TITLE_CHARS {
        title.push_str("...");
    }
    title
}

/// Sidebar-style day label for `timestamp` relative to `now`.
pub fn relative_day(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    match (now - timestamp).num_days() {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        days if (2..7).contains(&days) => format!("{days} days ago"),
        _ => timestamp.format("%Y-%m-%d").to_string(),
    }
}

/// In-memory conversation state mirrored to a [`Storage`] port.
pub struct ConversationStore<S: Storage> {
    storage: S,
    conversations: Vec<Conversation>,
    messages: HashMap<String, Vec<Message>>,
    active: Option<String>,
}

impl<S: Storage> ConversationStore<S> {
    /// Load whatever the port holds under [`CONVERSATIONS_KEY`].
    pub fn open(mut storage: S) -> Self {
        let stored = match storage.get(CONVERSATIONS_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<StoredConversation>>(&raw) {
                Ok(stored) => stored,
                Err(err) => {
                    warn!("Failed to parse stored conversations: {}", err);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!("Failed to load conversations: {}", err);
                Vec::new()
            }
        };

        let mut conversations = Vec::with_capacity(stored.len());
        let mut messages = HashMap::with_capacity(stored.len());
        for entry in stored {
            messages.insert(entry.conversation.id.clone(), entry.messages);
            conversations.push(entry.conversation);
        }
        debug!("Loaded {} conversations", conversations.len());

        Self {
            storage,
            conversations,
            messages,
            active: None,
        }
    }

    /// Summaries, most recently created first.
    pub fn list(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    /// History of `id`; empty when nothing was recorded.
    pub fn messages(&self, id: &str) -> &[Message] {
        self.messages.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// History of the active conversation; empty when nothing is active.
    pub fn active_messages(&self) -> &[Message] {
        match &self.active {
            Some(id) => self.messages(id),
            None => &[],
        }
    }

    /// Start a new, empty conversation and make it active.
    pub fn create(&mut self) -> &Conversation {
        let id = self.next_id();
        let conversation = Conversation {
            id: id.clone(),
            title: NEW_CHAT_TITLE.to_string(),
            last_message: NEW_CHAT_PREVIEW.to_string(),
            timestamp: Utc::now(),
        };

        self.conversations.insert(0, conversation);
        self.messages.insert(id.clone(), Vec::new());
        self.active = Some(id);
        self.persist();

        &self.conversations[0]
    }

    /// Make `id` the active conversation and return its history.
    pub fn select(&mut self, id: &str) -> Result<&[Message], StoreError> {
        if self.get(id).is_none() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.active = Some(id.to_string());
        Ok(self.messages(id))
    }

    /// Append `message` to `id`, refreshing its summary.
    pub fn append_message(&mut self, id: &str, message: Message) -> Result<(), StoreError> {
        let conversation = self
            .conversations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let history = self.messages.entry(id.to_string()).or_default();

        let first_user_message =
            message.role == Role::User && !history.iter().any(|m| m.role == Role::User);
        if first_user_message {
            conversation.title = derive_title(&message.content);
        }
        conversation.last_message = take_chars(&message.content, PREVIEW_CHARS);
        conversation.timestamp = Utc::now();

        history.push(message);
        self.persist();
        Ok(())
    }

    /// Remove `id` and its history; clears the active selection if needed.
    pub fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        let position = self
            .conversations
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        self.conversations.remove(position);
        self.messages.remove(id);
        if self.active.as_deref() == Some(id) {
            self.active = None;
        }
        self.persist();
        Ok(())
    }

    /// Millisecond timestamp, bumped until it does not collide.
    fn next_id(&self) -> String {
        let mut candidate = Utc::now().timestamp_millis();
        while self.get(&candidate.to_string()).is_some() {
            candidate += 1;
        }
        candidate.to_string()
    }

    fn snapshot(&self) -> Vec<StoredConversation> {
        self.conversations
            .iter()
            .map(|conversation| StoredConversation {
                conversation: conversation.clone(),
                messages: self.messages(&conversation.id).to_vec(),
            })
            .collect()
    }

    fn persist(&mut self) {
        let raw = match serde_json::to_string(&self.snapshot()) {
            Ok(raw) => raw,
            Err(err) => {
                error!("Failed to serialize conversations: {}", err);
                return;
            }
        };
        if let Err(err) = self.storage.set(CONVERSATIONS_KEY, &raw) {
            error!("Failed to save conversations: {}", err);
        }
    }
}
