//! In-memory stand-ins for the database and the remote services.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::ai::{TextResponder, VisionResponder};
use crate::db::models::{ConversationRecord, FileMetadata, User};
use crate::db::Store;
use crate::search::{SearchOutcome, SearchProvider};

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<BTreeMap<i64, User>>,
    conversations: Mutex<Vec<ConversationRecord>>,
    files: Mutex<Vec<FileMetadata>>,
}

impl MemoryStore {
    pub fn users(&self) -> Vec<User> {
        self.users.lock().unwrap().values().cloned().collect()
    }

    pub fn conversations(&self) -> Vec<ConversationRecord> {
        self.conversations.lock().unwrap().clone()
    }

    pub fn files(&self) -> Vec<FileMetadata> {
        self.files.lock().unwrap().clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn register_user(
        &self,
        chat_id: i64,
        first_name: &str,
        username: Option<&str>,
    ) -> anyhow::Result<Option<User>> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&chat_id) {
            return Ok(None);
        }
        let user = User {
            chat_id,
            first_name: first_name.to_string(),
            username: username.map(str::to_string),
            phone_number: None,
            created_at: Utc::now(),
        };
        users.insert(chat_id, user.clone());
        Ok(Some(user))
    }

    async fn set_phone_number(&self, chat_id: i64, phone_number: &str) -> anyhow::Result<u64> {
        let mut users = self.users.lock().unwrap();
        match users.get_mut(&chat_id) {
            Some(user) => {
                user.phone_number = Some(phone_number.to_string());
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn log_conversation(
        &self,
        chat_id: i64,
        user_input: &str,
        bot_response: &str,
    ) -> anyhow::Result<ConversationRecord> {
        let record = ConversationRecord {
            id: Uuid::new_v4(),
            chat_id,
            user_input: user_input.to_string(),
            bot_response: bot_response.to_string(),
            created_at: Utc::now(),
        };
        self.conversations.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn log_file_metadata(
        &self,
        file_id: &str,
        file_name: &str,
        description: &str,
    ) -> anyhow::Result<FileMetadata> {
        let record = FileMetadata {
            id: Uuid::new_v4(),
            file_id: file_id.to_string(),
            file_name: file_name.to_string(),
            description: description.to_string(),
            created_at: Utc::now(),
        };
        self.files.lock().unwrap().push(record.clone());
        Ok(record)
    }
}

/// Answers every text and image request with the same result.
pub struct ScriptedResponder {
    reply: Result<String, String>,
    calls: AtomicUsize,
}

impl ScriptedResponder {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: &str) -> Self {
        Self {
            reply: Err(error.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer(&self) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().map_err(|e| anyhow::anyhow!(e))
    }
}

#[async_trait]
impl TextResponder for ScriptedResponder {
    async fn respond(&self, _utterance: &str) -> anyhow::Result<String> {
        self.answer()
    }
}

#[async_trait]
impl VisionResponder for ScriptedResponder {
    async fn describe(&self, _image: &[u8], _prompt: &str) -> anyhow::Result<String> {
        self.answer()
    }
}

/// Search provider that counts how often it was asked.
pub struct CountingSearch {
    outcome: SearchOutcome,
    calls: AtomicUsize,
}

impl CountingSearch {
    pub fn new(outcome: SearchOutcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for CountingSearch {
    async fn search(&self, _query: &str) -> anyhow::Result<SearchOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.outcome.clone())
    }
}
