use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub chat_id: i64,
    pub first_name: String,
    pub username: Option<String>,
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One AI chat or web-search exchange.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: Uuid,
    pub chat_id: i64,
    pub user_input: String,
    pub bot_response: String,
    pub created_at: DateTime<Utc>,
}

/// Description generated for an analyzed image.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FileMetadata {
    pub id: Uuid,
    pub file_id: String,
    pub file_name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}
