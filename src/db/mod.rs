pub mod models;

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

/// Persistence used by the bot handlers.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a user unless one already exists for `chat_id`.
    /// Returns the new record, or `None` when the user was already known.
    async fn register_user(
        &self,
        chat_id: i64,
        first_name: &str,
        username: Option<&str>,
    ) -> anyhow::Result<Option<models::User>>;

    /// Returns the number of updated users (0 for an unknown chat).
    async fn set_phone_number(&self, chat_id: i64, phone_number: &str) -> anyhow::Result<u64>;

    async fn log_conversation(
        &self,
        chat_id: i64,
        user_input: &str,
        bot_response: &str,
    ) -> anyhow::Result<models::ConversationRecord>;

    async fn log_file_metadata(
        &self,
        file_id: &str,
        file_name: &str,
        description: &str,
    ) -> anyhow::Result<models::FileMetadata>;
}

#[derive(Debug, Clone)]
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    /// Build a pool that connects on first use.
    ///
    /// An unparsable URL is logged and replaced by the libpq defaults
    /// (`PGHOST`, `PGUSER`, ...), so the bot still starts without a database.
    pub fn connect_lazy(database_url: &str) -> Self {
        let options = PgConnectOptions::from_str(database_url).unwrap_or_else(|e| {
            tracing::error!("Invalid DATABASE_URL ({}), using PG* defaults", e);
            PgConnectOptions::new()
        });
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy_with(options);
        Self { pool }
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        // Each CREATE TABLE must be a separate query (Postgres doesn't allow
        // multiple commands in a single prepared statement).

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS users (
                chat_id BIGINT PRIMARY KEY,
                first_name TEXT NOT NULL,
                username TEXT,
                phone_number TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS chat_history (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                chat_id BIGINT NOT NULL,
                user_input TEXT NOT NULL,
                bot_response TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS file_metadata (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                file_id TEXT NOT NULL,
                file_name TEXT NOT NULL,
                description TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chat_history_chat ON chat_history(chat_id, created_at)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_file_metadata_file ON file_metadata(file_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl Store for Database {
    // ── User Operations ────────────────────────────────────────────

    async fn register_user(
        &self,
        chat_id: i64,
        first_name: &str,
        username: Option<&str>,
    ) -> anyhow::Result<Option<models::User>> {
        let user = sqlx::query_as::<_, models::User>(
            r#"
            INSERT INTO users (chat_id, first_name, username)
            VALUES ($1, $2, $3)
            ON CONFLICT (chat_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(chat_id)
        .bind(first_name)
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn set_phone_number(&self, chat_id: i64, phone_number: &str) -> anyhow::Result<u64> {
        let result = sqlx::query("UPDATE users SET phone_number = $2 WHERE chat_id = $1")
            .bind(chat_id)
            .bind(phone_number)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // ── Log Operations ─────────────────────────────────────────────

    async fn log_conversation(
        &self,
        chat_id: i64,
        user_input: &str,
        bot_response: &str,
    ) -> anyhow::Result<models::ConversationRecord> {
        let record = sqlx::query_as::<_, models::ConversationRecord>(
            r#"
            INSERT INTO chat_history (chat_id, user_input, bot_response)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(chat_id)
        .bind(user_input)
        .bind(bot_response)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    async fn log_file_metadata(
        &self,
        file_id: &str,
        file_name: &str,
        description: &str,
    ) -> anyhow::Result<models::FileMetadata> {
        let record = sqlx::query_as::<_, models::FileMetadata>(
            r#"
            INSERT INTO file_metadata (file_id, file_name, description)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(file_id)
        .bind(file_name)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }
}

/// Run with: TEST_DATABASE_URL=postgres://... cargo test --features integ_test
#[cfg(all(test, feature = "integ_test"))]
mod tests {
    use super::*;

    async fn test_db() -> Option<Database> {
        let url = match std::env::var("TEST_DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                eprintln!("Skipping test: TEST_DATABASE_URL not set");
                return None;
            }
        };
        let db = Database::connect_lazy(&url);
        db.run_migrations().await.expect("migrations failed");
        Some(db)
    }

    fn fresh_chat_id() -> i64 {
        (uuid::Uuid::new_v4().as_u128() as i64) & i64::MAX
    }

    async fn users_with_chat_id(db: &Database, chat_id: i64) -> i64 {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE chat_id = $1")
            .bind(chat_id)
            .fetch_one(&db.pool)
            .await
            .unwrap();
        row.0
    }

    #[tokio::test]
    async fn register_twice_keeps_one_user() {
        let Some(db) = test_db().await else { return };
        let chat_id = fresh_chat_id();

        let first = db.register_user(chat_id, "Ada", Some("ada")).await.unwrap();
        let second = db.register_user(chat_id, "Ada", Some("ada")).await.unwrap();

        let user = first.expect("first registration inserts");
        assert!(user.phone_number.is_none());
        assert!(second.is_none());
        assert_eq!(users_with_chat_id(&db, chat_id).await, 1);
    }

    #[tokio::test]
    async fn phone_number_for_unknown_chat_updates_nothing() {
        let Some(db) = test_db().await else { return };
        let updated = db.set_phone_number(fresh_chat_id(), "+100").await.unwrap();
        assert_eq!(updated, 0);
    }

    #[tokio::test]
    async fn phone_number_is_stored() {
        let Some(db) = test_db().await else { return };
        let chat_id = fresh_chat_id();
        db.register_user(chat_id, "Bob", None).await.unwrap();

        assert_eq!(db.set_phone_number(chat_id, "+4412345").await.unwrap(), 1);

        let row: (Option<String>,) =
            sqlx::query_as("SELECT phone_number FROM users WHERE chat_id = $1")
                .bind(chat_id)
                .fetch_one(&db.pool)
                .await
                .unwrap();
        assert_eq!(row.0.as_deref(), Some("+4412345"));
    }

    #[tokio::test]
    async fn file_metadata_allows_duplicates() {
        let Some(db) = test_db().await else { return };
        let file_id = uuid::Uuid::new_v4().to_string();

        let a = db.log_file_metadata(&file_id, "a.jpg", "cat").await.unwrap();
        let b = db.log_file_metadata(&file_id, "a.jpg", "cat").await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.file_id, b.file_id);
    }

    #[tokio::test]
    async fn conversation_is_logged() {
        let Some(db) = test_db().await else { return };
        let chat_id = fresh_chat_id();
        let record = db.log_conversation(chat_id, "hi", "hello").await.unwrap();
        assert_eq!(record.chat_id, chat_id);
        assert_eq!(record.user_input, "hi");
        assert_eq!(record.bot_response, "hello");
    }
}
