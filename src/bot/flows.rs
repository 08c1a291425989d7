//! What the bot answers to each kind of message, independent of Telegram.

use crate::bot::AppState;

pub const WELCOME: &str =
    "Welcome to the User Registration Bot! Please share your phone number to continue.";
pub const SHARE_PHONE_BUTTON: &str = "Share my phone number";
pub const FAREWELL: &str = "Bye! Hope to talk to you again soon.";
pub const CHAT_APOLOGY: &str =
    "Sorry, I couldn't process your request right now. Please try again later.";
pub const IMAGE_APOLOGY: &str =
    "Sorry, I couldn't analyze the file right now. Please try again later.";
pub const IMAGE_PROMPT: &str = "Analyse this image and generate response";
pub const WEBSEARCH_USAGE: &str =
    "Please provide a query to search for. Usage: /websearch <your_query>";

/// Keyboard change sent along with a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKeyboard {
    Unchanged,
    /// One-time keyboard with a single "share contact" button.
    RequestContact,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: ReplyKeyboard,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: ReplyKeyboard::Unchanged,
        }
    }

    fn with_keyboard(mut self, keyboard: ReplyKeyboard) -> Self {
        self.keyboard = keyboard;
        self
    }
}

/// An image attached to a message, as a photo or an image document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_id: String,
    pub file_name: String,
}

/// `/start`: register the sender once and ask for their phone number.
pub async fn start(
    state: &AppState,
    chat_id: i64,
    first_name: &str,
    username: Option<&str>,
) -> anyhow::Result<Reply> {
    if let Some(user) = state.store.register_user(chat_id, first_name, username).await? {
        tracing::info!(
            "Registered new user: {} (@{})",
            user.first_name,
            user.username.as_deref().unwrap_or("-")
        );
    }
    Ok(Reply::text(WELCOME).with_keyboard(ReplyKeyboard::RequestContact))
}

pub async fn share_contact(
    state: &AppState,
    chat_id: i64,
    phone_number: &str,
) -> anyhow::Result<Reply> {
    let updated = state.store.set_phone_number(chat_id, phone_number).await?;
    if updated == 0 {
        tracing::warn!("Phone number shared by unregistered chat {}", chat_id);
    } else {
        tracing::info!("Stored phone number for chat {}", chat_id);
    }
    Ok(Reply::text(format!(
        "Thank you for sharing your phone number: {}. Registration complete!",
        phone_number
    )))
}

pub fn cancel() -> Reply {
    Reply::text(FAREWELL).with_keyboard(ReplyKeyboard::Remove)
}

/// Plain text goes to the text model; the exchange is logged only on success.
pub async fn chat(state: &AppState, chat_id: i64, text: &str) -> Reply {
    let exchange = async {
        let answer = state.text_ai.respond(text).await?;
        state.store.log_conversation(chat_id, text, &answer).await?;
        anyhow::Ok(answer)
    };

    match exchange.await {
        Ok(answer) => Reply::text(answer),
        Err(e) => {
            tracing::error!("Error with Gemini API: {:#}", e);
            Reply::text(CHAT_APOLOGY)
        }
    }
}

/// Describe a downloaded image and record what was found.
pub async fn describe_image(state: &AppState, upload: &ImageUpload, image: &[u8]) -> Reply {
    let analysis = async {
        let description = state.vision_ai.describe(image, IMAGE_PROMPT).await?;
        state
            .store
            .log_file_metadata(&upload.file_id, &upload.file_name, &description)
            .await?;
        anyhow::Ok(description)
    };

    match analysis.await {
        Ok(description) => Reply::text(format!(
            "Here is what I found in the image:\n\n{}",
            description
        )),
        Err(e) => {
            tracing::error!("Error analyzing {} with Gemini: {:#}", upload.file_name, e);
            Reply::text(IMAGE_APOLOGY)
        }
    }
}

/// `/websearch <query>`.
pub async fn websearch(state: &AppState, chat_id: i64, query: &str) -> anyhow::Result<Reply> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Reply::text(WEBSEARCH_USAGE));
    }
    let summary = state.web_search.search(query, chat_id).await?;
    Ok(Reply::text(summary))
}
