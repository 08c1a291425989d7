use std::sync::Arc;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{
    ButtonRequest, ChatAction, FileMeta, KeyboardButton, KeyboardMarkup, KeyboardRemove,
    MessageEntityKind,
};

use crate::bot::flows::{self, ImageUpload, Reply, ReplyKeyboard};
use crate::bot::{AppState, HandlerResult};

/// Telegram rejects messages longer than this many characters.
const TELEGRAM_MAX_MESSAGE_LEN: usize = 4096;

/// Whether `msg` shares a contact card.
pub fn is_contact(msg: &Message) -> bool {
    msg.contact().is_some()
}

/// Whether `msg` is text for the model: any text that does not open with a
/// bot command entity. `/ hello` carries no such entity and still qualifies.
pub fn is_chat_text(msg: &Message) -> bool {
    if msg.text().is_none() {
        return false;
    }
    let opens_with_command = msg.entities().is_some_and(|entities| {
        entities
            .iter()
            .any(|e| e.offset == 0 && matches!(e.kind, MessageEntityKind::BotCommand))
    });
    !opens_with_command
}

/// A shared contact: store the sender's phone number.
pub async fn handle_contact(bot: Bot, msg: Message, state: Arc<AppState>) -> HandlerResult {
    let (Some(user), Some(contact)) = (msg.from.as_ref(), msg.contact()) else {
        return Ok(());
    };

    let reply = flows::share_contact(&state, user.id.0 as i64, &contact.phone_number).await?;
    send_reply(&bot, msg.chat.id, reply).await?;
    Ok(())
}

/// Plain (non-command) text: ask the model.
pub async fn handle_text(bot: Bot, msg: Message, state: Arc<AppState>) -> HandlerResult {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    bot.send_chat_action(msg.chat.id, ChatAction::Typing).await?;
    let reply = flows::chat(&state, msg.chat.id.0, text).await;
    send_reply(&bot, msg.chat.id, reply).await?;
    Ok(())
}

/// An image attached to a message, with the Telegram file handle to fetch it.
#[derive(Debug, Clone)]
pub struct IncomingImage {
    file: FileMeta,
    upload: ImageUpload,
}

/// A photo or image document: download it and have it described.
pub async fn handle_image(
    bot: Bot,
    msg: Message,
    image: IncomingImage,
    state: Arc<AppState>,
) -> HandlerResult {
    bot.send_chat_action(msg.chat.id, ChatAction::Typing).await?;

    let reply = match download(&bot, &image.file).await {
        Ok(bytes) => flows::describe_image(&state, &image.upload, &bytes).await,
        Err(e) => {
            tracing::error!("Failed to download {}: {}", image.upload.file_id, e);
            Reply::text(flows::IMAGE_APOLOGY)
        }
    };

    send_reply(&bot, msg.chat.id, reply).await?;
    Ok(())
}

/// The image carried by `msg`, if any.
///
/// Photos use their largest size; documents qualify when their MIME type is
/// `image/*` and keep their original file name.
pub fn incoming_image(msg: &Message) -> Option<IncomingImage> {
    if let Some(largest) = msg.photo().and_then(|sizes| sizes.last()) {
        let file_id = largest.file.id.to_string();
        return Some(IncomingImage {
            file: largest.file.clone(),
            upload: ImageUpload {
                file_name: format!("image_{}.jpg", file_id),
                file_id,
            },
        });
    }

    let document = msg.document()?;
    let is_image = document
        .mime_type
        .as_ref()
        .is_some_and(|mime| mime.essence_str().starts_with("image/"));
    if !is_image {
        return None;
    }
    let file_id = document.file.id.to_string();
    Some(IncomingImage {
        file: document.file.clone(),
        upload: ImageUpload {
            file_name: document
                .file_name
                .clone()
                .unwrap_or_else(|| format!("image_{}.jpg", file_id)),
            file_id,
        },
    })
}

async fn download(bot: &Bot, meta: &FileMeta) -> anyhow::Result<Vec<u8>> {
    let file = bot.get_file(meta.id.clone()).await?;
    let mut buf = Vec::new();
    bot.download_file(&file.path, &mut buf).await?;
    tracing::debug!("Downloaded {} ({} bytes)", file.path, buf.len());
    Ok(buf)
}

/// Send `reply` to `chat_id`, split into several messages when it is too long.
/// The keyboard change rides on the last message.
pub async fn send_reply(bot: &Bot, chat_id: ChatId, reply: Reply) -> HandlerResult {
    let chunks = chunk_message(&reply.text);
    let last = chunks.len() - 1;

    for (i, chunk) in chunks.into_iter().enumerate() {
        let request = bot.send_message(chat_id, chunk);
        if i < last {
            request.await?;
            continue;
        }
        match reply.keyboard {
            ReplyKeyboard::Unchanged => {
                request.await?;
            }
            ReplyKeyboard::RequestContact => {
                let button = KeyboardButton::new(flows::SHARE_PHONE_BUTTON)
                    .request(ButtonRequest::Contact);
                let keyboard = KeyboardMarkup::new(vec![vec![button]])
                    .one_time_keyboard()
                    .resize_keyboard();
                request.reply_markup(keyboard).await?;
            }
            ReplyKeyboard::Remove => {
                request.reply_markup(KeyboardRemove::new()).await?;
            }
        }
    }

    Ok(())
}

/// Split on the last whitespace or sentence end before the limit, counting
/// characters rather than bytes.
fn chunk_message(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= TELEGRAM_MAX_MESSAGE_LEN {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < chars.len() {
        let mut end = (start + TELEGRAM_MAX_MESSAGE_LEN).min(chars.len());

        if end < chars.len() {
            if let Some(split) = (start..end)
                .rev()
                .find(|&i| matches!(chars[i], '\n' | ' ' | '.' | '!' | '?'))
            {
                end = split + 1;
            }
        }

        chunks.push(chars[start..end].iter().collect::<String>());
        start = end;
    }

    chunks
}
