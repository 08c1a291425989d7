pub mod commands;
pub mod flows;
pub mod handlers;

use std::sync::Arc;
use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::dptree;
use teloxide::prelude::*;

use crate::ai::{TextResponder, VisionResponder};
use crate::db::Store;
use crate::search::WebSearchRelay;

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Shared application state, accessible from all handlers.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub text_ai: Arc<dyn TextResponder>,
    pub vision_ai: Arc<dyn VisionResponder>,
    pub web_search: WebSearchRelay,
}

/// Build the teloxide update handler tree.
///
/// Branches are tried in order and the first match handles the update:
/// commands, shared contacts, plain text, then images.
pub fn build_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    let command_handler = Update::filter_message()
        .filter_command::<commands::BotCommand>()
        .endpoint(commands::handle_command);

    let contact_handler = Update::filter_message()
        .filter(|msg: Message| handlers::is_contact(&msg))
        .endpoint(handlers::handle_contact);

    // Unknown commands fall through to here and are dropped.
    let text_handler = Update::filter_message()
        .filter(|msg: Message| handlers::is_chat_text(&msg))
        .endpoint(handlers::handle_text);

    let image_handler = Update::filter_message()
        .filter_map(|msg: Message| handlers::incoming_image(&msg))
        .endpoint(handlers::handle_image);

    dptree::entry()
        .branch(command_handler)
        .branch(contact_handler)
        .branch(text_handler)
        .branch(image_handler)
}
