use std::sync::Arc;
use teloxide::macros::BotCommands;
use teloxide::prelude::*;
use teloxide::types::ChatAction;
use teloxide::utils::command::ParseError;

use crate::bot::handlers::send_reply;
use crate::bot::{flows, AppState, HandlerResult};

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum BotCommand {
    #[command(description = "Register and share your phone number")]
    Start,
    #[command(description = "Close the registration keyboard")]
    Cancel,
    #[command(description = "Search the web: /websearch <query>", parse_with = whole_query)]
    Websearch(String),
}

/// Everything after the command is the query, possibly empty, with runs of
/// whitespace collapsed to single spaces.
fn whole_query(input: String) -> Result<(String,), ParseError> {
    Ok((input.split_whitespace().collect::<Vec<_>>().join(" "),))
}

pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: BotCommand,
    state: Arc<AppState>,
) -> HandlerResult {
    let chat_id = msg.chat.id;

    let reply = match cmd {
        BotCommand::Start => {
            let Some(user) = msg.from.as_ref() else {
                return Ok(());
            };
            flows::start(
                &state,
                user.id.0 as i64,
                &user.first_name,
                user.username.as_deref(),
            )
            .await?
        }

        BotCommand::Cancel => flows::cancel(),

        BotCommand::Websearch(query) => {
            if !query.is_empty() {
                bot.send_chat_action(chat_id, ChatAction::Typing).await?;
            }
            flows::websearch(&state, chat_id.0, &query).await?
        }
    };

    send_reply(&bot, chat_id, reply).await?;
    Ok(())
}
