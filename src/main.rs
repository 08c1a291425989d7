use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing_subscriber::EnvFilter;

mod ai;
mod bot;
mod config;
mod db;
mod search;
#[cfg(test)]
mod testing;

use ai::gemini::GeminiClient;
use bot::commands::BotCommand;
use config::AppConfig;
use db::Database;
use search::{SerpApiClient, WebSearchRelay};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("🤖 Starting Gemini relay bot...");

    // Load config
    let config = AppConfig::from_env()?;
    tracing::info!(
        "Config loaded. Text model: {}, vision model: {}",
        config.gemini_text_model,
        config.gemini_vision_model
    );

    // The bot keeps running without a database; store calls then fail one by one.
    let db = Database::connect_lazy(&config.database_url);
    match db.ping().await {
        Ok(()) => {
            tracing::info!("Database connected.");
            match db.run_migrations().await {
                Ok(()) => tracing::info!("Migrations applied."),
                Err(e) => tracing::error!("Failed to apply migrations: {:#}", e),
            }
        }
        Err(e) => tracing::error!("Error connecting to database: {:#}", e),
    }
    let store: Arc<dyn db::Store> = Arc::new(db);

    // External services
    let gemini = Arc::new(GeminiClient::new(&config));
    let serpapi = Arc::new(SerpApiClient::new(&config));

    // Build shared application state
    let state = Arc::new(bot::AppState {
        store: store.clone(),
        text_ai: gemini.clone(),
        vision_ai: gemini,
        web_search: WebSearchRelay::new(serpapi, store),
    });

    // Create the Telegram bot
    let bot = Bot::new(&config.telegram_bot_token);

    if let Err(e) = bot.set_my_commands(BotCommand::bot_commands()).await {
        tracing::warn!("Could not register the command menu: {}", e);
    }

    // Build the dispatcher
    let handler = bot::build_handler();

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
