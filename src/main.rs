use std::env;
use std::sync::Arc;

use anyhow::Result;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dishbot::bot::{callback_handler, message_handler};
use dishbot::db::Database;
use dishbot::dialogue::SuggestState;
use dishbot::localization::init_localization;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting dish suggestion bot");

    init_localization()?;

    let bot_token = env::var("TELEGRAM_BOT_TOKEN").expect("TELEGRAM_BOT_TOKEN must be set");
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let mut db = Database::new();
    db.connect(&database_url).await?;
    db.init_schema().await?;
    let db = Arc::new(db);

    let bot = Bot::new(bot_token);

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .enter_dialogue::<Message, InMemStorage<SuggestState>, SuggestState>()
                .endpoint(message_handler),
        )
        .branch(Update::filter_callback_query().endpoint(callback_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![
            InMemStorage::<SuggestState>::new(),
            Arc::clone(&db)
        ])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
