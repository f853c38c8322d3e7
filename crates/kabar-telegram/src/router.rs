use std::sync::Arc;

use teloxide::{
    dispatching::Dispatcher, dptree, error_handlers::LoggingErrorHandler, prelude::*,
    types::BotCommand, update_listeners::Polling,
};
use tracing::{info, warn};

use kabar_core::{assistant::Assistant, config::Config, messaging::port::MessagingPort};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<Assistant>,
    pub messenger: Arc<dyn MessagingPort>,
}

/// Command menu shown by Telegram clients.
pub fn bot_commands(news_source: &str) -> Vec<BotCommand> {
    vec![
        BotCommand::new("berita", format!("Berita terbaru dari {news_source}")),
        BotCommand::new("cuaca", "Cek cuaca: /cuaca [kota]"),
        BotCommand::new("help", "Daftar perintah"),
        BotCommand::new("start", "Mulai percakapan"),
    ]
}

pub async fn run_polling(cfg: Arc<Config>, assistant: Arc<Assistant>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => info!(username = %me.username(), "bot started"),
        Err(e) => warn!(error = %e, "getMe failed; continuing"),
    }
    if let Err(e) = bot.set_my_commands(bot_commands(&cfg.news_source_name)).await {
        warn!(error = %e, "failed to register command menu");
    }

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let state = Arc::new(AppState {
        assistant,
        messenger,
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    let listener = Polling::builder(bot.clone())
        .drop_pending_updates()
        .build();

    // One distribution key for every update: handled strictly one at a time.
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .distribution_function(|_| Some(()))
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    info!("dispatcher stopped");
    Ok(())
}
