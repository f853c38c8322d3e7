//! Telegram update handlers.
//!
//! Each message is converted to a messenger-neutral [`IncomingUpdate`],
//! answered by the core [`Assistant`](kabar_core::assistant::Assistant) and
//! delivered through the messaging port. Failures are logged, never returned
//! to the dispatcher.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};
use tracing::{error, warn};

use kabar_core::{
    domain::{ChatId, UserId},
    messaging::types::{ChatAction, IncomingUpdate},
};

use crate::router::AppState;

mod commands;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(update) = incoming_update(&msg) else {
        return Ok(());
    };
    let chat_id = update.chat_id();

    if let Err(e) = state
        .messenger
        .send_chat_action(chat_id, ChatAction::Typing)
        .await
    {
        warn!(chat_id = chat_id.0, error = %e, "typing indicator failed");
    }

    let Some(reply) = state.assistant.handle(&update).await else {
        return Ok(());
    };

    if let Err(e) = state.messenger.send_reply(chat_id, &reply).await {
        error!(chat_id = chat_id.0, error = %e, "failed to deliver reply");
    }
    Ok(())
}

fn incoming_update(msg: &Message) -> Option<IncomingUpdate> {
    let user = msg.from()?;
    let text = msg.text()?;
    commands::to_update(
        ChatId(msg.chat.id.0),
        UserId(user.id.0 as i64),
        user.username.clone(),
        text,
    )
}
