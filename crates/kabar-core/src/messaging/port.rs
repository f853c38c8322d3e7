use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::{ChatAction, Reply},
    Result,
};

/// Cross-messenger port.
///
/// Handlers produce a [`Reply`]; the adapter owns delivery details such as
/// parse modes and flood-control retries.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_reply(&self, chat_id: ChatId, reply: &Reply) -> Result<MessageRef>;

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()>;
}
