use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    messaging::types::InlineKeyboard,
    Result,
};

/// Outbound messaging port.
///
/// Telegram is the only implementation; the router, the welcome flow and the
/// broadcast scheduler only ever talk to this trait so they can be exercised
/// with a recording fake.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;

    /// Send `html` threaded as a reply to `reply_to`.
    async fn reply_html(&self, chat_id: ChatId, reply_to: MessageId, html: &str)
        -> Result<MessageRef>;

    async fn send_menu(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef>;

    /// Replace text and keyboard of an existing message.
    async fn edit_menu(&self, msg: MessageRef, html: &str, keyboard: InlineKeyboard) -> Result<()>;

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}
