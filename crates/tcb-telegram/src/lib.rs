//! Telegram adapter (teloxide).
//!
//! This crate implements the `tcb-core` MessagingPort over the Telegram Bot
//! API, converts teloxide updates into core `InboundEvent`s and runs the
//! update loop (long polling or webhook).

use async_trait::async_trait;

use reqwest::Url;
use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode},
    ApiError, RequestError,
};

use tokio::time::sleep;

pub mod convert;
pub mod router;

use tcb_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{ButtonAction, InlineKeyboard},
    },
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn map_err(e: RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, RequestError>>,
        Fut::IntoFuture: Send,
    {
        self.with_retry_raw(op).await.map_err(Self::map_err)
    }

    /// Retry once on `RetryAfter`; other errors are returned untouched.
    async fn with_retry_raw<T, Fut>(
        &self,
        mut op: impl FnMut() -> Fut,
    ) -> std::result::Result<T, RequestError>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Err(RequestError::RetryAfter(d)) if attempts < MAX_RETRIES => {
                    attempts += 1;
                    tracing::warn!(retry_after = ?d, "telegram rate limit hit; retrying once");
                    sleep(d).await;
                }
                other => return other,
            }
        }
    }
}

/// Map a core keyboard to Telegram markup. Invalid URLs are rejected up front
/// rather than by the API.
pub fn to_markup(keyboard: &InlineKeyboard) -> Result<InlineKeyboardMarkup> {
    let mut rows = Vec::with_capacity(keyboard.rows.len());
    for row in &keyboard.rows {
        let mut out = Vec::with_capacity(row.len());
        for button in row {
            let b = match &button.action {
                ButtonAction::Callback(data) => {
                    InlineKeyboardButton::callback(button.label.clone(), data.clone())
                }
                ButtonAction::Url(url) => {
                    let url = Url::parse(url)
                        .map_err(|e| Error::External(format!("invalid button url {url}: {e}")))?;
                    InlineKeyboardButton::url(button.label.clone(), url)
                }
            };
            out.push(b);
        }
        rows.push(out);
    }
    Ok(InlineKeyboardMarkup::new(rows))
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), html.to_string())
                    .parse_mode(ParseMode::Html)
                    .disable_web_page_preview(true)
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn reply_html(
        &self,
        chat_id: ChatId,
        reply_to: MessageId,
        html: &str,
    ) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), html.to_string())
                    .parse_mode(ParseMode::Html)
                    .reply_to_message_id(Self::tg_msg_id(reply_to))
                    .allow_sending_without_reply(true)
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn send_menu(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        let markup = to_markup(&keyboard)?;
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), html.to_string())
                    .parse_mode(ParseMode::Html)
                    .reply_markup(markup.clone())
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn edit_menu(&self, msg: MessageRef, html: &str, keyboard: InlineKeyboard) -> Result<()> {
        let markup = to_markup(&keyboard)?;
        let res = self
            .with_retry_raw(|| {
                self.bot
                    .edit_message_text(
                        Self::tg_chat(msg.chat_id),
                        Self::tg_msg_id(msg.message_id),
                        html.to_string(),
                    )
                    .parse_mode(ParseMode::Html)
                    .reply_markup(markup.clone())
            })
            .await;

        match res {
            Ok(_) => Ok(()),
            // Pressing the button of the page already shown.
            Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
            Err(e) => Err(Self::map_err(e)),
        }
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.with_retry(|| {
            let mut req = self.bot.answer_callback_query(callback_id.to_string());
            if let Some(t) = text {
                req = req.text(t.to_string());
            }
            req
        })
        .await?;
        Ok(())
    }
}

/// True when the API rejected the bot token. teloxide reports the 401
/// "Unauthorized" of `getMe` as `ApiError::NotFound`.
pub fn is_invalid_token(e: &RequestError) -> bool {
    matches!(e, RequestError::Api(ApiError::NotFound))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tcb_core::messaging::types::InlineButton;

    #[test]
    fn markup_keeps_rows_and_kinds() {
        let kb = InlineKeyboard::one_per_row(vec![
            InlineButton::callback("Back", "back"),
            InlineButton::url("Site", "https://www.trust-coin.site"),
        ]);
        let markup = to_markup(&kb).unwrap();
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[0][0].text, "Back");
        assert_eq!(markup.inline_keyboard[1][0].text, "Site");
    }

    #[test]
    fn only_unauthorized_counts_as_invalid_token() {
        assert!(is_invalid_token(&RequestError::Api(ApiError::NotFound)));
        assert!(!is_invalid_token(&RequestError::Api(ApiError::BotBlocked)));
        assert!(!is_invalid_token(&RequestError::Api(ApiError::MessageNotModified)));
    }

    #[test]
    fn invalid_url_is_rejected() {
        let kb = InlineKeyboard::one_per_row(vec![InlineButton::url("Bad", "not a url")]);
        assert!(to_markup(&kb).is_err());
    }
}
