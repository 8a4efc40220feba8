use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use teloxide::{
    dispatching::Dispatcher,
    dptree,
    error_handlers::LoggingErrorHandler,
    prelude::*,
    types::{AllowedUpdate, CallbackQuery, ChatMemberUpdated, Message},
    update_listeners::Polling,
};
use tokio_util::sync::CancellationToken;

use tcb_core::{errors::Error, ports::UpdateSink, router::Router};

use crate::convert;

/// Update kinds the bot reacts to. `chat_member` is opt-in on Telegram's side.
fn allowed_updates() -> Vec<AllowedUpdate> {
    vec![
        AllowedUpdate::Message,
        AllowedUpdate::CallbackQuery,
        AllowedUpdate::ChatMember,
    ]
}

#[derive(Clone)]
pub struct AppState {
    pub router: Arc<Router>,
    pub bot_username: Option<String>,
}

/// Long-poll until `cancel` fires.
pub async fn run_polling(
    bot: Bot,
    state: Arc<AppState>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    // A leftover webhook makes getUpdates fail with 409.
    if let Err(e) = bot.delete_webhook().await {
        tracing::warn!("failed to delete webhook before polling: {e}");
    }

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback))
        .branch(Update::filter_chat_member().endpoint(handle_chat_member));

    let listener = Polling::builder(bot.clone())
        .allowed_updates(allowed_updates())
        .drop_pending_updates()
        .build();

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            tracing::debug!(update_id = upd.id, "unhandled update");
        })
        .error_handler(LoggingErrorHandler::with_custom_text("dispatcher error"))
        .build();

    let shutdown = dispatcher.shutdown_token();
    tokio::spawn(async move {
        cancel.cancelled().await;
        match shutdown.shutdown() {
            Ok(done) => done.await,
            Err(e) => tracing::debug!("dispatcher was idle at shutdown: {e}"),
        }
    });

    tracing::info!("polling for updates");
    dispatcher
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("update listener error"),
        )
        .await;

    Ok(())
}

/// Register the webhook with Telegram; updates then arrive via `/webhook`.
pub async fn configure_webhook(bot: &Bot, url: &str, secret: Option<&str>) -> anyhow::Result<()> {
    let url = Url::parse(url)?;
    let mut req = bot
        .set_webhook(url.clone())
        .allowed_updates(allowed_updates())
        .drop_pending_updates(true);
    if let Some(secret) = secret {
        req = req.secret_token(secret.to_string());
    }
    req.await?;
    tracing::info!(%url, "webhook registered");
    Ok(())
}

async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if let Some(event) = convert::from_message(&msg, state.bot_username.as_deref()) {
        state.router.handle(event).await;
    }
    Ok(())
}

async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    if let Some(event) = convert::from_callback(&q) {
        state.router.handle(event).await;
    }
    Ok(())
}

async fn handle_chat_member(m: ChatMemberUpdated, state: Arc<AppState>) -> ResponseResult<()> {
    state.router.handle(convert::from_chat_member(&m)).await;
    Ok(())
}

/// Webhook ingestion: decode a raw update body and route it.
pub struct TelegramUpdateSink {
    state: Arc<AppState>,
}

impl TelegramUpdateSink {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl UpdateSink for TelegramUpdateSink {
    async fn accept(&self, payload: &[u8]) -> tcb_core::Result<()> {
        let update: Update =
            serde_json::from_slice(payload).map_err(|e| Error::Json(e.to_string()))?;
        match convert::from_update(&update, self.state.bot_username.as_deref()) {
            Some(event) => self.state.router.handle(event).await,
            None => tracing::debug!(update_id = update.id, "ignoring update"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use tcb_core::{
        activity::ActivityTracker,
        content::ContentStore,
        domain::{ChatId, MessageId, MessageRef},
        keywords::KeywordResponder,
        messaging::{port::MessagingPort, types::InlineKeyboard},
        scheduler::{BroadcastScheduler, BroadcastSettings},
        security::AdminGate,
    };

    use super::*;

    #[derive(Default)]
    struct CountingMessenger {
        sent: Mutex<Vec<String>>,
    }

    impl CountingMessenger {
        fn record(&self, chat_id: ChatId, html: &str) -> tcb_core::Result<MessageRef> {
            let mut sent = self.sent.lock().unwrap();
            sent.push(html.to_string());
            Ok(MessageRef {
                chat_id,
                message_id: MessageId(sent.len() as i32),
            })
        }
    }

    #[async_trait]
    impl MessagingPort for CountingMessenger {
        async fn send_html(&self, chat_id: ChatId, html: &str) -> tcb_core::Result<MessageRef> {
            self.record(chat_id, html)
        }

        async fn reply_html(
            &self,
            chat_id: ChatId,
            _reply_to: MessageId,
            html: &str,
        ) -> tcb_core::Result<MessageRef> {
            self.record(chat_id, html)
        }

        async fn send_menu(
            &self,
            chat_id: ChatId,
            html: &str,
            _keyboard: InlineKeyboard,
        ) -> tcb_core::Result<MessageRef> {
            self.record(chat_id, html)
        }

        async fn edit_menu(
            &self,
            msg: MessageRef,
            html: &str,
            _keyboard: InlineKeyboard,
        ) -> tcb_core::Result<()> {
            self.record(msg.chat_id, html).map(|_| ())
        }

        async fn answer_callback_query(
            &self,
            _callback_id: &str,
            _text: Option<&str>,
        ) -> tcb_core::Result<()> {
            Ok(())
        }
    }

    fn sink() -> (TelegramUpdateSink, Arc<CountingMessenger>) {
        let messenger = Arc::new(CountingMessenger::default());
        let content = Arc::new(ContentStore::default());
        let scheduler = BroadcastScheduler::new(
            BroadcastSettings {
                warmup: Duration::ZERO,
                interval: Duration::from_secs(120),
                retry_delay: Duration::from_secs(60),
                send_delay: Duration::ZERO,
                send_timeout: Duration::from_secs(5),
            },
            vec![],
            content.clone(),
            messenger.clone(),
        );
        let router = Router::new(
            messenger.clone(),
            Arc::new(ActivityTracker::new()),
            content,
            AdminGate::new(&[]),
            KeywordResponder::new(0.0),
            scheduler,
        );
        let state = Arc::new(AppState {
            router: Arc::new(router),
            bot_username: Some("TrustBot".to_string()),
        });
        (TelegramUpdateSink::new(state), messenger)
    }

    #[tokio::test]
    async fn garbage_payload_is_a_json_error() {
        let (sink, _) = sink();
        assert!(matches!(
            sink.accept(b"not json").await,
            Err(Error::Json(_))
        ));
    }

    #[tokio::test]
    async fn start_command_is_routed() {
        let (sink, messenger) = sink();
        let body = serde_json::json!({
            "update_id": 10,
            "message": {
                "message_id": 1,
                "date": 0,
                "chat": {"id": 5, "type": "private", "first_name": "Ana"},
                "from": {"id": 5, "is_bot": false, "first_name": "Ana"},
                "text": "/start",
            }
        });
        sink.accept(body.to_string().as_bytes()).await.unwrap();
        assert_eq!(messenger.sent.lock().unwrap().len(), 1);
    }
}
