//! Recording messenger shared by the unit tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{port::MessagingPort, types::InlineKeyboard},
    Result,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sent {
    Html {
        chat_id: ChatId,
        html: String,
    },
    Reply {
        chat_id: ChatId,
        reply_to: MessageId,
        html: String,
    },
    Menu {
        chat_id: ChatId,
        html: String,
        keyboard: InlineKeyboard,
    },
    Edit {
        msg: MessageRef,
        html: String,
        keyboard: InlineKeyboard,
    },
    Answer {
        callback_id: String,
    },
}

impl Sent {
    pub fn html(&self) -> &str {
        match self {
            Sent::Html { html, .. }
            | Sent::Reply { html, .. }
            | Sent::Menu { html, .. }
            | Sent::Edit { html, .. } => html,
            Sent::Answer { .. } => "",
        }
    }
}

#[derive(Default)]
pub struct FakeMessenger {
    next_id: Mutex<i32>,
    sent: Mutex<Vec<Sent>>,
    failing_chats: Mutex<HashSet<i64>>,
    hanging_chats: Mutex<HashSet<i64>>,
    fail_menus: Mutex<bool>,
}

impl FakeMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_chat(&self, chat_id: ChatId) {
        self.failing_chats.lock().unwrap().insert(chat_id.0);
    }

    /// Sends to `chat_id` never complete.
    pub fn hang_chat(&self, chat_id: ChatId) {
        self.hanging_chats.lock().unwrap().insert(chat_id.0);
    }

    pub fn fail_menus(&self) {
        *self.fail_menus.lock().unwrap() = true;
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Everything except callback answers.
    pub fn messages(&self) -> Vec<Sent> {
        self.sent()
            .into_iter()
            .filter(|s| !matches!(s, Sent::Answer { .. }))
            .collect()
    }

    fn check(&self, chat_id: ChatId) -> Result<MessageRef> {
        if self.failing_chats.lock().unwrap().contains(&chat_id.0) {
            return Err(Error::External(format!("chat {chat_id} unreachable")));
        }
        let mut guard = self.next_id.lock().unwrap();
        *guard += 1;
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(*guard),
        })
    }

    fn push(&self, s: Sent) {
        self.sent.lock().unwrap().push(s);
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        let hangs = self.hanging_chats.lock().unwrap().contains(&chat_id.0);
        if hangs {
            std::future::pending::<()>().await;
        }
        let msg = self.check(chat_id)?;
        self.push(Sent::Html {
            chat_id,
            html: html.to_string(),
        });
        Ok(msg)
    }

    async fn reply_html(
        &self,
        chat_id: ChatId,
        reply_to: MessageId,
        html: &str,
    ) -> Result<MessageRef> {
        let msg = self.check(chat_id)?;
        self.push(Sent::Reply {
            chat_id,
            reply_to,
            html: html.to_string(),
        });
        Ok(msg)
    }

    async fn send_menu(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        if *self.fail_menus.lock().unwrap() {
            return Err(Error::External("menu rejected".to_string()));
        }
        let msg = self.check(chat_id)?;
        self.push(Sent::Menu {
            chat_id,
            html: html.to_string(),
            keyboard,
        });
        Ok(msg)
    }

    async fn edit_menu(&self, msg: MessageRef, html: &str, keyboard: InlineKeyboard) -> Result<()> {
        self.check(msg.chat_id)?;
        self.push(Sent::Edit {
            msg,
            html: html.to_string(),
            keyboard,
        });
        Ok(())
    }

    async fn answer_callback_query(&self, callback_id: &str, _text: Option<&str>) -> Result<()> {
        self.push(Sent::Answer {
            callback_id: callback_id.to_string(),
        });
        Ok(())
    }
}
