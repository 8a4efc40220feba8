use crate::domain::{ChatId, MessageId, MessageRef, UserId};
use crate::membership::MemberSide;

/// Messenger-agnostic inbound event, produced by the transport adapter.
#[derive(Clone, Debug)]
pub enum InboundEvent {
    Command(Command),
    Callback(CallbackQuery),
    Membership(MembershipUpdate),
    Text(TextMessage),
}

/// Who produced an event.
#[derive(Clone, Debug)]
pub struct Sender {
    pub user_id: UserId,
    pub username: Option<String>,
    pub first_name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Channel,
}

#[derive(Clone, Debug)]
pub struct Command {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub from: Sender,
    /// Lowercased command name without the leading `/` or `@botname` suffix.
    pub name: String,
    /// Raw argument text after the command name (trimmed).
    pub args: String,
}

#[derive(Clone, Debug)]
pub struct TextMessage {
    pub chat_id: ChatId,
    pub chat_kind: ChatKind,
    pub message_id: MessageId,
    pub from: Sender,
    pub text: String,
}

#[derive(Clone, Debug)]
pub struct CallbackQuery {
    pub callback_id: String,
    pub from: Sender,
    pub data: String,
    /// Message the pressed keyboard is attached to, if still accessible.
    pub message: Option<MessageRef>,
    /// Photo messages cannot have their text edited; answer with a new message instead.
    pub message_has_photo: bool,
}

#[derive(Clone, Debug)]
pub struct MembershipUpdate {
    pub chat_id: ChatId,
    pub chat_title: Option<String>,
    pub member: Sender,
    pub old: MemberSide,
    pub new: MemberSide,
}

/// Inline keyboard, one row per entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub action: ButtonAction,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ButtonAction {
    Callback(String),
    Url(String),
}

impl InlineButton {
    pub fn callback(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Callback(data.into()),
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Url(url.into()),
        }
    }
}

impl InlineKeyboard {
    /// "One button per row" layout, the only layout the menus use.
    pub fn one_per_row(buttons: Vec<InlineButton>) -> Self {
        Self {
            rows: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }

    pub fn callback_data(&self) -> Vec<&str> {
        self.rows
            .iter()
            .flatten()
            .filter_map(|b| match &b.action {
                ButtonAction::Callback(d) => Some(d.as_str()),
                ButtonAction::Url(_) => None,
            })
            .collect()
    }
}
