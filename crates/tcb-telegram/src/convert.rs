//! teloxide update → core `InboundEvent`.
//!
//! Updates the core has no use for (edits, channel posts, messages without a
//! sender, non-text messages) convert to `None`.

use teloxide::types::{
    CallbackQuery as TgCallbackQuery, ChatMemberKind, ChatMemberUpdated, Message, Update,
    UpdateKind, User,
};

use tcb_core::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    membership::{MemberSide, MemberStatus},
    messaging::types::{
        CallbackQuery, ChatKind, Command, InboundEvent, MembershipUpdate, Sender, TextMessage,
    },
};

pub fn from_update(update: &Update, bot_username: Option<&str>) -> Option<InboundEvent> {
    match &update.kind {
        UpdateKind::Message(msg) => from_message(msg, bot_username),
        UpdateKind::CallbackQuery(q) => from_callback(q),
        UpdateKind::ChatMember(m) => Some(from_chat_member(m)),
        _ => None,
    }
}

pub fn from_message(msg: &Message, bot_username: Option<&str>) -> Option<InboundEvent> {
    let user = msg.from()?;
    let text = msg.text()?;
    let chat_id = ChatId(msg.chat.id.0);
    let message_id = MessageId(msg.id.0);

    if text.starts_with('/') {
        let (name, target, args) = parse_command(text);
        // `/cmd@OtherBot` in a group is addressed to someone else.
        if let (Some(target), Some(me)) = (target.as_deref(), bot_username) {
            if !target.eq_ignore_ascii_case(me.trim_start_matches('@')) {
                return None;
            }
        }
        if name.is_empty() {
            return None;
        }
        return Some(InboundEvent::Command(Command {
            chat_id,
            message_id,
            from: sender(user),
            name,
            args,
        }));
    }

    let chat_kind = if msg.chat.is_group() || msg.chat.is_supergroup() {
        ChatKind::Group
    } else if msg.chat.is_channel() {
        ChatKind::Channel
    } else {
        ChatKind::Private
    };

    Some(InboundEvent::Text(TextMessage {
        chat_id,
        chat_kind,
        message_id,
        from: sender(user),
        text: text.to_string(),
    }))
}

pub fn from_callback(q: &TgCallbackQuery) -> Option<InboundEvent> {
    let data = q.data.clone()?;
    let message = q.message.as_ref();
    Some(InboundEvent::Callback(CallbackQuery {
        callback_id: q.id.clone(),
        from: sender(&q.from),
        data,
        message: message.map(|m| MessageRef {
            chat_id: ChatId(m.chat.id.0),
            message_id: MessageId(m.id.0),
        }),
        message_has_photo: message.and_then(|m| m.photo()).is_some(),
    }))
}

pub fn from_chat_member(m: &ChatMemberUpdated) -> InboundEvent {
    InboundEvent::Membership(MembershipUpdate {
        chat_id: ChatId(m.chat.id.0),
        chat_title: m.chat.title().map(str::to_string),
        member: sender(&m.new_chat_member.user),
        old: member_side(&m.old_chat_member.kind),
        new: member_side(&m.new_chat_member.kind),
    })
}

fn member_side(kind: &ChatMemberKind) -> MemberSide {
    match kind {
        ChatMemberKind::Owner(_) => MemberSide::new(MemberStatus::Owner),
        ChatMemberKind::Administrator(_) => MemberSide::new(MemberStatus::Administrator),
        ChatMemberKind::Member => MemberSide::new(MemberStatus::Member),
        ChatMemberKind::Restricted(r) => MemberSide::restricted(r.is_member),
        ChatMemberKind::Left => MemberSide::new(MemberStatus::Left),
        ChatMemberKind::Banned(_) => MemberSide::new(MemberStatus::Banned),
    }
}

fn sender(user: &User) -> Sender {
    Sender {
        user_id: UserId(user.id.0 as i64),
        username: user.username.clone(),
        first_name: user.first_name.clone(),
    }
}

/// Split `/cmd@botname arg1 ...` into (lowercased name, optional target bot, trimmed args).
fn parse_command(text: &str) -> (String, Option<String>, String) {
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let mut head = first.trim_start_matches('/').splitn(2, '@');
    let name = head.next().unwrap_or("").to_lowercase();
    let target = head.next().map(str::to_string).filter(|t| !t.is_empty());

    (name, target, rest)
}
