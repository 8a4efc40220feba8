//! Inbound event router: commands, menu callbacks, membership changes and
//! group chatter.
//!
//! The router never fails: every outbound error is logged and the event is
//! considered handled.

use std::sync::Arc;

use crate::{
    activity::{ActivityKind, ActivityTracker},
    content::ContentStore,
    domain::{ChatId, MessageId},
    errors::Error,
    formatting::{markdown_to_html, truncate_chars},
    keywords::KeywordResponder,
    membership::{classify, TransitionKind},
    menu,
    messaging::{
        port::MessagingPort,
        types::{
            CallbackQuery, ChatKind, Command, InboundEvent, MembershipUpdate, Sender, TextMessage,
        },
    },
    scheduler::BroadcastScheduler,
    security::{AdminGate, PERMISSION_DENIED},
};

/// Preview length for `/listposts` and `/removepost` confirmations.
const PREVIEW_CHARS: usize = 100;
/// Below Telegram's 4096-character message cap.
const MESSAGE_LIMIT: usize = 4000;

const ADDPOST_USAGE: &str = "📝 **Usage:** /addpost <message>\n\n\
**Example:** /addpost 🚀 New TrustCoin update! Check out our latest features!";
const REMOVEPOST_USAGE: &str =
    "📝 **Usage:** /removepost <index>\n\nUse /listposts to see all posts with their indices.";
const INVALID_INDEX: &str = "❌ Invalid index. Use /listposts to see available posts.";
const NO_POSTS: &str = "📝 No auto posts configured.";

pub struct Router {
    messenger: Arc<dyn MessagingPort>,
    activity: Arc<ActivityTracker>,
    content: Arc<ContentStore>,
    admins: AdminGate,
    keywords: KeywordResponder,
    scheduler: BroadcastScheduler,
    bot_username: Option<String>,
}

impl Router {
    pub fn new(
        messenger: Arc<dyn MessagingPort>,
        activity: Arc<ActivityTracker>,
        content: Arc<ContentStore>,
        admins: AdminGate,
        keywords: KeywordResponder,
        scheduler: BroadcastScheduler,
    ) -> Self {
        Self {
            messenger,
            activity,
            content,
            admins,
            keywords,
            scheduler,
            bot_username: None,
        }
    }

    /// Username used to detect `@mentions` in group text.
    pub fn with_bot_username(mut self, username: Option<String>) -> Self {
        self.bot_username = username
            .map(|u| u.trim_start_matches('@').to_string())
            .filter(|u| !u.is_empty());
        self
    }

    pub async fn handle(&self, event: InboundEvent) {
        match event {
            InboundEvent::Command(cmd) => self.handle_command(cmd).await,
            InboundEvent::Callback(q) => self.handle_callback(q).await,
            InboundEvent::Membership(update) => self.handle_membership(update).await,
            InboundEvent::Text(msg) => self.handle_text(msg).await,
        }
    }

    // ============== Commands ==============

    async fn handle_command(&self, cmd: Command) {
        tracing::info!(
            chat_id = cmd.chat_id.0,
            user_id = cmd.from.user_id.0,
            command = %cmd.name,
            "command received"
        );

        match cmd.name.as_str() {
            "start" | "menu" => self.cmd_start(&cmd).await,
            "stats" | "addpost" | "listposts" | "removepost" => {
                if !self.admins.is_admin(cmd.from.user_id) {
                    tracing::warn!(
                        user_id = cmd.from.user_id.0,
                        command = %cmd.name,
                        "admin command denied"
                    );
                    self.send(cmd.chat_id, PERMISSION_DENIED).await;
                    return;
                }
                match cmd.name.as_str() {
                    "stats" => self.cmd_stats(&cmd).await,
                    "addpost" => self.cmd_addpost(&cmd).await,
                    "listposts" => self.cmd_listposts(&cmd).await,
                    _ => self.cmd_removepost(&cmd).await,
                }
            }
            other => tracing::debug!(command = other, "ignoring unknown command"),
        }
    }

    async fn cmd_start(&self, cmd: &Command) {
        self.track(&cmd.from, ActivityKind::StartCommand).await;

        let html = markdown_to_html(menu::START_TEXT);
        if let Err(e) = self
            .messenger
            .send_menu(cmd.chat_id, &html, menu::main_menu())
            .await
        {
            tracing::error!(chat_id = cmd.chat_id.0, "failed to send start menu: {e}");
            if let Err(e) = self
                .messenger
                .send_html(cmd.chat_id, menu::START_FALLBACK)
                .await
            {
                tracing::error!(chat_id = cmd.chat_id.0, "failed to send fallback welcome: {e}");
            }
        }
    }

    async fn cmd_stats(&self, cmd: &Command) {
        let snap = self.activity.snapshot().await;
        let posts = self.content.len().await;
        let last = match self.scheduler.last_completed().await {
            Some(t) => t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            None => "never".to_string(),
        };

        let text = format!(
            "📊 **Bot Statistics**\n\n\
             👥 **Total Users Tracked:** {}\n\
             🟢 **Active Users (24h):** {}\n\
             💬 **Total Messages:** {}\n\
             📝 **Auto Posts Available:** {}\n\
             ⏰ **Auto Post Interval:** {} seconds\n\
             📢 **Last Auto Post:** {}\n\
             🔧 **Admin Users:** {}",
            snap.total_users,
            snap.active_24h,
            snap.total_messages,
            posts,
            self.scheduler.interval().as_secs(),
            last,
            self.admins.len(),
        );
        self.send(cmd.chat_id, &text).await;
    }

    async fn cmd_addpost(&self, cmd: &Command) {
        let post = cmd.args.trim();
        if post.is_empty() {
            self.send(cmd.chat_id, ADDPOST_USAGE).await;
            return;
        }

        let total = self.content.add(post).await;
        tracing::info!(user_id = cmd.from.user_id.0, total, "auto post added");
        let text = format!(
            "✅ **Auto post added successfully!**\n\n📝 **Post:** {post}\n📊 **Total posts:** {total}"
        );
        self.send(cmd.chat_id, &text).await;
    }

    async fn cmd_listposts(&self, cmd: &Command) {
        let previews = self.content.list_preview(PREVIEW_CHARS).await;
        if previews.is_empty() {
            self.send(cmd.chat_id, NO_POSTS).await;
            return;
        }

        let entries: Vec<String> = previews
            .iter()
            .enumerate()
            .map(|(i, p)| markdown_to_html(&format!("**{}.** {p}", i + 1)))
            .collect();
        let header = markdown_to_html("📝 **Auto Posts:**");

        for chunk in chunk_entries(&header, &entries, MESSAGE_LIMIT) {
            if let Err(e) = self.messenger.send_html(cmd.chat_id, &chunk).await {
                tracing::error!(chat_id = cmd.chat_id.0, "failed to send post list: {e}");
                return;
            }
        }
    }

    async fn cmd_removepost(&self, cmd: &Command) {
        let Some(index) = parse_index(&cmd.args) else {
            self.send(cmd.chat_id, REMOVEPOST_USAGE).await;
            return;
        };

        match self.content.remove_at(index).await {
            Ok(removed) => {
                tracing::info!(user_id = cmd.from.user_id.0, index, "auto post removed");
                let text = format!(
                    "✅ **Post removed successfully!**\n\n📝 **Removed:** {}",
                    truncate_chars(&removed, PREVIEW_CHARS)
                );
                self.send(cmd.chat_id, &text).await;
            }
            Err(Error::IndexOutOfRange { .. }) => self.send(cmd.chat_id, INVALID_INDEX).await,
            Err(e) => tracing::error!("failed to remove auto post: {e}"),
        }
    }

    // ============== Callbacks ==============

    async fn handle_callback(&self, q: CallbackQuery) {
        if let Err(e) = self
            .messenger
            .answer_callback_query(&q.callback_id, None)
            .await
        {
            tracing::warn!("failed to answer callback query: {e}");
        }

        let Some(msg) = q.message else {
            tracing::debug!(data = %q.data, "callback without an accessible message");
            return;
        };

        let page = menu::page_for(&q.data);
        let html = markdown_to_html(&page.markdown);

        let res = if q.message_has_photo {
            self.messenger
                .send_menu(msg.chat_id, &html, page.keyboard)
                .await
                .map(|_| ())
        } else {
            self.messenger.edit_menu(msg, &html, page.keyboard).await
        };

        if let Err(e) = res {
            tracing::error!(
                chat_id = msg.chat_id.0,
                data = %q.data,
                "failed to show menu page: {e}"
            );
        }
    }

    // ============== Membership ==============

    async fn handle_membership(&self, update: MembershipUpdate) {
        let Some(transition) = classify(update.old, update.new) else {
            tracing::debug!(chat_id = update.chat_id.0, "no membership status change");
            return;
        };

        match transition.kind() {
            TransitionKind::Joined => {
                tracing::info!(
                    chat_id = update.chat_id.0,
                    user_id = update.member.user_id.0,
                    "new member joined"
                );
                let text = menu::welcome_text(
                    update.chat_title.as_deref(),
                    &update.member.first_name,
                );
                self.send(update.chat_id, &text).await;
            }
            TransitionKind::Left => {
                let tracked = self
                    .activity
                    .record_if_present(
                        update.member.user_id,
                        update.member.username.as_deref(),
                        ActivityKind::LeftGroup,
                    )
                    .await;
                tracing::info!(
                    chat_id = update.chat_id.0,
                    user_id = update.member.user_id.0,
                    tracked,
                    "member left"
                );
            }
            TransitionKind::Unchanged => {}
        }
    }

    // ============== Group text ==============

    async fn handle_text(&self, msg: TextMessage) {
        if msg.chat_kind != ChatKind::Group {
            tracing::debug!(chat_id = msg.chat_id.0, "ignoring non-group text");
            return;
        }

        self.track(&msg.from, ActivityKind::Message).await;

        let replies = self
            .keywords
            .replies_for(&msg.text, self.bot_username.as_deref());
        for reply in replies {
            self.reply(msg.chat_id, msg.message_id, &reply).await;
        }
    }

    // ============== Helpers ==============

    async fn track(&self, from: &Sender, kind: ActivityKind) {
        self.activity
            .record(from.user_id, from.username.as_deref(), kind)
            .await;
    }

    /// Send Markdown text; failures are logged.
    async fn send(&self, chat_id: ChatId, markdown: &str) {
        if let Err(e) = self
            .messenger
            .send_html(chat_id, &markdown_to_html(markdown))
            .await
        {
            tracing::error!(chat_id = chat_id.0, "failed to send message: {e}");
        }
    }

    async fn reply(&self, chat_id: ChatId, reply_to: MessageId, markdown: &str) {
        if let Err(e) = self
            .messenger
            .reply_html(chat_id, reply_to, &markdown_to_html(markdown))
            .await
        {
            tracing::error!(chat_id = chat_id.0, "failed to reply: {e}");
        }
    }
}

/// `/removepost` argument: exactly one run of ASCII digits.
fn parse_index(args: &str) -> Option<usize> {
    let mut parts = args.split_whitespace();
    let first = parts.next()?;
    if parts.next().is_some() || !first.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Too large to be a position; out of range either way.
    Some(first.parse::<usize>().unwrap_or(usize::MAX))
}

/// Pack entries into messages of at most `limit` bytes, splitting only
/// between entries. The header opens the first message.
fn chunk_entries(header: &str, entries: &[String], limit: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = header.to_string();

    for entry in entries {
        let sep = if current.is_empty() { "" } else { "\n\n" };
        if !current.is_empty() && current.len() + sep.len() + entry.len() > limit {
            out.push(std::mem::take(&mut current));
            current.push_str(entry);
            continue;
        }
        current.push_str(sep);
        current.push_str(entry);
    }

    if !current.is_empty() {
        out.push(current);
    }
    out
}
