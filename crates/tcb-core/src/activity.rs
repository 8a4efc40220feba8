//! Per-user engagement tracking for `/stats`.
//!
//! All state lives in memory behind one lock; a record is created on the
//! first observation of a user and only goes away through the optional
//! retention sweep.

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::domain::UserId;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActivityKind {
    Message,
    StartCommand,
    LeftGroup,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserActivityRecord {
    pub user_id: UserId,
    pub username: Option<String>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub message_count: u64,
    pub kinds: BTreeSet<ActivityKind>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActivitySnapshot {
    pub total_users: usize,
    pub active_24h: usize,
    pub total_messages: u64,
}

#[derive(Default)]
pub struct ActivityTracker {
    users: Mutex<HashMap<UserId, UserActivityRecord>>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, user_id: UserId, username: Option<&str>, kind: ActivityKind) {
        self.record_at(user_id, username, kind, Utc::now()).await;
    }

    pub async fn record_at(
        &self,
        user_id: UserId,
        username: Option<&str>,
        kind: ActivityKind,
        now: DateTime<Utc>,
    ) {
        let mut users = self.users.lock().await;
        let rec = users.entry(user_id).or_insert_with(|| UserActivityRecord {
            user_id,
            username: None,
            first_seen: now,
            last_seen: now,
            message_count: 0,
            kinds: BTreeSet::new(),
        });
        touch(rec, username, kind, now);
    }

    /// Like `record`, but never creates a record. Returns whether one existed.
    pub async fn record_if_present(
        &self,
        user_id: UserId,
        username: Option<&str>,
        kind: ActivityKind,
    ) -> bool {
        let mut users = self.users.lock().await;
        let Some(rec) = users.get_mut(&user_id) else {
            return false;
        };
        touch(rec, username, kind, Utc::now());
        true
    }

    pub async fn get(&self, user_id: UserId) -> Option<UserActivityRecord> {
        self.users.lock().await.get(&user_id).cloned()
    }

    pub async fn snapshot(&self) -> ActivitySnapshot {
        self.snapshot_at(Utc::now()).await
    }

    pub async fn snapshot_at(&self, now: DateTime<Utc>) -> ActivitySnapshot {
        let users = self.users.lock().await;
        let day = chrono::Duration::hours(24);
        ActivitySnapshot {
            total_users: users.len(),
            active_24h: users
                .values()
                .filter(|r| now.signed_duration_since(r.last_seen) <= day)
                .count(),
            total_messages: users.values().map(|r| r.message_count).sum(),
        }
    }

    /// Drop records whose last activity is older than `max_age`. Returns how many went.
    pub async fn evict_stale_at(&self, now: DateTime<Utc>, max_age: Duration) -> usize {
        let Ok(max_age) = chrono::Duration::from_std(max_age) else {
            return 0;
        };
        let mut users = self.users.lock().await;
        let before = users.len();
        users.retain(|_, r| now.signed_duration_since(r.last_seen) <= max_age);
        before - users.len()
    }
}

fn touch(
    rec: &mut UserActivityRecord,
    username: Option<&str>,
    kind: ActivityKind,
    now: DateTime<Utc>,
) {
    // Clock steps backwards must not break first_seen <= last_seen.
    if now > rec.last_seen {
        rec.last_seen = now;
    }
    if let Some(name) = username {
        rec.username = Some(name.to_string());
    }
    if kind == ActivityKind::Message {
        rec.message_count += 1;
    }
    rec.kinds.insert(kind);
}

/// Periodically evict stale records until `cancel` fires.
pub fn spawn_retention_sweeper(
    tracker: Arc<ActivityTracker>,
    retention: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            tokio::select! {
              _ = cancel.cancelled() => break,
              _ = tick.tick() => {
                let evicted = tracker.evict_stale_at(Utc::now(), retention).await;
                if evicted > 0 {
                    tracing::info!(evicted, "evicted stale activity records");
                }
              }
            }
        }
    })
}
