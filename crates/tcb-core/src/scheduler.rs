//! Broadcast scheduler: posts a random template to every destination chat on a
//! fixed interval.
//!
//! Lifecycle: warm-up delay, then `cycle → interval → cycle ...` until the
//! shutdown token fires. A failed cycle (empty store, panic) waits the shorter
//! retry delay instead; the loop itself never ends on a cycle failure.
//! Exactly one loop may run per scheduler; `start()` enforces it.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config, content::ContentStore, domain::ChatId, formatting::markdown_to_html,
    messaging::port::MessagingPort, Error, Result,
};

#[derive(Clone, Copy, Debug)]
pub struct BroadcastSettings {
    pub warmup: Duration,
    pub interval: Duration,
    pub retry_delay: Duration,
    /// Pause between two consecutive destination sends.
    pub send_delay: Duration,
    pub send_timeout: Duration,
}

impl BroadcastSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            warmup: cfg.auto_post_warmup,
            interval: cfg.auto_post_interval,
            retry_delay: cfg.auto_post_retry_delay,
            send_delay: cfg.auto_post_send_delay,
            send_timeout: cfg.send_timeout,
        }
    }
}

/// Outcome of one broadcast cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub delivered: Vec<ChatId>,
    pub failed: Vec<ChatId>,
    /// No destinations configured; nothing was sent.
    pub skipped: bool,
}

#[derive(Clone)]
pub struct BroadcastScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    settings: BroadcastSettings,
    destinations: Vec<ChatId>,
    store: Arc<ContentStore>,
    messenger: Arc<dyn MessagingPort>,
    started: AtomicBool,
    state: tokio::sync::Mutex<SchedulerState>,
}

#[derive(Default)]
struct SchedulerState {
    last_completed: Option<DateTime<Utc>>,
    cycles_completed: u64,
}

impl BroadcastScheduler {
    pub fn new(
        settings: BroadcastSettings,
        destinations: Vec<ChatId>,
        store: Arc<ContentStore>,
        messenger: Arc<dyn MessagingPort>,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                settings,
                destinations,
                store,
                messenger,
                started: AtomicBool::new(false),
                state: tokio::sync::Mutex::new(SchedulerState::default()),
            }),
        }
    }

    /// Spawn the broadcast loop. A second call fails with `AlreadyRunning`.
    pub fn start(&self, cancel: CancellationToken) -> Result<JoinHandle<()>> {
        if self
            .inner
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::AlreadyRunning(
                "broadcast scheduler already started".to_string(),
            ));
        }

        tracing::info!(
            destinations = self.inner.destinations.len(),
            interval_secs = self.inner.settings.interval.as_secs(),
            "broadcast scheduler started"
        );
        let scheduler = self.clone();
        Ok(tokio::spawn(async move { scheduler.run_loop(cancel).await }))
    }

    pub fn interval(&self) -> Duration {
        self.inner.settings.interval
    }

    pub async fn last_completed(&self) -> Option<DateTime<Utc>> {
        self.inner.state.lock().await.last_completed
    }

    pub async fn cycles_completed(&self) -> u64 {
        self.inner.state.lock().await.cycles_completed
    }

    async fn run_loop(self, cancel: CancellationToken) {
        if !sleep_or_cancel(&cancel, self.inner.settings.warmup).await {
            return;
        }

        loop {
            // Run the cycle on its own task so a panic is contained to that cycle.
            let scheduler = self.clone();
            let outcome = tokio::spawn(async move { scheduler.run_cycle().await }).await;

            let wait = match outcome {
                Ok(Ok(report)) => {
                    if !report.skipped {
                        tracing::info!(
                            delivered = report.delivered.len(),
                            failed = report.failed.len(),
                            "broadcast cycle completed"
                        );
                    }
                    self.inner.settings.interval
                }
                Ok(Err(e)) => {
                    tracing::error!("broadcast cycle failed: {e}");
                    self.inner.settings.retry_delay
                }
                Err(e) => {
                    tracing::error!("broadcast cycle aborted: {e}");
                    self.inner.settings.retry_delay
                }
            };

            if !sleep_or_cancel(&cancel, wait).await {
                break;
            }
        }

        tracing::info!("broadcast scheduler stopped");
    }

    /// One broadcast: pick a template and send it to every destination in order.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let template = self.inner.store.pick_random().await?;

        if self.inner.destinations.is_empty() {
            tracing::warn!("no group chat ids configured (GROUP_CHAT_IDS); skipping broadcast");
            return Ok(CycleReport {
                skipped: true,
                ..CycleReport::default()
            });
        }

        let html = markdown_to_html(&template);
        let settings = self.inner.settings;
        let mut report = CycleReport::default();

        for (i, chat_id) in self.inner.destinations.iter().copied().enumerate() {
            if i > 0 && !settings.send_delay.is_zero() {
                sleep(settings.send_delay).await;
            }

            let sent = match timeout(
                settings.send_timeout,
                self.inner.messenger.send_html(chat_id, &html),
            )
            .await
            {
                Ok(res) => res,
                Err(_) => Err(Error::Timeout(settings.send_timeout)),
            };

            match sent {
                Ok(_) => {
                    tracing::info!(chat_id = chat_id.0, "auto-posted to group");
                    report.delivered.push(chat_id);
                }
                Err(e) => {
                    tracing::error!(chat_id = chat_id.0, "error auto-posting to group: {e}");
                    report.failed.push(chat_id);
                }
            }
        }

        let mut st = self.inner.state.lock().await;
        st.last_completed = Some(Utc::now());
        st.cycles_completed += 1;

        Ok(report)
    }
}

/// Sleep for `dur` unless shutdown is requested first. Returns `false` on shutdown.
async fn sleep_or_cancel(cancel: &CancellationToken, dur: Duration) -> bool {
    tokio::select! {
      _ = cancel.cancelled() => false,
      _ = sleep(dur) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeMessenger, Sent};

    const A: ChatId = ChatId(-100);
    const B: ChatId = ChatId(-200);

    fn settings() -> BroadcastSettings {
        BroadcastSettings {
            warmup: Duration::ZERO,
            interval: Duration::from_millis(1),
            retry_delay: Duration::from_millis(1),
            send_delay: Duration::ZERO,
            send_timeout: Duration::from_secs(5),
        }
    }

    fn scheduler(
        destinations: Vec<ChatId>,
        templates: &[&str],
        messenger: Arc<FakeMessenger>,
    ) -> (BroadcastScheduler, Arc<ContentStore>) {
        let store = Arc::new(ContentStore::with_templates(
            templates.iter().map(|s| s.to_string()).collect(),
        ));
        let s = BroadcastScheduler::new(settings(), destinations, store.clone(), messenger);
        (s, store)
    }

    fn html_sends(m: &FakeMessenger) -> Vec<(ChatId, String)> {
        m.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Html { chat_id, html } => Some((chat_id, html)),
                _ => None,
            })
            .collect()
    }

    async fn wait_for_sends(m: &FakeMessenger, n: usize) {
        for _ in 0..2000 {
            if html_sends(m).len() >= n {
                return;
            }
            sleep(Duration::from_millis(1)).await;
        }
        panic!("expected at least {n} sends, got {}", html_sends(m).len());
    }

    #[tokio::test]
    async fn ten_cycles_send_one_template_to_each_destination_in_order() {
        let messenger = Arc::new(FakeMessenger::new());
        let (s, _) = scheduler(vec![A, B], &["**first**", "second"], messenger.clone());
        let allowed = ["<b>first</b>".to_string(), "second".to_string()];

        for cycle in 0..10 {
            let report = s.run_cycle().await.unwrap();
            assert_eq!(report.delivered, vec![A, B]);
            assert!(report.failed.is_empty());

            let sends = html_sends(&messenger);
            assert_eq!(sends.len(), (cycle + 1) * 2);
            let (a, b) = (&sends[cycle * 2], &sends[cycle * 2 + 1]);
            assert_eq!(a.0, A);
            assert_eq!(b.0, B);
            assert_eq!(a.1, b.1, "both destinations get the same template");
            assert!(allowed.contains(&a.1));
        }
        assert_eq!(s.cycles_completed().await, 10);
        assert!(s.last_completed().await.is_some());
    }

    #[tokio::test]
    async fn failed_destination_does_not_stop_the_cycle() {
        let messenger = Arc::new(FakeMessenger::new());
        messenger.fail_chat(A);
        let (s, _) = scheduler(vec![A, B], &["hello"], messenger.clone());

        let report = s.run_cycle().await.unwrap();
        assert_eq!(report.failed, vec![A]);
        assert_eq!(report.delivered, vec![B]);
        assert_eq!(html_sends(&messenger), vec![(B, "hello".to_string())]);
    }

    #[tokio::test]
    async fn timed_out_destination_does_not_stop_the_cycle() {
        let messenger = Arc::new(FakeMessenger::new());
        messenger.hang_chat(A);
        let store = Arc::new(ContentStore::with_templates(vec!["hello".to_string()]));
        let s = BroadcastScheduler::new(
            BroadcastSettings {
                send_timeout: Duration::from_millis(10),
                ..settings()
            },
            vec![A, B],
            store,
            messenger.clone(),
        );

        let report = timeout(Duration::from_secs(5), s.run_cycle())
            .await
            .expect("cycle must be bounded by the send timeout")
            .unwrap();
        assert_eq!(report.failed, vec![A]);
        assert_eq!(report.delivered, vec![B]);
        assert_eq!(html_sends(&messenger), vec![(B, "hello".to_string())]);
    }

    #[tokio::test]
    async fn empty_registry_skips_without_sending() {
        let messenger = Arc::new(FakeMessenger::new());
        let (s, _) = scheduler(vec![], &["hello"], messenger.clone());

        let report = s.run_cycle().await.unwrap();
        assert!(report.skipped);
        assert!(messenger.sent().is_empty());
        assert!(s.last_completed().await.is_none());
    }

    #[tokio::test]
    async fn empty_store_is_a_cycle_error() {
        let messenger = Arc::new(FakeMessenger::new());
        let (s, _) = scheduler(vec![A], &[], messenger.clone());
        assert!(matches!(s.run_cycle().await, Err(Error::EmptyStore)));
        assert!(messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn start_is_allowed_only_once() {
        let messenger = Arc::new(FakeMessenger::new());
        let (s, _) = scheduler(vec![A], &["x"], messenger);
        let cancel = CancellationToken::new();

        let handle = s.start(cancel.clone()).unwrap();
        assert!(matches!(
            s.clone().start(cancel.clone()),
            Err(Error::AlreadyRunning(_))
        ));

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn loop_keeps_posting_and_stops_on_cancel() {
        let messenger = Arc::new(FakeMessenger::new());
        let (s, _) = scheduler(vec![A, B], &["x"], messenger.clone());
        let cancel = CancellationToken::new();

        let handle = s.start(cancel.clone()).unwrap();
        wait_for_sends(&messenger, 6).await;
        cancel.cancel();
        timeout(Duration::from_secs(5), handle)
            .await
            .expect("loop exits promptly")
            .unwrap();
        assert!(s.cycles_completed().await >= 3);
    }

    #[tokio::test]
    async fn loop_survives_empty_store_and_recovers() {
        let messenger = Arc::new(FakeMessenger::new());
        let (s, store) = scheduler(vec![A], &[], messenger.clone());
        let cancel = CancellationToken::new();

        let handle = s.start(cancel.clone()).unwrap();
        sleep(Duration::from_millis(20)).await;
        assert!(html_sends(&messenger).is_empty());

        store.add("back").await;
        wait_for_sends(&messenger, 1).await;
        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn cancel_during_warmup_exits_without_posting() {
        let messenger = Arc::new(FakeMessenger::new());
        let store = Arc::new(ContentStore::with_templates(vec!["x".to_string()]));
        let s = BroadcastScheduler::new(
            BroadcastSettings {
                warmup: Duration::from_secs(3600),
                ..settings()
            },
            vec![A],
            store,
            messenger.clone(),
        );
        let cancel = CancellationToken::new();
        let handle = s.start(cancel.clone()).unwrap();
        cancel.cancel();
        timeout(Duration::from_secs(5), handle)
            .await
            .expect("warm-up is interruptible")
            .unwrap();
        assert!(messenger.sent().is_empty());
    }
}
