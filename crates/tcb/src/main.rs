use std::sync::Arc;

use anyhow::Context;
use teloxide::prelude::*;
use tokio_util::sync::CancellationToken;

use tcb_core::{
    activity::{spawn_retention_sweeper, ActivityTracker},
    config::{Config, UpdateMode},
    content::ContentStore,
    domain::ChatId,
    health::{HealthMarker, HealthState},
    instance::InstanceLock,
    keywords::KeywordResponder,
    messaging::port::MessagingPort,
    router::Router,
    scheduler::{BroadcastScheduler, BroadcastSettings},
    security::AdminGate,
};
use tcb_http::HttpState;
use tcb_telegram::{
    is_invalid_token,
    router::{configure_webhook, run_polling, AppState, TelegramUpdateSink},
    TelegramMessenger,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tcb_core::logging::init("tcb")?;

    let cfg = match Config::load() {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            tracing::error!("{e}");
            HealthMarker::new(Config::health_file_from_env()).remove();
            return Err(e.into());
        }
    };

    // Before touching the marker: it may belong to the running instance.
    let _lock = cfg
        .instance_lock_file
        .as_ref()
        .map(InstanceLock::acquire)
        .transpose()?;

    let health = HealthMarker::new(cfg.health_file.clone());
    let res = run(cfg, &health).await;
    if let Err(e) = &res {
        tracing::error!("bot failed: {e:#}");
        health.remove();
    }
    res
}

async fn run(cfg: Arc<Config>, health: &HealthMarker) -> anyhow::Result<()> {
    health.set_quiet(HealthState::Starting);

    let bot = Bot::new(cfg.telegram_bot_token.clone());
    let me = match bot.get_me().await {
        Ok(me) => me,
        Err(e) if is_invalid_token(&e) => {
            anyhow::bail!("invalid bot token, check TELEGRAM_BOT_TOKEN: {e}")
        }
        Err(e) => return Err(e).context("getMe failed"),
    };
    let bot_username = cfg.bot_username.clone().or_else(|| me.user.username.clone());
    tracing::info!(username = ?bot_username, "tcb started");
    tracing::info!(
        admins = cfg.admin_user_ids.len(),
        groups = cfg.group_chat_ids.len(),
        mode = cfg.update_mode.as_str(),
        "configuration loaded"
    );

    // Shared state, built once.
    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let activity = Arc::new(ActivityTracker::new());
    let content = Arc::new(ContentStore::default());
    let scheduler = BroadcastScheduler::new(
        BroadcastSettings::from_config(&cfg),
        cfg.group_chat_ids.iter().copied().map(ChatId).collect(),
        content.clone(),
        messenger.clone(),
    );
    let router = Router::new(
        messenger,
        activity.clone(),
        content,
        AdminGate::new(&cfg.admin_user_ids),
        KeywordResponder::new(cfg.keyword_reply_probability),
        scheduler.clone(),
    )
    .with_bot_username(bot_username.clone());
    let state = Arc::new(AppState {
        router: Arc::new(router),
        bot_username,
    });

    // Fail startup, not just the server task, when the port is taken.
    let listener = tcb_http::bind(&cfg.http_host, cfg.http_port)
        .await
        .with_context(|| {
            format!("failed to bind http server on {}:{}", cfg.http_host, cfg.http_port)
        })?;

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel.clone()));

    let mut background = Vec::new();
    if cfg.auto_post_enabled {
        background.push(scheduler.start(cancel.clone())?);
    } else {
        tracing::info!("auto-posting disabled");
    }
    if let Some(max_age) = cfg.activity_retention {
        background.push(spawn_retention_sweeper(
            activity.clone(),
            max_age,
            cancel.clone(),
        ));
    }

    let mut http_state = HttpState::new(cfg.update_mode);
    if cfg.update_mode == UpdateMode::Webhook {
        let url = cfg
            .webhook_url
            .as_deref()
            .context("WEBHOOK_URL is required in webhook mode")?;
        configure_webhook(&bot, url, cfg.webhook_secret.as_deref()).await?;
        http_state = http_state.with_sink(
            Arc::new(TelegramUpdateSink::new(state.clone())),
            cfg.webhook_secret.clone(),
        );
    }

    let http = tokio::spawn(tcb_http::serve(
        listener,
        http_state.clone(),
        cancel.clone(),
    ));

    http_state.set_running(true);
    health.set_quiet(HealthState::Running);
    tracing::info!("bot is active");

    match cfg.update_mode {
        UpdateMode::Polling => {
            if let Err(e) = run_polling(bot, state, cancel.clone()).await {
                tracing::error!("polling stopped with error: {e:#}");
            }
        }
        UpdateMode::Webhook => cancel.cancelled().await,
    }

    tracing::info!("shutting down");
    cancel.cancel();
    health.set_quiet(HealthState::Stopping);
    http_state.set_running(false);

    join_background(background).await;
    match http.await {
        Ok(Err(e)) => tracing::error!("http server failed: {e}"),
        Err(e) => tracing::error!("http server task aborted: {e}"),
        Ok(Ok(())) => {}
    }

    Ok(())
}

async fn join_background(tasks: Vec<tokio::task::JoinHandle<()>>) {
    for task in tasks {
        if let Err(e) = task.await {
            tracing::error!("background task failed: {e}");
        }
    }
}

/// Ctrl-C or SIGTERM cancels `cancel`.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
      _ = ctrl_c => {},
      _ = terminate => {},
    }

    tracing::info!("received shutdown signal");
    cancel.cancel();
}
