use std::{env, path::PathBuf, time::Duration};

use crate::{errors::Error, Result};

const DEFAULT_HEALTH_FILE: &str = "/tmp/bot_healthy";
const DEFAULT_INSTANCE_LOCK_FILE: &str = "/tmp/tcb.lock";

/// How updates reach the bot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateMode {
    Polling,
    Webhook,
}

impl UpdateMode {
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateMode::Polling => "polling",
            UpdateMode::Webhook => "webhook",
        }
    }
}

/// Typed configuration, loaded once at boot from the environment (and `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    pub admin_user_ids: Vec<i64>,
    pub group_chat_ids: Vec<i64>,
    pub bot_username: Option<String>,

    // Broadcast scheduler
    pub auto_post_enabled: bool,
    pub auto_post_interval: Duration,
    pub auto_post_warmup: Duration,
    pub auto_post_retry_delay: Duration,
    pub auto_post_send_delay: Duration,
    pub send_timeout: Duration,

    // Group interaction
    pub keyword_reply_probability: f64,
    pub activity_retention: Option<Duration>,

    // Update ingestion
    pub update_mode: UpdateMode,
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,

    // Hosting
    pub http_host: String,
    pub http_port: u16,
    pub health_file: PathBuf,
    pub instance_lock_file: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        // A missing .env is fine; real deployments set the environment directly.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (the process env in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN")
            .or_else(|| get("BOT_TOKEN_ENG"))
            .ok_or_else(|| {
                Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
            })?;

        let admin_user_ids = parse_csv_i64("ADMIN_USER_IDS", get("ADMIN_USER_IDS"))?;
        let group_chat_ids = parse_csv_i64("GROUP_CHAT_IDS", get("GROUP_CHAT_IDS"))?;
        let bot_username = get("BOT_USERNAME").map(|s| s.trim_start_matches('@').to_string());

        let auto_post_enabled = parse_bool("AUTO_POST_ENABLED", get("AUTO_POST_ENABLED"))?
            .unwrap_or(true);
        let auto_post_interval = secs("AUTO_POST_INTERVAL", get("AUTO_POST_INTERVAL"), 120)?;
        let auto_post_warmup = secs("AUTO_POST_WARMUP", get("AUTO_POST_WARMUP"), 60)?;
        let auto_post_retry_delay =
            secs("AUTO_POST_RETRY_DELAY", get("AUTO_POST_RETRY_DELAY"), 60)?;
        let auto_post_send_delay = Duration::from_millis(parse_num(
            "AUTO_POST_SEND_DELAY_MS",
            get("AUTO_POST_SEND_DELAY_MS"),
        )?
        .unwrap_or(1000));
        let send_timeout = secs("SEND_TIMEOUT", get("SEND_TIMEOUT"), 30)?;

        let keyword_reply_probability = match get("KEYWORD_REPLY_PROBABILITY") {
            None => 0.3,
            Some(raw) => {
                let p = raw.trim().parse::<f64>().map_err(|_| {
                    Error::Config(format!("KEYWORD_REPLY_PROBABILITY is not a number: {raw}"))
                })?;
                if !(0.0..=1.0).contains(&p) {
                    return Err(Error::Config(format!(
                        "KEYWORD_REPLY_PROBABILITY must be within 0..=1, got {p}"
                    )));
                }
                p
            }
        };
        let retention_days =
            parse_num::<u64>("ACTIVITY_RETENTION_DAYS", get("ACTIVITY_RETENTION_DAYS"))?;
        let activity_retention = match retention_days {
            None => None,
            Some(days) => {
                let secs = days.checked_mul(86_400).ok_or_else(|| {
                    Error::Config(format!("ACTIVITY_RETENTION_DAYS is too large: {days}"))
                })?;
                Some(Duration::from_secs(secs))
            }
        };

        let update_mode = match get("UPDATE_MODE").map(|s| s.trim().to_lowercase()) {
            None => UpdateMode::Polling,
            Some(m) if m == "polling" => UpdateMode::Polling,
            Some(m) if m == "webhook" => UpdateMode::Webhook,
            Some(other) => {
                return Err(Error::Config(format!(
                    "UPDATE_MODE must be 'polling' or 'webhook', got '{other}'"
                )))
            }
        };
        let webhook_url = get("WEBHOOK_URL");
        let webhook_secret = get("WEBHOOK_SECRET");
        if update_mode == UpdateMode::Webhook && webhook_url.is_none() {
            return Err(Error::Config(
                "WEBHOOK_URL is required when UPDATE_MODE=webhook".to_string(),
            ));
        }

        let http_host = get("HTTP_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let http_port = parse_num("PORT", get("PORT"))?.unwrap_or(8000);
        let health_file = PathBuf::from(
            get("HEALTH_FILE").unwrap_or_else(|| DEFAULT_HEALTH_FILE.to_string()),
        );
        // Explicitly empty disables the lock; unset falls back to the default path.
        let instance_lock_file = match lookup("INSTANCE_LOCK_FILE") {
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(PathBuf::from(v.trim())),
            None => Some(PathBuf::from(DEFAULT_INSTANCE_LOCK_FILE)),
        };

        Ok(Self {
            telegram_bot_token,
            admin_user_ids,
            group_chat_ids,
            bot_username,
            auto_post_enabled,
            auto_post_interval,
            auto_post_warmup,
            auto_post_retry_delay,
            auto_post_send_delay,
            send_timeout,
            keyword_reply_probability,
            activity_retention,
            update_mode,
            webhook_url,
            webhook_secret,
            http_host,
            http_port,
            health_file,
            instance_lock_file,
        })
    }

    /// Health marker path, readable even when the rest of the config is broken.
    pub fn health_file_from_env() -> PathBuf {
        env::var("HEALTH_FILE")
            .ok()
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_HEALTH_FILE))
    }
}

fn secs(key: &str, v: Option<String>, default: u64) -> Result<Duration> {
    Ok(Duration::from_secs(parse_num(key, v)?.unwrap_or(default)))
}

fn parse_num<T: std::str::FromStr>(key: &str, v: Option<String>) -> Result<Option<T>> {
    let Some(raw) = v else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| Error::Config(format!("{key} is not a valid number: {raw}")))
}

fn parse_bool(key: &str, v: Option<String>) -> Result<Option<bool>> {
    let Some(raw) = v else {
        return Ok(None);
    };
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(Error::Config(format!("{key} is not a boolean: {raw}"))),
    }
}

fn parse_csv_i64(key: &str, v: Option<String>) -> Result<Vec<i64>> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| Error::Config(format!("{key} contains a non-numeric id: {s}")))
        })
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
