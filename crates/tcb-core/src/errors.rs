use std::time::Duration;

/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type so the router and
/// the broadcast scheduler can treat failures uniformly (reply vs log).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(String),

    #[error("external error: {0}")]
    External(String),

    #[error("index {index} out of range (have {len} entries)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("content store is empty")]
    EmptyStore,

    #[error("already running: {0}")]
    AlreadyRunning(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, Error>;
