//! Minimal HTTP surface for the hosting platform: liveness, health and
//! webhook ingestion.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use tcb_core::{config::UpdateMode, errors::Error, ports::UpdateSink, Result};

pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

#[derive(Clone)]
pub struct HttpState {
    running: Arc<AtomicBool>,
    mode: UpdateMode,
    sink: Option<Arc<dyn UpdateSink>>,
    secret: Option<String>,
}

impl HttpState {
    pub fn new(mode: UpdateMode) -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            mode,
            sink: None,
            secret: None,
        }
    }

    /// Accept webhook updates. `secret`, when set, must match the
    /// `X-Telegram-Bot-Api-Secret-Token` header.
    pub fn with_sink(mut self, sink: Arc<dyn UpdateSink>, secret: Option<String>) -> Self {
        self.sink = Some(sink);
        self.secret = secret;
        self
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Serialize)]
struct HealthReport {
    status: &'static str,
    bot_running: bool,
    mode: &'static str,
}

pub fn app(state: HttpState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/webhook", post(webhook))
        .with_state(state)
}

/// Bind the listener up front so a taken port fails startup.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener> {
    let listener = TcpListener::bind((host, port)).await?;
    tracing::info!(addr = %listener.local_addr()?, "http server listening");
    Ok(listener)
}

/// Serve until `cancel` fires.
pub async fn serve(
    listener: TcpListener,
    state: HttpState,
    cancel: CancellationToken,
) -> Result<()> {
    axum::serve(listener, app(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    tracing::info!("http server stopped");
    Ok(())
}

async fn home(State(state): State<HttpState>) -> String {
    let status = if state.is_running() {
        "Active"
    } else {
        "Starting..."
    };
    format!("TrustCoin Bot is running! Status: {status}")
}

async fn health(State(state): State<HttpState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "healthy",
        bot_running: state.is_running(),
        mode: state.mode.as_str(),
    })
}

async fn webhook(
    State(state): State<HttpState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let sink = match (&state.sink, state.mode) {
        (Some(sink), UpdateMode::Webhook) => sink,
        _ => {
            return (
                StatusCode::NOT_FOUND,
                "Webhook not configured for polling mode",
            )
        }
    };

    if let Some(expected) = &state.secret {
        let given = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if given != Some(expected.as_str()) {
            tracing::warn!("webhook call with missing or wrong secret token");
            return (StatusCode::UNAUTHORIZED, "Unauthorized");
        }
    }

    match sink.accept(&body).await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(Error::Json(e)) => {
            tracing::warn!("undecodable webhook payload: {e}");
            (StatusCode::BAD_REQUEST, "Bad Request")
        }
        Err(e) => {
            tracing::error!("error processing webhook: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Error")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use tower::ServiceExt;

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        payloads: Mutex<Vec<Vec<u8>>>,
    }

    #[async_trait]
    impl UpdateSink for RecordingSink {
        async fn accept(&self, payload: &[u8]) -> Result<()> {
            if payload.first() != Some(&b'{') {
                return Err(Error::Json("expected an object".to_string()));
            }
            self.payloads.lock().unwrap().push(payload.to_vec());
            Ok(())
        }
    }

    async fn call(app: Router, req: Request<Body>) -> (StatusCode, String) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let body = to_bytes(res.into_body(), 64 * 1024).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn webhook_req(secret: Option<&str>, body: &'static str) -> Request<Body> {
        let mut b = Request::builder().method("POST").uri("/webhook");
        if let Some(s) = secret {
            b = b.header(SECRET_HEADER, s);
        }
        b.body(Body::from(body)).unwrap()
    }

    fn webhook_state(secret: Option<&str>) -> (HttpState, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let state = HttpState::new(UpdateMode::Webhook)
            .with_sink(sink.clone(), secret.map(str::to_string));
        (state, sink)
    }

    #[tokio::test]
    async fn home_reflects_running_flag() {
        let state = HttpState::new(UpdateMode::Polling);
        let (_, body) = call(app(state.clone()), get_req("/")).await;
        assert_eq!(body, "TrustCoin Bot is running! Status: Starting...");

        state.set_running(true);
        let (status, body) = call(app(state), get_req("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "TrustCoin Bot is running! Status: Active");
    }

    #[tokio::test]
    async fn health_is_json() {
        let state = HttpState::new(UpdateMode::Polling);
        state.set_running(true);
        let (status, body) = call(app(state), get_req("/health")).await;
        assert_eq!(status, StatusCode::OK);
        let v: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"status": "healthy", "bot_running": true, "mode": "polling"})
        );
    }

    #[tokio::test]
    async fn webhook_is_404_in_polling_mode() {
        let state = HttpState::new(UpdateMode::Polling);
        let (status, body) = call(app(state), webhook_req(None, "{}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Webhook not configured for polling mode");
    }

    #[tokio::test]
    async fn webhook_checks_secret() {
        let (state, sink) = webhook_state(Some("s3cret"));

        let (status, _) = call(app(state.clone()), webhook_req(None, "{}")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = call(app(state.clone()), webhook_req(Some("nope"), "{}")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(sink.payloads.lock().unwrap().is_empty());

        let (status, body) = call(app(state), webhook_req(Some("s3cret"), "{}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
        assert_eq!(sink.payloads.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn binding_a_taken_port_fails() {
        let first = bind("127.0.0.1", 0).await.unwrap();
        let port = first.local_addr().unwrap().port();
        assert!(matches!(bind("127.0.0.1", port).await, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn serve_stops_on_cancel() {
        let listener = bind("127.0.0.1", 0).await.unwrap();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(serve(
            listener,
            HttpState::new(UpdateMode::Polling),
            cancel.clone(),
        ));
        cancel.cancel();
        let res = tokio::time::timeout(std::time::Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert!(res.is_ok());
    }

    #[tokio::test]
    async fn webhook_rejects_bad_payload() {
        let (state, _) = webhook_state(None);
        let (status, _) = call(app(state), webhook_req(None, "garbage")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
