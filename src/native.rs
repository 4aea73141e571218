//! native shell.
//!
//! - `ureq` is blocking, so every request runs inside `spawn_blocking`.
//! - [`TokioRt`] is a tiny multi-thread runtime that drives turns off the
//!   caller's thread; outcomes come back through the controller's inbox and
//!   are applied by `drain` on the owning thread.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::info;

use crate::api::{ApiResponse, Transport};
use crate::chat::PendingTurn;
use crate::config::ClientConfig;
use crate::error::TransportError;

pub type SharedTransport = Arc<dyn Transport + Send + Sync>;

#[derive(Clone)]
pub struct TokioRt(pub Arc<tokio::runtime::Runtime>);

impl TokioRt {
    pub fn new() -> std::io::Result<Self> {
        info!(target: "lenny_web", "initializing tokio multi-thread runtime (native)");
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        Ok(Self(Arc::new(rt)))
    }

    pub fn spawn_turn(&self, transport: SharedTransport, turn: PendingTurn) -> JoinHandle<()> {
        self.0.spawn(async move { turn.run(transport.as_ref()).await })
    }

    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.0.block_on(fut)
    }
}

#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Option<Duration>) -> Self {
        // non-2xx bodies carry the `{error}` text, so statuses are not errors here
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build();
        Self { agent: ureq::Agent::new_with_config(config) }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.request_timeout_ms.map(Duration::from_millis))
    }
}

#[async_trait::async_trait]
impl Transport for UreqTransport {
    async fn get(&self, url: &str) -> Result<ApiResponse, TransportError> {
        let agent = self.agent.clone();
        let url = url.to_string();
        blocking(move || read(agent.get(&url).header("accept", "application/json").call())).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<ApiResponse, TransportError> {
        let agent = self.agent.clone();
        let url = url.to_string();
        let body = body.clone();
        blocking(move || read(agent.post(&url).header("accept", "application/json").send_json(&body))).await
    }
}

async fn blocking<F>(work: F) -> Result<ApiResponse, TransportError>
where
    F: FnOnce() -> Result<ApiResponse, TransportError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| TransportError::Network(format!("request worker failed: {e}")))?
}

fn read(res: Result<ureq::http::Response<ureq::Body>, ureq::Error>) -> Result<ApiResponse, TransportError> {
    let res = res.map_err(|e| TransportError::Network(e.to_string()))?;
    let status = res.status().as_u16();
    // ureq 3.1: read body via Body::read_to_string()
    let text = res
        .into_body()
        .read_to_string()
        .map_err(|e| TransportError::Body(e.to_string()))?;
    Ok(ApiResponse::from_text(status, &text))
}
