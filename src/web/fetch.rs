//! gloo-net transport (browser fetch).

use gloo_net::http::{Request, Response};
use serde_json::Value;

use crate::api::{ApiResponse, Transport};
use crate::error::TransportError;

#[derive(Debug, Clone, Copy, Default)]
pub struct FetchTransport;

#[async_trait::async_trait(?Send)]
impl Transport for FetchTransport {
    async fn get(&self, url: &str) -> Result<ApiResponse, TransportError> {
        let res = Request::get(url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(network)?;
        read(res).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<ApiResponse, TransportError> {
        let res = Request::post(url)
            .header("accept", "application/json")
            .json(body)
            .map_err(network)?
            .send()
            .await
            .map_err(network)?;
        read(res).await
    }
}

fn network(err: gloo_net::Error) -> TransportError {
    TransportError::Network(err.to_string())
}

async fn read(res: Response) -> Result<ApiResponse, TransportError> {
    let status = res.status();
    let text = res.text().await.map_err(|e| TransportError::Body(e.to_string()))?;
    Ok(ApiResponse::from_text(status, &text))
}
