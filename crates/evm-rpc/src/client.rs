//! EVM JSON-RPC client: `eth_blockNumber` and `eth_getLogs` with classified
//! errors and a per-endpoint queries-per-second floor.
//!
//! # Example
//!
//! ```ignore
//! use evm_rpc::{EvmRpcClient, types::LogFilter};
//!
//! let client = EvmRpcClient::new("https://rpc.example.com")?;
//! let tip = client.get_block_number().await?;
//! let logs = client.get_logs(LogFilter::new(tip - 100, tip)).await?;
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{EvmRpcError, Result};
use crate::types::{JsonRpcRequest, JsonRpcResponse, LogFilter, LogsResponse};

// ═══════════════════════════════════════════════════════════════════════════════
// EVM RPC CLIENT
// ═══════════════════════════════════════════════════════════════════════════════

/// A plain JSON-RPC HTTP client for `eth_blockNumber` and `eth_getLogs`,
/// with errors classified into [`EvmRpcError::RateLimited`],
/// [`EvmRpcError::BlockRangeTooLarge`], and [`EvmRpcError::Transport`], and a
/// per-endpoint QPS floor enforced between requests.
///
/// # Thread Safety
///
/// `Send + Sync`; intended to be held behind an `Arc` and shared by the
/// chain worker that owns this endpoint.
#[derive(Debug)]
pub struct EvmRpcClient {
    client: reqwest::Client,
    rpc_url: String,
    request_id: AtomicU64,
    config: ClientConfig,
    last_request_at: Mutex<Option<Instant>>,
}

impl EvmRpcClient {
    /// Create a new client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(rpc_url: impl Into<String>) -> Result<Self> {
        Self::with_config(rpc_url, ClientConfig::default())
    }

    /// Create a new client with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be constructed.
    pub fn with_config(rpc_url: impl Into<String>, config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EvmRpcError::Transport(format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            rpc_url: rpc_url.into(),
            request_id: AtomicU64::new(1),
            config,
            last_request_at: Mutex::new(None),
        })
    }

    /// The RPC URL this client is connected to.
    #[must_use]
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// The current configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn next_request_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Enforce the configured QPS floor by sleeping until `min_delay` has
    /// elapsed since the previous request on this client.
    async fn throttle(&self) {
        let min_delay = self.config.min_delay();
        let mut guard = self.last_request_at.lock().await;
        if let Some(last) = *guard {
            let elapsed = last.elapsed();
            if elapsed < min_delay {
                tokio::time::sleep(min_delay - elapsed).await;
            }
        }
        *guard = Some(Instant::now());
    }

    /// Fetch the current chain tip.
    ///
    /// # Errors
    ///
    /// [`EvmRpcError::RateLimited`], [`EvmRpcError::Transport`]. Never
    /// returns [`EvmRpcError::BlockRangeTooLarge`].
    #[instrument(skip(self))]
    pub async fn get_block_number(&self) -> Result<u64> {
        let request_id = self.next_request_id();
        let request = JsonRpcRequest::new("eth_blockNumber", (), request_id);
        let response: JsonRpcResponse<String> = self.send_request(&request).await?;

        if let Some(error) = response.error {
            return Err(error.into_error());
        }

        let hex = response
            .result
            .ok_or_else(|| EvmRpcError::Transport("missing result for eth_blockNumber".into()))?;
        let stripped = hex.strip_prefix("0x").unwrap_or(&hex);
        u64::from_str_radix(stripped, 16)
            .map_err(|e| EvmRpcError::Transport(format!("malformed block number {hex:?}: {e}")))
    }

    /// Fetch logs matching `filter`.
    ///
    /// # Errors
    ///
    /// [`EvmRpcError::RateLimited`], [`EvmRpcError::BlockRangeTooLarge`],
    /// [`EvmRpcError::Transport`].
    #[instrument(skip(self, filter), fields(from_block = %filter.from_block, to_block = %filter.to_block))]
    pub async fn get_logs(&self, filter: LogFilter) -> Result<LogsResponse> {
        let request_id = self.next_request_id();
        let request = JsonRpcRequest::new("eth_getLogs", [filter], request_id);
        let response: JsonRpcResponse<LogsResponse> = self.send_request(&request).await?;

        if let Some(error) = response.error {
            return Err(error.into_error());
        }

        response
            .result
            .ok_or_else(|| EvmRpcError::Transport("missing result for eth_getLogs".into()))
    }

    async fn send_request<P, R>(&self, request: &JsonRpcRequest<'_, P>) -> Result<JsonRpcResponse<R>>
    where
        P: serde::Serialize + Sync,
        R: serde::de::DeserializeOwned,
    {
        self.throttle().await;

        let response = self.client.post(&self.rpc_url).json(request).send().await?;

        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        if let Some(err) = EvmRpcError::from_http_status(status.as_u16(), retry_after) {
            debug!(status = %status, "classified non-success http status");
            return Err(err);
        }
        if !status.is_success() {
            return Err(EvmRpcError::Transport(format!("http status {status}")));
        }

        let body: JsonRpcResponse<R> = response.json().await.map_err(|e| {
            warn!(error = %e, "failed to decode json-rpc response body");
            EvmRpcError::Transport(format!("malformed response body: {e}"))
        })?;
        Ok(body)
    }
}

/// Parse a `Retry-After` header, supporting both a seconds count and an
/// HTTP-date value.
fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    let raw = headers.get(reqwest::header::RETRY_AFTER)?.to_str().ok()?;
    if let Ok(secs) = raw.trim().parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let naive = chrono::NaiveDateTime::parse_from_str(raw.trim(), "%a, %d %b %Y %H:%M:%S GMT").ok()?;
    let date = naive.and_utc();
    let now = chrono::Utc::now();
    (date - now).to_std().ok()
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn client_creation() {
        let client = EvmRpcClient::new("https://example.com/rpc").expect("client creation failed");
        assert_eq!(client.rpc_url(), "https://example.com/rpc");
    }

    #[tokio::test]
    async fn get_block_number_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": "0x100"
            })))
            .mount(&mock_server)
            .await;

        let client = EvmRpcClient::new(mock_server.uri()).expect("client creation failed");
        assert_eq!(client.get_block_number().await.expect("rpc failed"), 256);
    }

    #[tokio::test]
    async fn get_logs_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": []
            })))
            .mount(&mock_server)
            .await;

        let client = EvmRpcClient::new(mock_server.uri()).expect("client creation failed");
        let logs = client
            .get_logs(LogFilter::new(100, 200))
            .await
            .expect("rpc failed");
        assert!(logs.is_empty());
    }

    #[tokio::test]
    async fn rate_limited_via_http_429_with_retry_after() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "2"))
            .mount(&mock_server)
            .await;

        let client = EvmRpcClient::new(mock_server.uri()).expect("client creation failed");
        let err = client.get_block_number().await.expect_err("expected error");
        match err {
            EvmRpcError::RateLimited { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(2));
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn block_range_too_large_via_rpc_code() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {"code": -32062, "message": "block range too large"}
            })))
            .mount(&mock_server)
            .await;

        let client = EvmRpcClient::new(mock_server.uri()).expect("client creation failed");
        let err = client
            .get_logs(LogFilter::new(1, 1_000_000))
            .await
            .expect_err("expected error");
        assert!(matches!(err, EvmRpcError::BlockRangeTooLarge));
    }

    #[tokio::test]
    async fn qps_floor_delays_second_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": "0x1"
            })))
            .mount(&mock_server)
            .await;

        let config = ClientConfig::default().with_qps(5);
        let client = EvmRpcClient::with_config(mock_server.uri(), config).expect("client creation failed");

        let start = Instant::now();
        client.get_block_number().await.expect("first call failed");
        client.get_block_number().await.expect("second call failed");
        assert!(start.elapsed() >= Duration::from_millis(200));
    }
}
