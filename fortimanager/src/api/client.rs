//! FortiManager JSON-RPC client
//!
//! All traffic goes through `POST {endpoint}/jsonrpc`. A session token is
//! obtained once at connect time via `exec /sys/login/user` and attached to
//! every subsequent request. Transport-level failures are retried with
//! exponential backoff; JSON-RPC status errors are terminal.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::device::DeviceApi;
use super::dvmdb::DvmdbApi;
use super::error::ApiError;
use super::rpc::{self, RpcParam, RpcRequest, RpcResponse};

#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    rpc_url: String,
    session: String,
    next_id: AtomicU64,
    retry: RetryConfig,
}

#[derive(Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub timeout_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
            timeout_seconds: 30,
        }
    }
}

#[derive(Serialize)]
struct LoginData<'a> {
    user: &'a str,
    passwd: &'a str,
}

/// FortiManager appliance status, from `get /sys/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemStatus {
    #[serde(rename = "Hostname")]
    pub hostname: String,
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Serial Number")]
    pub serial: String,
    #[serde(rename = "Platform Type")]
    pub platform: Option<String>,
}

impl Client {
    /// Connect with default retry configuration, logging in immediately.
    pub async fn connect(
        endpoint: &str,
        username: &str,
        password: &str,
        insecure: bool,
    ) -> Result<Self, ApiError> {
        Self::with_config(endpoint, username, password, insecure, RetryConfig::default()).await
    }

    pub async fn with_config(
        endpoint: &str,
        username: &str,
        password: &str,
        insecure: bool,
        retry: RetryConfig,
    ) -> Result<Self, ApiError> {
        let base = Url::parse(endpoint)
            .map_err(|e| ApiError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ApiError::InvalidEndpoint(format!(
                "unsupported scheme '{}'",
                base.scheme()
            )));
        }

        let http = reqwest::ClientBuilder::new()
            .danger_accept_invalid_certs(insecure)
            .timeout(Duration::from_secs(retry.timeout_seconds))
            .build()?;

        let rpc_url = format!("{}/jsonrpc", endpoint.trim_end_matches('/'));

        let login = LoginData {
            user: username,
            passwd: password,
        };
        let response: RpcResponse<serde_json::Value> = call_raw(
            &http,
            &rpc_url,
            &retry,
            rpc::METHOD_EXEC,
            "/sys/login/user",
            Some(&login),
            None,
            1,
        )
        .await?;

        let result = response
            .result
            .first()
            .ok_or_else(|| ApiError::Parse("empty result in login response".to_string()))?;
        if result.status.code != rpc::STATUS_OK {
            return Err(ApiError::Auth(result.status.message.clone()));
        }
        let session = response
            .session
            .ok_or_else(|| ApiError::Auth("no session token in login response".to_string()))?;

        tracing::debug!(endpoint = %endpoint, user = %username, "logged in to FortiManager");

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                rpc_url,
                session,
                next_id: AtomicU64::new(2),
                retry,
            }),
        })
    }

    /// `get` an object; the URL must name an existing object or table.
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let data = self.call::<(), T>(rpc::METHOD_GET, url, None).await?;
        data.ok_or_else(|| ApiError::Parse(format!("no data in response for {}", url)))
    }

    /// `add` a new object under a table URL. Returns the assigned key data
    /// when the API reports one (e.g. the policyid of a new policy).
    pub async fn add<D: Serialize + Sync, T: DeserializeOwned>(
        &self,
        url: &str,
        data: &D,
    ) -> Result<Option<T>, ApiError> {
        self.call(rpc::METHOD_ADD, url, Some(data)).await
    }

    /// `set` replaces the object at the URL with the full payload.
    pub async fn set<D: Serialize + Sync>(&self, url: &str, data: &D) -> Result<(), ApiError> {
        self.call::<D, serde_json::Value>(rpc::METHOD_SET, url, Some(data))
            .await?;
        Ok(())
    }

    /// `update` merges the payload into the existing object.
    pub async fn update<D: Serialize + Sync>(&self, url: &str, data: &D) -> Result<(), ApiError> {
        self.call::<D, serde_json::Value>(rpc::METHOD_UPDATE, url, Some(data))
            .await?;
        Ok(())
    }

    /// `delete` the object at the URL.
    pub async fn delete(&self, url: &str) -> Result<(), ApiError> {
        self.call::<(), serde_json::Value>(rpc::METHOD_DELETE, url, None)
            .await?;
        Ok(())
    }

    /// `exec` an operational endpoint.
    pub async fn exec<D: Serialize + Sync, T: DeserializeOwned>(
        &self,
        url: &str,
        data: Option<&D>,
    ) -> Result<Option<T>, ApiError> {
        self.call(rpc::METHOD_EXEC, url, data).await
    }

    /// FortiManager appliance status.
    pub async fn get_status(&self) -> Result<SystemStatus, ApiError> {
        self.get("/sys/status").await
    }

    /// Configuration objects of one managed device.
    pub fn device<'a>(&'a self, device: &str) -> DeviceApi<'a> {
        DeviceApi::new(self, device)
    }

    /// Device-manager database for one ADOM.
    pub fn dvmdb<'a>(&'a self, adom: &str) -> DvmdbApi<'a> {
        DvmdbApi::new(self, adom)
    }

    async fn call<D: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: &str,
        url: &str,
        data: Option<&D>,
    ) -> Result<Option<T>, ApiError> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let response: RpcResponse<T> = call_raw(
            &self.inner.http,
            &self.inner.rpc_url,
            &self.inner.retry,
            method,
            url,
            data,
            Some(&self.inner.session),
            id,
        )
        .await?;

        let result = response
            .result
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Parse(format!("empty result in response for {}", url)))?;

        let reported_url = result.url.unwrap_or_else(|| url.to_string());
        match result.status.code {
            rpc::STATUS_OK => Ok(result.data),
            rpc::STATUS_NOT_FOUND => Err(ApiError::NotFound { url: reported_url }),
            rpc::STATUS_ALREADY_EXISTS => Err(ApiError::AlreadyExists { url: reported_url }),
            rpc::STATUS_NO_PERMISSION => Err(ApiError::Auth(result.status.message)),
            code => Err(ApiError::Rpc {
                code,
                message: result.status.message,
                url: reported_url,
            }),
        }
    }
}

/// One JSON-RPC exchange with transport-level retry. Timeouts, connection
/// failures, 429 and 5xx responses retry with exponential backoff; anything
/// else is terminal.
#[allow(clippy::too_many_arguments)]
async fn call_raw<D: Serialize, T: DeserializeOwned>(
    http: &reqwest::Client,
    rpc_url: &str,
    retry: &RetryConfig,
    method: &str,
    url: &str,
    data: Option<&D>,
    session: Option<&str>,
    id: u64,
) -> Result<RpcResponse<T>, ApiError> {
    let mut attempt = 0;
    let mut last_error = None;

    while attempt <= retry.max_retries {
        if attempt > 0 {
            let backoff = std::cmp::min(
                retry.initial_backoff_ms * 2_u64.pow(attempt - 1),
                retry.max_backoff_ms,
            );
            tracing::debug!(url, backoff_ms = backoff, attempt, "retrying request");
            tokio::time::sleep(Duration::from_millis(backoff)).await;
        }

        let request = RpcRequest {
            id,
            method,
            params: vec![RpcParam {
                url: url.to_string(),
                data,
            }],
            session,
        };

        tracing::debug!(method, url, "JSON-RPC request");

        match http.post(rpc_url).json(&request).send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    let text = response.text().await?;
                    return serde_json::from_str(&text).map_err(|e| {
                        tracing::error!(url, error = %e, body = %text, "failed to parse response");
                        ApiError::Parse(e.to_string())
                    });
                }

                if status == reqwest::StatusCode::UNAUTHORIZED {
                    return Err(ApiError::Auth("HTTP 401".to_string()));
                }

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    last_error = Some(ApiError::ServiceUnavailable);
                } else {
                    let body = response.text().await.unwrap_or_default();
                    return Err(ApiError::Http {
                        status: status.as_u16(),
                        body,
                    });
                }
            }
            Err(e) => {
                if e.is_timeout() {
                    last_error = Some(ApiError::Timeout(retry.timeout_seconds));
                } else if e.is_connect() || e.is_request() {
                    last_error = Some(ApiError::ServiceUnavailable);
                } else {
                    return Err(ApiError::Request(e));
                }
            }
        }

        attempt += 1;
    }

    Err(last_error.unwrap_or(ApiError::ServiceUnavailable))
}
