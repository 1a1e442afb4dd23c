//! FortiManager JSON-RPC envelope
//!
//! Every API call is a `POST /jsonrpc` with a method verb and a single
//! params entry carrying the object URL and an optional data payload. The
//! session token from `exec /sys/login/user` rides along on each request.

use serde::{Deserialize, Serialize};

/// Method verbs understood by the FortiManager JSON-RPC endpoint.
pub const METHOD_GET: &str = "get";
pub const METHOD_ADD: &str = "add";
pub const METHOD_SET: &str = "set";
pub const METHOD_UPDATE: &str = "update";
pub const METHOD_DELETE: &str = "delete";
pub const METHOD_EXEC: &str = "exec";

/// Well-known status codes in `result[].status.code`.
pub const STATUS_OK: i32 = 0;
pub const STATUS_ALREADY_EXISTS: i32 = -2;
pub const STATUS_NOT_FOUND: i32 = -3;
pub const STATUS_INVALID_URL: i32 = -6;
pub const STATUS_NO_PERMISSION: i32 = -11;

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a, T: Serialize> {
    pub id: u64,
    pub method: &'a str,
    pub params: Vec<RpcParam<T>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct RpcParam<T: Serialize> {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse<T> {
    #[allow(dead_code)]
    pub id: Option<u64>,
    #[serde(default = "Vec::new")]
    pub result: Vec<RpcResult<T>>,
    pub session: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RpcResult<T> {
    pub status: RpcStatus,
    pub url: Option<String>,
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct RpcStatus {
    pub code: i32,
    #[serde(default)]
    pub message: String,
}
