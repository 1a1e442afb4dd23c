//! Shared mock-server helpers for API and resource tests

use mockito::{Matcher, Mock, Server};
use serde_json::json;

use super::client::Client;

pub const TEST_SESSION: &str = "test-session";

/// Mock the login exchange every `Client::connect` performs.
pub async fn mock_login(server: &mut Server) -> Mock {
    server
        .mock("POST", "/jsonrpc")
        .match_body(Matcher::PartialJson(json!({
            "method": "exec",
            "params": [{"url": "/sys/login/user"}]
        })))
        .with_body(format!(
            r#"{{"id":1,"result":[{{"status":{{"code":0,"message":"OK"}},"url":"/sys/login/user"}}],"session":"{}"}}"#,
            TEST_SESSION
        ))
        .create_async()
        .await
}

/// Mock one successful JSON-RPC call matched on method and object URL.
pub async fn mock_rpc(server: &mut Server, method: &str, url: &str, data: serde_json::Value) -> Mock {
    server
        .mock("POST", "/jsonrpc")
        .match_body(Matcher::PartialJson(json!({
            "method": method,
            "params": [{"url": url}]
        })))
        .with_body(
            json!({
                "id": 2,
                "result": [{"status": {"code": 0, "message": "OK"}, "url": url, "data": data}]
            })
            .to_string(),
        )
        .create_async()
        .await
}

/// Mock one failing JSON-RPC call with the given status code.
pub async fn mock_rpc_error(server: &mut Server, method: &str, url: &str, code: i32, message: &str) -> Mock {
    server
        .mock("POST", "/jsonrpc")
        .match_body(Matcher::PartialJson(json!({
            "method": method,
            "params": [{"url": url}]
        })))
        .with_body(
            json!({
                "id": 2,
                "result": [{"status": {"code": code, "message": message}, "url": url}]
            })
            .to_string(),
        )
        .create_async()
        .await
}

pub async fn connect(server: &Server) -> Client {
    Client::connect(&server.url(), "admin", "secret", true)
        .await
        .expect("test client login")
}
