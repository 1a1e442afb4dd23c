//! Provider lifecycle tests against a mocked FortiManager

use fortimanager::FortimanagerProvider;
use mockito::{Matcher, Server};
use serde_json::json;
use tfplug::context::Context;
use tfplug::data_source::{ConfigureDataSourceRequest, ReadDataSourceRequest};
use tfplug::provider::{ConfigureProviderRequest, Provider};
use tfplug::resource::{
    ConfigureResourceRequest, CreateResourceRequest, DeleteResourceRequest, ReadResourceRequest,
};
use tfplug::types::{AttributePath, Dynamic, DynamicValue};

const POLICY_URL: &str = "/pm/config/device/fw01/vdom/root/firewall/policy";

async fn mock_login(server: &mut Server) -> mockito::Mock {
    server
        .mock("POST", "/jsonrpc")
        .match_body(Matcher::PartialJson(json!({
            "method": "exec",
            "params": [{"url": "/sys/login/user"}]
        })))
        .with_body(
            r#"{"id":1,"result":[{"status":{"code":0,"message":"OK"},"url":"/sys/login/user"}],"session":"it-session"}"#,
        )
        .create_async()
        .await
}

async fn configured_provider(server: &Server) -> (FortimanagerProvider, std::sync::Arc<dyn std::any::Any + Send + Sync>) {
    let mut provider = FortimanagerProvider::new();

    let mut config = DynamicValue::empty_object();
    let _ = config.set_string(&AttributePath::new("hostname"), server.url());
    let _ = config.set_string(&AttributePath::new("username"), "admin".to_string());
    let _ = config.set_string(&AttributePath::new("password"), "secret".to_string());
    let _ = config.set_bool(&AttributePath::new("insecure"), true);

    let response = provider
        .configure(
            Context::new(),
            ConfigureProviderRequest {
                terraform_version: "1.9.0".to_string(),
                config,
            },
        )
        .await;

    assert!(
        response.diagnostics.is_empty(),
        "provider configuration failed: {:?}",
        response.diagnostics
    );
    (provider, response.provider_data.expect("provider data"))
}

#[tokio::test]
async fn firewall_policy_lifecycle_against_mock_server() {
    let mut server = Server::new_async().await;
    let _login = mock_login(&mut server).await;

    let _add = server
        .mock("POST", "/jsonrpc")
        .match_body(Matcher::PartialJson(json!({
            "method": "add",
            "session": "it-session",
            "params": [{"url": POLICY_URL, "data": {"name": "allow-web", "action": "accept"}}]
        })))
        .with_body(
            json!({
                "id": 2,
                "result": [{
                    "status": {"code": 0, "message": "OK"},
                    "url": POLICY_URL,
                    "data": {"policyid": 42}
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;
    let _get = server
        .mock("POST", "/jsonrpc")
        .match_body(Matcher::PartialJson(json!({
            "method": "get",
            "params": [{"url": format!("{}/42", POLICY_URL)}]
        })))
        .with_body(
            json!({
                "id": 3,
                "result": [{
                    "status": {"code": 0, "message": "OK"},
                    "url": format!("{}/42", POLICY_URL),
                    "data": {
                        "policyid": 42,
                        "name": "allow-web",
                        "action": "accept",
                        "srcaddr": "all",
                        "status": "enable"
                    }
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;
    let _delete = server
        .mock("POST", "/jsonrpc")
        .match_body(Matcher::PartialJson(json!({
            "method": "delete",
            "params": [{"url": format!("{}/42", POLICY_URL)}]
        })))
        .with_body(
            json!({
                "id": 4,
                "result": [{"status": {"code": 0, "message": "OK"}, "url": format!("{}/42", POLICY_URL)}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let (provider, provider_data) = configured_provider(&server).await;

    let mut resource = provider
        .create_resource("fortimanager_firewall_policy")
        .await
        .unwrap();
    let configure_response = resource
        .configure(
            Context::new(),
            ConfigureResourceRequest {
                provider_data: Some(provider_data),
            },
        )
        .await;
    assert!(configure_response.diagnostics.is_empty());

    // Create
    let mut config = DynamicValue::empty_object();
    let _ = config.set_string(&AttributePath::new("device_name"), "fw01".to_string());
    let _ = config.set_string(&AttributePath::new("name"), "allow-web".to_string());
    let _ = config.set_string(&AttributePath::new("action"), "accept".to_string());

    let create_response = resource
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: "fortimanager_firewall_policy".to_string(),
                config: config.clone(),
                planned_state: config,
            },
        )
        .await;
    assert!(create_response.diagnostics.is_empty());
    let state = create_response.new_state;
    assert_eq!(
        state.get_number(&AttributePath::new("policyid")).unwrap(),
        42.0
    );

    // Refresh
    let read_response = resource
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: "fortimanager_firewall_policy".to_string(),
                current_state: state.clone(),
                private: vec![],
            },
        )
        .await;
    assert!(read_response.diagnostics.is_empty());
    let refreshed = read_response.new_state.unwrap();
    assert_eq!(
        refreshed.get_list(&AttributePath::new("srcaddr")).unwrap(),
        vec![Dynamic::String("all".to_string())]
    );

    // Destroy
    let delete_response = resource
        .delete(
            Context::new(),
            DeleteResourceRequest {
                type_name: "fortimanager_firewall_policy".to_string(),
                prior_state: refreshed,
                planned_private: vec![],
            },
        )
        .await;
    assert!(delete_response.diagnostics.is_empty());
}

#[tokio::test]
async fn system_status_data_source_against_mock_server() {
    let mut server = Server::new_async().await;
    let _login = mock_login(&mut server).await;
    let _status = server
        .mock("POST", "/jsonrpc")
        .match_body(Matcher::PartialJson(json!({
            "method": "get",
            "params": [{"url": "/sys/status"}]
        })))
        .with_body(
            json!({
                "id": 2,
                "result": [{
                    "status": {"code": 0, "message": "OK"},
                    "url": "/sys/status",
                    "data": {
                        "Hostname": "fmg01",
                        "Version": "v7.2.2-build1334",
                        "Serial Number": "FMG-VM0000000001"
                    }
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let (provider, provider_data) = configured_provider(&server).await;

    let mut data_source = provider
        .create_data_source("fortimanager_system_status")
        .await
        .unwrap();
    let configure_response = data_source
        .configure(
            Context::new(),
            ConfigureDataSourceRequest {
                provider_data: Some(provider_data),
            },
        )
        .await;
    assert!(configure_response.diagnostics.is_empty());

    let read_response = data_source
        .read(
            Context::new(),
            ReadDataSourceRequest {
                type_name: "fortimanager_system_status".to_string(),
                config: DynamicValue::empty_object(),
            },
        )
        .await;

    assert!(read_response.diagnostics.is_empty());
    assert_eq!(
        read_response
            .state
            .get_string(&AttributePath::new("version"))
            .unwrap(),
        "v7.2.2-build1334"
    );
    assert_eq!(
        read_response
            .state
            .get_string(&AttributePath::new("id"))
            .unwrap(),
        "fortimanager_system_status"
    );
}

#[tokio::test]
async fn unconfigured_resource_reports_missing_provider_data() {
    let provider = FortimanagerProvider::new();

    let resource = provider
        .create_resource("fortimanager_firewall_policy")
        .await
        .unwrap();

    let mut config = DynamicValue::empty_object();
    let _ = config.set_string(&AttributePath::new("device_name"), "fw01".to_string());

    let response = resource
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: "fortimanager_firewall_policy".to_string(),
                config: config.clone(),
                planned_state: config,
            },
        )
        .await;

    assert_eq!(response.diagnostics.len(), 1);
    assert!(response.diagnostics[0]
        .summary
        .contains("Provider not configured"));
}
