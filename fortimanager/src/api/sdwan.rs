//! SD-WAN health check API for one device VDOM

use serde::{Deserialize, Serialize};

use super::client::Client;
use super::common::member_list;
use super::error::ApiError;

pub struct SdwanApi<'a> {
    client: &'a Client,
    base: String,
}

impl<'a> SdwanApi<'a> {
    pub(crate) fn new(client: &'a Client, base: String) -> Self {
        Self { client, base }
    }

    fn table(&self) -> String {
        format!("{}/system/sdwan/health-check", self.base)
    }

    /// get .../system/sdwan/health-check
    pub async fn list_health_checks(&self) -> Result<Vec<HealthCheck>, ApiError> {
        self.client.get(&self.table()).await
    }

    /// get .../system/sdwan/health-check/{name}
    pub async fn get_health_check(&self, name: &str) -> Result<HealthCheck, ApiError> {
        self.client.get(&format!("{}/{}", self.table(), name)).await
    }

    /// add .../system/sdwan/health-check
    pub async fn create_health_check(&self, check: &HealthCheck) -> Result<(), ApiError> {
        let _: Option<serde_json::Value> = self.client.add(&self.table(), check).await?;
        Ok(())
    }

    /// set .../system/sdwan/health-check/{name}
    pub async fn set_health_check(&self, name: &str, check: &HealthCheck) -> Result<(), ApiError> {
        self.client
            .set(&format!("{}/{}", self.table(), name), check)
            .await
    }

    /// delete .../system/sdwan/health-check/{name}
    pub async fn delete_health_check(&self, name: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("{}/{}", self.table(), name))
            .await
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthCheck {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(with = "member_list", default, skip_serializing_if = "Option::is_none")]
    pub server: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failtime: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recoverytime: Option<u32>,
    #[serde(with = "member_list", default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sla: Option<Vec<SlaTarget>>,
}

/// One SLA target entry of a health check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlaTarget {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    #[serde(
        rename = "link-cost-factor",
        with = "member_list",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub link_cost_factor: Option<Vec<String>>,
    #[serde(rename = "latency-threshold", skip_serializing_if = "Option::is_none")]
    pub latency_threshold: Option<u32>,
    #[serde(rename = "jitter-threshold", skip_serializing_if = "Option::is_none")]
    pub jitter_threshold: Option<u32>,
    #[serde(
        rename = "packetloss-threshold",
        skip_serializing_if = "Option::is_none"
    )]
    pub packetloss_threshold: Option<u32>,
}
