//! Wireless controller VAP (SSID) API for one device VDOM

use serde::{Deserialize, Serialize};

use super::client::Client;
use super::common::EnableDisable;
use super::error::ApiError;

pub struct WirelessApi<'a> {
    client: &'a Client,
    base: String,
}

impl<'a> WirelessApi<'a> {
    pub(crate) fn new(client: &'a Client, base: String) -> Self {
        Self { client, base }
    }

    fn table(&self) -> String {
        format!("{}/wireless-controller/vap", self.base)
    }

    /// get .../wireless-controller/vap
    pub async fn list_vaps(&self) -> Result<Vec<Vap>, ApiError> {
        self.client.get(&self.table()).await
    }

    /// get .../wireless-controller/vap/{name}
    pub async fn get_vap(&self, name: &str) -> Result<Vap, ApiError> {
        self.client.get(&format!("{}/{}", self.table(), name)).await
    }

    /// add .../wireless-controller/vap
    pub async fn create_vap(&self, vap: &Vap) -> Result<(), ApiError> {
        let _: Option<serde_json::Value> = self.client.add(&self.table(), vap).await?;
        Ok(())
    }

    /// set .../wireless-controller/vap/{name}
    pub async fn set_vap(&self, name: &str, vap: &Vap) -> Result<(), ApiError> {
        self.client
            .set(&format!("{}/{}", self.table(), name), vap)
            .await
    }

    /// delete .../wireless-controller/vap/{name}
    pub async fn delete_vap(&self, name: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("{}/{}", self.table(), name))
            .await
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vap {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passphrase: Option<String>,
    #[serde(rename = "broadcast-ssid", skip_serializing_if = "Option::is_none")]
    pub broadcast_ssid: Option<EnableDisable>,
    #[serde(rename = "max-clients", skip_serializing_if = "Option::is_none")]
    pub max_clients: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}
