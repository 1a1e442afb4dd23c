//! System interface API, device-global scope

use serde::{Deserialize, Serialize};

use super::client::Client;
use super::common::{member_list, subnet, EnableDisable};
use super::error::ApiError;

pub struct SystemApi<'a> {
    client: &'a Client,
    base: String,
}

impl<'a> SystemApi<'a> {
    pub(crate) fn new(client: &'a Client, base: String) -> Self {
        Self { client, base }
    }

    fn table(&self) -> String {
        format!("{}/system/interface", self.base)
    }

    /// get .../system/interface
    pub async fn list_interfaces(&self) -> Result<Vec<SystemInterface>, ApiError> {
        self.client.get(&self.table()).await
    }

    /// get .../system/interface/{name}
    pub async fn get_interface(&self, name: &str) -> Result<SystemInterface, ApiError> {
        self.client.get(&format!("{}/{}", self.table(), name)).await
    }

    /// add .../system/interface
    pub async fn create_interface(&self, interface: &SystemInterface) -> Result<(), ApiError> {
        let _: Option<serde_json::Value> = self.client.add(&self.table(), interface).await?;
        Ok(())
    }

    /// update .../system/interface/{name}; merges the given fields only
    pub async fn update_interface(
        &self,
        name: &str,
        interface: &SystemInterface,
    ) -> Result<(), ApiError> {
        self.client
            .update(&format!("{}/{}", self.table(), name), interface)
            .await
    }

    /// delete .../system/interface/{name}
    pub async fn delete_interface(&self, name: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("{}/{}", self.table(), name))
            .await
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemInterface {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vdom: Option<String>,
    #[serde(with = "subnet", default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(with = "member_list", default, skip_serializing_if = "Option::is_none")]
    pub allowaccess: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EnableDisable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub interface_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlanid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
