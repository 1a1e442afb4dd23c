//! Device-manager database (dvmdb) API, ADOM scope

use serde::Deserialize;

use super::client::Client;
use super::error::ApiError;

pub struct DvmdbApi<'a> {
    client: &'a Client,
    adom: String,
}

impl<'a> DvmdbApi<'a> {
    pub(crate) fn new(client: &'a Client, adom: &str) -> Self {
        Self {
            client,
            adom: adom.to_string(),
        }
    }

    /// get /dvmdb/adom/{adom}/device
    pub async fn list_devices(&self) -> Result<Vec<ManagedDevice>, ApiError> {
        self.client
            .get(&format!("/dvmdb/adom/{}/device", self.adom))
            .await
    }

    /// get /dvmdb/adom/{adom}/device/{name}
    pub async fn get_device(&self, name: &str) -> Result<ManagedDevice, ApiError> {
        self.client
            .get(&format!("/dvmdb/adom/{}/device/{}", self.adom, name))
            .await
    }
}

/// Inventory entry for a managed device.
#[derive(Debug, Clone, Deserialize)]
pub struct ManagedDevice {
    pub name: String,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub sn: Option<String>,
    #[serde(default)]
    pub os_ver: Option<String>,
    #[serde(rename = "platform_str", default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
}
