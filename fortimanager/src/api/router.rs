//! Static route API for one device VDOM

use serde::{Deserialize, Serialize};

use super::client::Client;
use super::common::{member_list, subnet, EnableDisable};
use super::error::ApiError;

pub struct RouterApi<'a> {
    client: &'a Client,
    base: String,
}

impl<'a> RouterApi<'a> {
    pub(crate) fn new(client: &'a Client, base: String) -> Self {
        Self { client, base }
    }

    fn table(&self) -> String {
        format!("{}/router/static", self.base)
    }

    /// get .../router/static
    pub async fn list_static_routes(&self) -> Result<Vec<StaticRoute>, ApiError> {
        self.client.get(&self.table()).await
    }

    /// get .../router/static/{seq-num}
    pub async fn get_static_route(&self, seq_num: u32) -> Result<StaticRoute, ApiError> {
        self.client
            .get(&format!("{}/{}", self.table(), seq_num))
            .await
    }

    /// add .../router/static; FortiManager assigns the seq-num when absent
    pub async fn create_static_route(&self, route: &StaticRoute) -> Result<u32, ApiError> {
        let key: Option<RouteKey> = self.client.add(&self.table(), route).await?;
        key.map(|k| k.seq_num)
            .or(route.seq_num)
            .ok_or_else(|| ApiError::Parse("no seq-num in add response".to_string()))
    }

    /// set .../router/static/{seq-num}
    pub async fn set_static_route(&self, seq_num: u32, route: &StaticRoute) -> Result<(), ApiError> {
        self.client
            .set(&format!("{}/{}", self.table(), seq_num), route)
            .await
    }

    /// delete .../router/static/{seq-num}
    pub async fn delete_static_route(&self, seq_num: u32) -> Result<(), ApiError> {
        self.client
            .delete(&format!("{}/{}", self.table(), seq_num))
            .await
    }
}

#[derive(Debug, Deserialize)]
struct RouteKey {
    #[serde(rename = "seq-num")]
    seq_num: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticRoute {
    #[serde(rename = "seq-num", skip_serializing_if = "Option::is_none")]
    pub seq_num: Option<u32>,
    #[serde(with = "subnet", default, skip_serializing_if = "Option::is_none")]
    pub dst: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    #[serde(with = "member_list", default, skip_serializing_if = "Option::is_none")]
    pub device: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EnableDisable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}
