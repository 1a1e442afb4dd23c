//! Firewall policy API for one device VDOM

use serde::{Deserialize, Serialize};

use super::client::Client;
use super::common::{member_list, EnableDisable};
use super::error::ApiError;

pub struct FirewallApi<'a> {
    client: &'a Client,
    base: String,
}

impl<'a> FirewallApi<'a> {
    pub(crate) fn new(client: &'a Client, base: String) -> Self {
        Self { client, base }
    }

    fn table(&self) -> String {
        format!("{}/firewall/policy", self.base)
    }

    /// get .../firewall/policy
    pub async fn list_policies(&self) -> Result<Vec<FirewallPolicy>, ApiError> {
        self.client.get(&self.table()).await
    }

    /// get .../firewall/policy/{policyid}
    pub async fn get_policy(&self, policyid: u32) -> Result<FirewallPolicy, ApiError> {
        self.client
            .get(&format!("{}/{}", self.table(), policyid))
            .await
    }

    /// add .../firewall/policy; FortiManager assigns and returns the policyid
    pub async fn create_policy(&self, policy: &FirewallPolicy) -> Result<u32, ApiError> {
        let key: Option<PolicyKey> = self.client.add(&self.table(), policy).await?;
        key.map(|k| k.policyid)
            .or(policy.policyid)
            .ok_or_else(|| ApiError::Parse("no policyid in add response".to_string()))
    }

    /// set .../firewall/policy/{policyid}
    pub async fn set_policy(
        &self,
        policyid: u32,
        policy: &FirewallPolicy,
    ) -> Result<(), ApiError> {
        self.client
            .set(&format!("{}/{}", self.table(), policyid), policy)
            .await
    }

    /// delete .../firewall/policy/{policyid}
    pub async fn delete_policy(&self, policyid: u32) -> Result<(), ApiError> {
        self.client
            .delete(&format!("{}/{}", self.table(), policyid))
            .await
    }
}

#[derive(Debug, Deserialize)]
struct PolicyKey {
    policyid: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FirewallPolicy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policyid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(with = "member_list", default, skip_serializing_if = "Option::is_none")]
    pub srcintf: Option<Vec<String>>,
    #[serde(with = "member_list", default, skip_serializing_if = "Option::is_none")]
    pub dstintf: Option<Vec<String>>,
    #[serde(with = "member_list", default, skip_serializing_if = "Option::is_none")]
    pub srcaddr: Option<Vec<String>>,
    #[serde(with = "member_list", default, skip_serializing_if = "Option::is_none")]
    pub dstaddr: Option<Vec<String>>,
    #[serde(with = "member_list", default, skip_serializing_if = "Option::is_none")]
    pub service: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EnableDisable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nat: Option<EnableDisable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logtraffic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}
