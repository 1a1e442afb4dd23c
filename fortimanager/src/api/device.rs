//! Scoped access to one managed device's configuration database
//!
//! Device-level objects live under `/pm/config/device/{device}/vdom/{vdom}`
//! for VDOM-scoped tables and `/pm/config/device/{device}/global` for
//! device-global tables.

use super::client::Client;
use super::firewall::FirewallApi;
use super::router::RouterApi;
use super::sdwan::SdwanApi;
use super::system::SystemApi;
use super::wireless::WirelessApi;

pub struct DeviceApi<'a> {
    client: &'a Client,
    device: String,
}

impl<'a> DeviceApi<'a> {
    pub fn new(client: &'a Client, device: &str) -> Self {
        Self {
            client,
            device: device.to_string(),
        }
    }

    /// VDOM-scoped configuration tables.
    pub fn vdom(self, vdom: &str) -> VdomScope<'a> {
        VdomScope {
            client: self.client,
            base: format!("/pm/config/device/{}/vdom/{}", self.device, vdom),
        }
    }

    /// Device-global configuration tables.
    pub fn global(self) -> GlobalScope<'a> {
        GlobalScope {
            client: self.client,
            base: format!("/pm/config/device/{}/global", self.device),
        }
    }
}

pub struct VdomScope<'a> {
    client: &'a Client,
    base: String,
}

impl<'a> VdomScope<'a> {
    pub fn firewall(self) -> FirewallApi<'a> {
        FirewallApi::new(self.client, self.base)
    }

    pub fn router(self) -> RouterApi<'a> {
        RouterApi::new(self.client, self.base)
    }

    pub fn wireless(self) -> WirelessApi<'a> {
        WirelessApi::new(self.client, self.base)
    }

    pub fn sdwan(self) -> SdwanApi<'a> {
        SdwanApi::new(self.client, self.base)
    }
}

pub struct GlobalScope<'a> {
    client: &'a Client,
    base: String,
}

impl<'a> GlobalScope<'a> {
    pub fn system(self) -> SystemApi<'a> {
        SystemApi::new(self.client, self.base)
    }
}
