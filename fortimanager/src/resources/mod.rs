pub mod firewall_policy;
pub mod router_static;
pub mod sdwan_health_check;
pub mod system_interface;
pub mod util;
pub mod wireless_vap;

pub use firewall_policy::FirewallPolicyResource;
pub use router_static::RouterStaticResource;
pub use sdwan_health_check::SdwanHealthCheckResource;
pub use system_interface::SystemInterfaceResource;
pub use wireless_vap::WirelessVapResource;
