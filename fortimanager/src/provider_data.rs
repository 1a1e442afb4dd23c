//! Provider data passed to resources and data sources

use crate::api::Client;
use std::sync::Arc;

#[derive(Clone)]
pub struct FortimanagerProviderData {
    pub client: Arc<Client>,
    /// Administrative domain used for dvmdb lookups.
    pub adom: String,
}

impl FortimanagerProviderData {
    pub fn new(client: Client, adom: String) -> Self {
        Self {
            client: Arc::new(client),
            adom,
        }
    }
}
