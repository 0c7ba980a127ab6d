use std::sync::Arc;

use havoc_core::config::BrokerConfig;
use havoc_store::ProvisioningStore;

use crate::catalog::Catalog;

pub struct BrokerState {
    pub store: Arc<dyn ProvisioningStore>,
    pub config: BrokerConfig,
    /// Loaded once at startup and served from `/v2/catalog`.
    pub catalog: Catalog,
}

impl BrokerState {
    /// Link to the settings endpoint of one instance.
    pub fn dashboard_url(&self, instance_id: &str) -> String {
        match &self.config.public_uri {
            Some(uri) => format!("https://{}/dashboard/{}", uri, instance_id),
            None => format!("/dashboard/{}", instance_id),
        }
    }
}
