use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::addr::ResourceAddr;

/// Local provider state: every managed resource keyed by `<type>.<name>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderState {
    pub version: u32,
    #[serde(default)]
    pub resources: BTreeMap<String, StoredResource>,
}

impl Default for ProviderState {
    fn default() -> Self {
        Self {
            version: Self::VERSION,
            resources: BTreeMap::new(),
        }
    }
}

/// State for a single managed resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResource {
    pub resource_type: String,
    pub resource_name: String,
    /// The resource state as written by its reconciler.
    pub attributes: serde_json::Value,
}

impl ProviderState {
    /// Bump when the on-disk layout changes.
    pub const VERSION: u32 = 1;

    pub fn get(&self, addr: &ResourceAddr) -> Option<&StoredResource> {
        self.resources.get(&addr.to_string())
    }

    pub fn attributes(&self, addr: &ResourceAddr) -> Option<&serde_json::Value> {
        self.get(addr).map(|r| &r.attributes)
    }

    pub fn set(&mut self, addr: &ResourceAddr, attributes: serde_json::Value) {
        self.resources.insert(
            addr.to_string(),
            StoredResource {
                resource_type: addr.resource_type.clone(),
                resource_name: addr.resource_name.clone(),
                attributes,
            },
        );
    }

    pub fn remove(&mut self, addr: &ResourceAddr) -> Option<StoredResource> {
        self.resources.remove(&addr.to_string())
    }
}
