//! clusters_mgmt v1 API objects.
//!
//! Every field is optional: the API omits what is unset, and patch bodies
//! must carry only what changed.

pub mod autoscaler;
pub mod cluster;
pub mod dns_domain;
pub mod group;
pub mod ingress;
pub mod list;
pub mod node_pool;
pub mod tuning_config;

pub use autoscaler::{AutoscalerResourceLimits, ClusterAutoscaler};
pub use cluster::{Cluster, ClusterAws, ClusterNodes, ClusterState, Dns};
pub use dns_domain::DnsDomain;
pub use group::Group;
pub use ingress::Ingress;
pub use list::Page;
pub use node_pool::{AwsNodePool, NodePool, NodePoolAutoscaling, Taint};
pub use tuning_config::TuningConfig;

use serde::{Deserialize, Serialize};

/// `{"id": ...}` reference used for regions, versions, machine types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl IdRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()) }
    }
}

/// `{"enabled": ...}` toggle block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toggle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// `{"url": ...}` endpoint block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
