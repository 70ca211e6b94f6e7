//! Resource kinds. Each module holds a state record, its field table and
//! the API hooks.

pub mod autoscaler;
pub mod cluster;
pub mod dns_domain;
pub mod groups;
pub mod ingress;
pub mod machine_pool;
pub mod tuning_config;

pub use autoscaler::{AutoscalerState, ClusterAutoscalerKind};
pub use cluster::{HcpCluster, HcpClusterState};
pub use dns_domain::{DnsDomainKind, DnsDomainState};
pub use groups::{GroupItem, Groups, GroupsState};
pub use ingress::{DefaultIngress, IngressState};
pub use machine_pool::{MachinePool, MachinePoolState};
pub use tuning_config::{TuningConfigKind, TuningConfigState};

use ocmtf_core::Attr;

use crate::reconcile::Violation;

/// Reject a cluster reference that is set but blank.
pub(crate) fn check_cluster_id(cluster: &Attr<String>) -> Result<(), Violation> {
    match cluster.as_str() {
        Some(id) if id.trim().is_empty() => Err(Violation::on(
            "cluster",
            "Invalid cluster",
            "cluster ID may not be empty/blank string",
        )),
        _ => Ok(()),
    }
}
