use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Endpoint, IdRef, Toggle};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ClusterState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<IdRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_provider: Option<IdRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<IdRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<IdRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypershift: Option<Toggle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ccs: Option<Toggle>,
    #[serde(rename = "multiAZ", default, skip_serializing_if = "Option::is_none")]
    pub multi_az: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<Endpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console: Option<Endpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<Dns>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<ClusterNodes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<ClusterAws>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<jiff::Timestamp>,
}

impl Cluster {
    /// True for hosted-control-plane clusters.
    pub fn is_hosted_control_plane(&self) -> bool {
        self.hypershift
            .as_ref()
            .and_then(|h| h.enabled)
            .unwrap_or(false)
    }
}

/// Provisioning state reported by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterState {
    Validating,
    Waiting,
    Pending,
    Installing,
    Ready,
    Error,
    Hibernating,
    PoweringDown,
    Resuming,
    Uninstalling,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ClusterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClusterState::Validating => "validating",
            ClusterState::Waiting => "waiting",
            ClusterState::Pending => "pending",
            ClusterState::Installing => "installing",
            ClusterState::Ready => "ready",
            ClusterState::Error => "error",
            ClusterState::Hibernating => "hibernating",
            ClusterState::PoweringDown => "powering_down",
            ClusterState::Resuming => "resuming",
            ClusterState::Uninstalling => "uninstalling",
            ClusterState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dns {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_domain: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterNodes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_machine_type: Option<IdRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_zones: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterAws {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_link: Option<bool>,
}
