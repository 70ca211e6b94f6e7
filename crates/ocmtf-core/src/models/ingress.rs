use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A cluster ingress. Every cluster is provisioned with one default ingress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listening: Option<String>,
    /// `classic` or `nlb`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_balancer_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_selectors: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_namespaces: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_wildcard_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_namespace_ownership_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_routes_hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_routes_tls_secret_ref: Option<String>,
}
