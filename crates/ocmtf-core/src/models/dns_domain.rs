use serde::{Deserialize, Serialize};

pub const DNS_DOMAIN_KIND: &str = "DNSDomain";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsDomain {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// `classic` or `hcp`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_arch: Option<String>,
}
