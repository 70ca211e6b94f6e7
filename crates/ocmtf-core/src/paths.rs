//! clusters_mgmt v1 URL conventions.
//!
//! Pure string functions. These define where each entity lives relative to
//! the API root.

pub const CLUSTERS: &str = "/api/clusters_mgmt/v1/clusters";

pub const DNS_DOMAINS: &str = "/api/clusters_mgmt/v1/dns_domains";

pub fn cluster(cluster_id: &str) -> String {
    format!("{CLUSTERS}/{cluster_id}")
}

pub fn node_pools(cluster_id: &str) -> String {
    format!("{CLUSTERS}/{cluster_id}/node_pools")
}

pub fn node_pool(cluster_id: &str, pool_id: &str) -> String {
    format!("{CLUSTERS}/{cluster_id}/node_pools/{pool_id}")
}

pub fn autoscaler(cluster_id: &str) -> String {
    format!("{CLUSTERS}/{cluster_id}/autoscaler")
}

pub fn tuning_configs(cluster_id: &str) -> String {
    format!("{CLUSTERS}/{cluster_id}/tuning_configs")
}

pub fn tuning_config(cluster_id: &str, config_id: &str) -> String {
    format!("{CLUSTERS}/{cluster_id}/tuning_configs/{config_id}")
}

pub fn ingresses(cluster_id: &str) -> String {
    format!("{CLUSTERS}/{cluster_id}/ingresses")
}

pub fn ingress(cluster_id: &str, ingress_id: &str) -> String {
    format!("{CLUSTERS}/{cluster_id}/ingresses/{ingress_id}")
}

pub fn groups(cluster_id: &str) -> String {
    format!("{CLUSTERS}/{cluster_id}/groups")
}

pub fn dns_domain(domain_id: &str) -> String {
    format!("{DNS_DOMAINS}/{domain_id}")
}
