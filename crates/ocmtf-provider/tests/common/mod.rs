#![allow(dead_code)]

use std::time::Duration;

use ocmtf_client::{ClientConfig, OcmClient};
use ocmtf_provider::{Diagnostics, OcmContext, Severity};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CLUSTER_ID: &str = "123";

pub fn context(server: &MockServer) -> OcmContext {
    let client = OcmClient::new(&ClientConfig {
        url: server.uri(),
        ..Default::default()
    })
    .unwrap();
    OcmContext::new(client, Duration::from_millis(10)).with_ready_timeout(Duration::from_secs(2))
}

/// Serve `GET /clusters/123` as a ready cluster.
pub async fn mount_ready_cluster(server: &MockServer, hosted: bool) {
    Mock::given(method("GET"))
        .and(path(format!("/api/clusters_mgmt/v1/clusters/{CLUSTER_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "Cluster",
            "id": CLUSTER_ID,
            "name": "my-cluster",
            "state": "ready",
            "hypershift": {"enabled": hosted},
        })))
        .mount(server)
        .await;
}

pub fn not_found(reason: &str) -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({
        "kind": "Error",
        "id": "404",
        "code": "CLUSTERS-MGMT-404",
        "reason": reason,
    }))
}

pub fn error_details(diags: &Diagnostics) -> Vec<String> {
    diags
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .map(|d| d.detail.clone())
        .collect()
}

pub async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.map_or(0, |r| r.len())
}
