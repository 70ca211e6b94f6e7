mod common;

use std::collections::BTreeMap;

use common::{context, error_details, not_found, request_count, CLUSTER_ID};
use ocmtf_core::Attr;
use ocmtf_provider::resources::{HcpCluster, HcpClusterState};
use ocmtf_provider::{Reconciler, StateChange};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CLUSTERS: &str = "/api/clusters_mgmt/v1/clusters";

fn text(s: &str) -> Attr<String> {
    Attr::Known(s.to_string())
}

fn plan() -> HcpClusterState {
    HcpClusterState {
        id: Attr::Unknown,
        state: Attr::Unknown,
        name: text("my-cluster"),
        cloud_region: text("us-east-1"),
        aws_account_id: text("111122223333"),
        aws_billing_account_id: text("111122223333"),
        aws_subnet_ids: Attr::Known(vec!["subnet-1".into(), "subnet-2".into()]),
        version: text("4.15.2"),
        replicas: Attr::Known(2),
        wait_for_create_complete: Attr::Known(false),
        ..Default::default()
    }
}

fn remote(state: &str) -> serde_json::Value {
    json!({
        "kind": "Cluster",
        "id": CLUSTER_ID,
        "name": "my-cluster",
        "state": state,
        "region": {"id": "us-east-1"},
        "version": {"id": "openshift-v4.15.2"},
        "hypershift": {"enabled": true},
        "aws": {
            "account_id": "111122223333",
            "billing_account_id": "111122223333",
            "subnet_ids": ["subnet-1", "subnet-2"],
            "private_link": false,
        },
        "nodes": {
            "compute": 2,
            "compute_machine_type": {"id": "m5.xlarge"},
            "availability_zones": ["us-east-1a"],
        },
        "api": {"url": "https://api.my-cluster.example.com:443"},
        "dns": {"base_domain": "example.com"},
        "properties": {"rosa_tf_version": "0.1.0", "team": "infra"},
    })
}

fn reconciler(server: &MockServer) -> Reconciler<HcpCluster> {
    Reconciler::new(HcpCluster::new(context(server)))
}

#[tokio::test]
async fn reserved_property_is_rejected() {
    let server = MockServer::start().await;
    let mut properties = BTreeMap::new();
    properties.insert("rosa_tf_version".to_string(), "9.9.9".to_string());
    let resp = reconciler(&server)
        .create(HcpClusterState {
            properties: Attr::Known(properties),
            ..plan()
        })
        .await;
    assert_eq!(
        error_details(&resp.diagnostics),
        vec!["Can not override reserved properties keys. rosa_tf_version is a reserved property key"
            .to_string()]
    );
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn non_positive_wait_timeout_is_rejected() {
    let server = MockServer::start().await;
    let resp = reconciler(&server)
        .create(HcpClusterState {
            wait_timeout_minutes: Attr::Known(0),
            ..plan()
        })
        .await;
    assert_eq!(resp.diagnostics.errors().next().unwrap().summary, "Invalid wait timeout");
}

#[tokio::test]
async fn create_populates_computed_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CLUSTERS))
        .respond_with(ResponseTemplate::new(201).set_body_json(remote("installing")))
        .expect(1)
        .mount(&server)
        .await;

    let resp = reconciler(&server).create(plan()).await;
    assert!(resp.diagnostics.is_empty(), "{:?}", resp.diagnostics);
    let state = resp.new_state().unwrap();
    assert_eq!(state.id, text(CLUSTER_ID));
    assert_eq!(state.state, text("installing"));
    assert_eq!(state.version, text("4.15.2"));
    assert_eq!(state.domain, text("my-cluster.example.com"));
    assert_eq!(state.compute_machine_type, text("m5.xlarge"));
    assert_eq!(state.availability_zones, Attr::Known(vec!["us-east-1a".to_string()]));
    assert_eq!(state.wait_for_create_complete, Attr::Known(false));

    let own = state.properties.known().unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own["team"], "infra");
    assert_eq!(state.ocm_properties.known().unwrap().len(), 2);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["version"]["id"], "openshift-v4.15.2");
    assert_eq!(body["hypershift"]["enabled"], true);
    assert_eq!(
        body["properties"]["rosa_tf_version"],
        env!("CARGO_PKG_VERSION")
    );
}

#[tokio::test]
async fn create_waits_for_ready_when_asked() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CLUSTERS))
        .respond_with(ResponseTemplate::new(201).set_body_json(remote("pending")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{CLUSTERS}/{CLUSTER_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(remote("installing")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{CLUSTERS}/{CLUSTER_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(remote("ready")))
        .mount(&server)
        .await;

    let resp = reconciler(&server)
        .create(HcpClusterState {
            wait_for_create_complete: Attr::Known(true),
            wait_timeout_minutes: Attr::Known(1),
            ..plan()
        })
        .await;
    assert!(resp.diagnostics.is_empty(), "{:?}", resp.diagnostics);
    assert_eq!(resp.new_state().unwrap().state, text("ready"));
}

#[tokio::test]
async fn huge_wait_timeout_still_waits() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CLUSTERS))
        .respond_with(ResponseTemplate::new(201).set_body_json(remote("pending")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{CLUSTERS}/{CLUSTER_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(remote("ready")))
        .mount(&server)
        .await;

    let resp = reconciler(&server)
        .create(HcpClusterState {
            wait_for_create_complete: Attr::Known(true),
            wait_timeout_minutes: Attr::Known(i64::MAX),
            ..plan()
        })
        .await;
    assert!(resp.diagnostics.is_empty(), "{:?}", resp.diagnostics);
    assert_eq!(resp.new_state().unwrap().state, text("ready"));
}

#[tokio::test]
async fn update_patches_nested_billing_account() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{CLUSTERS}/{CLUSTER_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(remote("ready")))
        .mount(&server)
        .await;
    let mut patched = remote("ready");
    patched["aws"]["billing_account_id"] = json!("444455556666");
    Mock::given(method("PATCH"))
        .and(path(format!("{CLUSTERS}/{CLUSTER_ID}")))
        .and(body_json(json!({"aws": {"billing_account_id": "444455556666"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(patched))
        .expect(1)
        .mount(&server)
        .await;

    let state = reconciler(&server)
        .read(HcpClusterState {
            id: text(CLUSTER_ID),
            ..plan()
        })
        .await
        .new_state()
        .cloned()
        .unwrap();
    let next = HcpClusterState {
        aws_billing_account_id: text("444455556666"),
        ..state.clone()
    };
    let resp = reconciler(&server).update(state, next).await;
    assert!(resp.diagnostics.is_empty(), "{:?}", resp.diagnostics);
    assert_eq!(
        resp.new_state().unwrap().aws_billing_account_id,
        text("444455556666")
    );
}

#[tokio::test]
async fn changing_region_is_rejected() {
    let server = MockServer::start().await;
    let state = HcpClusterState {
        id: text(CLUSTER_ID),
        ..plan()
    };
    let next = HcpClusterState {
        cloud_region: text("eu-west-1"),
        ..state.clone()
    };
    let resp = reconciler(&server).update(state, next).await;
    assert_eq!(
        error_details(&resp.diagnostics),
        vec!["Attribute cloud_region, cannot be changed from \"us-east-1\" to \"eu-west-1\""
            .to_string()]
    );
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn delete_waits_until_cluster_is_gone() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{CLUSTERS}/{CLUSTER_ID}")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{CLUSTERS}/{CLUSTER_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(remote("uninstalling")))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{CLUSTERS}/{CLUSTER_ID}")))
        .respond_with(not_found("Cluster '123' not found"))
        .mount(&server)
        .await;

    let resp = reconciler(&server)
        .delete(HcpClusterState {
            id: text(CLUSTER_ID),
            ..plan()
        })
        .await;
    assert_eq!(resp.state, StateChange::Removed);
    assert!(resp.diagnostics.is_empty());
    assert_eq!(request_count(&server).await, 4);
}

#[tokio::test]
async fn delete_can_skip_waiting() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{CLUSTERS}/{CLUSTER_ID}")))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let resp = reconciler(&server)
        .delete(HcpClusterState {
            id: text(CLUSTER_ID),
            disable_waiting_in_destroy: Attr::Known(true),
            ..plan()
        })
        .await;
    assert_eq!(resp.state, StateChange::Removed);
    assert_eq!(request_count(&server).await, 1);
}
