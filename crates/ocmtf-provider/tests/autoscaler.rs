mod common;

use common::{context, error_details, mount_ready_cluster, request_count, CLUSTER_ID};
use ocmtf_core::Attr;
use ocmtf_provider::resources::autoscaler::{AutoscalerState, ClusterAutoscalerKind, ResourceLimits};
use ocmtf_provider::{Reconciler, StateChange};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const AUTOSCALER: &str = "/api/clusters_mgmt/v1/clusters/123/autoscaler";

fn plan() -> AutoscalerState {
    AutoscalerState {
        cluster: Attr::Known(CLUSTER_ID.to_string()),
        max_pod_grace_period: Attr::Known(600),
        max_node_provision_time: Attr::Known("15m".to_string()),
        resource_limits: Attr::Known(ResourceLimits {
            max_nodes_total: Attr::Known(10),
        }),
        ..Default::default()
    }
}

fn reconciler(server: &MockServer) -> Reconciler<ClusterAutoscalerKind> {
    Reconciler::new(ClusterAutoscalerKind::new(context(server)))
}

#[tokio::test]
async fn create_patches_the_existing_autoscaler() {
    let server = MockServer::start().await;
    mount_ready_cluster(&server, true).await;
    Mock::given(method("PATCH"))
        .and(path(AUTOSCALER))
        .and(body_json(json!({
            "max_pod_grace_period": 600,
            "max_node_provision_time": "15m",
            "resource_limits": {"max_nodes_total": 10},
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "ClusterAutoscaler",
            "max_pod_grace_period": 600,
            "pod_priority_threshold": -10,
            "max_node_provision_time": "15m",
            "resource_limits": {"max_nodes_total": 10},
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = reconciler(&server).create(plan()).await;
    assert!(resp.diagnostics.is_empty(), "{:?}", resp.diagnostics);
    let state = resp.new_state().unwrap();
    assert_eq!(state.cluster, Attr::Known("123".to_string()));
    assert_eq!(state.pod_priority_threshold, Attr::Known(-10));
}

#[tokio::test]
async fn create_failure_names_the_cluster() {
    let server = MockServer::start().await;
    mount_ready_cluster(&server, true).await;
    Mock::given(method("PATCH"))
        .and(path(AUTOSCALER))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let resp = reconciler(&server).create(plan()).await;
    let details = error_details(&resp.diagnostics);
    assert_eq!(details.len(), 1);
    assert!(details[0]
        .contains("Failed building cluster autoscaler state for cluster '123': status is 500"));
}

#[tokio::test]
async fn provision_time_must_be_a_positive_duration() {
    let server = MockServer::start().await;
    let r = reconciler(&server);

    for bad in ["0s", "abc", "-5m"] {
        let resp = r
            .create(AutoscalerState {
                max_node_provision_time: Attr::Known(bad.to_string()),
                ..plan()
            })
            .await;
        let errors: Vec<_> = resp.diagnostics.errors().collect();
        assert_eq!(errors.len(), 1, "{bad}");
        assert_eq!(errors[0].summary, "Invalid max_node_provision_time");
    }
    assert_eq!(request_count(&server).await, 0);

    let schema = ocmtf_provider::resources::autoscaler::schema();
    for good in ["10m", "1h", "30s"] {
        let candidate = AutoscalerState {
            max_node_provision_time: Attr::Known(good.to_string()),
            ..plan()
        };
        assert!(schema.check_policies(&candidate).is_empty(), "{good}");
    }
}

#[tokio::test]
async fn blank_cluster_is_rejected() {
    let server = MockServer::start().await;
    let resp = reconciler(&server)
        .create(AutoscalerState {
            cluster: Attr::Known("  ".to_string()),
            ..plan()
        })
        .await;
    let details = error_details(&resp.diagnostics);
    assert_eq!(details, vec!["cluster ID may not be empty/blank string".to_string()]);
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn update_sends_nested_limit_change() {
    let server = MockServer::start().await;
    let remote = json!({
        "max_pod_grace_period": 600,
        "max_node_provision_time": "15m",
        "resource_limits": {"max_nodes_total": 10},
    });
    Mock::given(method("GET"))
        .and(path(AUTOSCALER))
        .respond_with(ResponseTemplate::new(200).set_body_json(remote))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(AUTOSCALER))
        .and(body_json(json!({"resource_limits": {"max_nodes_total": 20}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "max_pod_grace_period": 600,
            "max_node_provision_time": "15m",
            "resource_limits": {"max_nodes_total": 20},
        })))
        .expect(1)
        .mount(&server)
        .await;

    let next = AutoscalerState {
        resource_limits: Attr::Known(ResourceLimits {
            max_nodes_total: Attr::Known(20),
        }),
        ..plan()
    };
    let resp = reconciler(&server).update(plan(), next).await;
    assert!(resp.diagnostics.is_empty(), "{:?}", resp.diagnostics);
    assert_eq!(
        resp.new_state().unwrap().resource_limits,
        Attr::Known(ResourceLimits {
            max_nodes_total: Attr::Known(20)
        })
    );
}

#[tokio::test]
async fn moving_to_another_cluster_is_rejected() {
    let server = MockServer::start().await;
    let next = AutoscalerState {
        cluster: Attr::Known("456".to_string()),
        ..plan()
    };
    let resp = reconciler(&server).update(plan(), next).await;
    let details = error_details(&resp.diagnostics);
    assert_eq!(
        details,
        vec!["Attribute cluster, cannot be changed from \"123\" to \"456\"".to_string()]
    );
}

#[tokio::test]
async fn delete_only_forgets_the_autoscaler() {
    let server = MockServer::start().await;
    let resp = reconciler(&server).delete(plan()).await;
    assert_eq!(resp.state, StateChange::Removed);
    let warnings: Vec<_> = resp.diagnostics.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].summary, "Cannot delete Hosted CP cluster autoscaler");
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn import_reads_by_cluster() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(AUTOSCALER))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"max_pod_grace_period": 300})))
        .mount(&server)
        .await;

    let resp = reconciler(&server).import_state("123").await;
    let state = resp.new_state().unwrap();
    assert_eq!(state.cluster, Attr::Known("123".to_string()));
    assert_eq!(state.max_pod_grace_period, Attr::Known(300));
    assert_eq!(state.resource_limits, Attr::Null);

    let resp = reconciler(&server).import_state("123,extra").await;
    assert!(resp.has_errors());
}
