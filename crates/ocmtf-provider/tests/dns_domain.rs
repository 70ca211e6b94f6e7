mod common;

use common::{context, error_details, not_found, request_count};
use ocmtf_core::Attr;
use ocmtf_provider::resources::{DnsDomainKind, DnsDomainState};
use ocmtf_provider::{Reconciler, StateChange};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DOMAINS: &str = "/api/clusters_mgmt/v1/dns_domains";
const DOMAIN_ID: &str = "abcd.i1.devshift.org";

fn reconciler(server: &MockServer) -> Reconciler<DnsDomainKind> {
    Reconciler::new(DnsDomainKind::new(context(server)))
}

fn stored(arch: Attr<String>) -> DnsDomainState {
    DnsDomainState {
        id: Attr::Known(DOMAIN_ID.to_string()),
        cluster_arch: arch,
    }
}

#[tokio::test]
async fn create_sends_kind_and_architecture() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DOMAINS))
        .and(body_json(json!({"kind": "DNSDomain", "cluster_arch": "hcp"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "kind": "DNSDomain",
            "id": DOMAIN_ID,
            "cluster_arch": "hcp",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let plan = DnsDomainState {
        id: Attr::Unknown,
        cluster_arch: Attr::Known("hcp".to_string()),
    };
    let resp = reconciler(&server).create(plan).await;
    assert!(resp.diagnostics.is_empty(), "{:?}", resp.diagnostics);
    assert_eq!(
        resp.new_state(),
        Some(&stored(Attr::Known("hcp".to_string())))
    );
}

#[tokio::test]
async fn unset_architecture_stays_null() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DOMAINS))
        .and(body_json(json!({"kind": "DNSDomain"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": DOMAIN_ID,
            "cluster_arch": "classic",
        })))
        .mount(&server)
        .await;

    let plan = DnsDomainState {
        id: Attr::Unknown,
        cluster_arch: Attr::Null,
    };
    let resp = reconciler(&server).create(plan).await;
    assert_eq!(resp.new_state(), Some(&stored(Attr::Null)));
}

#[tokio::test]
async fn unsupported_architecture_is_rejected() {
    let server = MockServer::start().await;
    let plan = DnsDomainState {
        id: Attr::Unknown,
        cluster_arch: Attr::Known("arm".to_string()),
    };
    let resp = reconciler(&server).create(plan).await;
    let errors: Vec<_> = resp.diagnostics.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].summary, "Invalid cluster architecture");
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn changing_architecture_is_rejected() {
    let server = MockServer::start().await;
    let resp = reconciler(&server)
        .update(
            stored(Attr::Known("classic".to_string())),
            stored(Attr::Known("hcp".to_string())),
        )
        .await;
    assert_eq!(resp.state, StateChange::Unchanged);
    assert_eq!(
        error_details(&resp.diagnostics),
        vec!["Attribute cluster_arch, cannot be changed from \"classic\" to \"hcp\"".to_string()]
    );
}

#[tokio::test]
async fn read_of_missing_domain_removes_it() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{DOMAINS}/{DOMAIN_ID}")))
        .respond_with(not_found("DNS domain not found"))
        .mount(&server)
        .await;

    let resp = reconciler(&server).read(stored(Attr::Null)).await;
    assert_eq!(resp.state, StateChange::Removed);
}

#[tokio::test]
async fn import_takes_remote_architecture() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{DOMAINS}/{DOMAIN_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": DOMAIN_ID,
            "cluster_arch": "hcp",
        })))
        .mount(&server)
        .await;

    let resp = reconciler(&server).import_state(DOMAIN_ID).await;
    assert_eq!(
        resp.new_state(),
        Some(&stored(Attr::Known("hcp".to_string())))
    );
}

#[tokio::test]
async fn delete_removes_the_domain() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{DOMAINS}/{DOMAIN_ID}")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let resp = reconciler(&server).delete(stored(Attr::Null)).await;
    assert_eq!(resp.state, StateChange::Removed);
    assert!(resp.diagnostics.is_empty());
}
