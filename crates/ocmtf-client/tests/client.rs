use ocmtf_client::{ApiError, ClientConfig, OcmClient, OcmError};
use ocmtf_core::models::{DnsDomain, NodePool};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, token: Option<&str>) -> OcmClient {
    OcmClient::new(&ClientConfig {
        url: server.uri(),
        token: token.map(String::from),
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn rejects_url_without_scheme() {
    let err = OcmClient::new(&ClientConfig {
        url: "api.openshift.com".into(),
        ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, OcmError::InvalidUrl(_)));
}

#[test]
fn api_error_renders_all_parts() {
    let err = ApiError::from_body(
        404,
        br#"{
            "kind": "Error",
            "id": "404",
            "href": "/api/clusters_mgmt/v1/errors/404",
            "code": "CLUSTERS-MGMT-404",
            "reason": "Cluster '123' not found",
            "operation_id": "96ae3bc2"
        }"#,
    );
    assert_eq!(
        err.to_string(),
        "status is 404, identifier is '404', code is 'CLUSTERS-MGMT-404' and \
         operation identifier is '96ae3bc2': Cluster '123' not found"
    );
}

#[test]
fn api_error_with_empty_body_is_just_the_status() {
    assert_eq!(ApiError::from_body(500, b"{}").to_string(), "status is 500");
    assert_eq!(ApiError::from_body(502, b"<html>").to_string(), "status is 502");
}

#[tokio::test]
async fn get_sends_token_and_decodes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/clusters_mgmt/v1/dns_domains/my.domain"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "DNSDomain",
            "id": "my.domain",
            "cluster_arch": "classic"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("secret"));
    let domain: DnsDomain = client
        .get("/api/clusters_mgmt/v1/dns_domains/my.domain")
        .await
        .unwrap();
    assert_eq!(domain.id.as_deref(), Some("my.domain"));
    assert_eq!(domain.cluster_arch.as_deref(), Some("classic"));
}

#[tokio::test]
async fn not_found_is_flagged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client
        .get::<NodePool>("/api/clusters_mgmt/v1/clusters/c/node_pools/p")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn patch_sends_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/clusters_mgmt/v1/clusters/c/node_pools/p"))
        .and(body_json(json!({"replicas": 3})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "p", "replicas": 3})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let pool: NodePool = client
        .patch(
            "/api/clusters_mgmt/v1/clusters/c/node_pools/p",
            &json!({"replicas": 3}),
        )
        .await
        .unwrap();
    assert_eq!(pool.replicas, Some(3));
}

#[tokio::test]
async fn delete_surfaces_backend_failure() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "kind": "Error",
            "reason": "last pool"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client
        .delete("/api/clusters_mgmt/v1/clusters/c/node_pools/p")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "status is 400: last pool");
}

#[tokio::test]
async fn list_all_walks_pages() {
    let server = MockServer::start().await;
    let first: Vec<_> = (0..100).map(|i| json!({"id": format!("p{i}")})).collect();
    Mock::given(method("GET"))
        .and(path("/api/clusters_mgmt/v1/clusters/c/node_pools"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "NodePoolList", "page": 1, "size": 100, "total": 101, "items": first
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/clusters_mgmt/v1/clusters/c/node_pools"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "NodePoolList", "page": 2, "size": 1, "total": 101,
            "items": [{"id": "last"}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let pools: Vec<NodePool> = client
        .list_all("/api/clusters_mgmt/v1/clusters/c/node_pools")
        .await
        .unwrap();
    assert_eq!(pools.len(), 101);
    assert_eq!(pools[100].id.as_deref(), Some("last"));
}
