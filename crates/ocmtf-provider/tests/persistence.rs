use ocmtf_provider::{ProviderState, ResourceAddr, StateStore};
use serde_json::json;

#[test]
fn missing_file_loads_empty_state() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path().join("state.json"));
    let state = store.load().unwrap();
    assert_eq!(state.version, ProviderState::VERSION);
    assert!(state.resources.is_empty());
}

#[test]
fn flush_then_load_keeps_resources_apart() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path().join("nested").join("state.json"));

    let workers: ResourceAddr = "machine_pool.workers".parse().unwrap();
    let gpu: ResourceAddr = "machine_pool.gpu".parse().unwrap();
    let mut state = ProviderState::default();
    state.set(&workers, json!({"id": "workers", "replicas": 2}));
    state.set(&gpu, json!({"id": "gpu", "replicas": 1}));
    store.flush(&state).unwrap();

    assert!(store.path().exists());
    assert!(!store.path().with_extension("json.tmp").exists());

    let mut loaded = store.load().unwrap();
    assert_eq!(loaded.resources.len(), 2);
    assert_eq!(loaded.attributes(&gpu), Some(&json!({"id": "gpu", "replicas": 1})));
    assert_eq!(loaded.get(&workers).unwrap().resource_type, "machine_pool");

    loaded.remove(&workers);
    store.flush(&loaded).unwrap();
    let reloaded = store.load().unwrap();
    assert!(reloaded.get(&workers).is_none());
    assert!(reloaded.get(&gpu).is_some());
}

#[test]
fn newer_state_version_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, r#"{"version": 99, "resources": {}}"#).unwrap();

    let err = StateStore::new(&path).load().unwrap_err();
    assert!(err.to_string().contains("newer than supported version 1"));
}

#[test]
fn address_parsing() {
    let addr: ResourceAddr = "tuning_config.tuned.v2".parse().unwrap();
    assert_eq!(addr.resource_type, "tuning_config");
    assert_eq!(addr.resource_name, "tuned.v2");
    assert_eq!(addr.to_string(), "tuning_config.tuned.v2");

    for bad in ["cluster", ".name", "cluster."] {
        assert!(bad.parse::<ResourceAddr>().is_err(), "{bad}");
    }
}
