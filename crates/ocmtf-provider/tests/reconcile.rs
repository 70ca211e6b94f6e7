use std::collections::BTreeMap;

use ocmtf_core::Attr;
use ocmtf_provider::reconcile::{carry_forward, diff_mutable, settle, validate_immutable};
use ocmtf_provider::resources::machine_pool::{
    self, Autoscaling, AwsNodePoolSpec, MachinePoolState, TaintSpec,
};
use ocmtf_provider::schema::Mutability;
use serde_json::json;

fn text(s: &str) -> Attr<String> {
    Attr::Known(s.to_string())
}

fn existing_pool() -> MachinePoolState {
    MachinePoolState {
        id: text("pool1"),
        cluster: text("123"),
        name: text("pool1"),
        replicas: Attr::Known(2),
        autoscaling: Attr::Known(Autoscaling {
            enabled: Attr::Known(false),
            ..Default::default()
        }),
        labels: Attr::Known(BTreeMap::from([("role".to_string(), "gpu".to_string())])),
        availability_zone: text("us-east-1a"),
        subnet_id: text("subnet-1"),
        aws_node_pool: Attr::Known(AwsNodePoolSpec {
            instance_type: text("m5.xlarge"),
        }),
        auto_repair: Attr::Known(true),
        ..Default::default()
    }
}

#[test]
fn single_immutable_change_yields_one_violation() {
    let schema = machine_pool::schema();
    let state = existing_pool();

    let changes: Vec<(&str, MachinePoolState)> = vec![
        ("cluster", MachinePoolState { cluster: text("456"), ..state.clone() }),
        ("name", MachinePoolState { name: text("pool2"), ..state.clone() }),
        (
            "availability_zone",
            MachinePoolState { availability_zone: text("us-east-1b"), ..state.clone() },
        ),
        ("subnet_id", MachinePoolState { subnet_id: text("subnet-2"), ..state.clone() }),
        (
            "aws_node_pool.instance_type",
            MachinePoolState {
                aws_node_pool: Attr::Known(AwsNodePoolSpec { instance_type: text("m5.2xlarge") }),
                ..state.clone()
            },
        ),
    ];

    let immutable: Vec<_> = schema.names(Mutability::Immutable).collect();
    assert_eq!(immutable.len(), changes.len());

    for (field, plan) in changes {
        let violations = validate_immutable(&state, &plan, &schema);
        assert_eq!(violations.len(), 1, "changing {field}");
        assert_eq!(violations[0].field, Some(field));
        assert_eq!(violations[0].summary, "Attribute value cannot be changed");
    }
}

#[test]
fn violation_detail_shows_old_and_new() {
    let schema = machine_pool::schema();
    let state = existing_pool();
    let plan = MachinePoolState { name: text("pool2"), ..state.clone() };

    let violations = validate_immutable(&state, &plan, &schema);
    assert_eq!(
        violations[0].detail,
        "Attribute name, cannot be changed from \"pool1\" to \"pool2\""
    );
}

#[test]
fn unknown_plan_values_are_exempt() {
    let schema = machine_pool::schema();
    let state = existing_pool();
    let plan = MachinePoolState {
        name: Attr::Unknown,
        subnet_id: Attr::Unknown,
        ..state.clone()
    };
    assert!(validate_immutable(&state, &plan, &schema).is_empty());
}

#[test]
fn null_plan_against_known_state_is_a_change() {
    let schema = machine_pool::schema();
    let state = existing_pool();
    let plan = MachinePoolState { name: Attr::Null, ..state.clone() };

    let violations = validate_immutable(&state, &plan, &schema);
    assert_eq!(violations.len(), 1);
    assert!(violations[0].detail.ends_with("to <null>"));
}

#[test]
fn identical_state_and_plan_give_empty_patch() {
    let schema = machine_pool::schema();
    let state = existing_pool();
    let patch = diff_mutable(&state, &state.clone(), &schema).unwrap();
    assert!(patch.is_empty());
    assert!(patch.body.is_empty());
}

#[test]
fn diff_is_deterministic() {
    let schema = machine_pool::schema();
    let state = existing_pool();
    let plan = MachinePoolState {
        replicas: Attr::Known(5),
        ..state.clone()
    };

    let first = diff_mutable(&state, &plan, &schema).unwrap();
    let second = diff_mutable(&state, &plan, &schema).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.changed, vec!["replicas"]);
    assert_eq!(serde_json::Value::Object(first.body), json!({"replicas": 5}));
}

#[test]
fn enabling_autoscaling_patches_the_autoscaling_block() {
    let schema = machine_pool::schema();
    let state = existing_pool();
    let plan = MachinePoolState {
        replicas: Attr::Null,
        autoscaling: Attr::Known(Autoscaling {
            enabled: Attr::Known(true),
            min_replicas: Attr::Known(1),
            max_replicas: Attr::Known(3),
        }),
        ..state.clone()
    };

    assert!(validate_immutable(&state, &plan, &schema).is_empty());
    assert!(schema.check_policies(&plan).is_empty());

    let patch = diff_mutable(&state, &plan, &schema).unwrap();
    assert!(patch.contains("autoscaling"));
    assert!(!patch.contains("replicas"));
    assert_eq!(
        serde_json::Value::Object(patch.body),
        json!({"autoscaling": {"min_replica": 1, "max_replica": 3}})
    );
}

#[test]
fn maps_and_lists_compare_by_content() {
    let schema = machine_pool::schema();
    let mut state = existing_pool();
    state.taints = Attr::Known(vec![TaintSpec {
        key: "k".into(),
        value: "v".into(),
        schedule_type: "NoSchedule".into(),
    }]);

    let mut plan = state.clone();
    plan.labels = Attr::Known(BTreeMap::from([("role".to_string(), "gpu".to_string())]));
    assert!(diff_mutable(&state, &plan, &schema).unwrap().is_empty());

    plan.taints = Attr::Known(vec![TaintSpec {
        key: "k".into(),
        value: "v".into(),
        schedule_type: "NoExecute".into(),
    }]);
    let patch = diff_mutable(&state, &plan, &schema).unwrap();
    assert_eq!(patch.changed, vec!["taints"]);
    assert_eq!(
        serde_json::Value::Object(patch.body),
        json!({"taints": [{"key": "k", "value": "v", "effect": "NoExecute"}]})
    );
}

#[test]
fn dropping_labels_sends_an_empty_map() {
    let schema = machine_pool::schema();
    let state = existing_pool();
    let plan = MachinePoolState { labels: Attr::Null, ..state.clone() };

    let patch = diff_mutable(&state, &plan, &schema).unwrap();
    assert_eq!(patch.changed, vec!["labels"]);
    assert_eq!(serde_json::Value::Object(patch.body), json!({"labels": {}}));
}

#[test]
fn carry_forward_fills_computed_and_sticky_fields() {
    let schema = machine_pool::schema();
    let state = existing_pool();
    let plan = MachinePoolState {
        id: Attr::Unknown,
        availability_zone: Attr::Null,
        auto_repair: Attr::Unknown,
        replicas: Attr::Null,
        ..state.clone()
    };

    let plan = carry_forward(&state, plan, &schema).unwrap();
    assert_eq!(plan.id, text("pool1"));
    assert_eq!(plan.availability_zone, text("us-east-1a"));
    assert_eq!(plan.auto_repair, Attr::Known(true));
    // Not marked: a dropped replica count stays dropped.
    assert_eq!(plan.replicas, Attr::Null);
}

#[test]
fn settle_clears_unknowns() {
    let record = MachinePoolState {
        id: Attr::Unknown,
        autoscaling: Attr::Known(Autoscaling {
            enabled: Attr::Unknown,
            ..Default::default()
        }),
        ..existing_pool()
    };
    let settled = settle(&record).unwrap();
    assert_eq!(settled.id, Attr::Null);
    assert_eq!(settled.autoscaling.known().unwrap().enabled, Attr::Null);
    assert_eq!(settled.name, text("pool1"));
}
