//! Node pools of a hosted-control-plane cluster.
//!
//! Pools named `workers` or `workers-<n>` are created with the cluster.
//! Declaring one adopts the existing pool instead of creating it.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use ocmtf_core::models::{AwsNodePool, NodePool, NodePoolAutoscaling, Taint};
use ocmtf_core::{paths, Attr};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ProviderError;
use crate::import::parse_id;
use crate::reconcile::{self, Populate, Violation};
use crate::resource::{BoxFuture, DeleteOutcome, Fetched, OcmContext, ResourceKind, Target};
use crate::schema::{Patch, Schema};

pub const TYPE_NAME: &str = "machine_pool";

const NAME_PATTERN: &str = r"^[a-z]([-a-z0-9]*[a-z0-9])?$";
const DEFAULT_NAME: &str = "workers";
const RESERVED_PREFIX: &str = "worker";
const SCHEDULE_TYPES: [&str; 3] = ["NoSchedule", "PreferNoSchedule", "NoExecute"];

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(NAME_PATTERN).expect("Invalid machine pool name regex"));

static NO_TEXT: Attr<String> = Attr::Null;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachinePoolState {
    #[serde(default)]
    pub id: Attr<String>,
    #[serde(default)]
    pub cluster: Attr<String>,
    #[serde(default)]
    pub name: Attr<String>,
    #[serde(default)]
    pub replicas: Attr<i64>,
    #[serde(default)]
    pub autoscaling: Attr<Autoscaling>,
    #[serde(default)]
    pub taints: Attr<Vec<TaintSpec>>,
    #[serde(default)]
    pub labels: Attr<BTreeMap<String, String>>,
    #[serde(default)]
    pub availability_zone: Attr<String>,
    #[serde(default)]
    pub subnet_id: Attr<String>,
    #[serde(default)]
    pub aws_node_pool: Attr<AwsNodePoolSpec>,
    #[serde(default)]
    pub auto_repair: Attr<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Autoscaling {
    #[serde(default)]
    pub enabled: Attr<bool>,
    #[serde(default)]
    pub min_replicas: Attr<i64>,
    #[serde(default)]
    pub max_replicas: Attr<i64>,
}

impl Autoscaling {
    pub fn is_enabled(&self) -> bool {
        self.enabled == Attr::Known(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsNodePoolSpec {
    #[serde(default)]
    pub instance_type: Attr<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaintSpec {
    pub key: String,
    pub value: String,
    pub schedule_type: String,
}

impl TaintSpec {
    fn to_api(&self) -> Taint {
        Taint {
            key: self.key.clone(),
            value: self.value.clone(),
            effect: self.schedule_type.clone(),
        }
    }
}

impl From<&Taint> for TaintSpec {
    fn from(t: &Taint) -> Self {
        Self {
            key: t.key.clone(),
            value: t.value.clone(),
            schedule_type: t.effect.clone(),
        }
    }
}

impl Populate<NodePool> for MachinePoolState {
    fn populate(&mut self, pool: &NodePool) {
        self.id = pool.id.clone().into();
        self.name = pool.id.clone().into();

        self.aws_node_pool = match &pool.aws_node_pool {
            Some(aws) => Attr::Known(AwsNodePoolSpec {
                instance_type: aws.instance_type.clone().into(),
            }),
            None => Attr::Null,
        };

        match &pool.autoscaling {
            Some(scaling) => {
                self.autoscaling = Attr::Known(Autoscaling {
                    enabled: Attr::Known(true),
                    min_replicas: scaling.min_replica.into(),
                    max_replicas: scaling.max_replica.into(),
                });
                self.replicas = Attr::Null;
            }
            None => {
                self.autoscaling = match &self.autoscaling {
                    Attr::Known(a) if a.enabled.has_value() => Attr::Known(Autoscaling {
                        enabled: Attr::Known(false),
                        ..Default::default()
                    }),
                    Attr::Known(_) => Attr::Known(Autoscaling::default()),
                    _ => Attr::Null,
                };
                // The API omits a zero replica count; keep the planned value then.
                if let Some(replicas) = pool.replicas {
                    self.replicas = Attr::Known(replicas);
                } else if self.replicas.is_unknown() {
                    self.replicas = Attr::Null;
                }
            }
        }

        self.taints = match pool.taints.as_deref() {
            Some(taints) if !taints.is_empty() => {
                Attr::Known(taints.iter().map(TaintSpec::from).collect())
            }
            _ => Attr::Null,
        };
        self.labels = match &pool.labels {
            Some(labels) if !labels.is_empty() => Attr::Known(labels.clone()),
            _ => Attr::Null,
        };

        self.subnet_id = pool.subnet.clone().into();
        self.availability_zone = pool.availability_zone.clone().into();
        self.auto_repair = pool.auto_repair.into();
    }
}

fn instance_type(s: &MachinePoolState) -> &Attr<String> {
    match &s.aws_node_pool {
        Attr::Known(aws) => &aws.instance_type,
        _ => &NO_TEXT,
    }
}

pub fn schema() -> Schema<MachinePoolState> {
    Schema::<MachinePoolState>::builder(TYPE_NAME)
        .computed("id", |s| &s.id)
        .immutable("cluster", |s| &s.cluster)
        .immutable("name", |s| &s.name)
        .mutable("replicas", |s| &s.replicas)
        .mutable("autoscaling", |s| &s.autoscaling)
        .encode_with(encode_autoscaling)
        .mutable("taints", |s| &s.taints)
        .encode_with(encode_taints)
        .clears_to(json!([]))
        .mutable("labels", |s| &s.labels)
        .clears_to(json!({}))
        .immutable("availability_zone", |s| &s.availability_zone)
        .from_state()
        .immutable("subnet_id", |s| &s.subnet_id)
        .at("subnet")
        .from_state()
        .immutable("aws_node_pool.instance_type", instance_type)
        .from_state()
        .mutable("auto_repair", |s| &s.auto_repair)
        .from_state()
        .policy(check_name)
        .policy(check_scaling)
        .policy(check_taints)
        .policy(check_labels)
        .build()
}

fn encode_autoscaling(s: &MachinePoolState) -> Result<Option<Value>, serde_json::Error> {
    Ok(s.autoscaling.known().filter(|a| a.is_enabled()).map(|a| {
        json!({
            "min_replica": a.min_replicas,
            "max_replica": a.max_replicas,
        })
    }))
}

fn encode_taints(s: &MachinePoolState) -> Result<Option<Value>, serde_json::Error> {
    s.taints
        .known()
        .map(|taints| serde_json::to_value(taints.iter().map(TaintSpec::to_api).collect::<Vec<_>>()))
        .transpose()
}

fn check_name(plan: &MachinePoolState) -> Result<(), Violation> {
    match plan.name.as_str() {
        Some(name) if !NAME_RE.is_match(name) => Err(Violation::on(
            "name",
            "Invalid machine pool name",
            format!("Expected a valid value for 'name' matching {NAME_PATTERN}, got '{name}'"),
        )),
        _ => Ok(()),
    }
}

fn check_scaling(plan: &MachinePoolState) -> Result<(), Violation> {
    let cluster = plan.cluster.str_or_empty();
    let invalid = |msg: &str| {
        Violation::on(
            "autoscaling",
            "Cannot build machine pool",
            format!("Cannot build machine pool for cluster '{cluster}', {msg}"),
        )
    };

    let scaling = plan.autoscaling.known();
    let enabled = scaling.is_some_and(Autoscaling::is_enabled);
    if let Some(a) = scaling {
        if enabled && !a.max_replicas.has_value() {
            return Err(invalid("when enabling autoscaling, should set value for maxReplicas"));
        }
        if enabled && !a.min_replicas.has_value() {
            return Err(invalid("when enabling autoscaling, should set value for minReplicas"));
        }
        if !enabled && (a.min_replicas.has_value() || a.max_replicas.has_value()) {
            return Err(invalid(
                "when disabling autoscaling, cannot set min_replicas and/or max_replicas",
            ));
        }
    }

    let undecided = plan.replicas.is_unknown()
        || plan.autoscaling.is_unknown()
        || scaling.is_some_and(|a| a.enabled.is_unknown());
    if !undecided && enabled == plan.replicas.has_value() {
        return Err(invalid(
            "please provide a value for either the 'replicas' or 'autoscaling.enabled' \
             parameter. It is mandatory to include at least one of these parameters in the \
             resource plan",
        ));
    }
    Ok(())
}

fn check_taints(plan: &MachinePoolState) -> Result<(), Violation> {
    let Some(taints) = plan.taints.known() else {
        return Ok(());
    };
    if taints.is_empty() {
        return Err(Violation::on(
            "taints",
            "Invalid taints",
            "Attribute taints list must contain at least 1 elements",
        ));
    }
    match taints
        .iter()
        .find(|t| !SCHEDULE_TYPES.contains(&t.schedule_type.as_str()))
    {
        Some(t) => Err(Violation::on(
            "taints",
            "Invalid taints",
            format!(
                "Taint '{}' has schedule_type '{}', expected one of {}",
                t.key,
                t.schedule_type,
                SCHEDULE_TYPES.join(", ")
            ),
        )),
        None => Ok(()),
    }
}

fn check_labels(plan: &MachinePoolState) -> Result<(), Violation> {
    match plan.labels.known() {
        Some(labels) if labels.is_empty() => Err(Violation::on(
            "labels",
            "Invalid labels",
            "Attribute labels map must contain at least 1 elements",
        )),
        _ => Ok(()),
    }
}

/// `workers` or `workers-<n>`.
pub fn is_default_name(name: &str) -> bool {
    match name.strip_prefix(DEFAULT_NAME) {
        Some("") => true,
        Some(rest) => rest
            .strip_prefix('-')
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit())),
        None => false,
    }
}

fn build_node_pool(plan: &MachinePoolState) -> NodePool {
    let non_blank = |a: &Attr<String>| a.as_str().filter(|s| !s.is_empty()).map(String::from);
    NodePool {
        id: plan.name.known().cloned(),
        replicas: plan.replicas.known().copied(),
        autoscaling: plan
            .autoscaling
            .known()
            .filter(|a| a.is_enabled())
            .map(|a| NodePoolAutoscaling {
                min_replica: a.min_replicas.known().copied(),
                max_replica: a.max_replicas.known().copied(),
            }),
        aws_node_pool: instance_type(plan).known().map(|t| AwsNodePool {
            instance_type: Some(t.clone()),
        }),
        availability_zone: non_blank(&plan.availability_zone),
        subnet: non_blank(&plan.subnet_id),
        labels: plan.labels.known().cloned(),
        taints: plan
            .taints
            .known()
            .filter(|t| !t.is_empty())
            .map(|t| t.iter().map(TaintSpec::to_api).collect()),
        auto_repair: plan.auto_repair.known().copied(),
        ..Default::default()
    }
}

pub struct MachinePool {
    ctx: OcmContext,
    schema: Schema<MachinePoolState>,
}

impl MachinePool {
    pub fn new(ctx: OcmContext) -> Self {
        Self {
            ctx,
            schema: schema(),
        }
    }

    fn target(state: &MachinePoolState) -> Result<Target, ProviderError> {
        let cluster = state.cluster.require("cluster")?;
        let id = state.id.require("id")?;
        Ok(Target {
            label: Self::LABEL,
            id: id.clone(),
            cluster: Some(cluster.clone()),
            path: paths::node_pool(cluster, id),
        })
    }

    /// Take over the pool the cluster was created with.
    async fn adopt_default(
        &self,
        plan: &MachinePoolState,
        cluster: &str,
        name: &str,
    ) -> Result<MachinePoolState, ProviderError> {
        let remote: Fetched<NodePool> = self
            .ctx
            .fetch(&paths::node_pool(cluster, name))
            .await
            .map_err(|e| {
                ProviderError::ReadFailed(format!(
                    "Failed to fetch machine pool with identifier {name} for cluster {cluster}: {e}"
                ))
            })?;
        let Fetched::Found(remote) = remote else {
            return Err(ProviderError::invalid(
                "Can't create machine pool",
                format!(
                    "Can't create machine pool for cluster '{cluster}': the default machine pool \
                     '{name}' was deleted and a new machine pool with that name may not be \
                     created. Please use a different name."
                ),
            ));
        };
        tracing::info!(cluster = %cluster, pool = %name, "adopting default machine pool");

        let seed = MachinePoolState {
            id: Attr::Known(name.to_string()),
            cluster: Attr::Known(cluster.to_string()),
            ..Default::default()
        };
        let state = reconcile::populate(seed, &remote);
        let plan = reconcile::carry_forward(&state, plan.clone(), &self.schema)?;
        if let Some(v) = reconcile::validate_immutable(&state, &plan, &self.schema)
            .into_iter()
            .next()
        {
            return Err(v.into());
        }
        let patch = reconcile::diff_mutable(&state, &plan, &self.schema)?;
        self.apply(&state, &plan, &patch).await
    }

    async fn apply(
        &self,
        state: &MachinePoolState,
        plan: &MachinePoolState,
        patch: &Patch,
    ) -> Result<MachinePoolState, ProviderError> {
        let target = Self::target(state)?;
        let remote: NodePool = reconcile::apply_patch(&self.ctx.client, &target, patch).await?;
        // Replicas and autoscaling.enabled follow the plan where the API is silent.
        let mut next = plan.clone();
        next.id = state.id.clone();
        Ok(reconcile::populate(next, &remote))
    }

    async fn count_pools(&self, cluster: &str) -> Result<usize, ProviderError> {
        let pools: Vec<NodePool> = self.ctx.client.list_all(&paths::node_pools(cluster)).await?;
        Ok(pools.len())
    }
}

impl ResourceKind for MachinePool {
    type State = MachinePoolState;

    const TYPE_NAME: &'static str = TYPE_NAME;
    const LABEL: &'static str = "machine pool";

    fn schema(&self) -> &Schema<MachinePoolState> {
        &self.schema
    }

    fn create<'a>(
        &'a self,
        plan: &'a MachinePoolState,
    ) -> BoxFuture<'a, Result<MachinePoolState, ProviderError>> {
        Box::pin(async move {
            let cluster = plan.cluster.require("cluster")?;
            let name = plan.name.require("name")?;
            if name.starts_with(RESERVED_PREFIX) && !is_default_name(name) {
                return Err(ProviderError::invalid(
                    "Invalid machine pool name",
                    format!(
                        "Machine pool name '{name}' is reserved: names starting with \
                         '{RESERVED_PREFIX}' are only accepted for the default machine pools \
                         '{DEFAULT_NAME}' and '{DEFAULT_NAME}-<n>'"
                    ),
                ));
            }

            self.ctx.wait_for_cluster(cluster).await?;

            if is_default_name(name) {
                return self.adopt_default(plan, cluster, name).await;
            }

            tracing::info!(cluster = %cluster, pool = %name, "creating machine pool");
            let created: NodePool = self
                .ctx
                .client
                .post(&paths::node_pools(cluster), &build_node_pool(plan))
                .await
                .map_err(|e| {
                    ProviderError::CreateFailed(format!(
                        "Cannot create machine pool for cluster '{cluster}': {e}"
                    ))
                })?;
            Ok(reconcile::populate(plan.clone(), &created))
        })
    }

    fn read<'a>(
        &'a self,
        state: &'a MachinePoolState,
    ) -> BoxFuture<'a, Result<Fetched<MachinePoolState>, ProviderError>> {
        Box::pin(async move {
            let target = Self::target(state)?;
            let remote: Fetched<NodePool> = self.ctx.fetch(&target.path).await.map_err(|e| {
                ProviderError::ReadFailed(format!(
                    "Failed to fetch machine pool with identifier {} for cluster {}: {e}",
                    target.id,
                    state.cluster.str_or_empty()
                ))
            })?;
            Ok(remote.map(|pool| reconcile::populate(state.clone(), &pool)))
        })
    }

    fn update<'a>(
        &'a self,
        state: &'a MachinePoolState,
        plan: &'a MachinePoolState,
        patch: &'a Patch,
    ) -> BoxFuture<'a, Result<MachinePoolState, ProviderError>> {
        Box::pin(async move {
            let target = Self::target(state)?;
            if let Err(e) = self.ctx.client.get::<NodePool>(&target.path).await {
                return Err(ProviderError::UpdateFailed(format!(
                    "Cannot find machine pool with identifier '{}' for cluster '{}': {e}",
                    target.id,
                    state.cluster.str_or_empty()
                )));
            }
            self.apply(state, plan, patch).await
        })
    }

    fn delete<'a>(
        &'a self,
        state: &'a MachinePoolState,
    ) -> BoxFuture<'a, Result<DeleteOutcome, ProviderError>> {
        Box::pin(async move {
            let target = Self::target(state)?;
            let cluster = state.cluster.str_or_empty();
            tracing::info!(cluster = %cluster, pool = %target.id, "deleting machine pool");

            let Err(e) = self.ctx.client.delete(&target.path).await else {
                return Ok(DeleteOutcome::Deleted);
            };
            match self.count_pools(cluster).await {
                Ok(1) => Ok(DeleteOutcome::Abandoned {
                    summary: "Cannot delete machine pool".to_string(),
                    detail: format!(
                        "Cannot delete the last machine pool for cluster '{cluster}'. \
                         Hosted control plane clusters must have at least one machine pool. \
                         It is being removed from the state only. \
                         To resume managing this machine pool, import it again. \
                         It will be automatically deleted when the cluster is deleted."
                    ),
                }),
                _ => Err(ProviderError::DeleteFailed(format!(
                    "Cannot delete machine pool with identifier '{}' for cluster '{cluster}': {e}",
                    target.id
                ))),
            }
        })
    }

    fn import_state(&self, id: &str) -> Result<MachinePoolState, ProviderError> {
        let [cluster, pool] = parse_id::<2>(id, "Machine pool", "<cluster_id>,<machine_pool_id>")?;
        Ok(MachinePoolState {
            cluster: Attr::Known(cluster.to_string()),
            id: Attr::Known(pool.to_string()),
            ..Default::default()
        })
    }
}
