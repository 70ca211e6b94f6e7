//! Cluster-wide autoscaler of a hosted-control-plane cluster.
//!
//! The autoscaler always exists; create and update both PATCH it, and delete
//! only forgets it.

use jiff::SignedDuration;
use ocmtf_core::models::{AutoscalerResourceLimits, ClusterAutoscaler};
use ocmtf_core::{paths, Attr};
use serde::{Deserialize, Serialize};

use super::check_cluster_id;
use crate::error::ProviderError;
use crate::import::parse_id;
use crate::reconcile::{self, Populate, Violation};
use crate::resource::{BoxFuture, DeleteOutcome, Fetched, OcmContext, ResourceKind, Target};
use crate::schema::{Patch, Schema};

pub const TYPE_NAME: &str = "cluster_autoscaler";

static NO_COUNT: Attr<i64> = Attr::Null;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoscalerState {
    #[serde(default)]
    pub cluster: Attr<String>,
    #[serde(default)]
    pub max_pod_grace_period: Attr<i64>,
    #[serde(default)]
    pub pod_priority_threshold: Attr<i64>,
    #[serde(default)]
    pub max_node_provision_time: Attr<String>,
    #[serde(default)]
    pub resource_limits: Attr<ResourceLimits>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    #[serde(default)]
    pub max_nodes_total: Attr<i64>,
}

impl Populate<ClusterAutoscaler> for AutoscalerState {
    fn populate(&mut self, remote: &ClusterAutoscaler) {
        self.max_pod_grace_period = remote.max_pod_grace_period.into();
        self.pod_priority_threshold = remote.pod_priority_threshold.into();
        self.max_node_provision_time = remote
            .max_node_provision_time
            .clone()
            .filter(|s| !s.is_empty())
            .into();
        self.resource_limits = match &remote.resource_limits {
            Some(limits) => Attr::Known(ResourceLimits {
                max_nodes_total: limits.max_nodes_total.into(),
            }),
            None => Attr::Null,
        };
    }
}

fn max_nodes_total(s: &AutoscalerState) -> &Attr<i64> {
    match &s.resource_limits {
        Attr::Known(limits) => &limits.max_nodes_total,
        _ => &NO_COUNT,
    }
}

pub fn schema() -> Schema<AutoscalerState> {
    Schema::<AutoscalerState>::builder(TYPE_NAME)
        .immutable("cluster", |s| &s.cluster)
        .mutable("max_pod_grace_period", |s| &s.max_pod_grace_period)
        .mutable("pod_priority_threshold", |s| &s.pod_priority_threshold)
        .mutable("max_node_provision_time", |s| &s.max_node_provision_time)
        .mutable("resource_limits.max_nodes_total", max_nodes_total)
        .policy(|plan| check_cluster_id(&plan.cluster))
        .policy(check_provision_time)
        .build()
}

fn check_provision_time(plan: &AutoscalerState) -> Result<(), Violation> {
    let Some(raw) = plan.max_node_provision_time.as_str() else {
        return Ok(());
    };
    match raw.parse::<SignedDuration>() {
        Ok(d) if d.is_positive() => Ok(()),
        _ => Err(Violation::on(
            "max_node_provision_time",
            "Invalid max_node_provision_time",
            format!("Value '{raw}' is not a positive duration, expected e.g. '15m' or '1h'"),
        )),
    }
}

fn build_autoscaler(plan: &AutoscalerState) -> ClusterAutoscaler {
    ClusterAutoscaler {
        max_pod_grace_period: plan.max_pod_grace_period.known().copied(),
        pod_priority_threshold: plan.pod_priority_threshold.known().copied(),
        max_node_provision_time: plan.max_node_provision_time.known().cloned(),
        resource_limits: plan
            .resource_limits
            .known()
            .map(|limits| AutoscalerResourceLimits {
                max_nodes_total: limits.max_nodes_total.known().copied(),
            }),
        ..Default::default()
    }
}

pub struct ClusterAutoscalerKind {
    ctx: OcmContext,
    schema: Schema<AutoscalerState>,
}

impl ClusterAutoscalerKind {
    pub fn new(ctx: OcmContext) -> Self {
        Self {
            ctx,
            schema: schema(),
        }
    }

    fn target(state: &AutoscalerState) -> Result<Target, ProviderError> {
        let cluster = state.cluster.require("cluster")?;
        Ok(Target {
            label: Self::LABEL,
            id: cluster.clone(),
            cluster: Some(cluster.clone()),
            path: paths::autoscaler(cluster),
        })
    }

    fn fresh(cluster: &Attr<String>, remote: &ClusterAutoscaler) -> AutoscalerState {
        let seed = AutoscalerState {
            cluster: cluster.clone(),
            ..Default::default()
        };
        reconcile::populate(seed, remote)
    }
}

impl ResourceKind for ClusterAutoscalerKind {
    type State = AutoscalerState;

    const TYPE_NAME: &'static str = TYPE_NAME;
    const LABEL: &'static str = "cluster autoscaler";

    fn schema(&self) -> &Schema<AutoscalerState> {
        &self.schema
    }

    fn create<'a>(
        &'a self,
        plan: &'a AutoscalerState,
    ) -> BoxFuture<'a, Result<AutoscalerState, ProviderError>> {
        Box::pin(async move {
            let target = Self::target(plan)?;
            self.ctx.wait_for_cluster(&target.id).await?;

            tracing::info!(cluster = %target.id, "configuring cluster autoscaler");
            let remote: ClusterAutoscaler = self
                .ctx
                .client
                .patch(&target.path, &build_autoscaler(plan))
                .await
                .map_err(|e| {
                    ProviderError::CreateFailed(format!(
                        "Failed building cluster autoscaler state for cluster '{}': {e}",
                        target.id
                    ))
                })?;
            Ok(Self::fresh(&plan.cluster, &remote))
        })
    }

    fn read<'a>(
        &'a self,
        state: &'a AutoscalerState,
    ) -> BoxFuture<'a, Result<Fetched<AutoscalerState>, ProviderError>> {
        Box::pin(async move {
            let target = Self::target(state)?;
            let remote: Fetched<ClusterAutoscaler> =
                self.ctx.fetch(&target.path).await.map_err(|e| {
                    ProviderError::ReadFailed(format!(
                        "Failed getting autoscaler for cluster '{}': {e}",
                        target.id
                    ))
                })?;
            Ok(remote.map(|r| Self::fresh(&state.cluster, &r)))
        })
    }

    fn update<'a>(
        &'a self,
        state: &'a AutoscalerState,
        _plan: &'a AutoscalerState,
        patch: &'a Patch,
    ) -> BoxFuture<'a, Result<AutoscalerState, ProviderError>> {
        Box::pin(async move {
            let target = Self::target(state)?;
            if let Err(e) = self.ctx.client.get::<ClusterAutoscaler>(&target.path).await {
                return Err(ProviderError::UpdateFailed(format!(
                    "Failed getting autoscaler for cluster '{}': {e}",
                    target.id
                )));
            }
            let remote: ClusterAutoscaler =
                reconcile::apply_patch(&self.ctx.client, &target, patch).await?;
            Ok(Self::fresh(&state.cluster, &remote))
        })
    }

    fn delete<'a>(
        &'a self,
        state: &'a AutoscalerState,
    ) -> BoxFuture<'a, Result<DeleteOutcome, ProviderError>> {
        Box::pin(async move {
            let cluster = state.cluster.str_or_empty();
            Ok(DeleteOutcome::Abandoned {
                summary: "Cannot delete Hosted CP cluster autoscaler".to_string(),
                detail: format!(
                    "Cannot delete the cluster autoscaler for cluster '{cluster}'. \
                     Hosted control plane clusters must have a cluster autoscaler. \
                     It is being removed from the state only. \
                     To resume managing the cluster autoscaler, import it again. \
                     It will be automatically deleted when the cluster is deleted."
                ),
            })
        })
    }

    fn import_state(&self, id: &str) -> Result<AutoscalerState, ProviderError> {
        let [cluster] = parse_id::<1>(id, "Cluster autoscaler", "<cluster_id>")?;
        Ok(AutoscalerState {
            cluster: Attr::Known(cluster.to_string()),
            ..Default::default()
        })
    }
}
