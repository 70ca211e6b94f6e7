use ocmtf_core::models::TuningConfig;
use ocmtf_core::{paths, Attr};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::check_cluster_id;
use crate::error::ProviderError;
use crate::import::parse_id;
use crate::reconcile::{self, Populate, Violation};
use crate::resource::{BoxFuture, DeleteOutcome, Fetched, OcmContext, ResourceKind, Target};
use crate::schema::{Patch, Schema};

pub const TYPE_NAME: &str = "tuning_config";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TuningConfigState {
    #[serde(default)]
    pub id: Attr<String>,
    #[serde(default)]
    pub cluster: Attr<String>,
    #[serde(default)]
    pub name: Attr<String>,
    /// The tuned profile as a JSON document.
    #[serde(default)]
    pub spec: Attr<String>,
}

impl Populate<TuningConfig> for TuningConfigState {
    fn populate(&mut self, remote: &TuningConfig) {
        self.id = remote.id.clone().into();
        self.name = remote.name.clone().into();
        self.spec = match &remote.spec {
            // Keep the planned text when it says the same thing, so
            // formatting alone never shows up as a change.
            Some(spec) if self.spec.as_str().and_then(parse_spec) == Some(spec.clone()) => {
                self.spec.clone()
            }
            Some(spec) => Attr::Known(spec.to_string()),
            None => Attr::Null,
        };
    }
}

fn parse_spec(raw: &str) -> Option<Value> {
    serde_json::from_str(raw).ok()
}

pub fn schema() -> Schema<TuningConfigState> {
    Schema::<TuningConfigState>::builder(TYPE_NAME)
        .computed("id", |s| &s.id)
        .immutable("cluster", |s| &s.cluster)
        .immutable("name", |s| &s.name)
        .mutable("spec", |s| &s.spec)
        .encode_with(encode_spec)
        .compare_with(|a, b| same_spec(&a.spec, &b.spec))
        .policy(|plan| check_cluster_id(&plan.cluster))
        .policy(check_spec)
        .build()
}

/// Equal when both parse to the same document, whatever the formatting.
fn same_spec(a: &Attr<String>, b: &Attr<String>) -> bool {
    match (a.as_str().and_then(parse_spec), b.as_str().and_then(parse_spec)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn encode_spec(s: &TuningConfigState) -> Result<Option<Value>, serde_json::Error> {
    s.spec.as_str().map(serde_json::from_str).transpose()
}

fn check_spec(plan: &TuningConfigState) -> Result<(), Violation> {
    match plan.spec.as_str() {
        Some(raw) => serde_json::from_str::<Value>(raw).map(|_| ()).map_err(|e| {
            Violation::on(
                "spec",
                "Invalid tuning config spec",
                format!("Attribute spec must be a valid JSON document: {e}"),
            )
        }),
        None => Ok(()),
    }
}

pub struct TuningConfigKind {
    ctx: OcmContext,
    schema: Schema<TuningConfigState>,
}

impl TuningConfigKind {
    pub fn new(ctx: OcmContext) -> Self {
        Self {
            ctx,
            schema: schema(),
        }
    }

    fn target(state: &TuningConfigState) -> Result<Target, ProviderError> {
        let cluster = state.cluster.require("cluster")?;
        let id = state.id.require("id")?;
        Ok(Target {
            label: Self::LABEL,
            id: id.clone(),
            cluster: Some(cluster.clone()),
            path: paths::tuning_config(cluster, id),
        })
    }
}

impl ResourceKind for TuningConfigKind {
    type State = TuningConfigState;

    const TYPE_NAME: &'static str = TYPE_NAME;
    const LABEL: &'static str = "tuning config";

    fn schema(&self) -> &Schema<TuningConfigState> {
        &self.schema
    }

    fn create<'a>(
        &'a self,
        plan: &'a TuningConfigState,
    ) -> BoxFuture<'a, Result<TuningConfigState, ProviderError>> {
        Box::pin(async move {
            let cluster = plan.cluster.require("cluster")?;
            self.ctx.wait_for_cluster(cluster).await?;

            let body = TuningConfig {
                name: plan.name.known().cloned(),
                spec: plan.spec.as_str().and_then(parse_spec),
                ..Default::default()
            };
            tracing::info!(cluster = %cluster, name = plan.name.str_or_empty(), "creating tuning config");
            let created: TuningConfig = self
                .ctx
                .client
                .post(&paths::tuning_configs(cluster), &body)
                .await
                .map_err(|e| {
                    ProviderError::CreateFailed(format!(
                        "Failed building tuning config for cluster '{cluster}': {e}"
                    ))
                })?;
            Ok(reconcile::populate(plan.clone(), &created))
        })
    }

    fn read<'a>(
        &'a self,
        state: &'a TuningConfigState,
    ) -> BoxFuture<'a, Result<Fetched<TuningConfigState>, ProviderError>> {
        Box::pin(async move {
            let target = Self::target(state)?;
            let remote: Fetched<TuningConfig> =
                self.ctx.fetch(&target.path).await.map_err(|e| {
                    ProviderError::ReadFailed(format!(
                        "Failed to fetch tuning config '{}' for cluster '{}': {e}",
                        target.id,
                        state.cluster.str_or_empty()
                    ))
                })?;
            Ok(remote.map(|r| reconcile::populate(state.clone(), &r)))
        })
    }

    fn update<'a>(
        &'a self,
        state: &'a TuningConfigState,
        plan: &'a TuningConfigState,
        patch: &'a Patch,
    ) -> BoxFuture<'a, Result<TuningConfigState, ProviderError>> {
        Box::pin(async move {
            let target = Self::target(state)?;
            if let Err(e) = self.ctx.client.get::<TuningConfig>(&target.path).await {
                return Err(ProviderError::UpdateFailed(format!(
                    "Cannot find tuning config with identifier '{}' for cluster '{}': {e}",
                    target.id,
                    state.cluster.str_or_empty()
                )));
            }
            let remote: TuningConfig =
                reconcile::apply_patch(&self.ctx.client, &target, patch).await?;
            Ok(reconcile::populate(plan.clone(), &remote))
        })
    }

    fn delete<'a>(
        &'a self,
        state: &'a TuningConfigState,
    ) -> BoxFuture<'a, Result<DeleteOutcome, ProviderError>> {
        Box::pin(async move {
            let target = Self::target(state)?;
            tracing::info!(cluster = state.cluster.str_or_empty(), id = %target.id, "deleting tuning config");
            self.ctx.client.delete(&target.path).await.map_err(|e| {
                ProviderError::DeleteFailed(format!(
                    "Failed to delete tuning config '{}' for cluster '{}': {e}",
                    target.id,
                    state.cluster.str_or_empty()
                ))
            })?;
            Ok(DeleteOutcome::Deleted)
        })
    }

    fn import_state(&self, id: &str) -> Result<TuningConfigState, ProviderError> {
        let [cluster, config] =
            parse_id::<2>(id, "Tuning config", "<cluster_id>,<tuning_config_id>")?;
        Ok(TuningConfigState {
            cluster: Attr::Known(cluster.to_string()),
            id: Attr::Known(config.to_string()),
            ..Default::default()
        })
    }
}
