//! Hosted-control-plane clusters.

use std::collections::BTreeMap;
use std::time::Duration;

use ocmtf_core::models::{Cluster, ClusterAws, ClusterNodes, IdRef, Toggle};
use ocmtf_core::{paths, Attr};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProviderError;
use crate::import::parse_id;
use crate::reconcile::{self, Populate, Violation};
use crate::resource::{BoxFuture, DeleteOutcome, Fetched, OcmContext, ResourceKind, Target};
use crate::schema::{Patch, Schema};

pub const TYPE_NAME: &str = "cluster";

/// Property keys the provider owns.
pub const RESERVED_PROPERTIES: [&str; 3] = ["rosa_creator_arn", "rosa_tf_version", "rosa_tf_commit"];
const TF_VERSION_PROPERTY: &str = "rosa_tf_version";

const VERSION_PREFIX: &str = "openshift-v";
const DEFAULT_WAIT_MINUTES: i64 = 60;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HcpClusterState {
    #[serde(default)]
    pub id: Attr<String>,
    #[serde(default)]
    pub state: Attr<String>,
    #[serde(default)]
    pub name: Attr<String>,
    #[serde(default)]
    pub cloud_region: Attr<String>,
    #[serde(default)]
    pub aws_account_id: Attr<String>,
    #[serde(default)]
    pub aws_billing_account_id: Attr<String>,
    #[serde(default)]
    pub aws_subnet_ids: Attr<Vec<String>>,
    #[serde(default)]
    pub availability_zones: Attr<Vec<String>>,
    #[serde(default)]
    pub compute_machine_type: Attr<String>,
    #[serde(default)]
    pub replicas: Attr<i64>,
    #[serde(default)]
    pub private: Attr<bool>,
    #[serde(default)]
    pub version: Attr<String>,
    #[serde(default)]
    pub properties: Attr<BTreeMap<String, String>>,
    #[serde(default)]
    pub ocm_properties: Attr<BTreeMap<String, String>>,
    #[serde(default)]
    pub api_url: Attr<String>,
    #[serde(default)]
    pub console_url: Attr<String>,
    #[serde(default)]
    pub domain: Attr<String>,
    #[serde(default)]
    pub wait_for_create_complete: Attr<bool>,
    #[serde(default)]
    pub wait_timeout_minutes: Attr<i64>,
    #[serde(default)]
    pub disable_waiting_in_destroy: Attr<bool>,
}

impl HcpClusterState {
    fn wait_timeout(&self) -> Duration {
        let minutes = self
            .wait_timeout_minutes
            .known()
            .copied()
            .unwrap_or(DEFAULT_WAIT_MINUTES);
        Duration::from_secs(u64::try_from(minutes).unwrap_or(0).saturating_mul(60))
    }
}

impl Populate<Cluster> for HcpClusterState {
    fn populate(&mut self, remote: &Cluster) {
        self.id = remote.id.clone().into();
        self.name = remote.name.clone().into();
        self.state = remote.state.as_ref().map(|s| s.to_string()).into();
        self.cloud_region = remote.region.as_ref().and_then(|r| r.id.clone()).into();
        self.version = remote
            .version
            .as_ref()
            .and_then(|v| v.id.as_deref())
            .map(|id| id.strip_prefix(VERSION_PREFIX).unwrap_or(id).to_string())
            .into();

        let aws = remote.aws.clone().unwrap_or_default();
        self.aws_account_id = aws.account_id.into();
        self.aws_billing_account_id = aws.billing_account_id.into();
        self.aws_subnet_ids = aws.subnet_ids.filter(|s| !s.is_empty()).into();
        self.private = aws.private_link.into();

        let nodes = remote.nodes.clone().unwrap_or_default();
        self.replicas = nodes.compute.into();
        self.compute_machine_type = nodes.compute_machine_type.and_then(|m| m.id).into();
        self.availability_zones = nodes.availability_zones.filter(|z| !z.is_empty()).into();

        self.api_url = remote.api.as_ref().and_then(|a| a.url.clone()).into();
        self.console_url = remote.console.as_ref().and_then(|c| c.url.clone()).into();
        self.domain = match (&remote.name, remote.dns.as_ref().and_then(|d| d.base_domain.as_ref())) {
            (Some(name), Some(base)) => Attr::Known(format!("{name}.{base}")),
            _ => Attr::Null,
        };

        let all = remote.properties.clone().unwrap_or_default();
        let own: BTreeMap<String, String> = all
            .iter()
            .filter(|(k, _)| !RESERVED_PROPERTIES.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        self.properties = if own.is_empty() {
            Attr::Null
        } else {
            Attr::Known(own)
        };
        self.ocm_properties = if all.is_empty() {
            Attr::Null
        } else {
            Attr::Known(all)
        };
    }
}

pub fn schema() -> Schema<HcpClusterState> {
    Schema::<HcpClusterState>::builder(TYPE_NAME)
        .computed("id", |s| &s.id)
        .computed("state", |s| &s.state)
        .computed("api_url", |s| &s.api_url)
        .computed("console_url", |s| &s.console_url)
        .computed("domain", |s| &s.domain)
        .computed("availability_zones", |s| &s.availability_zones)
        .computed("ocm_properties", |s| &s.ocm_properties)
        .immutable("name", |s| &s.name)
        .immutable("cloud_region", |s| &s.cloud_region)
        .immutable("aws_account_id", |s| &s.aws_account_id)
        .immutable("aws_subnet_ids", |s| &s.aws_subnet_ids)
        .immutable("compute_machine_type", |s| &s.compute_machine_type)
        .from_state()
        .immutable("private", |s| &s.private)
        .from_state()
        .immutable("version", |s| &s.version)
        .from_state()
        .mutable("aws_billing_account_id", |s| &s.aws_billing_account_id)
        .at("aws.billing_account_id")
        .from_state()
        .mutable("replicas", |s| &s.replicas)
        .at("nodes.compute")
        .from_state()
        .mutable("properties", |s| &s.properties)
        .encode_with(|s| Ok(Some(properties_body(&s.properties))))
        .clears_to(properties_body(&Attr::Null))
        .policy(check_properties)
        .policy(check_wait_timeout)
        .build()
}

/// User properties plus the provider's own version marker.
fn properties_body(properties: &Attr<BTreeMap<String, String>>) -> Value {
    let mut body: serde_json::Map<String, Value> = properties
        .known()
        .into_iter()
        .flatten()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    body.insert(
        TF_VERSION_PROPERTY.to_string(),
        Value::String(env!("CARGO_PKG_VERSION").to_string()),
    );
    Value::Object(body)
}

fn check_properties(plan: &HcpClusterState) -> Result<(), Violation> {
    let Some(properties) = plan.properties.known() else {
        return Ok(());
    };
    match properties
        .keys()
        .find(|k| RESERVED_PROPERTIES.contains(&k.as_str()))
    {
        Some(key) => Err(Violation::on(
            "properties",
            "Invalid property key",
            format!("Can not override reserved properties keys. {key} is a reserved property key"),
        )),
        None => Ok(()),
    }
}

fn check_wait_timeout(plan: &HcpClusterState) -> Result<(), Violation> {
    match plan.wait_timeout_minutes.known() {
        Some(minutes) if *minutes <= 0 => Err(Violation::on(
            "wait_timeout_minutes",
            "Invalid wait timeout",
            format!("Attribute wait_timeout_minutes must be positive, got {minutes}"),
        )),
        _ => Ok(()),
    }
}

fn build_cluster(plan: &HcpClusterState) -> Result<Cluster, serde_json::Error> {
    let properties: BTreeMap<String, String> =
        serde_json::from_value(properties_body(&plan.properties))?;
    Ok(Cluster {
        name: plan.name.known().cloned(),
        product: Some(IdRef::new("rosa")),
        cloud_provider: Some(IdRef::new("aws")),
        region: plan.cloud_region.as_str().map(IdRef::new),
        version: plan
            .version
            .as_str()
            .map(|v| IdRef::new(format!("{VERSION_PREFIX}{v}"))),
        hypershift: Some(Toggle {
            enabled: Some(true),
        }),
        ccs: Some(Toggle {
            enabled: Some(true),
        }),
        multi_az: Some(true),
        nodes: Some(ClusterNodes {
            compute: plan.replicas.known().copied(),
            compute_machine_type: plan.compute_machine_type.as_str().map(IdRef::new),
            availability_zones: plan.availability_zones.known().cloned(),
        }),
        aws: Some(ClusterAws {
            account_id: plan.aws_account_id.known().cloned(),
            billing_account_id: plan.aws_billing_account_id.known().cloned(),
            subnet_ids: plan.aws_subnet_ids.known().cloned(),
            private_link: plan.private.known().copied(),
        }),
        properties: Some(properties),
        ..Default::default()
    })
}

pub struct HcpCluster {
    ctx: OcmContext,
    schema: Schema<HcpClusterState>,
}

impl HcpCluster {
    pub fn new(ctx: OcmContext) -> Self {
        Self {
            ctx,
            schema: schema(),
        }
    }

    fn target(state: &HcpClusterState) -> Result<Target, ProviderError> {
        let id = state.id.require("id")?;
        Ok(Target {
            label: Self::LABEL,
            id: id.clone(),
            cluster: None,
            path: paths::cluster(id),
        })
    }
}

impl ResourceKind for HcpCluster {
    type State = HcpClusterState;

    const TYPE_NAME: &'static str = TYPE_NAME;
    const LABEL: &'static str = "cluster";

    fn schema(&self) -> &Schema<HcpClusterState> {
        &self.schema
    }

    fn create<'a>(
        &'a self,
        plan: &'a HcpClusterState,
    ) -> BoxFuture<'a, Result<HcpClusterState, ProviderError>> {
        Box::pin(async move {
            let name = plan.name.require("name")?;
            let body = build_cluster(plan)?;

            tracing::info!(name = %name, "creating cluster");
            let mut remote: Cluster = self
                .ctx
                .client
                .post(paths::CLUSTERS, &body)
                .await
                .map_err(|e| {
                    ProviderError::CreateFailed(format!(
                        "Can't create cluster with name '{name}': {e}"
                    ))
                })?;

            if plan.wait_for_create_complete == Attr::Known(true) {
                let id = remote.id.clone().unwrap_or_default();
                remote = self
                    .ctx
                    .waiter
                    .wait_for_ready(&id, plan.wait_timeout())
                    .await
                    .map_err(|e| {
                        ProviderError::CreateFailed(format!(
                            "Cluster '{id}' was created but did not become ready: {e}"
                        ))
                    })?;
            }
            Ok(reconcile::populate(plan.clone(), &remote))
        })
    }

    fn read<'a>(
        &'a self,
        state: &'a HcpClusterState,
    ) -> BoxFuture<'a, Result<Fetched<HcpClusterState>, ProviderError>> {
        Box::pin(async move {
            let target = Self::target(state)?;
            let remote: Fetched<Cluster> = self.ctx.fetch(&target.path).await.map_err(|e| {
                ProviderError::ReadFailed(format!(
                    "Can't find cluster with identifier '{}': {e}",
                    target.id
                ))
            })?;
            Ok(remote.map(|c| reconcile::populate(state.clone(), &c)))
        })
    }

    fn update<'a>(
        &'a self,
        state: &'a HcpClusterState,
        plan: &'a HcpClusterState,
        patch: &'a Patch,
    ) -> BoxFuture<'a, Result<HcpClusterState, ProviderError>> {
        Box::pin(async move {
            let target = Self::target(state)?;
            if let Err(e) = self.ctx.client.get::<Cluster>(&target.path).await {
                return Err(ProviderError::UpdateFailed(format!(
                    "Can't find cluster with identifier '{}': {e}",
                    target.id
                )));
            }
            let remote: Cluster = reconcile::apply_patch(&self.ctx.client, &target, patch).await?;
            Ok(reconcile::populate(plan.clone(), &remote))
        })
    }

    fn delete<'a>(
        &'a self,
        state: &'a HcpClusterState,
    ) -> BoxFuture<'a, Result<DeleteOutcome, ProviderError>> {
        Box::pin(async move {
            let target = Self::target(state)?;
            tracing::info!(cluster = %target.id, "deleting cluster");
            self.ctx.client.delete(&target.path).await.map_err(|e| {
                ProviderError::DeleteFailed(format!(
                    "Can't delete cluster with identifier '{}': {e}",
                    target.id
                ))
            })?;

            if state.disable_waiting_in_destroy != Attr::Known(true) {
                self.ctx
                    .waiter
                    .wait_for_deletion(&target.id, state.wait_timeout())
                    .await
                    .map_err(|e| {
                        ProviderError::DeleteFailed(format!(
                            "Cluster '{}' is still being deleted: {e}",
                            target.id
                        ))
                    })?;
            }
            Ok(DeleteOutcome::Deleted)
        })
    }

    fn import_state(&self, id: &str) -> Result<HcpClusterState, ProviderError> {
        let [cluster] = parse_id::<1>(id, "Cluster", "<cluster_id>")?;
        Ok(HcpClusterState {
            id: Attr::Known(cluster.to_string()),
            ..Default::default()
        })
    }
}
