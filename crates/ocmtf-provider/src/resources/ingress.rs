//! The default ingress of a cluster.
//!
//! The API creates it with the cluster and refuses to delete it, so create
//! adopts the existing one and delete only forgets it.

use std::collections::BTreeMap;

use ocmtf_core::models::{Cluster, Ingress};
use ocmtf_core::{paths, Attr};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::check_cluster_id;
use crate::error::ProviderError;
use crate::import::parse_id;
use crate::reconcile::{self, Populate, Violation};
use crate::resource::{BoxFuture, DeleteOutcome, Fetched, OcmContext, ResourceKind, Target};
use crate::schema::{Patch, Schema};

pub const TYPE_NAME: &str = "default_ingress";

const LOAD_BALANCER_TYPES: [&str; 2] = ["classic", "nlb"];
const WILDCARD_POLICIES: [&str; 2] = ["WildcardsDisallowed", "WildcardsAllowed"];
const OWNERSHIP_POLICIES: [&str; 2] = ["Strict", "InterNamespaceAllowed"];

/// Fields hosted control planes manage themselves.
const ROUTE_FIELDS: [&str; 4] = [
    "route_selectors",
    "excluded_namespaces",
    "route_wildcard_policy",
    "route_namespace_ownership_policy",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressState {
    #[serde(default)]
    pub id: Attr<String>,
    #[serde(default)]
    pub cluster: Attr<String>,
    #[serde(default)]
    pub load_balancer_type: Attr<String>,
    #[serde(default)]
    pub route_selectors: Attr<BTreeMap<String, String>>,
    #[serde(default)]
    pub excluded_namespaces: Attr<Vec<String>>,
    #[serde(default)]
    pub route_wildcard_policy: Attr<String>,
    #[serde(default)]
    pub route_namespace_ownership_policy: Attr<String>,
    #[serde(default)]
    pub cluster_routes_hostname: Attr<String>,
    #[serde(default)]
    pub cluster_routes_tls_secret_ref: Attr<String>,
}

impl Populate<Ingress> for IngressState {
    fn populate(&mut self, remote: &Ingress) {
        self.id = remote.id.clone().into();
        self.load_balancer_type = remote.load_balancer_type.clone().into();
        self.route_selectors = remote
            .route_selectors
            .clone()
            .filter(|m| !m.is_empty())
            .into();
        self.excluded_namespaces = remote
            .excluded_namespaces
            .clone()
            .filter(|v| !v.is_empty())
            .into();
        self.route_wildcard_policy = remote.route_wildcard_policy.clone().into();
        self.route_namespace_ownership_policy =
            remote.route_namespace_ownership_policy.clone().into();
        self.cluster_routes_hostname = remote.cluster_routes_hostname.clone().into();
        self.cluster_routes_tls_secret_ref = remote.cluster_routes_tls_secret_ref.clone().into();
    }
}

pub fn schema() -> Schema<IngressState> {
    Schema::<IngressState>::builder(TYPE_NAME)
        .computed("id", |s| &s.id)
        .immutable("cluster", |s| &s.cluster)
        .mutable("load_balancer_type", |s| &s.load_balancer_type)
        .from_state()
        .mutable("route_selectors", |s| &s.route_selectors)
        .clears_to(json!({}))
        .mutable("excluded_namespaces", |s| &s.excluded_namespaces)
        .clears_to(json!([]))
        .mutable("route_wildcard_policy", |s| &s.route_wildcard_policy)
        .from_state()
        .mutable("route_namespace_ownership_policy", |s| {
            &s.route_namespace_ownership_policy
        })
        .from_state()
        .mutable("cluster_routes_hostname", |s| &s.cluster_routes_hostname)
        .mutable("cluster_routes_tls_secret_ref", |s| {
            &s.cluster_routes_tls_secret_ref
        })
        .policy(|plan| check_cluster_id(&plan.cluster))
        .policy(|plan| one_of("load_balancer_type", &plan.load_balancer_type, &LOAD_BALANCER_TYPES))
        .policy(|plan| one_of("route_wildcard_policy", &plan.route_wildcard_policy, &WILDCARD_POLICIES))
        .policy(|plan| {
            one_of(
                "route_namespace_ownership_policy",
                &plan.route_namespace_ownership_policy,
                &OWNERSHIP_POLICIES,
            )
        })
        .policy(check_cluster_routes)
        .build()
}

fn one_of(field: &'static str, value: &Attr<String>, allowed: &[&str]) -> Result<(), Violation> {
    match value.as_str() {
        Some(v) if !allowed.contains(&v) => Err(Violation::on(
            field,
            "Invalid attribute value",
            format!(
                "Attribute {field} value must be one of {allowed:?}, got: \"{v}\""
            ),
        )),
        _ => Ok(()),
    }
}

fn check_cluster_routes(plan: &IngressState) -> Result<(), Violation> {
    let hostname = &plan.cluster_routes_hostname;
    let secret = &plan.cluster_routes_tls_secret_ref;
    if hostname.is_unknown() || secret.is_unknown() {
        return Ok(());
    }
    if hostname.has_value() != secret.has_value() {
        return Err(Violation::on(
            "cluster_routes_hostname",
            "Invalid cluster routes",
            "Attributes cluster_routes_hostname and cluster_routes_tls_secret_ref must be set together",
        ));
    }
    Ok(())
}

pub struct DefaultIngress {
    ctx: OcmContext,
    schema: Schema<IngressState>,
}

impl DefaultIngress {
    pub fn new(ctx: OcmContext) -> Self {
        Self {
            ctx,
            schema: schema(),
        }
    }

    fn target(state: &IngressState) -> Result<Target, ProviderError> {
        let cluster = state.cluster.require("cluster")?;
        let id = state.id.require("id")?;
        Ok(Target {
            label: Self::LABEL,
            id: id.clone(),
            cluster: Some(cluster.clone()),
            path: paths::ingress(cluster, id),
        })
    }

    /// The cluster's default ingress, if it has one.
    async fn find_default(&self, cluster: &str) -> Result<Option<Ingress>, ProviderError> {
        let ingresses: Vec<Ingress> = self
            .ctx
            .client
            .list_all(&paths::ingresses(cluster))
            .await
            .map_err(|e| {
                ProviderError::ReadFailed(format!(
                    "Failed to list ingresses of cluster '{cluster}': {e}"
                ))
            })?;
        Ok(ingresses.into_iter().find(|i| i.default == Some(true)))
    }

    /// Reject route and load balancer changes on hosted control planes.
    async fn check_hosted(&self, cluster: &str, patch: &Patch) -> Result<(), ProviderError> {
        let touches_lb = patch.contains("load_balancer_type");
        let touches_routes = ROUTE_FIELDS.iter().any(|f| patch.contains(f));
        if !touches_lb && !touches_routes {
            return Ok(());
        }

        let remote: Cluster = self.ctx.client.get(&paths::cluster(cluster)).await?;
        if !remote.is_hosted_control_plane() {
            return Ok(());
        }
        let what = if touches_lb {
            "load balancer type"
        } else {
            "route selectors"
        };
        Err(ProviderError::invalid(
            "Can't update ingress",
            format!("Can't update {what} on Hosted Control Plane cluster '{cluster}'"),
        ))
    }

    async fn apply(
        &self,
        state: &IngressState,
        plan: &IngressState,
        patch: &Patch,
    ) -> Result<IngressState, ProviderError> {
        let target = Self::target(state)?;
        self.check_hosted(state.cluster.str_or_empty(), patch).await?;
        let remote: Ingress = reconcile::apply_patch(&self.ctx.client, &target, patch).await?;
        let mut next = plan.clone();
        next.id = state.id.clone();
        Ok(reconcile::populate(next, &remote))
    }
}

impl ResourceKind for DefaultIngress {
    type State = IngressState;

    const TYPE_NAME: &'static str = TYPE_NAME;
    const LABEL: &'static str = "default ingress";

    fn schema(&self) -> &Schema<IngressState> {
        &self.schema
    }

    fn create<'a>(
        &'a self,
        plan: &'a IngressState,
    ) -> BoxFuture<'a, Result<IngressState, ProviderError>> {
        Box::pin(async move {
            let cluster = plan.cluster.require("cluster")?;
            let Some(remote) = self.find_default(cluster).await? else {
                return Err(ProviderError::invalid(
                    "Can't find default ingress",
                    format!("Cluster '{cluster}' has no default ingress"),
                ));
            };
            tracing::info!(
                cluster = %cluster,
                ingress = remote.id.as_deref().unwrap_or(""),
                "adopting default ingress"
            );

            let seed = IngressState {
                cluster: plan.cluster.clone(),
                ..Default::default()
            };
            let state = reconcile::populate(seed, &remote);
            let plan = reconcile::carry_forward(&state, plan.clone(), &self.schema)?;
            let patch = reconcile::diff_mutable(&state, &plan, &self.schema)?;
            self.apply(&state, &plan, &patch).await
        })
    }

    fn read<'a>(
        &'a self,
        state: &'a IngressState,
    ) -> BoxFuture<'a, Result<Fetched<IngressState>, ProviderError>> {
        Box::pin(async move {
            let cluster = state.cluster.require("cluster")?;
            let remote = match state.id.as_str() {
                Some(id) => self
                    .ctx
                    .fetch::<Ingress>(&paths::ingress(cluster, id))
                    .await
                    .map_err(|e| {
                        ProviderError::ReadFailed(format!(
                            "Failed to fetch ingress '{id}' of cluster '{cluster}': {e}"
                        ))
                    })?,
                None => match self.find_default(cluster).await? {
                    Some(ingress) => Fetched::Found(ingress),
                    None => Fetched::Gone(format!("cluster '{cluster}' has no default ingress")),
                },
            };
            Ok(remote.map(|r| reconcile::populate(state.clone(), &r)))
        })
    }

    fn update<'a>(
        &'a self,
        state: &'a IngressState,
        plan: &'a IngressState,
        patch: &'a Patch,
    ) -> BoxFuture<'a, Result<IngressState, ProviderError>> {
        Box::pin(async move {
            let target = Self::target(state)?;
            if let Err(e) = self.ctx.client.get::<Ingress>(&target.path).await {
                return Err(ProviderError::UpdateFailed(format!(
                    "Cannot find ingress with identifier '{}' for cluster '{}': {e}",
                    target.id,
                    state.cluster.str_or_empty()
                )));
            }
            self.apply(state, plan, patch).await
        })
    }

    fn delete<'a>(
        &'a self,
        state: &'a IngressState,
    ) -> BoxFuture<'a, Result<DeleteOutcome, ProviderError>> {
        Box::pin(async move {
            let cluster = state.cluster.str_or_empty();
            Ok(DeleteOutcome::Abandoned {
                summary: "Cannot delete default ingress".to_string(),
                detail: format!(
                    "Cannot delete the default ingress for cluster '{cluster}'. \
                     Every cluster must have a default ingress. \
                     It is being removed from the state only. \
                     To resume managing the default ingress, import it again."
                ),
            })
        })
    }

    fn import_state(&self, id: &str) -> Result<IngressState, ProviderError> {
        let [cluster] = parse_id::<1>(id, "Default ingress", "<cluster_id>")?;
        Ok(IngressState {
            cluster: Attr::Known(cluster.to_string()),
            ..Default::default()
        })
    }
}
