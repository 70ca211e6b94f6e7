use ocmtf_core::models::dns_domain::DNS_DOMAIN_KIND;
use ocmtf_core::models::DnsDomain;
use ocmtf_core::{paths, Attr};
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::import::parse_id;
use crate::reconcile::{self, Populate, Violation};
use crate::resource::{BoxFuture, DeleteOutcome, Fetched, OcmContext, ResourceKind};
use crate::schema::{Patch, Schema};

pub const TYPE_NAME: &str = "dns_domain";

const ARCHITECTURES: [&str; 2] = ["classic", "hcp"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsDomainState {
    #[serde(default)]
    pub id: Attr<String>,
    #[serde(default)]
    pub cluster_arch: Attr<String>,
}

impl Populate<DnsDomain> for DnsDomainState {
    fn populate(&mut self, remote: &DnsDomain) {
        self.id = remote.id.clone().into();
        // An architecture the user never set stays null. Import seeds it as
        // unknown so the remote value is taken.
        if !self.cluster_arch.is_null() {
            self.cluster_arch = remote.cluster_arch.clone().into();
        }
    }
}

pub fn schema() -> Schema<DnsDomainState> {
    Schema::<DnsDomainState>::builder(TYPE_NAME)
        .computed("id", |s| &s.id)
        .immutable("cluster_arch", |s| &s.cluster_arch)
        .policy(check_arch)
        .build()
}

fn check_arch(plan: &DnsDomainState) -> Result<(), Violation> {
    match plan.cluster_arch.as_str() {
        Some(arch) if !ARCHITECTURES.contains(&arch) => Err(Violation::on(
            "cluster_arch",
            "Invalid cluster architecture",
            format!("Attribute cluster_arch value must be one of [\"classic\" \"hcp\"], got: \"{arch}\""),
        )),
        _ => Ok(()),
    }
}

pub struct DnsDomainKind {
    ctx: OcmContext,
    schema: Schema<DnsDomainState>,
}

impl DnsDomainKind {
    pub fn new(ctx: OcmContext) -> Self {
        Self {
            ctx,
            schema: schema(),
        }
    }
}

impl ResourceKind for DnsDomainKind {
    type State = DnsDomainState;

    const TYPE_NAME: &'static str = TYPE_NAME;
    const LABEL: &'static str = "DNS domain";

    fn schema(&self) -> &Schema<DnsDomainState> {
        &self.schema
    }

    fn create<'a>(
        &'a self,
        plan: &'a DnsDomainState,
    ) -> BoxFuture<'a, Result<DnsDomainState, ProviderError>> {
        Box::pin(async move {
            let body = DnsDomain {
                kind: Some(DNS_DOMAIN_KIND.to_string()),
                cluster_arch: plan.cluster_arch.known().cloned(),
                ..Default::default()
            };
            let created: DnsDomain = self
                .ctx
                .client
                .post(paths::DNS_DOMAINS, &body)
                .await
                .map_err(|e| {
                    ProviderError::CreateFailed(format!("Failed to create DNS domain: {e}"))
                })?;
            tracing::info!(domain = created.id.as_deref().unwrap_or(""), "DNS domain created");
            Ok(reconcile::populate(plan.clone(), &created))
        })
    }

    fn read<'a>(
        &'a self,
        state: &'a DnsDomainState,
    ) -> BoxFuture<'a, Result<Fetched<DnsDomainState>, ProviderError>> {
        Box::pin(async move {
            let id = state.id.require("id")?;
            let remote: Fetched<DnsDomain> =
                self.ctx.fetch(&paths::dns_domain(id)).await.map_err(|e| {
                    ProviderError::ReadFailed(format!("Failed to fetch DNS domain '{id}': {e}"))
                })?;
            Ok(remote.map(|d| reconcile::populate(state.clone(), &d)))
        })
    }

    fn update<'a>(
        &'a self,
        state: &'a DnsDomainState,
        _plan: &'a DnsDomainState,
        _patch: &'a Patch,
    ) -> BoxFuture<'a, Result<DnsDomainState, ProviderError>> {
        // Nothing is mutable; the reconciler has already rejected any change.
        Box::pin(async move { Ok(state.clone()) })
    }

    fn delete<'a>(
        &'a self,
        state: &'a DnsDomainState,
    ) -> BoxFuture<'a, Result<DeleteOutcome, ProviderError>> {
        Box::pin(async move {
            let id = state.id.require("id")?;
            tracing::info!(domain = %id, "deleting DNS domain");
            self.ctx
                .client
                .delete(&paths::dns_domain(id))
                .await
                .map_err(|e| {
                    ProviderError::DeleteFailed(format!("Failed to delete DNS domain '{id}': {e}"))
                })?;
            Ok(DeleteOutcome::Deleted)
        })
    }

    fn import_state(&self, id: &str) -> Result<DnsDomainState, ProviderError> {
        let [domain] = parse_id::<1>(id, "DNS domain", "<domain_id>")?;
        Ok(DnsDomainState {
            id: Attr::Known(domain.to_string()),
            cluster_arch: Attr::Unknown,
        })
    }
}
