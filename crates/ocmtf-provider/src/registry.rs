use std::collections::BTreeMap;

use serde_json::Value;

use crate::diag::Response;
use crate::error::ProviderError;
use crate::lifecycle::Reconciler;
use crate::resource::{BoxFuture, OcmContext, ResourceKind};
use crate::resources::{
    ClusterAutoscalerKind, DefaultIngress, DnsDomainKind, HcpCluster, MachinePool,
    TuningConfigKind,
};

/// A resource kind driven over JSON plans and states.
///
/// `Err` means the JSON did not decode into the kind's state; everything
/// else is reported in the response diagnostics.
pub trait DynResource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn create(&self, plan: Value) -> BoxFuture<'_, Result<Response<Value>, ProviderError>>;

    fn read(&self, state: Value) -> BoxFuture<'_, Result<Response<Value>, ProviderError>>;

    fn update(
        &self,
        state: Value,
        plan: Value,
    ) -> BoxFuture<'_, Result<Response<Value>, ProviderError>>;

    fn delete(&self, state: Value) -> BoxFuture<'_, Result<Response<Value>, ProviderError>>;

    fn import_state<'a>(
        &'a self,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Response<Value>, ProviderError>>;
}

fn to_json<S: serde::Serialize>(resp: Response<S>) -> Result<Response<Value>, ProviderError> {
    Ok(resp.try_map(serde_json::to_value)?)
}

impl<K: ResourceKind> DynResource for Reconciler<K> {
    fn type_name(&self) -> &'static str {
        K::TYPE_NAME
    }

    fn create(&self, plan: Value) -> BoxFuture<'_, Result<Response<Value>, ProviderError>> {
        Box::pin(async move {
            let plan: K::State = serde_json::from_value(plan)?;
            to_json(Reconciler::create(self, plan).await)
        })
    }

    fn read(&self, state: Value) -> BoxFuture<'_, Result<Response<Value>, ProviderError>> {
        Box::pin(async move {
            let state: K::State = serde_json::from_value(state)?;
            to_json(Reconciler::read(self, state).await)
        })
    }

    fn update(
        &self,
        state: Value,
        plan: Value,
    ) -> BoxFuture<'_, Result<Response<Value>, ProviderError>> {
        Box::pin(async move {
            let state: K::State = serde_json::from_value(state)?;
            let plan: K::State = serde_json::from_value(plan)?;
            to_json(Reconciler::update(self, state, plan).await)
        })
    }

    fn delete(&self, state: Value) -> BoxFuture<'_, Result<Response<Value>, ProviderError>> {
        Box::pin(async move {
            let state: K::State = serde_json::from_value(state)?;
            to_json(Reconciler::delete(self, state).await)
        })
    }

    fn import_state<'a>(
        &'a self,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Response<Value>, ProviderError>> {
        Box::pin(async move { to_json(Reconciler::import_state(self, id).await) })
    }
}

/// Resource kinds by type name.
#[derive(Default)]
pub struct Registry {
    kinds: BTreeMap<&'static str, Box<dyn DynResource>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every clusters_mgmt resource kind, sharing one context.
    pub fn ocm(ctx: OcmContext) -> Self {
        let mut registry = Self::new();
        registry
            .register(HcpCluster::new(ctx.clone()))
            .register(MachinePool::new(ctx.clone()))
            .register(ClusterAutoscalerKind::new(ctx.clone()))
            .register(DnsDomainKind::new(ctx.clone()))
            .register(TuningConfigKind::new(ctx.clone()))
            .register(DefaultIngress::new(ctx));
        registry
    }

    pub fn register<K: ResourceKind + 'static>(&mut self, kind: K) -> &mut Self {
        self.kinds.insert(K::TYPE_NAME, Box::new(Reconciler::new(kind)));
        self
    }

    pub fn get(&self, type_name: &str) -> Result<&dyn DynResource, ProviderError> {
        self.kinds
            .get(type_name)
            .map(|k| k.as_ref())
            .ok_or_else(|| ProviderError::UnknownResourceType(type_name.to_string()))
    }

    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.kinds.keys().copied()
    }
}
