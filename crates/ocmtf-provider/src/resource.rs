use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use ocmtf_client::{ClusterWait, OcmClient, OcmError};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ProviderError;
use crate::schema::{Patch, Schema};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Default budget for waiting on a cluster before touching its children.
pub const CLUSTER_READY_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Shared handles every resource kind talks to the API through.
#[derive(Debug, Clone)]
pub struct OcmContext {
    pub client: OcmClient,
    pub waiter: ClusterWait,
    pub ready_timeout: Duration,
}

impl OcmContext {
    pub fn new(client: OcmClient, poll_interval: Duration) -> Self {
        Self {
            waiter: ClusterWait::new(client.clone(), poll_interval),
            client,
            ready_timeout: CLUSTER_READY_TIMEOUT,
        }
    }

    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    /// GET `path`, mapping 404 to [`Fetched::Gone`].
    pub async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<Fetched<T>, OcmError> {
        match self.client.get(path).await {
            Ok(value) => Ok(Fetched::Found(value)),
            Err(e) if e.is_not_found() => Ok(Fetched::Gone(e.to_string())),
            Err(e) => Err(e),
        }
    }

    /// Block until `cluster_id` is ready, mapping failure to a diagnostic.
    pub async fn wait_for_cluster(&self, cluster_id: &str) -> Result<(), ProviderError> {
        self.waiter
            .wait_for_ready(cluster_id, self.ready_timeout)
            .await
            .map(|_| ())
            .map_err(|e| {
                ProviderError::invalid(
                    "Cannot poll cluster state",
                    format!("Cannot poll state of cluster with identifier '{cluster_id}': {e}"),
                )
            })
    }
}

/// A lookup of an object that may have been deleted out of band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<T> {
    Found(T),
    /// Missing; carries the API's reason.
    Gone(String),
}

impl<T> Fetched<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Self::Found(value) => Fetched::Found(f(value)),
            Self::Gone(reason) => Fetched::Gone(reason),
        }
    }
}

/// Where an existing remote object lives, for patching and error context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub label: &'static str,
    pub id: String,
    pub cluster: Option<String>,
    pub path: String,
}

impl Target {
    pub fn describe(&self) -> String {
        match &self.cluster {
            Some(cluster) => format!("{} on cluster {cluster}", self.id),
            None => self.id.clone(),
        }
    }
}

/// How a delete ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The remote object stays; only the state entry goes.
    Abandoned { summary: String, detail: String },
}

/// One impl per resource type.
///
/// Hooks only talk to the API. Immutable checks, policies and the patch are
/// computed by [`crate::Reconciler`] before `update` runs, and errors are
/// turned into diagnostics there.
pub trait ResourceKind: Send + Sync {
    type State: Clone + Default + Debug + Serialize + DeserializeOwned + Send + Sync;

    /// e.g. "machine_pool"
    const TYPE_NAME: &'static str;
    /// e.g. "machine pool"
    const LABEL: &'static str;

    fn schema(&self) -> &Schema<Self::State>;

    /// Create the remote object described by `plan`.
    fn create<'a>(&'a self, plan: &'a Self::State)
        -> BoxFuture<'a, Result<Self::State, ProviderError>>;

    /// Refresh `state` from the API.
    fn read<'a>(
        &'a self,
        state: &'a Self::State,
    ) -> BoxFuture<'a, Result<Fetched<Self::State>, ProviderError>>;

    /// Apply `patch` and return the new state.
    fn update<'a>(
        &'a self,
        state: &'a Self::State,
        plan: &'a Self::State,
        patch: &'a Patch,
    ) -> BoxFuture<'a, Result<Self::State, ProviderError>>;

    fn delete<'a>(&'a self, state: &'a Self::State)
        -> BoxFuture<'a, Result<DeleteOutcome, ProviderError>>;

    /// Seed a state from an import identifier. The reconciler reads it next.
    fn import_state(&self, id: &str) -> Result<Self::State, ProviderError>;
}
