use crate::diag::{Diagnostics, Response};
use crate::error::ProviderError;
use crate::reconcile::{self, Violation};
use crate::resource::{DeleteOutcome, Fetched, ResourceKind};

/// Drives one resource kind through Create / Read / Update / Delete /
/// ImportState.
///
/// Validation happens here, before any hook runs, so a rejected plan never
/// reaches the network. Hook errors come back as error diagnostics; no
/// operation returns `Err`.
pub struct Reconciler<K> {
    kind: K,
}

impl<K: ResourceKind> Reconciler<K> {
    pub fn new(kind: K) -> Self {
        Self { kind }
    }

    pub async fn create(&self, plan: K::State) -> Response<K::State> {
        let mut diags = Diagnostics::new();
        if report(&mut diags, self.kind.schema().check_policies(&plan)) {
            return Response::failed(diags);
        }

        tracing::info!(resource_type = K::TYPE_NAME, "creating resource");
        let created = match self.kind.create(&plan).await {
            Ok(state) => state,
            Err(e) => {
                diags.add_provider_error(&format!("Failed to create {}", K::LABEL), &e);
                return Response::failed(diags);
            }
        };
        self.finish(created, diags)
    }

    pub async fn read(&self, state: K::State) -> Response<K::State> {
        let mut diags = Diagnostics::new();
        match self.kind.read(&state).await {
            Ok(Fetched::Found(fresh)) => self.finish(fresh, diags),
            Ok(Fetched::Gone(reason)) => {
                tracing::warn!(
                    resource_type = K::TYPE_NAME,
                    reason = %reason,
                    "{} not found, removing from state",
                    K::LABEL
                );
                Response::removed(diags)
            }
            Err(e) => {
                diags.add_provider_error(&format!("Failed to read {}", K::LABEL), &e);
                Response::failed(diags)
            }
        }
    }

    pub async fn update(&self, state: K::State, plan: K::State) -> Response<K::State> {
        let mut diags = Diagnostics::new();
        let schema = self.kind.schema();

        let plan = match reconcile::carry_forward(&state, plan, schema) {
            Ok(plan) => plan,
            Err(e) => {
                diags.add_provider_error(&format!("Failed to update {}", K::LABEL), &e);
                return Response::failed(diags);
            }
        };
        if report(&mut diags, reconcile::validate_immutable(&state, &plan, schema)) {
            return Response::failed(diags);
        }
        if report(&mut diags, schema.check_policies(&plan)) {
            return Response::failed(diags);
        }

        let result = match reconcile::diff_mutable(&state, &plan, schema) {
            Ok(patch) => {
                tracing::debug!(
                    resource_type = K::TYPE_NAME,
                    changed = ?patch.changed,
                    "computed patch"
                );
                self.kind.update(&state, &plan, &patch).await
            }
            Err(e) => Err(e),
        };
        match result {
            Ok(updated) => self.finish(updated, diags),
            Err(e) => {
                diags.add_provider_error(&format!("Failed to update {}", K::LABEL), &e);
                Response::failed(diags)
            }
        }
    }

    pub async fn delete(&self, state: K::State) -> Response<K::State> {
        let mut diags = Diagnostics::new();
        match self.kind.delete(&state).await {
            Ok(DeleteOutcome::Deleted) => {
                tracing::info!(resource_type = K::TYPE_NAME, "resource deleted");
                Response::removed(diags)
            }
            Ok(DeleteOutcome::Abandoned { summary, detail }) => {
                tracing::warn!(
                    resource_type = K::TYPE_NAME,
                    "{} left in place, removing from state",
                    K::LABEL
                );
                diags.add_warning(summary, detail);
                Response::removed(diags)
            }
            Err(e) => {
                diags.add_provider_error(&format!("Failed to delete {}", K::LABEL), &e);
                Response::failed(diags)
            }
        }
    }

    pub async fn import_state(&self, id: &str) -> Response<K::State> {
        let mut diags = Diagnostics::new();
        let seed = match self.kind.import_state(id) {
            Ok(seed) => seed,
            Err(e) => {
                diags.add_provider_error("Invalid import identifier", &e);
                return Response::failed(diags);
            }
        };

        match self.kind.read(&seed).await {
            Ok(Fetched::Found(state)) => self.finish(state, diags),
            Ok(Fetched::Gone(reason)) => {
                diags.add_error(
                    format!("Cannot import {}", K::LABEL),
                    format!("Cannot find {} with identifier '{id}': {reason}", K::LABEL),
                );
                Response::failed(diags)
            }
            Err(e) => {
                diags.add_provider_error(&format!("Cannot import {}", K::LABEL), &e);
                Response::failed(diags)
            }
        }
    }

    fn finish(&self, state: K::State, mut diags: Diagnostics) -> Response<K::State> {
        match reconcile::settle(&state) {
            Ok(state) => Response::set(state, diags),
            Err(e) => {
                diags.add_provider_error(
                    &format!("Can't populate {} state", K::LABEL),
                    &ProviderError::State(e.to_string()),
                );
                Response::failed(diags)
            }
        }
    }
}

/// Record each violation as an error. True when there was at least one.
fn report(diags: &mut Diagnostics, violations: Vec<Violation>) -> bool {
    let failed = !violations.is_empty();
    for v in violations {
        diags.add_error(v.summary, v.detail);
    }
    failed
}
