//! The generic state reconciler.
//!
//! Every resource kind runs the same four steps against its [`Schema`]:
//! reject immutable changes, compute the minimal patch, send it, and fold
//! the API object back into state.

use ocmtf_client::OcmClient;
use ocmtf_core::attr::UNKNOWN_MARKER;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ProviderError;
use crate::resource::Target;
use crate::schema::{Mutability, Patch, Schema};

/// A rejected plan, reported as one diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// The offending attribute, when there is a single one.
    pub field: Option<&'static str>,
    pub summary: String,
    pub detail: String,
}

impl Violation {
    pub fn new(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            field: None,
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    pub fn on(field: &'static str, summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            field: Some(field),
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    pub fn immutable(field: &'static str, old: &str, new: &str) -> Self {
        Self::on(
            field,
            "Attribute value cannot be changed",
            format!("Attribute {field}, cannot be changed from {old} to {new}"),
        )
    }
}

impl From<Violation> for ProviderError {
    fn from(v: Violation) -> Self {
        ProviderError::Invalid {
            summary: v.summary,
            detail: v.detail,
        }
    }
}

/// Copies the API object into a state record. Attributes the object does
/// not carry are set to null so repeated reads converge.
pub trait Populate<R> {
    fn populate(&mut self, remote: &R);
}

/// One violation per immutable field whose plan value is not unknown and
/// differs from state.
pub fn validate_immutable<S>(state: &S, plan: &S, schema: &Schema<S>) -> Vec<Violation> {
    schema
        .fields()
        .iter()
        .filter(|f| f.mutability() == Mutability::Immutable)
        .filter(|f| !f.is_unknown(plan) && !f.same(state, plan))
        .map(|f| Violation::immutable(f.name(), &f.render(state), &f.render(plan)))
        .collect()
}

/// Mutable fields whose plan value is known and differs from state.
///
/// A field the plan sets to null while state still holds a value is only
/// included when the schema declares a cleared form for it.
pub fn diff_mutable<S>(state: &S, plan: &S, schema: &Schema<S>) -> Result<Patch, ProviderError> {
    let mut patch = Patch::default();
    for field in schema
        .fields()
        .iter()
        .filter(|f| f.mutability() == Mutability::Mutable)
    {
        if field.is_unknown(plan) || field.same(state, plan) {
            continue;
        }
        if field.is_null(plan) {
            if let Some(cleared) = field.cleared_value() {
                patch.changed.push(field.name());
                patch.insert(field.api_path(), cleared.clone());
            }
            continue;
        }
        patch.changed.push(field.name());
        if let Some(value) = field.encode(plan)? {
            patch.insert(field.api_path(), value);
        }
    }
    Ok(patch)
}

/// Send `patch` to the target. An empty patch refreshes the object instead.
pub async fn apply_patch<R: DeserializeOwned>(
    client: &OcmClient,
    target: &Target,
    patch: &Patch,
) -> Result<R, ProviderError> {
    let result = if patch.is_empty() {
        tracing::debug!(
            resource_type = target.label,
            id = %target.id,
            "nothing to patch, refreshing"
        );
        client.get(&target.path).await
    } else {
        tracing::info!(
            resource_type = target.label,
            id = %target.id,
            cluster = target.cluster.as_deref().unwrap_or(""),
            fields = ?patch.changed,
            "patching resource"
        );
        client.patch(&target.path, &patch.body).await
    };
    result.map_err(|e| {
        ProviderError::UpdateFailed(e.to_string()).with_resource(target.label, &target.describe())
    })
}

/// Fold `remote` into `state`.
pub fn populate<S: Populate<R>, R>(mut state: S, remote: &R) -> S {
    state.populate(remote);
    state
}

/// Fill null or unknown plan values from state for computed fields and
/// fields marked `from_state`.
pub fn carry_forward<S>(state: &S, plan: S, schema: &Schema<S>) -> Result<S, ProviderError>
where
    S: Serialize + DeserializeOwned,
{
    let stored = serde_json::to_value(state)?;
    let mut planned = serde_json::to_value(&plan)?;
    let mut touched = false;
    for field in schema.fields().iter().filter(|f| f.from_state()) {
        if !(field.is_null(&plan) || field.is_unknown(&plan)) {
            continue;
        }
        if let Some(value) = lookup(&stored, field.name()).filter(|v| !v.is_null()) {
            if let Value::Object(map) = &mut planned {
                crate::schema::insert_path(map, field.name(), value.clone());
                touched = true;
            }
        }
    }
    if !touched {
        return Ok(plan);
    }
    Ok(serde_json::from_value(planned)?)
}

/// Replace every unknown value with null. Stored state never holds unknowns.
pub fn settle<S>(record: &S) -> Result<S, ProviderError>
where
    S: Serialize + DeserializeOwned,
{
    let mut value = serde_json::to_value(record)?;
    scrub(&mut value);
    Ok(serde_json::from_value(value)?)
}

fn scrub(value: &mut Value) {
    if value.as_object().is_some_and(is_marker) {
        *value = Value::Null;
        return;
    }
    match value {
        Value::Object(map) => map.values_mut().for_each(scrub),
        Value::Array(items) => items.iter_mut().for_each(scrub),
        _ => {}
    }
}

fn is_marker(map: &Map<String, Value>) -> bool {
    map.len() == 1 && map.get(UNKNOWN_MARKER) == Some(&Value::Bool(true))
}

fn lookup<'a>(value: &'a Value, dotted: &str) -> Option<&'a Value> {
    dotted
        .split('.')
        .try_fold(value, |current, key| current.as_object()?.get(key))
}
