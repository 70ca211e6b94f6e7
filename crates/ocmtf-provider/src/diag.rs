use serde::{Deserialize, Serialize};

use crate::error::{format_err_chain, ProviderError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// One user-facing message produced by a lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
}

/// Ordered diagnostics of a single operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.0.push(Diagnostic {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
        });
    }

    pub fn add_warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.0.push(Diagnostic {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
        });
    }

    /// Record `err` as an error. Validation errors keep their own summary;
    /// everything else is reported under `summary` with the full cause chain.
    pub fn add_provider_error(&mut self, summary: &str, err: &ProviderError) {
        match err {
            ProviderError::Invalid { summary, detail } => self.add_error(summary, detail),
            other => self.add_error(summary, format_err_chain(other)),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// What an operation did to the stored state of a resource.
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange<S> {
    /// Replace the stored state.
    Set(S),
    /// Drop the resource from state.
    Removed,
    /// Leave stored state as it was (operation failed before any change).
    Unchanged,
}

/// Result of one lifecycle operation: the state change plus diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Response<S> {
    pub state: StateChange<S>,
    pub diagnostics: Diagnostics,
}

impl<S> Response<S> {
    pub fn set(state: S, diagnostics: Diagnostics) -> Self {
        Self {
            state: StateChange::Set(state),
            diagnostics,
        }
    }

    pub fn removed(diagnostics: Diagnostics) -> Self {
        Self {
            state: StateChange::Removed,
            diagnostics,
        }
    }

    pub fn failed(diagnostics: Diagnostics) -> Self {
        Self {
            state: StateChange::Unchanged,
            diagnostics,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    /// The new state, if the operation set one.
    pub fn new_state(&self) -> Option<&S> {
        match &self.state {
            StateChange::Set(s) => Some(s),
            _ => None,
        }
    }

    pub fn try_map<T, E>(self, f: impl FnOnce(S) -> Result<T, E>) -> Result<Response<T>, E> {
        let state = match self.state {
            StateChange::Set(s) => StateChange::Set(f(s)?),
            StateChange::Removed => StateChange::Removed,
            StateChange::Unchanged => StateChange::Unchanged,
        };
        Ok(Response {
            state,
            diagnostics: self.diagnostics,
        })
    }
}
