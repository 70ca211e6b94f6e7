//! ocmtf-provider
//!
//! Reconciliation engine for clusters_mgmt resources.
//!
//! Public API:
//! - [`Schema`]: per-resource field table (immutable / mutable / computed)
//! - [`reconcile`]: `validate_immutable`, `diff_mutable`, `apply_patch`, `populate`
//! - [`ResourceKind`]: per-resource API hooks
//! - [`Reconciler`]: Create / Read / Update / Delete / ImportState driver
//! - [`Registry`]: dispatch by type name over JSON plans and states
//! - [`resources::Groups`]: read-only group listing
//! - [`StateStore`]: local state file

pub mod addr;
pub mod diag;
pub mod error;
pub mod import;
pub mod lifecycle;
pub mod persistence;
pub mod reconcile;
pub mod registry;
pub mod resource;
pub mod resources;
pub mod schema;
pub mod state;

pub use crate::addr::ResourceAddr;
pub use crate::diag::{Diagnostic, Diagnostics, Response, Severity, StateChange};
pub use crate::error::ProviderError;
pub use crate::lifecycle::Reconciler;
pub use crate::persistence::StateStore;
pub use crate::registry::Registry;
pub use crate::resource::{DeleteOutcome, Fetched, OcmContext, ResourceKind};
pub use crate::schema::{Patch, Schema};
pub use crate::state::ProviderState;
