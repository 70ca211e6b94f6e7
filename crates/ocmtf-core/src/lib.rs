//! ocmtf-core
//!
//! Pure domain types: the three-valued [`Attr`] used by plans and state, and
//! the clusters_mgmt v1 API objects. No HTTP dependency; this is the shared
//! vocabulary of the workspace.

pub mod attr;
pub mod error;
pub mod models;
pub mod paths;

pub use crate::attr::Attr;
pub use crate::error::CoreError;
