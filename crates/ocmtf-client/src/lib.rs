//! ocmtf-client
//!
//! clusters_mgmt v1 REST operations. Thin wrapper around `reqwest`, plus the
//! cluster readiness poller other operations wait on.

pub mod client;
pub mod error;
pub mod wait;

pub use crate::client::{ClientConfig, OcmClient};
pub use crate::error::{ApiError, OcmError};
pub use crate::wait::ClusterWait;
