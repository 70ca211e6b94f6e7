use std::fmt;
use std::time::Duration;

use ocmtf_core::models::ClusterState;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcmError {
    #[error("{0}")]
    Api(ApiError),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("cluster '{cluster_id}' is in state '{state}'")]
    ClusterState {
        cluster_id: String,
        state: ClusterState,
    },

    #[error("timed out after {}s waiting for cluster '{cluster_id}' to be {target}", .waited.as_secs())]
    Timeout {
        cluster_id: String,
        target: &'static str,
        waited: Duration,
    },
}

impl OcmError {
    /// HTTP status of an API error response, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(e) => Some(e.status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// A non-2xx response, decoded from the API's error body when it has one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: u16,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub operation_id: Option<String>,
}

impl ApiError {
    /// Decode an error body. Bodies that are not OCM errors still yield
    /// the status.
    pub fn from_body(status: u16, body: &[u8]) -> Self {
        let mut err: ApiError = serde_json::from_slice(body).unwrap_or_default();
        err.status = status;
        err
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = vec![format!("status is {}", self.status)];
        if let Some(id) = &self.id {
            parts.push(format!("identifier is '{id}'"));
        }
        if let Some(code) = &self.code {
            parts.push(format!("code is '{code}'"));
        }
        if let Some(op) = &self.operation_id {
            parts.push(format!("operation identifier is '{op}'"));
        }

        let last = parts.pop().unwrap_or_default();
        if parts.is_empty() {
            f.write_str(&last)?;
        } else {
            write!(f, "{} and {last}", parts.join(", "))?;
        }

        if let Some(reason) = &self.reason {
            write!(f, ": {reason}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}
