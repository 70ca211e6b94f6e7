use ocmtf_client::OcmError;
use ocmtf_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Rejected input. Carries its own diagnostic summary.
    #[error("{summary}: {detail}")]
    Invalid { summary: String, detail: String },

    #[error("resource creation failed: {0}")]
    CreateFailed(String),

    #[error("resource read failed: {0}")]
    ReadFailed(String),

    #[error("resource update failed: {0}")]
    UpdateFailed(String),

    #[error("resource deletion failed: {0}")]
    DeleteFailed(String),

    #[error("unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("state error: {0}")]
    State(String),

    #[error("OCM error: {0}")]
    Ocm(#[from] OcmError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    pub fn invalid(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Invalid {
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    /// Prepend resource identity to the error message.
    pub fn with_resource(self, label: &str, name: &str) -> Self {
        match self {
            Self::CreateFailed(msg) => Self::CreateFailed(format!("{label} ({name}): {msg}")),
            Self::ReadFailed(msg) => Self::ReadFailed(format!("{label} ({name}): {msg}")),
            Self::UpdateFailed(msg) => Self::UpdateFailed(format!("{label} ({name}): {msg}")),
            Self::DeleteFailed(msg) => Self::DeleteFailed(format!("{label} ({name}): {msg}")),
            other => other,
        }
    }
}

/// Walk the full error chain and join all causes into one string.
///
/// Transport errors from reqwest carry the useful detail (connection
/// refused, TLS failure) in the source chain rather than in `Display`.
pub fn format_err_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_msg = cause.to_string();
        if !msg.ends_with(&cause_msg) {
            msg.push_str(": ");
            msg.push_str(&cause_msg);
        }
        source = cause.source();
    }
    msg
}
