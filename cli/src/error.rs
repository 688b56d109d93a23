//! Error types shared by the workflow core.

use thiserror::Error;

pub const EXIT_GENERIC_FAILURE: i32 = 1;
pub const EXIT_VALIDATION_FAILURE: i32 = 2;
pub const EXIT_REQUEST_FAILURE: i32 = 3;
pub const EXIT_TRANSPORT_OR_AUTH_FAILURE: i32 = 4;
pub const EXIT_NOT_FOUND: i32 = 5;

/// Which lookup failed while resolving a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Domain,
    Cluster,
}

impl LookupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Cluster => "cluster",
        }
    }
}

#[derive(Debug, Error)]
pub enum StretchError {
    /// Token endpoint rejected the credentials or could not be reached
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Non-2xx response on a data call
    #[error("{method} {path} failed: status={status} body={body}")]
    Http {
        method: String,
        path: String,
        status: u16,
        body: String,
    },

    /// Request never produced a response (connect, TLS, timeout)
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{} '{name}' not found{}", .kind.as_str(), scope_suffix(.scope))]
    NotFound {
        kind: LookupKind,
        name: String,
        scope: Option<String>,
    },

    #[error(
        "validation {id} failed: executionStatus={execution_status} resultStatus={}",
        .result_status.as_deref().unwrap_or("<none>")
    )]
    ValidationFailed {
        id: String,
        execution_status: String,
        result_status: Option<String>,
    },

    #[error("validation {id} still running after {waited_secs}s, giving up")]
    PollTimeout { id: String, waited_secs: u64 },

    #[error("unexpected response from {path}: {reason}")]
    UnexpectedResponse { path: String, reason: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StretchError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Auth(_) | Self::Transport(_) => EXIT_TRANSPORT_OR_AUTH_FAILURE,
            Self::Http { status, .. } if matches!(status, 401 | 403 | 407) => {
                EXIT_TRANSPORT_OR_AUTH_FAILURE
            }
            Self::Http { .. } | Self::UnexpectedResponse { .. } => EXIT_REQUEST_FAILURE,
            Self::NotFound { .. } => EXIT_NOT_FOUND,
            Self::ValidationFailed { .. } | Self::PollTimeout { .. } => EXIT_VALIDATION_FAILURE,
            Self::InvalidInput(_) | Self::Config(_) | Self::Io(_) | Self::Json(_) => {
                EXIT_GENERIC_FAILURE
            }
        }
    }
}

fn scope_suffix(scope: &Option<String>) -> String {
    scope
        .as_deref()
        .map(|s| format!(" in domain '{}'", s))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, StretchError>;
