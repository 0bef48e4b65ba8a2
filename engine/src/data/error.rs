//! Unified error type for filter compilation and resolution
//!
//! Every failure surfaced by the engine maps to one of these variants, each
//! carrying a stable business code so callers can translate it into their
//! own transport-level status.

use thiserror::Error;
use uuid::Uuid;

/// Unified error type for filter operations
#[derive(Error, Debug)]
pub enum FilterError {
    /// Malformed operator / data type / value combination
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Filter payload could not be parsed
    #[error("Invalid filter format: {0}")]
    InvalidFormat(String),

    /// One or more named filters do not exist
    #[error("Filters not found [{}]", join_ids(.ids))]
    FiltersNotFound { ids: Vec<Uuid> },

    /// Network or variant does not exist
    #[error("Network {network_id} (variant {variant_id}) not found")]
    NetworkNotFound { network_id: Uuid, variant_id: String },

    /// Network snapshot is inconsistent (dangling references, duplicates)
    #[error("Failed to evaluate filter: {0}")]
    EvaluateFilterFailed(String),

    /// Remote collaborator failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

fn join_ids(ids: &[Uuid]) -> String {
    ids.iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl FilterError {
    /// Create an invalid filter error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidFilter(msg.into())
    }

    /// Create a filters not found error
    pub fn filters_not_found(ids: &[Uuid]) -> Self {
        Self::FiltersNotFound { ids: ids.to_vec() }
    }

    /// Create a network not found error
    pub fn network_not_found(network_id: Uuid, variant_id: impl Into<String>) -> Self {
        Self::NetworkNotFound {
            network_id,
            variant_id: variant_id.into(),
        }
    }

    /// Stable business code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFilter(_) => "filter.invalidFilter",
            Self::InvalidFormat(_) => "filter.invalidFilterFormat",
            Self::FiltersNotFound { .. } => "filter.filtersNotFound",
            Self::NetworkNotFound { .. } => "filter.networkNotFound",
            Self::EvaluateFilterFailed(_) => "filter.evaluateFilterFailed",
            Self::Http(_) => "filter.remoteUnavailable",
        }
    }

    /// Errors caused by the request itself
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidFilter(_) | Self::InvalidFormat(_))
    }

    /// Errors caused by a missing filter, network or variant
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::FiltersNotFound { .. } | Self::NetworkNotFound { .. }
        )
    }

    /// Check if this is a connection-related error that might be transient
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| s.is_server_error())
            }
            _ => false,
        }
    }
}

impl From<serde_json::Error> for FilterError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidFormat(e.to_string())
    }
}
