//! Error types for the Hetzner Cloud network provider.

use thiserror::Error;

use crate::api::{ApiError, ErrorCode};
use crate::context::ContextError;
use crate::network::subnet_id::InvalidSubnetId;

/// Errors that can occur while serving provider requests.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested resource was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A composite subnet ID could not be parsed or no longer resolves.
    #[error("Invalid ID: {0}")]
    InvalidId(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The API rejected a request.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// An asynchronous action finished with an error.
    #[error("Action {id} ({command}) failed: {message} ({code})")]
    ActionFailed {
        /// Action ID.
        id: i64,
        /// Command the action executed.
        command: String,
        /// Error code reported for the action.
        code: String,
        /// Error message reported for the action.
        message: String,
    },

    /// The subnet exists remotely but did not finish provisioning.
    ///
    /// `id` addresses the remote subnet; keep it in state or import it.
    #[error("Subnet {id} was created but is not ready: {source}")]
    Incomplete {
        /// Composite ID of the created subnet.
        id: String,
        /// Why it did not become ready.
        #[source]
        source: Box<ProviderError>,
    },

    /// The request was cancelled by the caller.
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Operation timed out.
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// Operation not implemented.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),
}

impl ProviderError {
    /// Get the error message as a string.
    ///
    /// Returns a reference to the error message for any variant.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg) => msg,
            Self::InvalidId(msg) => msg,
            Self::Validation(msg) => msg,
            Self::Configuration(msg) => msg,
            Self::UnknownResource(msg) => msg,
            Self::Serialization(_err) => "serialization error (see Debug output)",
            Self::Api(err) => &err.message,
            Self::ActionFailed { message, .. } => message,
            Self::Incomplete { source, .. } => source.message(),
            Self::Cancelled(msg) => msg,
            Self::DeadlineExceeded(msg) => msg,
            Self::Unimplemented(msg) => msg,
        }
    }

    /// Composite ID of a subnet that was created but did not become ready.
    pub fn incomplete_id(&self) -> Option<&str> {
        match self {
            Self::Incomplete { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Whether this is an API error carrying `code`.
    pub fn is_api_code(&self, code: &ErrorCode) -> bool {
        matches!(self, Self::Api(err) if err.is(code))
    }

    /// Whether the referenced object is gone: an invalid composite ID or an
    /// API `not_found`.
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::InvalidId(_)) || self.is_api_code(&ErrorCode::NotFound)
    }

    /// Whether this is the "resources still attached" service error.
    pub fn is_attached_resources(&self) -> bool {
        matches!(self, Self::Api(err) if err.is_attached_resources())
    }
}

impl From<InvalidSubnetId> for ProviderError {
    fn from(err: InvalidSubnetId) -> Self {
        Self::InvalidId(err.to_string())
    }
}

impl From<ContextError> for ProviderError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::Cancelled => Self::Cancelled(err.to_string()),
            ContextError::DeadlineExceeded => Self::DeadlineExceeded(err.to_string()),
        }
    }
}
