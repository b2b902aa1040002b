//! Error types for the Equinix provider.

use thiserror::Error;

/// Errors produced while serving provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The remote object does not exist.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The configuration or API input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An internal provider error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// The provider is not configured or was configured incorrectly.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource or data source type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A gRPC transport error occurred.
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// The HTTP request to the Equinix API could not be completed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Equinix API rejected the request.
    #[error("Equinix API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error text reported by the API.
        message: String,
    },

    /// The object already exists (create conflict).
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    /// Authentication or authorization failure.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Rate limit exceeded and retries exhausted.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// The API is temporarily unavailable and retries were exhausted.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Waiting for a remote state transition timed out.
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// The remote object is in a state that does not allow the operation.
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    /// The operation is not supported for this type.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),
}

impl ProviderError {
    /// Map a non-success Equinix API response onto an error variant.
    pub fn from_api(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::PermissionDenied(message),
            404 => Self::NotFound(message),
            409 => Self::AlreadyExists(message),
            422 => Self::Validation(message),
            429 => Self::ResourceExhausted(message),
            503 => Self::Unavailable(message),
            _ => Self::Api { status, message },
        }
    }

    /// Whether this error means the remote object is gone.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Api { status: 404, .. })
    }
}

impl From<ProviderError> for tonic::Status {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(msg) => tonic::Status::not_found(msg),
            ProviderError::Validation(msg) => tonic::Status::invalid_argument(msg),
            ProviderError::Configuration(msg) => tonic::Status::failed_precondition(msg),
            ProviderError::UnknownResource(msg) => tonic::Status::not_found(msg),
            ProviderError::Internal(msg) => tonic::Status::internal(msg),
            ProviderError::Serialization(err) => {
                tonic::Status::invalid_argument(format!("Serialization error: {}", err))
            },
            ProviderError::Transport(err) => {
                tonic::Status::unavailable(format!("Transport error: {}", err))
            },
            ProviderError::Http(err) => tonic::Status::unavailable(format!("HTTP error: {}", err)),
            ProviderError::Api { status, message } => {
                tonic::Status::unknown(format!("Equinix API error ({}): {}", status, message))
            },
            ProviderError::AlreadyExists(msg) => tonic::Status::already_exists(msg),
            ProviderError::PermissionDenied(msg) => tonic::Status::permission_denied(msg),
            ProviderError::ResourceExhausted(msg) => tonic::Status::resource_exhausted(msg),
            ProviderError::Unavailable(msg) => tonic::Status::unavailable(msg),
            ProviderError::DeadlineExceeded(msg) => tonic::Status::deadline_exceeded(msg),
            ProviderError::FailedPrecondition(msg) => tonic::Status::failed_precondition(msg),
            ProviderError::Unimplemented(msg) => tonic::Status::unimplemented(msg),
        }
    }
}
