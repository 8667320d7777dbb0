//! Error taxonomy for governance operations.

use crate::crypto::SignatureError;
use crate::store::StoreError;
use thiserror::Error;

/// Result type for governance operations
pub type GovernanceResult<T> = Result<T, GovernanceError>;

/// Client-visible failure of a governance operation.
///
/// Display strings start with the taxonomy token (`invalid-input: ...`).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GovernanceError {
    #[error("method-not-allowed")]
    MethodNotAllowed,

    #[error("invalid-input: {0}")]
    InvalidInput(String),

    #[error("unauthorized: signature does not match address")]
    Unauthorized,

    #[error("not-found: proposal {0} does not exist")]
    NotFound(u64),

    #[error("invalid-state: {0}")]
    InvalidState(String),

    #[error("backend-unavailable: {0}")]
    BackendUnavailable(String),
}

impl GovernanceError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Taxonomy token.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed => "method-not-allowed",
            Self::InvalidInput(_) => "invalid-input",
            Self::Unauthorized => "unauthorized",
            Self::NotFound(_) => "not-found",
            Self::InvalidState(_) => "invalid-state",
            Self::BackendUnavailable(_) => "backend-unavailable",
        }
    }

    /// HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::MethodNotAllowed => 405,
            Self::InvalidInput(_) | Self::InvalidState(_) => 400,
            Self::Unauthorized => 401,
            Self::NotFound(_) => 404,
            Self::BackendUnavailable(_) => 500,
        }
    }

    /// Message sent to the client. Backend causes stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::BackendUnavailable(_) => "backend-unavailable".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for GovernanceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::AlreadyVoted => Self::InvalidState("already voted".to_string()),
            StoreError::BackendUnavailable(cause) => Self::BackendUnavailable(cause),
        }
    }
}

impl From<SignatureError> for GovernanceError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::Malformed(what) => Self::InvalidInput(format!("malformed {}", what)),
            SignatureError::Recovery => Self::Unauthorized,
            SignatureError::Backend(cause) => Self::BackendUnavailable(cause),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(GovernanceError::MethodNotAllowed.http_status(), 405);
        assert_eq!(GovernanceError::invalid_input("x").http_status(), 400);
        assert_eq!(GovernanceError::Unauthorized.http_status(), 401);
        assert_eq!(GovernanceError::NotFound(3).http_status(), 404);
        assert_eq!(
            GovernanceError::InvalidState("proposal not active".into()).http_status(),
            400
        );
        assert_eq!(
            GovernanceError::BackendUnavailable("db".into()).http_status(),
            500
        );
    }

    #[test]
    fn test_display_carries_token() {
        assert_eq!(
            GovernanceError::InvalidState("proposal not active".into()).to_string(),
            "invalid-state: proposal not active"
        );
        assert_eq!(GovernanceError::NotFound(9).kind(), "not-found");
    }

    #[test]
    fn test_backend_cause_is_not_public() {
        let err = GovernanceError::BackendUnavailable("connection refused on 10.0.0.5".into());
        assert_eq!(err.public_message(), "backend-unavailable");
        assert!(err.to_string().contains("10.0.0.5"));
    }

    #[test]
    fn test_store_error_mapping() {
        assert_eq!(
            GovernanceError::from(StoreError::NotFound(4)),
            GovernanceError::NotFound(4)
        );
        assert_eq!(
            GovernanceError::from(StoreError::AlreadyVoted).kind(),
            "invalid-state"
        );
        assert_eq!(
            GovernanceError::from(StoreError::BackendUnavailable("io".into())).kind(),
            "backend-unavailable"
        );
    }

    #[test]
    fn test_signature_error_mapping() {
        assert_eq!(
            GovernanceError::from(SignatureError::Recovery),
            GovernanceError::Unauthorized
        );
        assert_eq!(
            GovernanceError::from(SignatureError::Malformed("signature")).kind(),
            "invalid-input"
        );
    }
}
