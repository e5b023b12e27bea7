//! Domain error model and the externally visible error taxonomy.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Result type returned by catalog operations to the boundary layer.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, input-driven failures (validation,
/// malformed identifiers). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. empty or overlong text).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

/// Classification of every failure a catalog operation can report.
///
/// Each kind has a fixed status class, a stable machine-readable code and a
/// human-readable description.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidRequest,
    Unexpected,
}

impl ErrorKind {
    /// HTTP status class for this kind.
    pub const fn status_code(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::InvalidRequest => 400,
            Self::Unexpected => 500,
        }
    }

    /// Stable machine-readable code.
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InvalidRequest => "invalid_request",
            Self::Unexpected => "unexpected",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::NotFound => "the requested resource does not exist",
            Self::InvalidRequest => "the request is malformed or incomplete",
            Self::Unexpected => "an unexpected error occurred",
        }
    }
}

/// Failure returned by catalog operations.
///
/// Every variant maps to exactly one [`ErrorKind`]; nothing leaves the service
/// layer unclassified.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The requested entity does not exist.
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: String },

    /// Input was rejected before reaching storage.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Anything else (storage failures, corrupt rows, ...).
    ///
    /// The source is kept for logging and must never be shown to callers.
    #[error("unexpected failure during {operation}")]
    Unexpected {
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl CatalogError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn unexpected(
        operation: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Unexpected {
            operation,
            source: source.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::Unexpected { .. } => ErrorKind::Unexpected,
        }
    }

    /// Message safe to show to callers.
    ///
    /// Unexpected failures only expose the kind description.
    pub fn public_message(&self) -> String {
        match self {
            Self::NotFound { .. } => self.to_string(),
            Self::InvalidRequest(msg) => msg.clone(),
            Self::Unexpected { .. } => self.kind().description().to_string(),
        }
    }
}

impl From<DomainError> for CatalogError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => Self::InvalidRequest(msg),
            DomainError::InvalidId(msg) => Self::InvalidRequest(msg),
        }
    }
}
