//! Error types for the filter and reconcile engines.
//!
//! Remote failures keep the [`Operation`] that was being attempted and the
//! adapter kind, so a failed reconcile says whether it died while locating,
//! creating, updating or deleting.

use crate::types::Operation;
use prismakit::ErrorCategory;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Flat classification of every engine failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The addressed object does not exist.
    NotFound,
    /// A create collided with an existing object.
    AlreadyExists,
    /// Login failed or the session was rejected.
    AuthenticationFailure,
    /// The API answered with something that is not the expected shape.
    MalformedResponse,
    /// A filter pattern could not be compiled.
    MalformedFilter,
    /// Neither an ID nor a name was given to reconcile against.
    AmbiguousIdentity,
    /// Opaque API error payload.
    GenericApiError,
    /// Connection-level failure.
    Transport,
    /// The caller's input or the adapter definition is incomplete.
    InvalidInput,
}

/// Errors raised by the engines.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A regex filter failed to compile.
    #[error("malformed filter '{pattern}': {message}")]
    MalformedFilter {
        /// The offending pattern.
        pattern: String,
        /// Compiler message.
        message: String,
    },

    /// Neither an ID nor a name was supplied.
    #[error("either an ID or a name is required to reconcile a {kind}")]
    AmbiguousIdentity {
        /// Adapter kind.
        kind: String,
    },

    /// The adapter has no definition for the requested operation.
    #[error("{kind} does not support {operation}")]
    Unsupported {
        /// Adapter kind.
        kind: String,
        /// Operation name.
        operation: &'static str,
    },

    /// A path template referenced a field the record does not carry.
    #[error("field '{field}' needed to build a request path is missing or not a scalar")]
    MissingPathField {
        /// Field name.
        field: String,
    },

    /// A listing path needed a caller-supplied parameter.
    #[error("parameter '{name}' is required to list this resource")]
    MissingParameter {
        /// Parameter name.
        name: String,
    },

    /// A field required to create the object is not set.
    #[error("field '{field}' is required to create a {kind}")]
    MissingField {
        /// Adapter kind.
        kind: String,
        /// Field name.
        field: String,
    },

    /// The API answered with an unexpected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A remote call failed.
    #[error("{operation} {kind} failed: {source}")]
    Remote {
        /// What was being attempted.
        operation: Operation,
        /// Adapter kind.
        kind: String,
        /// Classified transport error.
        #[source]
        source: prismakit::Error,
    },
}

impl Error {
    /// Wrap a transport error with the attempted operation.
    pub fn remote(operation: Operation, kind: &str) -> impl FnOnce(prismakit::Error) -> Self {
        let kind = kind.to_string();
        move |source| Self::Remote {
            operation,
            kind,
            source,
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MalformedFilter { .. } => ErrorKind::MalformedFilter,
            Error::AmbiguousIdentity { .. } => ErrorKind::AmbiguousIdentity,
            Error::Unsupported { .. }
            | Error::MissingPathField { .. }
            | Error::MissingParameter { .. }
            | Error::MissingField { .. } => ErrorKind::InvalidInput,
            Error::MalformedResponse(_) => ErrorKind::MalformedResponse,
            Error::Remote { source, .. } => match source.category() {
                ErrorCategory::NotFound => ErrorKind::NotFound,
                ErrorCategory::AlreadyExists => ErrorKind::AlreadyExists,
                ErrorCategory::Authentication => ErrorKind::AuthenticationFailure,
                ErrorCategory::MalformedResponse => ErrorKind::MalformedResponse,
                ErrorCategory::Api => ErrorKind::GenericApiError,
                ErrorCategory::Transport => ErrorKind::Transport,
            },
        }
    }

    /// Whether this is a remote "object not found".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Remote { source, .. } if source.is_not_found())
    }

    /// The attempted operation, for remote failures.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Error::Remote { operation, .. } => Some(*operation),
            _ => None,
        }
    }
}
