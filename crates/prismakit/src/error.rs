//! Error types for Prisma Cloud requests.
//!
//! Every failed request is classified into one of a small set of variants so
//! callers can tell "the object is not there" apart from "the API refused the
//! request" without inspecting status codes.

use serde_json::Value;
use std::fmt;

/// Result type alias for Prisma Cloud operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Name of the response header that carries Prisma Cloud's error details.
pub const REDLOCK_STATUS_HEADER: &str = "X-Redlock-Status";

/// Categories of request errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The requested object does not exist.
    NotFound,
    /// An object with the same identity already exists.
    AlreadyExists,
    /// Login failed or the session token was rejected.
    Authentication,
    /// The response could not be decoded.
    MalformedResponse,
    /// The API rejected the request with its own error payload.
    Api,
    /// Connection, TLS or timeout failure.
    Transport,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport)
    }

    /// Whether the failure describes data ("nothing there") rather than a fault.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::NotFound => "Object not found",
            Self::AlreadyExists => "Object already exists",
            Self::Authentication => "Authentication failed",
            Self::MalformedResponse => "Malformed API response",
            Self::Api => "API error",
            Self::Transport => "Network connectivity issue",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::NotFound => "Verify the ID or name of the object",
            Self::AlreadyExists => "Reconcile by name instead of creating a duplicate",
            Self::Authentication => "Check the username, password and customer name",
            Self::MalformedResponse => "Verify the API URL points at a Prisma Cloud tenant",
            Self::Api => "Check the error details for the rejected field",
            Self::Transport => "Check your internet connection and try again",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to Prisma Cloud.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The object addressed by `path` does not exist.
    #[error("object not found: {path}")]
    NotFound {
        /// Rendered request path.
        path: String,
    },

    /// A create collided with an existing object.
    #[error("object already exists: {path}")]
    AlreadyExists {
        /// Rendered request path.
        path: String,
    },

    /// Login failed or the session token was rejected.
    #[error("authentication failed: {0}")]
    AuthenticationFailure(String),

    /// The response body or error header could not be decoded.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The API returned an error payload.
    #[error("API error (HTTP {status}): {details}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Parsed error details, passed through untouched.
        details: Value,
    },

    /// Connection-level failure.
    #[error("transport error: {0}")]
    Transport(String),
}

impl Error {
    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::AlreadyExists { .. } => ErrorCategory::AlreadyExists,
            Error::AuthenticationFailure(_) => ErrorCategory::Authentication,
            Error::MalformedResponse(_) => ErrorCategory::MalformedResponse,
            Error::Api { .. } => ErrorCategory::Api,
            Error::Transport(_) => ErrorCategory::Transport,
        }
    }

    /// Whether this error means the object simply does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.category().is_recoverable()
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::Transport(format!("HTTP {code}")),
            other => Self::Transport(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

/// Classify a non-200 response.
///
/// Prisma Cloud reports failures through the `X-Redlock-Status` header, a
/// JSON list of `{"i18nKey": ..., "severity": ..., "subject": ...}` entries.
/// The body is only used for diagnostics.
pub fn classify(status: u16, redlock_status: Option<&str>, body: &str, path: &str) -> Error {
    if status == 401 {
        return Error::AuthenticationFailure(format!("HTTP 401 for {path}"));
    }

    let Some(header) = redlock_status else {
        return Error::Transport(format!(
            "{REDLOCK_STATUS_HEADER} header is missing, is this Prisma Cloud?\n{body}"
        ));
    };

    let details: Value = match serde_json::from_str(header) {
        Ok(v) => v,
        Err(e) => {
            return Error::MalformedResponse(format!(
                "invalid {REDLOCK_STATUS_HEADER} header ({e}): {header}"
            ));
        }
    };

    let keys = details
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.get("i18nKey").and_then(Value::as_str))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    for key in keys {
        if key.ends_with("_already_exists") {
            return Error::AlreadyExists {
                path: path.to_string(),
            };
        }
        if key == "invalid_id" || key == "not_found" {
            return Error::NotFound {
                path: path.to_string(),
            };
        }
    }

    Error::Api { status, details }
}
