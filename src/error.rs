//! Error taxonomy shared by the clients, the store, the renderer and the service.

use std::fmt;

/// Which external data source a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Countries,
    ExchangeRates,
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Upstream::Countries => write!(f, "RestCountries API"),
            Upstream::ExchangeRates => write!(f, "Exchange Rate API"),
        }
    }
}

/// A single failed field check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("external data source unavailable: could not fetch data from {upstream} ({reason})")]
    UpstreamUnavailable { upstream: Upstream, reason: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation failed: {}", join_fields(.0))]
    ValidationFailed(Vec<FieldError>),

    #[error("failed to render summary image: {0}")]
    RenderFailure(String),

    /// Detail is kept for logs but never shown in `Display`.
    #[error("internal error")]
    Internal { detail: String },

    #[error("refresh failed: {cause}")]
    RefreshFailed {
        #[source]
        cause: Box<Error>,
    },
}

fn join_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn upstream_unavailable(upstream: Upstream, reason: impl Into<String>) -> Self {
        Error::UpstreamUnavailable {
            upstream,
            reason: reason.into(),
        }
    }

    pub fn internal(detail: impl fmt::Display) -> Self {
        Error::Internal {
            detail: detail.to_string(),
        }
    }

    /// Wrap a cycle failure. Already-wrapped errors are not wrapped twice.
    pub fn refresh_failed(cause: Error) -> Self {
        match cause {
            Error::RefreshFailed { .. } => cause,
            other => Error::RefreshFailed {
                cause: Box::new(other),
            },
        }
    }

    /// The innermost error, looking through `RefreshFailed`.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::RefreshFailed { cause } => cause.root_cause(),
            other => other,
        }
    }

    /// Which upstream failed, when that is known.
    pub fn upstream(&self) -> Option<Upstream> {
        match self.root_cause() {
            Error::UpstreamUnavailable { upstream, .. } => Some(*upstream),
            _ => None,
        }
    }

    /// Upstream failures are worth retrying later; nothing else is.
    pub fn is_retryable(&self) -> bool {
        self.upstream().is_some()
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root_cause(), Error::NotFound(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::internal(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::internal(e)
    }
}
