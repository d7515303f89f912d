//! Error taxonomy for the geography fetch pipeline.
//!
//! Every failure is a [`FetchError`] with one of the closed set of
//! [`ErrorKind`]s. Lower-level errors (transport, timer, JSON syntax) are
//! wrapped once where they occur and kept as the `source`.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use geofetch_verify::VerificationError;

/// Shared, clonable underlying cause.
pub type Cause = Arc<dyn StdError + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, FetchError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Network failure, timeout, cancellation or non-2xx status.
    Load,
    /// Body is not syntactically valid JSON text.
    Parse,
    /// Malformed input, wrong content type, oversized body, wrong document shape.
    Validation,
    /// Policy violation.
    Security,
    /// Invalid or refused configuration change.
    Configuration,
}

impl ErrorKind {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Load => "GEOGRAPHY_LOAD_ERROR",
            Self::Parse => "GEOGRAPHY_PARSE_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::Security => "SECURITY_ERROR",
            Self::Configuration => "CONFIGURATION_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.code()) }
}

/// Finer classification of [`ErrorKind::Security`] failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityReason {
    DisallowedProtocol,
    PrivateAddress,
    ProductionLocalhost,
    Redirect,
    IntegrityMismatch,
    IntegrityRequired,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}{}", url_suffix(.source_url))]
pub struct FetchError {
    kind:       ErrorKind,
    reason:     Option<SecurityReason>,
    message:    String,
    source_url: Option<String>,
    #[source]
    cause:      Option<Cause>,
    timestamp:  DateTime<Utc>,
}

fn url_suffix(url: &Option<String>) -> String {
    url.as_deref().map(|u| format!(" (url: {u})")).unwrap_or_default()
}

impl FetchError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            reason: None,
            message: message.into(),
            source_url: None,
            cause: None,
            timestamp: Utc::now(),
        }
    }

    pub fn load(message: impl Into<String>) -> Self { Self::new(ErrorKind::Load, message) }

    pub fn parse(message: impl Into<String>) -> Self { Self::new(ErrorKind::Parse, message) }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn security(reason: SecurityReason, message: impl Into<String>) -> Self {
        Self {
            reason: Some(reason),
            ..Self::new(ErrorKind::Security, message)
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Attach the offending URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Attach the offending URL unless one is already recorded.
    #[must_use]
    pub fn or_url(self, url: &str) -> Self {
        if self.source_url.is_some() { self } else { self.with_url(url) }
    }

    #[must_use]
    pub fn with_source<E: StdError + Send + Sync + 'static>(self, err: E) -> Self {
        self.with_cause(Arc::new(err))
    }

    #[must_use]
    pub fn with_cause(mut self, cause: Cause) -> Self {
        self.cause = Some(cause);
        self
    }

    pub fn kind(&self) -> ErrorKind { self.kind }

    pub fn reason(&self) -> Option<SecurityReason> { self.reason }

    pub fn message(&self) -> &str { &self.message }

    pub fn source_url(&self) -> Option<&str> { self.source_url.as_deref() }

    pub fn timestamp(&self) -> DateTime<Utc> { self.timestamp }

    pub fn is_security(&self) -> bool { self.kind == ErrorKind::Security }

    /// Map a digest failure. Mismatches are security failures; malformed
    /// tokens are validation failures.
    pub(crate) fn from_verification(err: VerificationError) -> Self {
        match err {
            VerificationError::Mismatch { .. } => {
                Self::security(SecurityReason::IntegrityMismatch, err.to_string()).with_source(err)
            }
            other => Self::validation(format!("invalid integrity value: {other}")).with_source(other),
        }
    }
}
