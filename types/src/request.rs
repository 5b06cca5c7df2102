//! Request handles and terminal outcomes.

use std::fmt;

// ============================================================================
// RequestHandle
// ============================================================================

/// Consumer-chosen identifier correlating an async request with its completion.
///
/// Handles are unique among in-flight requests. The sentinel [`RequestHandle::ALL`]
/// never names a single request; it addresses every outstanding one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestHandle(i64);

impl RequestHandle {
    /// Sentinel meaning "every outstanding request".
    pub const ALL: Self = Self(-1);

    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_all(self) -> bool {
        self.0 == Self::ALL.0
    }
}

impl From<i64> for RequestHandle {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for RequestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all() {
            f.write_str("*")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

// ============================================================================
// RequestOutcome
// ============================================================================

/// The single terminal outcome of a request, as seen by the consumer.
///
/// Cancellation is its own variant: it carries neither payload nor message and is
/// never reported as a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    Success(Vec<u8>),
    Failure(String),
    Cancelled,
}

impl RequestOutcome {
    /// Failure for a response whose status is outside `200..300`.
    #[must_use]
    pub fn unexpected_status(code: u16, url: &str) -> Self {
        Self::Failure(format!("Unexpected response code: {code} for URL: {url}"))
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    #[must_use]
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            Self::Success(bytes) => Some(bytes),
            Self::Failure(_) | Self::Cancelled => None,
        }
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Failure(message) => Some(message),
            Self::Success(_) | Self::Cancelled => None,
        }
    }

    /// Split into the `(bytes | none, errorMessage | none)` pair of `onRequestComplete`.
    ///
    /// A cancelled request yields `(None, None)`.
    #[must_use]
    pub fn into_parts(self) -> (Option<Vec<u8>>, Option<String>) {
        match self {
            Self::Success(bytes) => (Some(bytes), None),
            Self::Failure(message) => (None, Some(message)),
            Self::Cancelled => (None, None),
        }
    }
}
