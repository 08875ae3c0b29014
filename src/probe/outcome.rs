use std::fmt;

/// Raw result of a single probe request. Only the status line matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Status(u16),
    Timeout,
    ConnectionError,
    TlsError,
}

impl Outcome {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Outcome::Status(code) => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Status(code) => write!(f, "HTTP {}", code),
            Outcome::Timeout => f.write_str("request timed out"),
            Outcome::ConnectionError => f.write_str("connection failed"),
            Outcome::TlsError => f.write_str("TLS handshake failed"),
        }
    }
}

/// Failure taxonomy used to decide what a repair pass may retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    TransientNetworkFailure,
    RateLimited,
    UpstreamServerError,
    AmbiguousNotFound,
    DefinitiveRestriction,
    DefinitiveAccess,
    UnexpectedStatus,
}

impl FailureClass {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FailureClass::TransientNetworkFailure
                | FailureClass::RateLimited
                | FailureClass::UpstreamServerError
        )
    }
}
