use thiserror::Error;

pub type Result<T> = std::result::Result<T, LifecycleError>;

/// Closed set of core error conditions.
///
/// Every variant is a deterministic function of its inputs; none of them is
/// retryable. Callers that report errors over the wire should use
/// [`LifecycleError::code`] for the machine-readable code and the `Display`
/// impl for the human message.
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("invalid resource path: {0}")]
    InvalidPath(String),

    #[error("failure_rate must be in [0,1], got {0}")]
    InvalidFailureRate(f64),

    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("unsupported token version: {0}")]
    UnsupportedTokenVersion(u32),
}

impl LifecycleError {
    /// Stable machine code for this error, fixed for wire interop.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPath(_) => "invalid_path",
            Self::InvalidFailureRate(_) => "invalid_failure_rate",
            Self::MalformedToken(_) => "malformed_token",
            Self::UnsupportedTokenVersion(_) => "unsupported_token_version",
        }
    }
}
