//! Authorization error types.

use std::fmt;

/// Authorization errors.
#[derive(Debug)]
pub enum AuthzError {
    /// Failed to connect to SpiceDB.
    ConnectionFailed {
        /// Error details.
        details: String,
    },
    /// SpiceDB request failed.
    RequestFailed {
        /// Error details.
        details: String,
    },
}

impl fmt::Display for AuthzError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed { details } => {
                write!(f, "failed to connect to authorization service: {}", details)
            }
            Self::RequestFailed { details } => {
                write!(f, "authorization request failed: {}", details)
            }
        }
    }
}

impl std::error::Error for AuthzError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_failed_display() {
        let err = AuthzError::RequestFailed {
            details: "deadline exceeded".to_string(),
        };
        assert!(err.to_string().contains("deadline exceeded"));
    }
}
