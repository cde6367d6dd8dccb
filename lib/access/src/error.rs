//! Error types for the access crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `ConfigError`: Fatal startup-time configuration failures
//! - `ProviderError`: Identity-provider handshake failures
//! - `SessionStoreError`: Session backing store failures

use googlefed_core::SessionId;
use std::fmt;
use std::path::PathBuf;

/// Errors from validating configuration or loading the identity map.
///
/// Every variant is fatal: the process must not start serving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No allowed email domain was configured.
    MissingDomain,
    /// The identity-map file has a suffix other than `.yaml`, `.yml`, or `.json`.
    UnrecognizedUserMapFormat { path: PathBuf },
    /// Both a user-map file and inline user entries were configured.
    ConflictingUserMapSources { path: PathBuf },
    /// The identity-map file could not be read.
    UserMapRead { path: PathBuf, details: String },
    /// The identity-map file could not be parsed.
    UserMapParse { path: PathBuf, details: String },
    /// `group_principals` was neither `replace` nor `extend`.
    InvalidGroupPrincipalMode { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDomain => {
                write!(f, "googlefed.domain is required")
            }
            Self::UnrecognizedUserMapFormat { path } => {
                write!(f, "unrecognized user_map format '{}'", path.display())
            }
            Self::ConflictingUserMapSources { path } => {
                write!(
                    f,
                    "user_map '{}' conflicts with inline googlefed.user entries",
                    path.display()
                )
            }
            Self::UserMapRead { path, details } => {
                write!(f, "failed to read user_map '{}': {details}", path.display())
            }
            Self::UserMapParse { path, details } => {
                write!(f, "failed to parse user_map '{}': {details}", path.display())
            }
            Self::InvalidGroupPrincipalMode { value } => {
                write!(
                    f,
                    "invalid group_principals '{value}' (expected 'replace' or 'extend')"
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors from the identity-provider handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The callback arrived without pending handshake state in the session.
    MissingState,
    /// The callback's state parameter does not match the pending handshake.
    StateMismatch,
    /// The callback carried neither an authorization code nor an error.
    MissingCode,
    /// Provider configuration is invalid (bad URLs, etc.).
    Configuration { details: String },
    /// The authorization code could not be exchanged for tokens.
    TokenExchange { details: String },
    /// The ID token failed validation.
    TokenValidation { details: String },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingState => write!(f, "no pending login for this session"),
            Self::StateMismatch => write!(f, "login state mismatch"),
            Self::MissingCode => write!(f, "callback carried no authorization code"),
            Self::Configuration { details } => {
                write!(f, "identity provider configuration error: {details}")
            }
            Self::TokenExchange { details } => {
                write!(f, "token exchange failed: {details}")
            }
            Self::TokenValidation { details } => {
                write!(f, "token validation failed: {details}")
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// Errors from the session backing store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStoreError {
    /// The store could not be reached.
    Unavailable { details: String },
    /// A stored session could not be decoded.
    Corrupt {
        session_id: SessionId,
        details: String,
    },
}

impl fmt::Display for SessionStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { details } => {
                write!(f, "session store unavailable: {details}")
            }
            Self::Corrupt {
                session_id,
                details,
            } => {
                write!(f, "session {session_id} is corrupt: {details}")
            }
        }
    }
}

impl std::error::Error for SessionStoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_format_names_the_path() {
        let err = ConfigError::UnrecognizedUserMapFormat {
            path: PathBuf::from("/etc/users.ini"),
        };
        assert!(err.to_string().contains("unrecognized user_map format"));
        assert!(err.to_string().contains("/etc/users.ini"));
    }

    #[test]
    fn missing_domain_display() {
        assert!(
            ConfigError::MissingDomain
                .to_string()
                .contains("googlefed.domain")
        );
    }

    #[test]
    fn provider_token_exchange_display() {
        let err = ProviderError::TokenExchange {
            details: "invalid_grant".to_string(),
        };
        assert!(err.to_string().contains("invalid_grant"));
    }

    #[test]
    fn session_store_corrupt_display() {
        let err = SessionStoreError::Corrupt {
            session_id: SessionId::new("01J0000000000000000000000"),
            details: "bad json".to_string(),
        };
        assert!(err.to_string().contains("bad json"));
    }
}
