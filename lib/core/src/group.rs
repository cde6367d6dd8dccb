//! Group membership lookup.

use crate::id::UserId;
use async_trait::async_trait;
use std::fmt;

/// Errors from group resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
    /// The backing service could not be reached.
    Unavailable { details: String },
    /// The backing service answered with an error.
    LookupFailed { user_id: UserId, details: String },
}

impl fmt::Display for ResolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { details } => {
                write!(f, "group resolver unavailable: {details}")
            }
            Self::LookupFailed { user_id, details } => {
                write!(f, "group lookup for {user_id} failed: {details}")
            }
        }
    }
}

impl std::error::Error for ResolverError {}

/// Answers "what groups does this user belong to".
///
/// Called on the request path for every authenticated request that is not
/// in global-admin mode. No retry or timeout is applied by callers;
/// implementations that talk to a remote service should bound their own
/// latency.
#[async_trait]
pub trait GroupResolver: Send + Sync {
    /// Returns the group names for `user_id`, in the order they should
    /// appear in the principal set.
    async fn groups(&self, user_id: &UserId) -> crate::Result<Vec<String>, ResolverError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<String>);

    #[async_trait]
    impl GroupResolver for Fixed {
        async fn groups(&self, _user_id: &UserId) -> crate::Result<Vec<String>, ResolverError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn resolver_is_object_safe() {
        let resolver: Box<dyn GroupResolver> = Box::new(Fixed(vec!["eng".to_string()]));
        let groups = resolver
            .groups(&UserId::new("u1"))
            .await
            .expect("lookup should succeed");
        assert_eq!(groups, vec!["eng"]);
    }

    #[test]
    fn lookup_failed_display() {
        let err = ResolverError::LookupFailed {
            user_id: UserId::new("u1"),
            details: "timeout".to_string(),
        };
        assert!(err.to_string().contains("u1"));
        assert!(err.to_string().contains("timeout"));
    }
}
