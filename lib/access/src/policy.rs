//! Session-backed authentication policy.
//!
//! The policy only *reads* identity. Identity is established by the login
//! protocol writing `username` into the session (see [`crate::protocol`]),
//! which is why [`AuthenticationPolicy::remember`] and
//! [`AuthenticationPolicy::forget`] produce no headers.

use crate::config::{GoogleFedConfig, GroupPrincipalMode};
use crate::identity_map::IdentityMap;
use crate::session::SessionData;
use async_trait::async_trait;
use googlefed_core::{GroupResolver, Principal, PrincipalSet, ResolverError, UserId};
use http::{HeaderName, HeaderValue};
use rootcause::Report;
use std::sync::Arc;
use tracing::debug;

/// Response headers a policy wants attached to establish or drop identity.
pub type Headers = Vec<(HeaderName, HeaderValue)>;

/// The capability set an authentication policy offers to the dispatch layer.
#[async_trait]
pub trait AuthenticationPolicy: Send + Sync {
    /// Returns the user ID using only data present in the request.
    fn unauthenticated_userid(&self, session: &SessionData) -> Option<UserId>;

    /// Returns the authenticated user ID.
    fn authenticated_userid(&self, session: &SessionData) -> Option<UserId>;

    /// Returns the principals the request acts as.
    ///
    /// # Errors
    ///
    /// Propagates group resolver failures.
    async fn effective_principals(
        &self,
        session: &SessionData,
    ) -> Result<PrincipalSet, Report<ResolverError>>;

    /// Returns headers that remember `principal` on subsequent requests.
    fn remember(&self, session: &SessionData, principal: &UserId) -> Headers;

    /// Returns headers that forget the current user on subsequent requests.
    fn forget(&self, session: &SessionData) -> Headers;
}

/// Authentication policy for Google federated login.
///
/// Immutable after construction; share it behind an `Arc`.
#[derive(Clone)]
pub struct GoogleAuthPolicy {
    identity_map: Arc<IdentityMap>,
    resolver: Arc<dyn GroupResolver>,
    all_admin: bool,
    group_principals: GroupPrincipalMode,
}

impl GoogleAuthPolicy {
    /// Creates a policy.
    #[must_use]
    pub fn new(
        identity_map: Arc<IdentityMap>,
        resolver: Arc<dyn GroupResolver>,
        all_admin: bool,
        group_principals: GroupPrincipalMode,
    ) -> Self {
        Self {
            identity_map,
            resolver,
            all_admin,
            group_principals,
        }
    }

    /// Creates a policy using the admin and group settings of `config`.
    #[must_use]
    pub fn from_config(
        config: &GoogleFedConfig,
        identity_map: Arc<IdentityMap>,
        resolver: Arc<dyn GroupResolver>,
    ) -> Self {
        Self::new(
            identity_map,
            resolver,
            config.all_admin(),
            config.group_principals(),
        )
    }

    /// Returns the identity map.
    #[must_use]
    pub fn identity_map(&self) -> &IdentityMap {
        &self.identity_map
    }
}

impl std::fmt::Debug for GoogleAuthPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleAuthPolicy")
            .field("identity_map_entries", &self.identity_map.len())
            .field("all_admin", &self.all_admin)
            .field("group_principals", &self.group_principals)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthenticationPolicy for GoogleAuthPolicy {
    fn unauthenticated_userid(&self, session: &SessionData) -> Option<UserId> {
        session
            .username()
            .map(|username| self.identity_map.lookup(username))
    }

    // No persistent user store exists to consult, so this is the same
    // session-only read.
    fn authenticated_userid(&self, session: &SessionData) -> Option<UserId> {
        self.unauthenticated_userid(session)
    }

    async fn effective_principals(
        &self,
        session: &SessionData,
    ) -> Result<PrincipalSet, Report<ResolverError>> {
        let mut principals = PrincipalSet::anonymous();
        let Some(user_id) = self.unauthenticated_userid(session) else {
            return Ok(principals);
        };

        principals.push(Principal::Authenticated);
        principals.push(Principal::User(user_id.clone()));

        if self.all_admin {
            principals.push(Principal::Admin);
            return Ok(principals);
        }

        let groups = PrincipalSet::from_groups(self.resolver.groups(&user_id).await?);
        debug!(%user_id, groups = groups.len(), "resolved group principals");

        match self.group_principals {
            GroupPrincipalMode::Replace => Ok(groups),
            GroupPrincipalMode::Extend => {
                principals.extend(groups);
                Ok(principals)
            }
        }
    }

    fn remember(&self, _session: &SessionData, _principal: &UserId) -> Headers {
        Vec::new()
    }

    fn forget(&self, _session: &SessionData) -> Headers {
        Vec::new()
    }
}
