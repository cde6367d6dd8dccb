//! Authentication module for the googlefed server.
//!
//! This module provides:
//! - The Google OpenID Connect provider
//! - Cookie-backed session loading and persistence
//! - Login, callback and logout routes
//! - Authentication extractors for Axum routes
//!
//! # Authorization Model
//!
//! Every protocol route is an event in [`EventPermissions`]; the handler
//! only runs if the request's effective principals are permitted. Pages
//! guarded by [`RequireAuth`] are checked against the protected-resource
//! event, which by default requires `system.Authenticated`.

pub mod middleware;
pub mod oidc;
pub mod routes;
pub mod session;

use crate::config::SessionConfig;
use crate::error::ServerError;
use googlefed_access::{
    AuthenticationPolicy, EventKind, EventPermissions, IdentityProvider, LoginFlow, SessionData,
    SessionStore,
};
use std::sync::Arc;

pub use middleware::{OptionalAuth, RequireAuth};
pub use oidc::GoogleProvider;
pub use routes::{login, logout, provider_callback, provider_entry};
pub use session::{SessionHandle, session_layer};

/// Shared application state.
pub struct AppState {
    /// Backing store for sessions.
    pub sessions: Arc<dyn SessionStore>,
    /// Derives user IDs and principals from the session.
    pub policy: Arc<dyn AuthenticationPolicy>,
    /// The login protocol.
    pub flow: LoginFlow,
    /// External identity provider.
    pub provider: Arc<dyn IdentityProvider>,
    /// Who may trigger which event.
    pub permissions: EventPermissions,
    /// Session configuration.
    pub session_config: SessionConfig,
}

impl AppState {
    /// Checks that the session may trigger `kind`.
    ///
    /// Events open to everyone are decided without computing principals,
    /// so they never depend on the group resolver.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Forbidden`] if the event is refused, or a
    /// resolver error if the principals cannot be computed.
    pub async fn authorize(
        &self,
        kind: EventKind,
        session: &SessionData,
    ) -> Result<(), ServerError> {
        if self.permissions.is_open(kind) {
            return Ok(());
        }
        let principals = self.policy.effective_principals(session).await?;
        if self.permissions.permits(kind, &principals) {
            Ok(())
        } else {
            Err(ServerError::Forbidden {
                event: kind.to_string(),
            })
        }
    }
}
