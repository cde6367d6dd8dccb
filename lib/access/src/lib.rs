//! Google federated login for session-based applications.
//!
//! This crate provides:
//! - Validated configuration (`GoogleFedConfig`) and provider settings (`OidcConfig`)
//! - The identity map from provider usernames to internal user IDs
//! - Request-scoped session data and the session store contract
//! - The authentication policy deriving user IDs and effective principals
//! - The login/callback/logout protocol driving session state
//! - A permission table for login-related events
//!
//! # Access Model
//!
//! Only users whose verified email belongs to the configured domain are
//! logged in. Their session carries the email under `username`; every
//! request maps it through the identity map and, unless global-admin mode
//! is on, asks the group resolver for the user's groups.
//!
//! # Example
//!
//! ```
//! use googlefed_access::{
//!     FlowRoutes, GoogleAuthPolicy, GroupPrincipalMode, IdentityMap, LoginFlow, LoginRequest,
//!     SessionData, StaticGroupResolver, VerifiedProfile,
//! };
//! use std::sync::Arc;
//!
//! let flow = LoginFlow::new(
//!     "good.org",
//!     FlowRoutes {
//!         login_url: "/auth/login".to_string(),
//!         provider_url: "/auth/google".to_string(),
//!         root_url: Some("/".to_string()),
//!     },
//! );
//! let policy = GoogleAuthPolicy::new(
//!     Arc::new(IdentityMap::new([("alice@good.org", "u1")])),
//!     Arc::new(StaticGroupResolver::default()),
//!     true,
//!     GroupPrincipalMode::Replace,
//! );
//!
//! let mut session = SessionData::new();
//! flow.begin_login(&mut session, LoginRequest { url: "/reports", next: None });
//! let redirect = flow.complete_login(&mut session, &VerifiedProfile::new("alice@good.org"));
//! assert_eq!(redirect.location(), "/reports");
//!
//! use googlefed_access::AuthenticationPolicy;
//! assert_eq!(policy.authenticated_userid(&session).unwrap().as_str(), "u1");
//! ```

pub mod acl;
pub mod config;
pub mod error;
pub mod group;
pub mod identity_map;
pub mod oidc;
pub mod policy;
pub mod profile;
pub mod protocol;
pub mod provider;
pub mod session;

// Re-export main types at crate root
pub use acl::{Acl, AclEntry, EventKind, EventPermissions, Permission};
pub use config::{GoogleFedConfig, GoogleFedSettings, GroupPrincipalMode, UserMapSource};
pub use error::{ConfigError, ProviderError, SessionStoreError};
pub use group::StaticGroupResolver;
pub use identity_map::IdentityMap;
pub use oidc::{OidcConfig, OidcConfigBuilder};
pub use policy::{AuthenticationPolicy, GoogleAuthPolicy, Headers};
pub use profile::VerifiedProfile;
pub use protocol::{FlowRoutes, LoginFlow, LoginRequest, LoginState, Redirect};
pub use provider::{CallbackParams, IdentityProvider, ProviderOutcome};
pub use session::{NEXT_KEY, SessionData, SessionStore, StoredSession, USERNAME_KEY};
