//! Login, callback and logout protocol.
//!
//! A small state machine over the session's `username` and `next` keys:
//!
//! ```text
//! Anonymous --begin_login--> PendingProviderRedirect --complete_login--> Authenticated
//!                                     |                       (domain mismatch: stays unauthenticated)
//!                                     +--deny_login--> Anonymous
//! Authenticated --logout--> Anonymous
//! ```
//!
//! Every step ends in a single [`Redirect`]; none of them fail.

use crate::config::GoogleFedConfig;
use crate::policy::{AuthenticationPolicy, Headers};
use crate::profile::VerifiedProfile;
use crate::session::{NEXT_KEY, SessionData, USERNAME_KEY};
use tracing::{info, warn};

/// Fallback location when no application root is configured.
const DEFAULT_ROOT: &str = "/";

/// Where the login protocol is in a given session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    /// No identity and no pending login.
    Anonymous,
    /// A return URL is stored; the browser is at the provider.
    PendingProviderRedirect,
    /// The session carries a verified identity.
    Authenticated,
}

impl LoginState {
    /// Derives the state from session contents.
    #[must_use]
    pub fn of(session: &SessionData) -> Self {
        if session.username().is_some() {
            Self::Authenticated
        } else if session.next_url().is_some() {
            Self::PendingProviderRedirect
        } else {
            Self::Anonymous
        }
    }
}

/// A redirect response with any headers to merge into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    location: String,
    headers: Headers,
}

impl Redirect {
    /// Creates a redirect to `location` with no extra headers.
    #[must_use]
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            headers: Vec::new(),
        }
    }

    /// Adds headers to send with the redirect.
    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Returns the target location.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Returns the extra headers.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }
}

/// The request facts the login trigger needs.
#[derive(Debug, Clone, Copy)]
pub struct LoginRequest<'a> {
    /// The URL of the current request, including any query string.
    pub url: &'a str,
    /// The `next` query parameter, if present.
    pub next: Option<&'a str>,
}

/// URLs the protocol redirects between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowRoutes {
    /// Canonical login URL.
    pub login_url: String,
    /// Provider entry point the login trigger redirects to.
    pub provider_url: String,
    /// Application root, if the application has one.
    pub root_url: Option<String>,
}

/// Drives session state through login, callback and logout.
#[derive(Debug, Clone)]
pub struct LoginFlow {
    domain: String,
    routes: FlowRoutes,
}

impl LoginFlow {
    /// Creates a flow accepting logins from `domain`.
    #[must_use]
    pub fn new(domain: impl Into<String>, routes: FlowRoutes) -> Self {
        Self {
            domain: domain.into(),
            routes,
        }
    }

    /// Creates a flow using the domain from `config`.
    #[must_use]
    pub fn from_config(config: &GoogleFedConfig, routes: FlowRoutes) -> Self {
        Self::new(config.domain(), routes)
    }

    /// Returns the allowed email domain.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns the configured routes.
    #[must_use]
    pub fn routes(&self) -> &FlowRoutes {
        &self.routes
    }

    /// Returns the application root, or `/` with a warning if none is configured.
    #[must_use]
    pub fn app_root(&self) -> String {
        match &self.routes.root_url {
            Some(root) => root.clone(),
            None => {
                warn!("no application root configured, using '{DEFAULT_ROOT}' instead");
                DEFAULT_ROOT.to_string()
            }
        }
    }

    /// Starts a login: records where to return to and sends the browser to
    /// the provider.
    ///
    /// Called for the login endpoint and whenever access to a protected
    /// resource is denied. The return URL is the current URL unless the
    /// request *is* the login page, then the `next` parameter, then the
    /// application root.
    pub fn begin_login(&self, session: &mut SessionData, request: LoginRequest<'_>) -> Redirect {
        let next = if strip_query(request.url) != self.routes.login_url {
            request.url.to_string()
        } else if let Some(next) = request.next {
            next.to_string()
        } else {
            self.app_root()
        };
        session.insert(NEXT_KEY, next);
        Redirect::to(self.routes.provider_url.as_str())
    }

    /// Handles a successful provider callback.
    ///
    /// The identity is stored only if the email's domain matches exactly.
    /// Either way the stored return URL is consumed and followed, so a
    /// rejected login lands on the requested page still unauthenticated.
    pub fn complete_login(&self, session: &mut SessionData, profile: &VerifiedProfile) -> Redirect {
        if profile.email_domain() == Some(self.domain.as_str()) {
            info!(email = %profile.email, "login accepted");
            session.insert(USERNAME_KEY, profile.email.as_str());
        } else {
            warn!(
                "Email '{}' does not match '{}'!",
                profile.email, self.domain
            );
        }

        let next = match session.remove(NEXT_KEY) {
            Some(next) => next,
            None => self.app_root(),
        };
        Redirect::to(next)
    }

    /// Handles an explicit denial from the provider. The session is left as-is.
    #[must_use]
    pub fn deny_login(&self) -> Redirect {
        info!("login denied by identity provider");
        Redirect::to(self.app_root())
    }

    /// Destroys the whole session and returns home, carrying the policy's
    /// forget headers.
    pub fn logout(
        &self,
        session: &mut SessionData,
        policy: &dyn AuthenticationPolicy,
    ) -> Redirect {
        let headers = policy.forget(session);
        if let Some(username) = session.username() {
            info!(%username, "logging out");
        }
        session.invalidate();
        Redirect::to(self.app_root()).with_headers(headers)
    }
}

fn strip_query(url: &str) -> &str {
    url.split_once(['?', '#']).map_or(url, |(base, _)| base)
}
