//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from an optional file and environment
//! variables (`GOOGLEFED__DOMAIN`, `OIDC__CLIENT_ID`, `SESSION__DURATION_MINUTES`, ...).
//!
//! See [`GoogleFedSettings`] for the login policy settings and
//! [`OidcConfig`] for the identity provider.

use googlefed_access::{GoogleFedSettings, OidcConfig};
use googlefed_core::principal::AUTHENTICATED;
use serde::Deserialize;
use std::path::Path;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Canonical login URL, as seen in request paths.
    #[serde(default = "default_login_url")]
    pub login_url: String,

    /// Application root. An empty value means the application has none.
    #[serde(default = "default_root_url")]
    pub root_url: Option<String>,

    /// Principals allowed onto protected pages.
    #[serde(default = "default_protected_principals")]
    pub protected_principals: Vec<String>,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// Login policy settings.
    pub googlefed: GoogleFedSettings,

    /// Google identity provider configuration.
    pub oidc: OidcConfig,

    /// SpiceDB connection; when absent, groups come from `googlefed.groups`.
    #[serde(default)]
    pub authz: Option<AuthzConfig>,
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Session duration in minutes.
    #[serde(default = "default_session_duration_minutes")]
    pub duration_minutes: i64,

    /// Interval between session cleanup runs, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,

    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

/// SpiceDB connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthzConfig {
    /// gRPC endpoint, e.g. "http://localhost:50051".
    pub endpoint: String,
    /// Preshared key.
    pub preshared_key: String,
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_login_url() -> String {
    "/auth/login".to_string()
}

fn default_root_url() -> Option<String> {
    Some("/".to_string())
}

fn default_protected_principals() -> Vec<String> {
    vec![AUTHENTICATED.to_string()]
}

fn default_session_duration_minutes() -> i64 {
    60 * 24
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

fn default_secure_cookies() -> bool {
    true
}

fn default_cookie_name() -> String {
    "session".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_minutes: default_session_duration_minutes(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
            secure_cookies: default_secure_cookies(),
            cookie_name: default_cookie_name(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from an optional file, then environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid,
    /// including a `login_url` that is not an absolute path.
    pub fn load(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Self>()?
            .validated()
    }

    fn validated(self) -> Result<Self, config::ConfigError> {
        // Mounted as a route, so it must be a path.
        if !self.login_url.starts_with('/') {
            return Err(config::ConfigError::Message(format!(
                "login_url '{}' must be a path starting with '/'",
                self.login_url
            )));
        }
        Ok(self)
    }

    /// Returns the application root, treating an empty value as none.
    #[must_use]
    pub fn root_url(&self) -> Option<String> {
        self.root_url.clone().filter(|root| !root.is_empty())
    }
}
