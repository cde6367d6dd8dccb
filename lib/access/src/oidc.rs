//! Identity-provider (Google OpenID Connect) configuration.
//!
//! These values are handed to the provider handshake unmodified; this crate
//! never interprets the credentials itself.

use serde::{Deserialize, Serialize};

/// Google's OIDC issuer.
pub const GOOGLE_ISSUER: &str = "https://accounts.google.com";

/// Configuration for the Google identity provider.
///
/// Fields with defaults can be omitted when loading from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OidcConfig {
    /// The OAuth2 client ID registered with Google.
    client_id: String,
    /// The OAuth2 client secret.
    client_secret: String,
    /// The redirect URI for the provider callback (e.g., "https://app.example.com/auth/google/callback").
    redirect_uri: String,
    /// The OIDC issuer URL used for discovery.
    /// Default: "https://accounts.google.com"
    #[serde(default = "default_issuer_url")]
    issuer_url: String,
    /// OAuth2 scopes to request as a comma-separated string.
    /// Default: "openid,email"
    #[serde(default = "default_scopes")]
    scopes: String,
    /// OpenID 2.0 realm, forwarded as `openid.realm` so identities issued
    /// under the legacy hybrid flow keep their association.
    #[serde(default)]
    realm: Option<String>,
}

fn default_issuer_url() -> String {
    GOOGLE_ISSUER.to_string()
}

fn default_scopes() -> String {
    "openid,email".to_string()
}

impl OidcConfig {
    /// Creates a new configuration with defaults for optional fields.
    #[must_use]
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            issuer_url: default_issuer_url(),
            scopes: default_scopes(),
            realm: None,
        }
    }

    /// Creates a configuration builder for more customization.
    #[must_use]
    pub fn builder(
        client_id: String,
        client_secret: String,
        redirect_uri: String,
    ) -> OidcConfigBuilder {
        OidcConfigBuilder::new(client_id, client_secret, redirect_uri)
    }

    /// Returns the OAuth2 client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the OAuth2 client secret.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Returns the OAuth2 redirect URI.
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Returns the OIDC issuer URL.
    #[must_use]
    pub fn issuer_url(&self) -> &str {
        &self.issuer_url
    }

    /// Returns the OAuth2 scopes to request, parsed from comma-separated string.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Returns the OpenID 2.0 realm, if configured.
    #[must_use]
    pub fn realm(&self) -> Option<&str> {
        self.realm.as_deref()
    }
}

/// Builder for `OidcConfig`.
#[derive(Debug)]
pub struct OidcConfigBuilder {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    issuer_url: String,
    scopes: Vec<String>,
    realm: Option<String>,
}

impl OidcConfigBuilder {
    /// Creates a new builder with required fields.
    #[must_use]
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            issuer_url: default_issuer_url(),
            scopes: vec!["openid".to_string(), "email".to_string()],
            realm: None,
        }
    }

    /// Overrides the issuer URL (useful against a test provider).
    #[must_use]
    pub fn issuer_url(mut self, issuer_url: String) -> Self {
        self.issuer_url = issuer_url;
        self
    }

    /// Adds a scope to the list of scopes to request.
    #[must_use]
    pub fn add_scope(mut self, scope: String) -> Self {
        if !self.scopes.contains(&scope) {
            self.scopes.push(scope);
        }
        self
    }

    /// Sets the OpenID 2.0 realm.
    #[must_use]
    pub fn realm(mut self, realm: String) -> Self {
        self.realm = Some(realm);
        self
    }

    /// Builds the `OidcConfig`.
    #[must_use]
    pub fn build(self) -> OidcConfig {
        OidcConfig {
            client_id: self.client_id,
            client_secret: self.client_secret,
            redirect_uri: self.redirect_uri,
            issuer_url: self.issuer_url,
            scopes: self.scopes.join(","),
            realm: self.realm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_config_targets_google() {
        let config = OidcConfig::new(
            "client-id".to_string(),
            "client-secret".to_string(),
            "https://app.example.com/auth/google/callback".to_string(),
        );

        assert_eq!(config.issuer_url(), GOOGLE_ISSUER);
        assert_eq!(config.scopes(), vec!["openid", "email"]);
        assert!(config.realm().is_none());
    }

    #[test]
    fn builder_add_scope_does_not_duplicate() {
        let config = OidcConfig::builder(
            "client-id".to_string(),
            "client-secret".to_string(),
            "https://app.example.com/auth/google/callback".to_string(),
        )
        .add_scope("email".to_string())
        .add_scope("profile".to_string())
        .realm("https://app.example.com/".to_string())
        .build();

        assert_eq!(config.scopes(), vec!["openid", "email", "profile"]);
        assert_eq!(config.realm(), Some("https://app.example.com/"));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let json = r#"{
            "client_id": "my-client",
            "client_secret": "secret",
            "redirect_uri": "https://app.example.com/auth/google/callback",
            "realm": "https://app.example.com/"
        }"#;

        let config: OidcConfig = serde_json::from_str(json).expect("deserialize");

        assert_eq!(config.client_id(), "my-client");
        assert_eq!(config.issuer_url(), GOOGLE_ISSUER);
        assert_eq!(config.scopes(), vec!["openid", "email"]);
        assert_eq!(config.realm(), Some("https://app.example.com/"));
    }
}
