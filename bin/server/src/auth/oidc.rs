//! Google identity provider using the openidconnect crate.

use async_trait::async_trait;
use googlefed_access::{
    CallbackParams, IdentityProvider, OidcConfig, ProviderError, ProviderOutcome, Redirect,
    SessionData, VerifiedProfile,
};
use openidconnect::core::{CoreAuthenticationFlow, CoreClient, CoreProviderMetadata};
use openidconnect::{
    AuthorizationCode, ClientId, ClientSecret, CsrfToken, IssuerUrl, Nonce, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenResponse,
};
use rootcause::Report;
use serde::{Deserialize, Serialize};

/// Session key holding the pending handshake state.
const OIDC_STATE_KEY: &str = "oidc_state";

/// Google OpenID Connect handshake.
pub struct GoogleProvider {
    provider_metadata: CoreProviderMetadata,
    client_id: ClientId,
    client_secret: ClientSecret,
    redirect_url: RedirectUrl,
    config: OidcConfig,
    hosted_domain: String,
}

/// Data needed to complete the callback, kept in the session meanwhile.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AuthState {
    csrf_token: String,
    pkce_verifier: String,
    nonce: String,
}

impl GoogleProvider {
    /// Creates a provider by discovering Google's metadata.
    ///
    /// `hosted_domain` is sent as Google's `hd` hint so the account chooser
    /// favours accounts from the allowed domain. It is only a hint; the
    /// domain is still checked on callback.
    pub async fn discover(
        config: OidcConfig,
        hosted_domain: String,
    ) -> Result<Self, Report<ProviderError>> {
        let issuer_url = IssuerUrl::new(config.issuer_url().to_string()).map_err(|e| {
            ProviderError::Configuration {
                details: format!("invalid issuer URL: {}", e),
            }
        })?;

        let http_client = http_client()?;

        let provider_metadata = CoreProviderMetadata::discover_async(issuer_url, &http_client)
            .await
            .map_err(|e| ProviderError::Configuration {
                details: format!("failed to discover provider: {}", e),
            })?;

        let redirect_url = RedirectUrl::new(config.redirect_uri().to_string()).map_err(|e| {
            ProviderError::Configuration {
                details: format!("invalid redirect URI: {}", e),
            }
        })?;

        Ok(Self {
            provider_metadata,
            client_id: ClientId::new(config.client_id().to_string()),
            client_secret: ClientSecret::new(config.client_secret().to_string()),
            redirect_url,
            config,
            hosted_domain,
        })
    }

    fn client(
        &self,
    ) -> CoreClient<
        openidconnect::EndpointSet,
        openidconnect::EndpointNotSet,
        openidconnect::EndpointNotSet,
        openidconnect::EndpointNotSet,
        openidconnect::EndpointMaybeSet,
        openidconnect::EndpointMaybeSet,
    > {
        CoreClient::from_provider_metadata(
            self.provider_metadata.clone(),
            self.client_id.clone(),
            Some(self.client_secret.clone()),
        )
        .set_redirect_uri(self.redirect_url.clone())
    }
}

fn http_client() -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| ProviderError::Configuration {
            details: format!("failed to create HTTP client: {}", e),
        })
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn entry_point(&self, session: &mut SessionData) -> Result<Redirect, Report<ProviderError>> {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let client = self.client();
        let mut auth_request = client
            .authorize_url(
                CoreAuthenticationFlow::AuthorizationCode,
                CsrfToken::new_random,
                Nonce::new_random,
            )
            .set_pkce_challenge(pkce_challenge)
            .add_extra_param("hd", self.hosted_domain.clone());

        for scope in self.config.scopes() {
            auth_request = auth_request.add_scope(Scope::new(scope.to_string()));
        }
        if let Some(realm) = self.config.realm() {
            auth_request = auth_request.add_extra_param("openid.realm", realm.to_string());
        }

        let (auth_url, csrf_token, nonce) = auth_request.url();

        let state = AuthState {
            csrf_token: csrf_token.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
            nonce: nonce.secret().clone(),
        };
        let state_json =
            serde_json::to_string(&state).map_err(|e| ProviderError::Configuration {
                details: format!("failed to serialize auth state: {}", e),
            })?;
        session.insert(OIDC_STATE_KEY, state_json);

        Ok(Redirect::to(auth_url.to_string()))
    }

    async fn complete(
        &self,
        session: &mut SessionData,
        callback: &CallbackParams,
    ) -> Result<ProviderOutcome, Report<ProviderError>> {
        let pending = session.remove(OIDC_STATE_KEY);

        if let Some(error) = &callback.error {
            return Ok(ProviderOutcome::Denied {
                reason: error.clone(),
            });
        }

        let state: AuthState = pending
            .as_deref()
            .and_then(|json| serde_json::from_str(json).ok())
            .ok_or(ProviderError::MissingState)?;

        if callback.state.as_deref() != Some(state.csrf_token.as_str()) {
            return Err(ProviderError::StateMismatch.into());
        }

        let code = callback.code.as_ref().ok_or(ProviderError::MissingCode)?;

        let client = self.client();
        let http_client = http_client()?;

        let token_response = client
            .exchange_code(AuthorizationCode::new(code.clone()))
            .map_err(|e| ProviderError::TokenExchange {
                details: format!("token endpoint error: {}", e),
            })?
            .set_pkce_verifier(PkceCodeVerifier::new(state.pkce_verifier))
            .request_async(&http_client)
            .await
            .map_err(|e| ProviderError::TokenExchange {
                details: format!("token exchange failed: {}", e),
            })?;

        let id_token = token_response
            .id_token()
            .ok_or_else(|| ProviderError::TokenExchange {
                details: "no ID token in response".to_string(),
            })?;

        let nonce = Nonce::new(state.nonce);
        let claims = id_token
            .claims(&client.id_token_verifier(), &nonce)
            .map_err(|e| ProviderError::TokenValidation {
                details: format!("ID token validation failed: {}", e),
            })?;

        let email = claims
            .email()
            .map(|e| e.as_str().to_string())
            .ok_or_else(|| ProviderError::TokenValidation {
                details: "ID token carries no email claim".to_string(),
            })?;

        if claims.email_verified() != Some(true) {
            return Ok(ProviderOutcome::Denied {
                reason: format!("email '{email}' is not verified"),
            });
        }

        let display_name = claims
            .name()
            .and_then(|n| n.get(None))
            .map(|n| n.as_str().to_string());

        Ok(ProviderOutcome::Complete(
            VerifiedProfile::new(email)
                .with_subject(Some(claims.subject().to_string()))
                .with_display_name(display_name),
        ))
    }
}
