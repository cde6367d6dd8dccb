//! The pluggable identity-provider handshake.
//!
//! The login protocol only needs two things from a provider: somewhere to
//! send the browser, and a verdict once the browser comes back.

use crate::error::ProviderError;
use crate::profile::VerifiedProfile;
use crate::protocol::Redirect;
use crate::session::SessionData;
use async_trait::async_trait;
use rootcause::Report;
use serde::Deserialize;

/// Query parameters of a provider callback.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    /// Authorization code, on success.
    #[serde(default)]
    pub code: Option<String>,
    /// Opaque state echoed back by the provider.
    #[serde(default)]
    pub state: Option<String>,
    /// Error code, when the user or provider refused.
    #[serde(default)]
    pub error: Option<String>,
}

/// Outcome of a provider callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOutcome {
    /// The provider verified the user.
    Complete(VerifiedProfile),
    /// The provider (or the user) declined.
    Denied {
        /// Why, as reported by the provider.
        reason: String,
    },
}

/// An external identity-provider handshake.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Starts the handshake, stashing whatever the callback will need in
    /// the session.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Configuration` if the authorization URL
    /// cannot be built.
    fn entry_point(&self, session: &mut SessionData) -> Result<Redirect, Report<ProviderError>>;

    /// Finishes the handshake for a callback.
    ///
    /// # Errors
    ///
    /// Returns an error if the callback does not belong to this session's
    /// pending handshake or the token exchange fails.
    async fn complete(
        &self,
        session: &mut SessionData,
        callback: &CallbackParams,
    ) -> Result<ProviderOutcome, Report<ProviderError>>;
}
