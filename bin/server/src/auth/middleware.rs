//! Authentication extractors for Axum.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use googlefed_access::{EventKind, LoginRequest};
use googlefed_core::{PrincipalSet, UserId};
use std::sync::Arc;

use super::{AppState, routes::Found, session::SessionHandle};
use crate::error::ServerError;

/// Extractor for requiring an authenticated user with access to protected pages.
///
/// Anonymous requests start a login that returns to the current URL.
/// Authenticated users without permission get a 403.
pub struct RequireAuth {
    pub user_id: UserId,
    pub principals: PrincipalSet,
}

impl<S> FromRequestParts<S> for RequireAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let session = SessionHandle::from_request_parts(parts, state).await?;
        let mut data = session.lock().await;

        let Some(user_id) = app_state.policy.authenticated_userid(&data) else {
            let url = parts.uri.to_string();
            let redirect = app_state.flow.begin_login(
                &mut data,
                LoginRequest {
                    url: &url,
                    next: None,
                },
            );
            return Err(AuthRejection::Login(Found(redirect)));
        };

        let principals = app_state.policy.effective_principals(&data).await?;
        if !app_state
            .permissions
            .permits(EventKind::ProtectedResource, &principals)
        {
            return Err(ServerError::Forbidden {
                event: EventKind::ProtectedResource.to_string(),
            }
            .into());
        }

        Ok(RequireAuth {
            user_id,
            principals,
        })
    }
}

/// Extractor for optionally getting the authenticated user ID.
///
/// Never starts a login.
pub struct OptionalAuth(pub Option<UserId>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let session = SessionHandle::from_request_parts(parts, state).await?;
        let data = session.lock().await;
        Ok(OptionalAuth(app_state.policy.authenticated_userid(&data)))
    }
}

/// Rejection type for authentication extractors.
#[derive(Debug)]
pub enum AuthRejection {
    /// Not logged in; redirect to the provider.
    Login(Found),
    /// Logged in but refused, or the lookup failed.
    Error(ServerError),
}

impl From<ServerError> for AuthRejection {
    fn from(err: ServerError) -> Self {
        Self::Error(err)
    }
}

impl From<rootcause::Report<googlefed_core::ResolverError>> for AuthRejection {
    fn from(report: rootcause::Report<googlefed_core::ResolverError>) -> Self {
        Self::Error(report.into())
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Login(found) => found.into_response(),
            Self::Error(err) => err.into_response(),
        }
    }
}
