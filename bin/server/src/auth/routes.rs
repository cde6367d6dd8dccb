//! Authentication routes for login, provider callback, and logout.

use axum::{
    extract::{OriginalUri, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use googlefed_access::{CallbackParams, EventKind, LoginRequest, ProviderOutcome, Redirect};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::{AppState, session::SessionHandle};
use crate::error::ServerError;

/// Path of the provider entry point.
pub const PROVIDER_PATH: &str = "/auth/google";

/// Path the provider returns the browser to.
pub const CALLBACK_PATH: &str = "/auth/google/callback";

/// Path that ends the session.
pub const LOGOUT_PATH: &str = "/auth/logout";

/// Query parameters accepted by the login page.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    next: Option<String>,
}

/// A protocol redirect answered with `302 Found`.
#[derive(Debug)]
pub struct Found(pub Redirect);

impl IntoResponse for Found {
    fn into_response(self) -> Response {
        let Found(redirect) = self;
        let mut response = (
            StatusCode::FOUND,
            [(header::LOCATION, redirect.location().to_string())],
        )
            .into_response();
        for (name, value) in redirect.headers() {
            response.headers_mut().append(name.clone(), value.clone());
        }
        response
    }
}

/// Starts a login from the login page.
pub async fn login(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<LoginQuery>,
    session: SessionHandle,
) -> Result<Found, ServerError> {
    let mut data = session.lock().await;
    state.authorize(EventKind::LoginRequested, &data).await?;

    let url = uri.to_string();
    let redirect = state.flow.begin_login(
        &mut data,
        LoginRequest {
            url: &url,
            next: query.next.as_deref(),
        },
    );
    Ok(Found(redirect))
}

/// Sends the browser on to Google.
pub async fn provider_entry(
    State(state): State<Arc<AppState>>,
    session: SessionHandle,
) -> Result<Found, ServerError> {
    let mut data = session.lock().await;
    state.authorize(EventKind::LoginRequested, &data).await?;
    Ok(Found(state.provider.entry_point(&mut data)?))
}

/// Handles the browser's return from Google.
pub async fn provider_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
    session: SessionHandle,
) -> Result<Found, ServerError> {
    let mut data = session.lock().await;

    // Checked before the provider consumes the pending state or exchanges
    // the code.
    let expected = if params.error.is_some() {
        EventKind::AuthenticationDenied
    } else {
        EventKind::AuthenticationComplete
    };
    state.authorize(expected, &data).await?;

    let redirect = match state.provider.complete(&mut data, &params).await? {
        ProviderOutcome::Complete(profile) => state.flow.complete_login(&mut data, &profile),
        ProviderOutcome::Denied { reason } => {
            info!(%reason, "provider denied authentication");
            if expected != EventKind::AuthenticationDenied {
                state
                    .authorize(EventKind::AuthenticationDenied, &data)
                    .await?;
            }
            state.flow.deny_login()
        }
    };
    Ok(Found(redirect))
}

/// Ends the session and returns home.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    session: SessionHandle,
) -> Result<Found, ServerError> {
    let mut data = session.lock().await;
    state.authorize(EventKind::Logout, &data).await?;
    Ok(Found(state.flow.logout(&mut data, state.policy.as_ref())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue};

    #[test]
    fn found_sets_location_and_extra_headers() {
        let redirect = Redirect::to("/home").with_headers(vec![(
            HeaderName::from_static("x-forget"),
            HeaderValue::from_static("1"),
        )]);

        let response = Found(redirect).into_response();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/home");
        assert_eq!(response.headers()["x-forget"], "1");
    }
}
