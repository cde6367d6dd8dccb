//! Cookie-backed session loading and persistence.
//!
//! [`session_layer`] loads the request's [`SessionData`] before the handler
//! runs and writes it back afterwards. Handlers reach it through the
//! [`SessionHandle`] extractor.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use googlefed_access::SessionData;
use googlefed_core::SessionId;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use super::AppState;
use crate::error::ServerError;

/// Shared handle to the current request's session.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle(Arc<Mutex<SessionData>>);

impl SessionHandle {
    /// Wraps loaded session data.
    #[must_use]
    pub fn new(data: SessionData) -> Self {
        Self(Arc::new(Mutex::new(data)))
    }

    /// Locks the session for reading or mutation.
    pub async fn lock(&self) -> MutexGuard<'_, SessionData> {
        self.0.lock().await
    }

    async fn snapshot(&self) -> SessionData {
        self.0.lock().await.clone()
    }
}

impl<S> FromRequestParts<S> for SessionHandle
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionHandle>()
            .cloned()
            .ok_or(ServerError::MissingSession)
    }
}

/// Loads the session named by the cookie, runs the handler, then persists
/// whatever the handler left behind.
pub async fn session_layer(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let jar = CookieJar::from_headers(request.headers());
    let cookie_name = state.session_config.cookie_name.as_str();

    let mut session_id = jar
        .get(cookie_name)
        .and_then(|cookie| cookie.value().parse::<SessionId>().ok());

    let data = match &session_id {
        Some(id) => state.sessions.load(id).await?,
        None => None,
    };
    if data.is_none() {
        // Unknown or expired; a fresh id is issued on first save.
        session_id = None;
    }

    let handle = SessionHandle::new(data.unwrap_or_default());
    request.extensions_mut().insert(handle.clone());

    let response = next.run(request).await;

    let jar = persist(&state, jar, session_id, handle.snapshot().await).await?;
    Ok((jar, response).into_response())
}

async fn persist(
    state: &AppState,
    jar: CookieJar,
    session_id: Option<SessionId>,
    data: SessionData,
) -> Result<CookieJar, ServerError> {
    if data.is_invalidated() {
        if let Some(id) = &session_id {
            debug!(session_id = %id, "deleting session");
            state.sessions.delete(id).await?;
        }
        if data.is_empty() {
            return Ok(jar.add(removal_cookie(state)));
        }
        // Values set after invalidation start a new session.
        let id = SessionId::generate();
        state.sessions.save(&id, &data).await?;
        return Ok(jar.add(session_cookie(state, &id)));
    }

    if !data.is_modified() {
        return Ok(jar);
    }

    let id = session_id.unwrap_or_else(SessionId::generate);
    state.sessions.save(&id, &data).await?;
    Ok(jar.add(session_cookie(state, &id)))
}

fn session_cookie(state: &AppState, id: &SessionId) -> Cookie<'static> {
    let config = &state.session_config;
    Cookie::build((config.cookie_name.clone(), id.to_string()))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(config.duration_minutes))
        .build()
}

fn removal_cookie(state: &AppState) -> Cookie<'static> {
    Cookie::build((state.session_config.cookie_name.clone(), ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}
