//! Server-side error type and its HTTP mapping.
//!
//! Library errors arrive as rootcause reports; they are logged in full here
//! and turned into a user-safe response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use googlefed_access::{ProviderError, SessionStoreError};
use googlefed_core::ResolverError;
use rootcause::Report;
use std::fmt;

/// Errors surfaced by request handlers.
#[derive(Debug)]
pub enum ServerError {
    /// The session store failed.
    SessionStore { details: String },
    /// The group resolver failed.
    Resolver { details: String },
    /// The callback was not part of a login this session started.
    BadCallback { details: String },
    /// The identity provider handshake failed.
    Provider { details: String },
    /// A handler ran without the session middleware.
    MissingSession,
    /// The dispatch table refused the event.
    Forbidden { event: String },
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionStore { details } => write!(f, "session store error: {details}"),
            Self::Resolver { details } => write!(f, "group resolver error: {details}"),
            Self::BadCallback { details } => write!(f, "bad provider callback: {details}"),
            Self::Provider { details } => write!(f, "identity provider error: {details}"),
            Self::MissingSession => write!(f, "session middleware not installed"),
            Self::Forbidden { event } => write!(f, "event '{event}' not permitted"),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<Report<SessionStoreError>> for ServerError {
    fn from(report: Report<SessionStoreError>) -> Self {
        Self::SessionStore {
            details: report.to_string(),
        }
    }
}

impl From<Report<ResolverError>> for ServerError {
    fn from(report: Report<ResolverError>) -> Self {
        Self::Resolver {
            details: report.to_string(),
        }
    }
}

impl From<Report<ProviderError>> for ServerError {
    fn from(report: Report<ProviderError>) -> Self {
        let details = report.to_string();
        match report.current_context() {
            ProviderError::MissingState
            | ProviderError::StateMismatch
            | ProviderError::MissingCode => Self::BadCallback { details },
            _ => Self::Provider { details },
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::SessionStore { .. } | Self::Resolver { .. } | Self::MissingSession => {
                tracing::error!(error = %self, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            Self::BadCallback { .. } => {
                tracing::warn!(error = %self, "rejected provider callback");
                (StatusCode::BAD_REQUEST, "Invalid login callback")
            }
            Self::Provider { .. } => {
                tracing::error!(error = %self, "login failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed")
            }
            Self::Forbidden { .. } => {
                tracing::warn!(error = %self, "forbidden");
                (StatusCode::FORBIDDEN, "Access denied")
            }
        };

        (status, message).into_response()
    }
}
