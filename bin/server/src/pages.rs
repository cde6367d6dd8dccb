//! Application pages.

use axum::Json;
use googlefed_core::PrincipalSet;
use serde::Serialize;

use crate::auth::{OptionalAuth, RequireAuth};

/// Identity of the current request as reported by `/whoami`.
#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub user_id: String,
    pub principals: PrincipalSet,
}

/// Public landing page.
pub async fn home(OptionalAuth(user): OptionalAuth) -> String {
    match user {
        Some(user_id) => format!("Signed in as {user_id}"),
        None => "Not signed in".to_string(),
    }
}

/// Protected page reporting the current user and principals.
pub async fn whoami(auth: RequireAuth) -> Json<WhoAmI> {
    Json(WhoAmI {
        user_id: auth.user_id.to_string(),
        principals: auth.principals,
    })
}
