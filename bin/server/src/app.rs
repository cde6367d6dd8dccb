//! Router assembly.

use axum::{Router, middleware, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::{
    self, AppState,
    routes::{CALLBACK_PATH, LOGOUT_PATH, PROVIDER_PATH},
};
use crate::pages;

/// Builds the application router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let login_path = state.flow.routes().login_url.clone();

    Router::new()
        .route("/", get(pages::home))
        .route("/whoami", get(pages::whoami))
        // Auth routes
        .route(&login_path, get(auth::login))
        .route(PROVIDER_PATH, get(auth::provider_entry))
        .route(CALLBACK_PATH, get(auth::provider_callback))
        .route(LOGOUT_PATH, get(auth::logout))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::session_layer,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::session_store::MemorySessionStore;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use googlefed_access::{
        Acl, AclEntry, CallbackParams, EventKind, EventPermissions, FlowRoutes, GoogleAuthPolicy, GroupPrincipalMode,
        IdentityMap, IdentityProvider, LoginFlow, ProviderError, ProviderOutcome, Redirect,
        Permission as AclPermission, SessionData, StaticGroupResolver, VerifiedProfile,
    };
    use googlefed_core::principal::AUTHENTICATED;
    use googlefed_core::{GroupResolver, ResolverError, UserId};
    use rootcause::Report;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    const PROVIDER_URL: &str = "https://accounts.example.com/o/auth";

    /// Provider that vouches for a fixed email unless the callback carries an error.
    struct FakeProvider {
        email: String,
        completions: AtomicUsize,
    }

    impl FakeProvider {
        fn new(email: &str) -> Self {
            Self {
                email: email.to_string(),
                completions: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl IdentityProvider for FakeProvider {
        fn entry_point(
            &self,
            session: &mut SessionData,
        ) -> Result<Redirect, Report<ProviderError>> {
            session.insert("fake_state", "pending");
            Ok(Redirect::to(PROVIDER_URL))
        }

        async fn complete(
            &self,
            session: &mut SessionData,
            callback: &CallbackParams,
        ) -> Result<ProviderOutcome, Report<ProviderError>> {
            self.completions.fetch_add(1, Ordering::SeqCst);
            session
                .remove("fake_state")
                .ok_or(ProviderError::MissingState)?;
            if let Some(error) = &callback.error {
                return Ok(ProviderOutcome::Denied {
                    reason: error.clone(),
                });
            }
            Ok(ProviderOutcome::Complete(VerifiedProfile::new(
                self.email.clone(),
            )))
        }
    }

    /// Resolver that is always unreachable.
    struct UnavailableResolver;

    #[async_trait]
    impl GroupResolver for UnavailableResolver {
        async fn groups(
            &self,
            _user_id: &UserId,
        ) -> googlefed_core::Result<Vec<String>, ResolverError> {
            Err(ResolverError::Unavailable {
                details: "connection refused".to_string(),
            }
            .into())
        }
    }

    fn staff_resolver() -> Arc<dyn GroupResolver> {
        let mut groups = BTreeMap::new();
        groups.insert("u1".to_string(), vec!["staff".to_string()]);
        Arc::new(StaticGroupResolver::new(groups))
    }

    fn app(email: &str, mode: GroupPrincipalMode) -> Router {
        app_with_resolver(email, mode, staff_resolver())
    }

    fn app_with_resolver(
        email: &str,
        mode: GroupPrincipalMode,
        resolver: Arc<dyn GroupResolver>,
    ) -> Router {
        let state = test_state(
            Arc::new(FakeProvider::new(email)),
            mode,
            resolver,
            EventPermissions::default(),
        );
        router(Arc::new(state))
    }

    fn test_state(
        provider: Arc<FakeProvider>,
        mode: GroupPrincipalMode,
        resolver: Arc<dyn GroupResolver>,
        permissions: EventPermissions,
    ) -> AppState {
        let session_config = SessionConfig {
            secure_cookies: false,
            ..SessionConfig::default()
        };

        AppState {
            sessions: Arc::new(MemorySessionStore::new(chrono::Duration::hours(1))),
            policy: Arc::new(GoogleAuthPolicy::new(
                Arc::new(IdentityMap::new([("alice@good.org", "u1")])),
                resolver,
                false,
                mode,
            )),
            flow: LoginFlow::new(
                "good.org",
                FlowRoutes {
                    login_url: "/auth/login".to_string(),
                    provider_url: PROVIDER_PATH.to_string(),
                    root_url: Some("/".to_string()),
                },
            ),
            provider,
            permissions,
            session_config,
        }
    }

    async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        app.clone()
            .oneshot(request.body(Body::empty()).expect("request"))
            .await
            .expect("response")
    }

    fn location(response: &Response) -> &str {
        response.headers()[header::LOCATION]
            .to_str()
            .expect("location")
    }

    /// Returns the `name=value` pair of the response's session cookie.
    fn session_cookie(response: &Response) -> Option<String> {
        let value = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
        value.split(';').next().map(str::to_string)
    }

    /// Logs in through the fake provider starting from `start`, returning
    /// the cookie and the final redirect target.
    async fn log_in(app: &Router, start: &str) -> (String, String) {
        let response = get(app, start, None).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), PROVIDER_PATH);
        let cookie = session_cookie(&response).expect("session cookie");

        let response = get(app, PROVIDER_PATH, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), PROVIDER_URL);

        let response = get(app, "/auth/google/callback?code=c&state=s", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        (cookie, location(&response).to_string())
    }

    #[tokio::test]
    async fn full_login_whoami_logout_flow() {
        let app = app("alice@good.org", GroupPrincipalMode::Extend);

        let (cookie, target) = log_in(&app, "/whoami").await;
        assert_eq!(target, "/whoami");

        let response = get(&app, "/whoami", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["user_id"], "u1");
        assert_eq!(
            json["principals"],
            serde_json::json!(["system.Everyone", "system.Authenticated", "u1", "staff"])
        );

        let response = get(&app, "/", Some(&cookie)).await;
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        assert_eq!(&body[..], b"Signed in as u1");

        let response = get(&app, "/auth/logout", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/");
        assert_eq!(session_cookie(&response).as_deref(), Some("session="));

        let response = get(&app, "/whoami", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), PROVIDER_PATH);
    }

    #[tokio::test]
    async fn login_page_follows_next_parameter() {
        let app = app("alice@good.org", GroupPrincipalMode::Extend);
        let (_, target) = log_in(&app, "/auth/login?next=/reports").await;
        assert_eq!(target, "/reports");
    }

    #[tokio::test]
    async fn login_page_without_next_returns_to_root() {
        let app = app("alice@good.org", GroupPrincipalMode::Extend);
        let (_, target) = log_in(&app, "/auth/login").await;
        assert_eq!(target, "/");
    }

    #[tokio::test]
    async fn foreign_domain_stays_anonymous() {
        let app = app("mallory@evil.org", GroupPrincipalMode::Extend);

        let (cookie, target) = log_in(&app, "/whoami").await;
        assert_eq!(target, "/whoami");

        let response = get(&app, "/whoami", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), PROVIDER_PATH);
    }

    #[tokio::test]
    async fn provider_denial_returns_home() {
        let app = app("alice@good.org", GroupPrincipalMode::Extend);

        let response = get(&app, "/auth/login", None).await;
        let cookie = session_cookie(&response).expect("session cookie");
        get(&app, PROVIDER_PATH, Some(&cookie)).await;

        let response = get(
            &app,
            "/auth/google/callback?error=access_denied",
            Some(&cookie),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/");

        let response = get(&app, "/", Some(&cookie)).await;
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        assert_eq!(&body[..], b"Not signed in");
    }

    #[tokio::test]
    async fn callback_without_pending_login_is_rejected() {
        let app = app("alice@good.org", GroupPrincipalMode::Extend);
        let response = get(&app, "/auth/google/callback?code=c&state=s", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn replace_mode_groups_are_refused_by_default_table() {
        let app = app("alice@good.org", GroupPrincipalMode::Replace);

        let (cookie, _) = log_in(&app, "/whoami").await;

        let response = get(&app, "/whoami", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    async fn body_text(response: Response) -> String {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        String::from_utf8(body.to_vec()).expect("utf-8 body")
    }

    #[tokio::test]
    async fn replace_mode_user_can_log_out_and_back_in() {
        let app = app("alice@good.org", GroupPrincipalMode::Replace);

        let (cookie, _) = log_in(&app, "/auth/login").await;
        assert_eq!(body_text(get(&app, "/", Some(&cookie)).await).await, "Signed in as u1");

        let response = get(&app, "/auth/logout", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/");
        assert_eq!(session_cookie(&response).as_deref(), Some("session="));

        assert_eq!(body_text(get(&app, "/", Some(&cookie)).await).await, "Not signed in");

        let response = get(&app, "/auth/login", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), PROVIDER_PATH);
    }

    #[tokio::test]
    async fn replace_mode_signed_in_user_can_restart_login() {
        let app = app("alice@good.org", GroupPrincipalMode::Replace);
        let (cookie, _) = log_in(&app, "/auth/login").await;

        let response = get(&app, "/auth/login", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), PROVIDER_PATH);

        let response = get(&app, PROVIDER_PATH, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), PROVIDER_URL);
    }

    #[tokio::test]
    async fn logout_survives_unavailable_resolver() {
        let app = app_with_resolver(
            "alice@good.org",
            GroupPrincipalMode::Replace,
            Arc::new(UnavailableResolver),
        );
        let (cookie, _) = log_in(&app, "/auth/login").await;

        let response = get(&app, "/whoami", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = get(&app, "/auth/logout", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/");
        assert_eq!(session_cookie(&response).as_deref(), Some("session="));

        assert_eq!(body_text(get(&app, "/", Some(&cookie)).await).await, "Not signed in");
    }

    #[tokio::test]
    async fn refused_callback_never_reaches_provider() {
        let provider = Arc::new(FakeProvider::new("alice@good.org"));
        let permissions = EventPermissions::default().with(
            EventKind::AuthenticationComplete,
            Acl::new(vec![AclEntry::allow(AUTHENTICATED, AclPermission::All)]),
        );
        let app = router(Arc::new(test_state(
            provider.clone(),
            GroupPrincipalMode::Extend,
            staff_resolver(),
            permissions,
        )));

        let response = get(&app, "/auth/login", None).await;
        let cookie = session_cookie(&response).expect("session cookie");
        get(&app, PROVIDER_PATH, Some(&cookie)).await;

        let response = get(&app, "/auth/google/callback?code=c&state=s", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(provider.completions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn anonymous_home_sets_no_cookie() {
        let app = app("alice@good.org", GroupPrincipalMode::Extend);
        let response = get(&app, "/", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(session_cookie(&response).is_none());
    }
}
