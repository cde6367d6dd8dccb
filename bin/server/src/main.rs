use googlefed_access::{
    EventPermissions, FlowRoutes, GoogleAuthPolicy, GoogleFedConfig, IdentityMap, LoginFlow,
    SessionStore, StaticGroupResolver,
};
use googlefed_authz::{AuthzClient, SpicedbGroupResolver};
use googlefed_core::GroupResolver;
use googlefed_server::{
    app,
    auth::{AppState, GoogleProvider, routes::PROVIDER_PATH},
    config::ServerConfig,
    session_store::MemorySessionStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable naming an optional configuration file.
const CONFIG_FILE_ENV: &str = "GOOGLEFED_CONFIG_FILE";

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_file = std::env::var_os(CONFIG_FILE_ENV).map(PathBuf::from);
    let config =
        ServerConfig::load(config_file.as_deref()).expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    let root_url = config.root_url();
    let googlefed =
        GoogleFedConfig::from_settings(config.googlefed).expect("invalid googlefed settings");

    let identity_map = IdentityMap::load(googlefed.user_map()).expect("failed to load user map");

    let resolver: Arc<dyn GroupResolver> = match config.authz {
        Some(authz) => {
            tracing::info!(endpoint = %authz.endpoint, "Connecting to SpiceDB...");
            let client = AuthzClient::new(authz.endpoint, authz.preshared_key)
                .await
                .expect("failed to connect to SpiceDB");
            Arc::new(SpicedbGroupResolver::new(client))
        }
        None => Arc::new(StaticGroupResolver::new(googlefed.groups().clone())),
    };

    let policy = GoogleAuthPolicy::from_config(&googlefed, Arc::new(identity_map), resolver);

    let flow = LoginFlow::from_config(
        &googlefed,
        FlowRoutes {
            login_url: config.login_url,
            provider_url: PROVIDER_PATH.to_string(),
            root_url,
        },
    );

    tracing::info!("Discovering Google OIDC provider...");
    let provider = GoogleProvider::discover(config.oidc, googlefed.domain().to_string())
        .await
        .expect("failed to discover OIDC provider");

    let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new(
        chrono::Duration::minutes(config.session.duration_minutes),
    ));

    // Spawn periodic session cleanup task
    let cleanup_store = sessions.clone();
    let cleanup_interval_secs = config.session.cleanup_interval_seconds;
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(cleanup_interval_secs));
        loop {
            interval.tick().await;
            match cleanup_store.delete_expired().await {
                Ok(count) if count > 0 => {
                    tracing::debug!(deleted_sessions = count, "Periodic session cleanup");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to cleanup expired sessions");
                }
            }
        }
    });

    let state = Arc::new(AppState {
        sessions,
        policy: Arc::new(policy),
        flow,
        provider: Arc::new(provider),
        permissions: EventPermissions::default().protected_by(config.protected_principals),
        session_config: config.session,
    });

    let app = app::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.bind_addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutting down");
}
