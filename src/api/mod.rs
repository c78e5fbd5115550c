use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::Config;
use crate::services::AccountService;
use crate::state::SharedState;

pub mod access;
mod admin;
mod assets;
mod auth;
mod error;
mod observability;
pub mod session;
mod system;
pub mod throttle;
mod types;

pub use access::{RouteAccess, SessionUser};
pub use error::ApiError;
pub use session::{AdminSession, CookieSigner, SessionCookies};
pub use throttle::LoginThrottle;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub sessions: SessionCookies,

    pub admin: AdminSession,

    pub throttle: LoginThrottle,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn accounts(&self) -> &Arc<dyn AccountService> {
        &self.shared.accounts
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    let server = &shared.config.server;

    let signer = if server.cookie_secret.is_empty() {
        warn!("No cookie secret configured; sessions will not survive a restart");
        CookieSigner::random()
    } else {
        CookieSigner::from_secret(&server.cookie_secret)
    };

    if server.admin_password.is_empty() {
        warn!("No admin password configured; admin console is disabled");
    }

    let sessions = SessionCookies::new(
        signer.clone(),
        server.secure_cookies,
        shared.clock.clone(),
    );
    let admin = AdminSession::new(
        signer,
        server.secure_cookies,
        &server.admin_password,
        shared.clock.clone(),
    );
    let throttle = LoginThrottle::new(&shared.config.security.auth_throttle);

    Arc::new(AppState {
        shared,
        sessions,
        admin,
        throttle,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config)?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let (activities_path, cors_origins) = {
        let config = state.config();
        (
            config.general.activities_path.clone(),
            config.server.cors_allowed_origins.clone(),
        )
    };

    let login_routes = Router::new()
        .route("/api/login", post(auth::login))
        .route(
            "/admin/login",
            get(assets::admin_login_page).post(admin::login),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            throttle::login_throttle,
        ));

    let admin_routes = create_admin_router(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route("/", get(assets::landing))
        .route("/health", get(system::health))
        .route("/login", get(assets::login_page))
        .route("/static/{*path}", get(assets::static_asset))
        .route("/api/logout", post(auth::logout))
        .route("/api/session", get(auth::current_session))
        .route("/admin/logout", post(admin::logout))
        .merge(login_routes)
        .merge(admin_routes)
        .nest_service("/activities", ServeDir::new(activities_path))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            access::site_gate,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(observability::logging_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer.allow_methods(Any).allow_headers(Any))
                .layer(middleware::from_fn(
                    observability::security_headers_middleware,
                )),
        )
        .with_state(state)
}

fn create_admin_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin", get(assets::admin_page))
        .route(
            "/admin/api/users",
            get(admin::list_accounts).post(admin::create_account),
        )
        .route(
            "/admin/api/users/{username}",
            get(admin::get_account).delete(admin::delete_account),
        )
        .route(
            "/admin/api/users/{username}/extend",
            post(admin::extend_account),
        )
        .route(
            "/admin/api/users/{username}/deactivate",
            post(admin::deactivate_account),
        )
        .route("/admin/api/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, access::admin_gate))
}
