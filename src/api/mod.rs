//! REST API of the dashboard
//!
//! ## Endpoints
//!
//! - `GET /api/health` - Liveness and cache backend health
//! - `GET /api/modules` - Puppet Forge modules
//! - `GET /api/eol/:system` - Lifecycle cycles of one platform
//! - `GET /api/terraform-providers` - Terraform providers
//! - `GET /api/check_website?force=bool` - Website liveness and certificates
//! - `GET /api/github-releases` - GitHub releases
//! - `GET /api/vendor-versions` - Vendor download pages
//! - `GET /api/system-status` - Health digest over every dimension
//! - `GET|POST /api/software_versions` - Manually maintained versions
//! - `PUT|DELETE /api/software_versions/:index`

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;
pub use types::{CacheHealth, HealthResponse, SoftwareCreated, WebsiteQuery};

use std::net::SocketAddr;

use axum::Router;
use axum::routing::{get, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,

    /// Bearer token required on every request when set
    pub auth_token: Option<String>,

    /// Allow any origin, the front end may be served from elsewhere
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            auth_token: None,
            enable_cors: true,
        }
    }
}

/// Build the router with every route and layer, without binding
pub fn router(config: &ApiConfig, state: ApiState) -> Router {
    let mut app = Router::new()
        .route("/api/health", get(routes::health::health_check))
        .route("/api/modules", get(routes::versions::list_modules))
        .route("/api/eol/:system", get(routes::versions::list_eol_versions))
        .route(
            "/api/terraform-providers",
            get(routes::versions::list_terraform_providers),
        )
        .route(
            "/api/github-releases",
            get(routes::versions::list_github_releases),
        )
        .route(
            "/api/vendor-versions",
            get(routes::versions::list_vendor_versions),
        )
        .route("/api/check_website", get(routes::websites::check_websites))
        .route("/api/system-status", get(routes::websites::system_status))
        .route(
            "/api/software_versions",
            get(routes::software::list_software).post(routes::software::create_software),
        )
        .route(
            "/api/software_versions/:index",
            put(routes::software::replace_software).delete(routes::software::remove_software),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    if let Some(token) = config.auth_token.clone() {
        app = app.layer(axum::middleware::from_fn_with_state(
            token,
            middleware::auth::auth_middleware,
        ));
    }

    app
}

/// Spawn the API server in a background task, returns the bound address
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind_addr);

    let app = router(&config, state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
