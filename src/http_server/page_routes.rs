//! Static page routes
//!
//! The login and dashboard pages are plain files served as-is. They do not
//! depend on the store being configured.

use axum::Router;
use tower_http::services::ServeFile;

use super::config::HttpServerConfig;

/// `GET /` serves the login page, `GET /dashboard.html` the dashboard
pub fn page_routes(config: &HttpServerConfig) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(config.login_page()))
        .route_service("/dashboard.html", ServeFile::new(config.dashboard_page()))
}
