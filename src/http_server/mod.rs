//! # HTTP Server Module
//!
//! Axum server exposing the inventory backend.
//!
//! # Endpoints
//!
//! - `GET /`, `GET /dashboard.html` - static pages
//! - `POST /login` - credential check
//! - `GET /products`, `GET /product/{productId}` - reads
//! - `POST /add_product`, `POST /update_quantity` - writes
//! - `GET /health`, `GET /metrics` - observability

pub mod config;
pub mod inventory_routes;
pub mod observability_routes;
pub mod page_routes;
pub mod server;
pub mod state;

pub use config::HttpServerConfig;
pub use inventory_routes::StatusResponse;
pub use server::HttpServer;
pub use state::AppState;
