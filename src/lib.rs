//! stockroom - inventory and login backend over a document store
//!
//! Layers, leaves first:
//! - `store`: documents, field queries, optimistic transactions
//! - `inventory`: validation, request shapes, products, the service
//! - `http_server`: Axum routes, shared state, server
//! - `cli`: process entry point

pub mod cli;
pub mod http_server;
pub mod inventory;
pub mod observability;
pub mod store;
