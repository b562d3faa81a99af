//! Observability for stockroom
//!
//! - Structured JSON logging, one line per event
//! - Monotonic request/store counters
//!
//! Observability is read-only: it never changes the outcome of a request.
//!
//! ```ignore
//! use stockroom::observability::{Event, Logger, MetricsRegistry};
//!
//! Logger::info(Event::ProductAdded, &[("product_id", "P1")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_products_added();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
