//! Observable events
//!
//! Every log line names exactly one of these. Events are explicit and typed
//! so log consumers can match on stable strings.

use std::fmt;

/// Observable events in stockroom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Server is binding its listener
    ServerStarting,
    /// Listener bound, ready for requests
    Serving,
    /// Store configuration parsed and store opened
    StoreInitialized,
    /// No store configuration present; store-backed endpoints disabled
    StoreUnconfigured,
    /// Store configuration present but unusable
    StoreInitFailed,
    /// Seed documents written into an empty store
    StoreSeeded,

    // Requests
    /// Request payload failed validation
    RequestRejected,
    /// Store-backed endpoint called without a store
    StoreUnavailable,
    /// Credentials matched a stored user
    LoginSucceeded,
    /// Credentials matched no stored user
    LoginRejected,
    /// New product document created
    ProductAdded,
    /// Add rejected because the identity is taken
    ProductConflict,
    /// Quantity adjustment committed
    QuantityAdjusted,

    // Store
    /// Optimistic commit lost a race; closure will run again
    TransactionRetry,
    /// Transaction gave up after exhausting its attempts
    TransactionAborted,
    /// Unexpected store error surfaced to a handler
    StoreFailure,
    /// Snapshot of the local store written to disk
    SnapshotPersisted,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ServerStarting => "SERVER_STARTING",
            Event::Serving => "SERVING",
            Event::StoreInitialized => "STORE_INITIALIZED",
            Event::StoreUnconfigured => "STORE_UNCONFIGURED",
            Event::StoreInitFailed => "STORE_INIT_FAILED",
            Event::StoreSeeded => "STORE_SEEDED",

            Event::RequestRejected => "REQUEST_REJECTED",
            Event::StoreUnavailable => "STORE_UNAVAILABLE",
            Event::LoginSucceeded => "LOGIN_SUCCEEDED",
            Event::LoginRejected => "LOGIN_REJECTED",
            Event::ProductAdded => "PRODUCT_ADDED",
            Event::ProductConflict => "PRODUCT_CONFLICT",
            Event::QuantityAdjusted => "QUANTITY_ADJUSTED",

            Event::TransactionRetry => "TRANSACTION_RETRY",
            Event::TransactionAborted => "TRANSACTION_ABORTED",
            Event::StoreFailure => "STORE_FAILURE",
            Event::SnapshotPersisted => "SNAPSHOT_PERSISTED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
