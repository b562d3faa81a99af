//! # Document Store
//!
//! Collection/id addressed JSON documents with field-equality queries and
//! optimistic read-modify-write transactions.
//!
//! Callers hold the store as `Arc<dyn DocumentStore>`; [`LocalStore`] is the
//! implementation shipped with the crate.

mod config;
mod document;
mod errors;
mod local;
mod transaction;

pub use config::{pending_seed, seed_store, Seed, StoreBackend, StoreConfig, STORE_CONFIG_ENV};
pub use document::{
    CommitRequest, DocumentSnapshot, FieldFilter, Fields, Precondition, Version, WriteOp,
};
pub use errors::{StoreError, StoreResult};
pub use local::LocalStore;
pub use transaction::{run_transaction, Transaction, TxError, TxOutcome, DEFAULT_MAX_ATTEMPTS};

/// Document store trait
///
/// Abstracts the storage backend. Implementations must apply each
/// [`CommitRequest`] atomically: either every precondition holds and every
/// write lands under one new [`Version`], or nothing changes.
pub trait DocumentStore: Send + Sync {
    /// Read one document
    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<DocumentSnapshot>>;

    /// Read every document in a collection, in store order
    fn list(&self, collection: &str) -> StoreResult<Vec<DocumentSnapshot>>;

    /// Read every document whose fields equal all `filters`
    fn find(&self, collection: &str, filters: &[FieldFilter]) -> StoreResult<Vec<DocumentSnapshot>>;

    /// Atomically check preconditions and apply writes
    fn commit(&self, request: CommitRequest) -> StoreResult<Version>;

    /// Unconditionally create or replace a document
    fn set(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<Version> {
        self.commit(CommitRequest::single(WriteOp::Set {
            collection: collection.to_string(),
            id: id.to_string(),
            fields,
        }))
    }
}
