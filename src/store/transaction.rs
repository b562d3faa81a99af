//! Optimistic read-modify-write transactions
//!
//! A transaction body reads documents through a [`Transaction`], stages
//! writes, and returns. The reads become commit preconditions: if any
//! document the body observed has a different version at commit time, the
//! store rejects the commit with [`StoreError::Conflict`] and the body runs
//! again from scratch against fresh reads.
//!
//! Rules:
//! - all reads happen before the first staged write
//! - the body must be free of side effects outside the transaction, since it
//!   may run more than once
//! - only conflicts are retried; any other error ends the transaction

use std::collections::BTreeMap;

use super::document::{CommitRequest, DocumentSnapshot, Fields, Precondition, Version, WriteOp};
use super::errors::{StoreError, StoreResult};
use super::DocumentStore;
use crate::observability::{Event, Logger};

/// Attempts used when the store configuration does not say otherwise
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Error returned by a transaction body or by the transaction machinery
#[derive(Debug)]
pub enum TxError<E> {
    /// The body decided to stop; nothing is committed and nothing is retried
    Abort(E),
    /// The store failed (including retries running out)
    Store(StoreError),
}

impl<E> From<StoreError> for TxError<E> {
    fn from(err: StoreError) -> Self {
        TxError::Store(err)
    }
}

/// Value produced by a committed transaction
#[derive(Debug, Clone, PartialEq)]
pub struct TxOutcome<T> {
    pub value: T,
    /// Commits lost to conflicts before the successful one
    pub retries: u32,
}

/// Read set and staged writes of one transaction attempt
pub struct Transaction<'s> {
    store: &'s dyn DocumentStore,
    observed: BTreeMap<(String, String), Option<Version>>,
    writes: Vec<WriteOp>,
}

impl<'s> Transaction<'s> {
    fn new(store: &'s dyn DocumentStore) -> Self {
        Self {
            store,
            observed: BTreeMap::new(),
            writes: Vec::new(),
        }
    }

    /// Read a document and record its version as a commit precondition
    pub fn get(&mut self, collection: &str, id: &str) -> StoreResult<Option<DocumentSnapshot>> {
        if !self.writes.is_empty() {
            return Err(StoreError::ReadAfterWrite);
        }

        let snapshot = self.store.get(collection, id)?;
        self.observed
            .entry((collection.to_string(), id.to_string()))
            .or_insert_with(|| snapshot.as_ref().map(|s| s.version));
        Ok(snapshot)
    }

    /// Stage a full-document write
    pub fn set(&mut self, collection: &str, id: &str, fields: Fields) {
        self.writes.push(WriteOp::Set {
            collection: collection.to_string(),
            id: id.to_string(),
            fields,
        });
    }

    /// Stage a field merge into an existing document
    pub fn update(&mut self, collection: &str, id: &str, fields: Fields) {
        self.writes.push(WriteOp::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            fields,
        });
    }

    fn into_commit(self) -> CommitRequest {
        CommitRequest {
            preconditions: self
                .observed
                .into_iter()
                .map(|((collection, id), expected)| Precondition {
                    collection,
                    id,
                    expected,
                })
                .collect(),
            writes: self.writes,
        }
    }
}

/// Run `body` as an atomic read-modify-write against `store`.
///
/// The body is re-run after every conflicting commit, up to `max_attempts`
/// runs in total. A body that stages no writes still commits its
/// preconditions, so its reads are validated too.
pub fn run_transaction<T, E, F>(
    store: &dyn DocumentStore,
    max_attempts: u32,
    mut body: F,
) -> Result<TxOutcome<T>, TxError<E>>
where
    F: FnMut(&mut Transaction<'_>) -> Result<T, TxError<E>>,
{
    let max_attempts = max_attempts.max(1);

    for attempt in 1..=max_attempts {
        let mut tx = Transaction::new(store);
        let value = body(&mut tx)?;

        match store.commit(tx.into_commit()) {
            Ok(_) => {
                return Ok(TxOutcome {
                    value,
                    retries: attempt - 1,
                })
            }
            Err(err) if err.is_retryable() => {
                let attempt_str = attempt.to_string();
                let reason = err.to_string();
                Logger::debug(
                    Event::TransactionRetry,
                    &[("attempt", attempt_str.as_str()), ("reason", reason.as_str())],
                );
            }
            Err(err) => return Err(TxError::Store(err)),
        }
    }

    let attempts_str = max_attempts.to_string();
    Logger::warn(Event::TransactionAborted, &[("attempts", attempts_str.as_str())]);
    Err(TxError::Store(StoreError::TransactionAborted {
        attempts: max_attempts,
    }))
}
