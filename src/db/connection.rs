//! Shared database access for multi-caller contexts.
//!
//! The core [`Database`] is single-threaded: every operation takes `&mut
//! self` and runs to completion. When several callers need one store, the
//! whole facade goes behind a single exclusive lock. All operations are
//! short in-memory map work and none block, so the lock is held only for
//! the duration of one call.

use std::sync::Arc;

use parking_lot::Mutex;

use super::api::{Database, DatabaseResult, DatabaseStats, Response};
use crate::storage::{Key, Value};

/// A clonable handle to a lock-guarded [`Database`].
///
/// Every method acquires the lock for exactly one facade operation. Use
/// [`with`](Self::with) to hold it across a multi-operation sequence.
#[derive(Clone, Default)]
pub struct SharedDatabase {
    inner: Arc<Mutex<Database>>,
}

impl SharedDatabase {
    /// Create a handle to a fresh, empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing database.
    pub fn from_database(db: Database) -> Self {
        Self {
            inner: Arc::new(Mutex::new(db)),
        }
    }

    /// Assign `value` to `key`.
    pub fn set(&self, key: Key, value: Value) {
        self.inner.lock().set(key, value);
    }

    /// The effective value of `key`, cloned out of the lock.
    pub fn get(&self, key: &Key) -> Option<Value> {
        self.inner.lock().get(key).cloned()
    }

    /// Remove `key`.
    pub fn unset(&self, key: &Key) {
        self.inner.lock().unset(key);
    }

    /// Number of keys currently holding `value`.
    pub fn num_equal_to(&self, value: &Value) -> usize {
        self.inner.lock().num_equal_to(value)
    }

    /// Open a new transaction.
    pub fn begin(&self) {
        self.inner.lock().begin();
    }

    /// Discard the innermost transaction.
    pub fn rollback(&self) -> DatabaseResult<()> {
        self.inner.lock().rollback()
    }

    /// Fold all open transactions into committed state.
    pub fn commit(&self) -> DatabaseResult<()> {
        self.inner.lock().commit()
    }

    /// Execute one command line.
    pub fn execute(&self, line: &str) -> DatabaseResult<Response> {
        self.inner.lock().execute(line)
    }

    /// Get database statistics.
    pub fn stats(&self) -> DatabaseStats {
        self.inner.lock().stats()
    }

    /// Run a closure against the database under one lock acquisition.
    ///
    /// This is how a caller keeps a transaction to itself: other handles
    /// cannot interleave operations while the closure runs.
    pub fn with<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut Database) -> T,
    {
        f(&mut self.inner.lock())
    }
}

impl std::fmt::Debug for SharedDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedDatabase")
            .field("stats", &self.stats())
            .finish()
    }
}
