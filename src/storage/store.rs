//! The base store: committed key-value data plus the value-count index.
//!
//! `Store` holds only committed state. While a transaction is active the
//! facade routes writes into the transaction stack instead; the store is
//! mutated either directly (no active transaction) or by commit folding.
//!
//! Count bookkeeping is deliberately decoupled from raw mutation: `set` and
//! `unset` never touch the index, and callers adjust it through
//! `apply_count_delta`. Commit folding reuses the same primitive.

use std::collections::HashMap;

use super::types::{Key, Value};

/// Committed key-value data with an O(1) value-count index.
#[derive(Debug, Default)]
pub struct Store {
    /// The committed key → value mapping.
    entries: HashMap<Key, Value>,
    /// Invariant: `value_counts[v] == |{k : entries[k] == v}|`.
    /// Entries that would reach zero are removed, never stored as zero.
    value_counts: HashMap<Value, usize>,
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditionally overwrite `key` with `value`.
    ///
    /// Does not adjust the value-count index; pair with
    /// [`apply_count_delta`](Self::apply_count_delta).
    pub fn set(&mut self, key: Key, value: Value) {
        self.entries.insert(key, value);
    }

    /// Look up a key. `None` when absent; never fails.
    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Remove a key if present. Silent no-op when absent.
    pub fn unset(&mut self, key: &Key) {
        self.entries.remove(key);
    }

    /// Number of keys currently holding `value`. Zero when never tracked.
    pub fn value_count(&self, value: &Value) -> usize {
        self.value_counts.get(value).copied().unwrap_or(0)
    }

    /// Adjust the index for one key moving from `old` to `new`.
    ///
    /// Decrements `old`'s count (when present), increments `new`'s (when
    /// present). A count that reaches zero is pruned from the map.
    pub fn apply_count_delta(&mut self, old: Option<&Value>, new: Option<&Value>) {
        if let Some(old) = old {
            if let Some(count) = self.value_counts.get_mut(old) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    self.value_counts.remove(old);
                }
            }
        }
        if let Some(new) = new {
            *self.value_counts.entry(new.clone()).or_insert(0) += 1;
        }
    }

    /// Number of committed keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no keys are committed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct values across all committed keys.
    pub fn distinct_values(&self) -> usize {
        self.value_counts.len()
    }
}
