//! The transaction stack: ordered overlay layers, outermost first.

use std::collections::HashMap;

use crate::storage::{Key, Value};
use crate::transaction::error::{TransactionError, TransactionResult};
use crate::transaction::layer::{Change, Layer};

/// An ordered sequence of transaction layers.
///
/// Index 0 is the oldest/outermost transaction, the last entry is the
/// innermost (current) one. An empty stack means no transaction is active.
/// The stack records changes; it never touches the base store itself.
#[derive(Debug, Default)]
pub struct TransactionStack {
    layers: Vec<Layer>,
}

impl TransactionStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff at least one transaction is open.
    pub fn is_active(&self) -> bool {
        !self.layers.is_empty()
    }

    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Open a new innermost transaction. Nesting depth is unbounded.
    pub fn begin(&mut self) {
        self.layers.push(Layer::new());
    }

    /// Discard the innermost layer and everything it recorded.
    ///
    /// Layers below it are untouched and become the active state.
    pub fn rollback(&mut self) -> TransactionResult<()> {
        if self.layers.pop().is_none() {
            return Err(TransactionError::NoActiveTransaction);
        }
        Ok(())
    }

    /// Record a SET in the innermost layer.
    ///
    /// `visible` is the effective value the caller observed for `key` just
    /// before this call. Silent no-op when no transaction is open; the
    /// facade writes the base store directly in that case.
    pub fn set(&mut self, key: Key, value: Value, visible: Option<&Value>) {
        if let Some(layer) = self.layers.last_mut() {
            layer.record_set(key, value, visible);
        }
    }

    /// Record an UNSET in the innermost layer.
    ///
    /// The caller guarantees `visible` is the key's current effective value;
    /// unsetting an absent key never reaches the stack.
    pub fn unset(&mut self, key: Key, visible: &Value) {
        if let Some(layer) = self.layers.last_mut() {
            layer.record_unset(key, visible);
        }
    }

    /// Resolve `key` against the stack, innermost layer first.
    ///
    /// `None` means no layer mentions the key and the caller must fall
    /// through to the base store. `Some(None)` means the key is effectively
    /// unset; `Some(Some(v))` means it effectively holds `v`.
    pub fn lookup(&self, key: &Key) -> Option<Option<&Value>> {
        self.layers
            .iter()
            .rev()
            .find_map(|layer| layer.change(key))
            .map(Change::effective)
    }

    /// Net count change for `value` across all open layers.
    pub fn net_value_count(&self, value: &Value) -> i64 {
        self.layers.iter().map(|layer| layer.delta(value)).sum()
    }

    /// Merge all layers into one change set keyed by key.
    ///
    /// A change from an inner layer overrides one from an outer layer for
    /// the same key. Iteration order is unspecified; folding into the base
    /// store is commutative per key.
    pub fn collect_net_changes(&self) -> HashMap<Key, Change> {
        let mut merged = HashMap::new();
        for layer in &self.layers {
            for (key, change) in layer.changes() {
                merged.insert(key.clone(), change.clone());
            }
        }
        merged
    }

    /// Discard every layer. Used after a successful commit fold.
    pub fn clear(&mut self) {
        self.layers.clear();
    }
}
