//! A single transaction layer: a sparse overlay over whatever was visible
//! when the layer began.

use std::collections::HashMap;

use crate::storage::{Key, Value};

/// A change recorded for one key within one layer.
///
/// `old` is the value visible to the layer before its *first* write to the
/// key (`None` when the key was absent). It is captured once on first touch
/// and carried unchanged through later rewrites in the same layer, so the
/// layer always knows its own pre-image for the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// The key was (re)assigned within the layer.
    Set {
        /// Value visible before the layer first touched the key.
        old: Option<Value>,
        /// The assigned value.
        new: Value,
    },
    /// The key was removed within the layer.
    Unset {
        /// Value visible before the layer first touched the key.
        old: Option<Value>,
    },
}

impl Change {
    /// The value this change makes visible. `None` means effectively unset.
    pub fn effective(&self) -> Option<&Value> {
        match self {
            Change::Set { new, .. } => Some(new),
            Change::Unset { .. } => None,
        }
    }

    /// The value visible before the layer first touched the key.
    pub fn old_value(&self) -> Option<&Value> {
        match self {
            Change::Set { old, .. } | Change::Unset { old } => old.as_ref(),
        }
    }
}

/// One overlay in the transaction stack.
#[derive(Debug, Default)]
pub(crate) struct Layer {
    /// One entry per key touched in this layer. Last write wins.
    changes: HashMap<Key, Change>,
    /// Net count change attributable to this layer alone: +1 per value a
    /// recorded change establishes, -1 per value it displaces. Zero-net
    /// entries may linger; they sum away harmlessly.
    value_deltas: HashMap<Value, i64>,
}

impl Layer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record a SET of `key` to `value`.
    ///
    /// `visible` is the value the caller observed for `key` immediately
    /// before this call. It establishes the layer's baseline only on the
    /// first touch of the key; a rewrite diffs against the value this layer
    /// itself last recorded, never re-deriving a new baseline.
    pub(crate) fn record_set(&mut self, key: Key, value: Value, visible: Option<&Value>) {
        match self.changes.get(&key) {
            Some(change) => {
                let displaced = change.effective().cloned();
                let old = change.old_value().cloned();
                if let Some(prev) = displaced {
                    self.bump(&prev, -1);
                }
                self.bump(&value, 1);
                self.changes.insert(key, Change::Set { old, new: value });
            }
            None => {
                if let Some(visible) = visible {
                    self.bump(visible, -1);
                }
                self.bump(&value, 1);
                self.changes.insert(
                    key,
                    Change::Set {
                        old: visible.cloned(),
                        new: value,
                    },
                );
            }
        }
    }

    /// Record an UNSET of `key`.
    ///
    /// `visible` is the value observed immediately before the call; the
    /// caller guarantees the key is effectively present (unsetting an absent
    /// key never reaches the stack).
    pub(crate) fn record_unset(&mut self, key: Key, visible: &Value) {
        match self.changes.get(&key) {
            Some(change) => {
                let displaced = change.effective().cloned();
                let old = change.old_value().cloned();
                if let Some(prev) = displaced {
                    self.bump(&prev, -1);
                }
                self.changes.insert(key, Change::Unset { old });
            }
            None => {
                self.bump(visible, -1);
                self.changes.insert(
                    key,
                    Change::Unset {
                        old: Some(visible.clone()),
                    },
                );
            }
        }
    }

    /// The change this layer records for `key`, if any.
    pub(crate) fn change(&self, key: &Key) -> Option<&Change> {
        self.changes.get(key)
    }

    /// Net count delta this layer contributes for `value`.
    pub(crate) fn delta(&self, value: &Value) -> i64 {
        self.value_deltas.get(value).copied().unwrap_or(0)
    }

    /// Iterate over all recorded changes.
    pub(crate) fn changes(&self) -> impl Iterator<Item = (&Key, &Change)> {
        self.changes.iter()
    }

    fn bump(&mut self, value: &Value, delta: i64) {
        *self.value_deltas.entry(value.clone()).or_insert(0) += delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k(s: &str) -> Key {
        Key::new(s)
    }

    fn v(s: &str) -> Value {
        Value::new(s)
    }

    #[test]
    fn test_first_touch_captures_baseline() {
        let mut layer = Layer::new();
        layer.record_set(k("a"), v("60"), Some(&v("50")));

        assert_eq!(layer.delta(&v("50")), -1);
        assert_eq!(layer.delta(&v("60")), 1);
        assert_eq!(
            layer.change(&k("a")),
            Some(&Change::Set {
                old: Some(v("50")),
                new: v("60"),
            })
        );
    }

    #[test]
    fn test_rewrite_keeps_original_baseline() {
        let mut layer = Layer::new();
        layer.record_set(k("a"), v("60"), Some(&v("50")));
        // Second write in the same layer: the caller now observes "60",
        // but the recorded baseline must stay "50".
        layer.record_set(k("a"), v("70"), Some(&v("60")));

        assert_eq!(layer.delta(&v("50")), -1);
        assert_eq!(layer.delta(&v("60")), 0);
        assert_eq!(layer.delta(&v("70")), 1);
        assert_eq!(
            layer.change(&k("a")),
            Some(&Change::Set {
                old: Some(v("50")),
                new: v("70"),
            })
        );
    }

    #[test]
    fn test_set_then_unset_of_new_key_nets_zero() {
        let mut layer = Layer::new();
        layer.record_set(k("a"), v("10"), None);
        layer.record_unset(k("a"), &v("10"));

        assert_eq!(layer.delta(&v("10")), 0);
        assert_eq!(layer.change(&k("a")), Some(&Change::Unset { old: None }));
    }

    #[test]
    fn test_unset_then_set_in_same_layer() {
        let mut layer = Layer::new();
        layer.record_unset(k("a"), &v("50"));
        // After the unset the key is effectively absent, so the caller
        // observes nothing before setting again.
        layer.record_set(k("a"), v("80"), None);

        assert_eq!(layer.delta(&v("50")), -1);
        assert_eq!(layer.delta(&v("80")), 1);
        assert_eq!(
            layer.change(&k("a")),
            Some(&Change::Set {
                old: Some(v("50")),
                new: v("80"),
            })
        );
    }

    #[test]
    fn test_effective_value() {
        let set = Change::Set {
            old: None,
            new: v("10"),
        };
        assert_eq!(set.effective(), Some(&v("10")));

        let unset = Change::Unset { old: Some(v("10")) };
        assert_eq!(unset.effective(), None);
    }
}
