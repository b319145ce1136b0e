//! Storage layer for memkv.
//!
//! This module owns committed state: the key-value entries and the
//! value-count index that makes NUMEQUALTO an O(1) lookup. Nothing in here
//! knows about transactions; the transaction stack and the facade layer
//! decide when the store is allowed to change.

mod store;
mod types;

pub use store::Store;
pub use types::{Key, Value};
