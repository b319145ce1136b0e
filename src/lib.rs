//! memkv - An In-Memory Transactional Key-Value Store
//!
//! This crate provides a string key-value store with nested transactions and
//! an auxiliary index that answers "how many keys hold value V" in O(1).
//! Writes inside a transaction never touch the base store until COMMIT;
//! ROLLBACK discards only the innermost transaction.
//!
//! # Example
//!
//! ```
//! use memkv::db::Database;
//! use memkv::storage::{Key, Value};
//!
//! let mut db = Database::new();
//! db.set(Key::new("a"), Value::new("10"));
//! db.begin();
//! db.set(Key::new("a"), Value::new("20"));
//! db.rollback().unwrap();
//! assert_eq!(db.get(&Key::new("a")).map(|v| v.as_str()), Some("10"));
//! ```

pub mod command;
pub mod db;
pub mod storage;
pub mod transaction;
