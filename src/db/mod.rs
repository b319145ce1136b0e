//! High-level Database API and REPL interface.
//!
//! This module composes the base store and the transaction stack into the
//! user-facing [`Database`] facade, and provides the interactive
//! command-line interface on top of it.

mod api;
mod connection;
mod repl;

pub use api::{Database, DatabaseConfig, DatabaseError, DatabaseResult, DatabaseStats, Response};
pub use connection::SharedDatabase;
pub use repl::{Repl, ReplConfig};
