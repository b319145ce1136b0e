//! Transaction error types.

use thiserror::Error;

/// Result type for transaction operations.
pub type TransactionResult<T> = Result<T, TransactionError>;

/// Errors that can occur during transaction operations.
///
/// There is exactly one: ROLLBACK or COMMIT without an open transaction.
/// It is always recoverable and never leaves the store or the stack in a
/// different state than before the failed call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    /// ROLLBACK or COMMIT was issued with no transaction open.
    #[error("NO TRANSACTION")]
    NoActiveTransaction,
}
