//! Nested transaction support for memkv.
//!
//! Each BEGIN pushes a new overlay layer onto the stack. Reads resolve
//! against the innermost layer that mentions a key before falling through to
//! the base store; ROLLBACK discards only the innermost layer; COMMIT folds
//! the net change set of every layer into the base store in one pass.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              TransactionStack               │
//! │   (ordered layers, innermost resolves 1st)  │
//! └─────────────────────────────────────────────┘
//!          │                       │
//!          ▼                       ▼
//!   ┌─────────────┐         ┌─────────────┐
//!   │    Layer    │   ...   │    Layer    │
//!   │ changes +   │         │ changes +   │
//!   │ count delta │         │ count delta │
//!   └─────────────┘         └─────────────┘
//! ```

mod error;
mod layer;
mod stack;

pub use error::{TransactionError, TransactionResult};
pub use layer::Change;
pub use stack::TransactionStack;
