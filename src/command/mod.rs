//! The line-oriented command grammar.
//!
//! This module only parses; execution lives in [`crate::db`]. The grammar is
//! deliberately forgiving at the loop level: blank and unrecognized lines
//! parse to an error the request loop silently drops.

mod error;
mod parser;

pub use error::{ParseError, ParseResult};
pub use parser::{Command, Parser};
