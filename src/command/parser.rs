//! Line grammar parser.
//!
//! Converts a single input line into a [`Command`]. Command names are
//! case-insensitive, arguments are whitespace-delimited tokens.

use crate::storage::{Key, Value};

use super::error::{ParseError, ParseResult};

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// SET key value
    Set { key: Key, value: Value },
    /// GET key
    Get { key: Key },
    /// UNSET key
    Unset { key: Key },
    /// NUMEQUALTO value
    NumEqualTo { value: Value },
    /// BEGIN
    Begin,
    /// ROLLBACK
    Rollback,
    /// COMMIT
    Commit,
    /// END
    End,
}

/// Parser for the line-oriented command grammar.
pub struct Parser;

impl Parser {
    /// Parse one line into a command.
    pub fn parse(line: &str) -> ParseResult<Command> {
        let mut tokens = line.split_whitespace();
        let name = tokens.next().ok_or(ParseError::EmptyLine)?;
        let args: Vec<&str> = tokens.collect();

        match name.to_uppercase().as_str() {
            "SET" => Self::with_arity("SET", &args, 2, || Command::Set {
                key: Key::new(args[0]),
                value: Value::new(args[1]),
            }),
            "GET" => Self::with_arity("GET", &args, 1, || Command::Get {
                key: Key::new(args[0]),
            }),
            "UNSET" => Self::with_arity("UNSET", &args, 1, || Command::Unset {
                key: Key::new(args[0]),
            }),
            "NUMEQUALTO" => Self::with_arity("NUMEQUALTO", &args, 1, || Command::NumEqualTo {
                value: Value::new(args[0]),
            }),
            "BEGIN" => Self::with_arity("BEGIN", &args, 0, || Command::Begin),
            "ROLLBACK" => Self::with_arity("ROLLBACK", &args, 0, || Command::Rollback),
            "COMMIT" => Self::with_arity("COMMIT", &args, 0, || Command::Commit),
            "END" => Self::with_arity("END", &args, 0, || Command::End),
            other => Err(ParseError::UnknownCommand(other.to_string())),
        }
    }

    fn with_arity(
        command: &'static str,
        args: &[&str],
        expected: usize,
        build: impl FnOnce() -> Command,
    ) -> ParseResult<Command> {
        if args.len() != expected {
            return Err(ParseError::WrongArgCount {
                command,
                expected,
                got: args.len(),
            });
        }
        Ok(build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set() {
        assert_eq!(
            Parser::parse("SET a 10").unwrap(),
            Command::Set {
                key: Key::new("a"),
                value: Value::new("10"),
            }
        );
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(
            Parser::parse("get a").unwrap(),
            Command::Get { key: Key::new("a") }
        );
        assert_eq!(Parser::parse("BeGiN").unwrap(), Command::Begin);
        assert_eq!(
            Parser::parse("numequalto 10").unwrap(),
            Command::NumEqualTo {
                value: Value::new("10"),
            }
        );
    }

    #[test]
    fn test_parse_bare_commands() {
        assert_eq!(Parser::parse("ROLLBACK").unwrap(), Command::Rollback);
        assert_eq!(Parser::parse("COMMIT").unwrap(), Command::Commit);
        assert_eq!(Parser::parse("END").unwrap(), Command::End);
    }

    #[test]
    fn test_parse_tolerates_extra_whitespace() {
        assert_eq!(
            Parser::parse("  UNSET   a  ").unwrap(),
            Command::Unset { key: Key::new("a") }
        );
    }

    #[test]
    fn test_parse_empty_line() {
        assert_eq!(Parser::parse(""), Err(ParseError::EmptyLine));
        assert_eq!(Parser::parse("   "), Err(ParseError::EmptyLine));
    }

    #[test]
    fn test_parse_unknown_command() {
        assert_eq!(
            Parser::parse("DELETE a"),
            Err(ParseError::UnknownCommand("DELETE".to_string()))
        );
    }

    #[test]
    fn test_parse_wrong_arity() {
        assert_eq!(
            Parser::parse("SET a"),
            Err(ParseError::WrongArgCount {
                command: "SET",
                expected: 2,
                got: 1,
            })
        );
        assert_eq!(
            Parser::parse("BEGIN now"),
            Err(ParseError::WrongArgCount {
                command: "BEGIN",
                expected: 0,
                got: 1,
            })
        );
    }
}
