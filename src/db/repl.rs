//! Interactive REPL (Read-Eval-Print Loop) for memkv.

use std::io::{self, BufRead, Write};

use super::api::{Database, DatabaseError, DatabaseResult, Response};

/// REPL configuration.
#[derive(Debug, Clone)]
pub struct ReplConfig {
    /// Prompt string.
    pub prompt: String,
    /// Show timing information.
    pub timing: bool,
    /// Print the banner on startup. Off for piped input.
    pub banner: bool,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: "memkv> ".into(),
            timing: false,
            banner: true,
        }
    }
}

/// The interactive REPL.
pub struct Repl {
    db: Database,
    config: ReplConfig,
    history: Vec<String>,
}

impl Repl {
    /// Create a new REPL with the given database.
    pub fn new(db: Database) -> Self {
        Self {
            db,
            config: ReplConfig::default(),
            history: Vec::new(),
        }
    }

    /// Create a REPL with custom configuration.
    pub fn with_config(db: Database, config: ReplConfig) -> Self {
        Self {
            db,
            config,
            history: Vec::new(),
        }
    }

    /// Run the REPL until END, `.quit`, or EOF.
    pub fn run(&mut self) -> io::Result<()> {
        if self.config.banner {
            self.print_banner();
        }

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            if self.config.banner {
                print!("{}", self.config.prompt);
                stdout.flush()?;
            }

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                // EOF.
                break;
            }

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            self.history.push(line.to_string());

            if self.is_dot_command(line) {
                match self.handle_dot_command(line) {
                    Ok(true) => break,
                    Ok(false) => {}
                    Err(e) => eprintln!("Error: {}", e),
                }
                continue;
            }

            let start = std::time::Instant::now();
            match self.db.execute(line) {
                Ok(Response::Exit) => break,
                Ok(response) => {
                    if let Some(output) = response.render() {
                        println!("{}", output);
                    }
                    if self.config.timing {
                        println!("Time: {:.3}ms", start.elapsed().as_secs_f64() * 1000.0);
                    }
                }
                // Unrecognized lines are silently ignored per the grammar.
                Err(DatabaseError::Parse(_)) => {}
                Err(e) => eprintln!("Error: {}", e),
            }
        }

        Ok(())
    }

    fn print_banner(&self) {
        println!("memkv v{}", env!("CARGO_PKG_VERSION"));
        println!("An in-memory transactional key-value store.");
        println!("Commands: SET k v | GET k | UNSET k | NUMEQUALTO v");
        println!("          BEGIN | ROLLBACK | COMMIT | END");
        println!("Type .help for REPL commands.");
        println!();
    }

    fn is_dot_command(&self, input: &str) -> bool {
        input.starts_with('.') || input.starts_with('\\')
    }

    fn handle_dot_command(&mut self, cmd: &str) -> DatabaseResult<bool> {
        let cmd = cmd.trim_start_matches(&['.', '\\'][..]);
        let parts: Vec<&str> = cmd.split_whitespace().collect();
        let command = parts.first().map(|s| s.to_lowercase());

        match command.as_deref() {
            Some("help") | Some("h") | Some("?") => {
                self.print_help();
            }
            Some("quit") | Some("exit") | Some("q") => {
                return Ok(true);
            }
            Some("stats") => {
                self.print_stats();
            }
            Some("history") => {
                self.print_history();
            }
            Some("timing") => {
                self.config.timing = !self.config.timing;
                println!("Timing: {}", if self.config.timing { "on" } else { "off" });
            }
            Some("clear") => {
                // Clear screen (ANSI escape).
                print!("\x1B[2J\x1B[H");
            }
            Some(cmd) => {
                eprintln!("Unknown command: .{}", cmd);
                eprintln!("Type .help for available commands");
            }
            None => {}
        }

        Ok(false)
    }

    fn print_help(&self) {
        println!("REPL commands:");
        println!("  .help, .h, .?           Show this help message");
        println!("  .quit, .exit, .q        Exit the REPL");
        println!("  .stats                  Show database statistics");
        println!("  .history                Show command history");
        println!("  .timing                 Toggle timing display");
        println!("  .clear                  Clear the screen");
        println!();
        println!("Database commands:");
        println!("  SET key value           Assign value to key");
        println!("  GET key                 Print key's value, or NULL");
        println!("  UNSET key               Remove key");
        println!("  NUMEQUALTO value        Count keys holding value");
        println!("  BEGIN                   Open a (nested) transaction");
        println!("  ROLLBACK                Discard the innermost transaction");
        println!("  COMMIT                  Fold all open transactions");
        println!("  END                     Exit");
        println!();
    }

    fn print_stats(&self) {
        let stats = self.db.stats();
        println!("Database Statistics:");
        println!("  Keys: {}", stats.keys);
        println!("  Distinct Values: {}", stats.distinct_values);
        println!("  Transaction Depth: {}", stats.transaction_depth);
    }

    fn print_history(&self) {
        println!("Command History:");
        for (i, cmd) in self.history.iter().enumerate() {
            println!("  {}: {}", i + 1, cmd);
        }
    }
}
