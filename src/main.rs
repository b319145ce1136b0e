//! memkv - An In-Memory Transactional Key-Value Store
//!
//! This is the main entry point for the memkv command-line interface.

use std::process::ExitCode;

use memkv::db::{Database, DatabaseConfig, Repl, ReplConfig};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    // Parse simple command line args.
    let mut verbose = false;
    let mut quiet = false;
    let mut execute: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-e" | "--execute" => {
                i += 1;
                if i < args.len() {
                    execute = Some(args[i].clone());
                }
            }
            "-v" | "--verbose" => {
                verbose = true;
            }
            "-q" | "--quiet" => {
                quiet = true;
            }
            "-h" | "--help" => {
                print_help();
                return ExitCode::SUCCESS;
            }
            "--version" => {
                println!("memkv v{}", env!("CARGO_PKG_VERSION"));
                return ExitCode::SUCCESS;
            }
            arg => {
                eprintln!("Unknown option: {}", arg);
                return ExitCode::FAILURE;
            }
        }
        i += 1;
    }

    let config = DatabaseConfig::new().verbose(verbose);
    let db = Database::with_config(config);

    // Execute given commands or run the request loop.
    if let Some(commands) = execute {
        execute_commands(db, &commands);
        ExitCode::SUCCESS
    } else {
        match run_repl(db, quiet) {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        }
    }
}

fn print_help() {
    println!("memkv - An in-memory transactional key-value store");
    println!();
    println!("Usage: memkv [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -e, --execute CMDS     Execute commands (';'-separated) and exit");
    println!("  -q, --quiet            No banner or prompt (for piped input)");
    println!("  -v, --verbose          Enable verbose output");
    println!("  -h, --help             Show this help message");
    println!("  --version              Show version");
    println!();
    println!("Examples:");
    println!("  memkv                               Start the interactive REPL");
    println!("  memkv -q < session.txt              Run a recorded session");
    println!("  memkv -e 'SET a 10; GET a'          Execute commands and exit");
}

fn execute_commands(mut db: Database, commands: &str) {
    let script = commands
        .split(';')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");

    for response in db.execute_script(&script) {
        if let Some(output) = response.render() {
            println!("{}", output);
        }
    }
}

fn run_repl(db: Database, quiet: bool) -> std::io::Result<()> {
    let config = ReplConfig {
        banner: !quiet,
        ..ReplConfig::default()
    };
    let mut repl = Repl::with_config(db, config);
    repl.run()
}
