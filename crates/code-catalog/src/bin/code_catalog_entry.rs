//! Catalogue CLI for adding code table entries.
//!
//! Delegates to `code_catalog::entry_cli` so the update flow stays testable
//! without spawning a process.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use code_catalog::entry_cli::{Args, apply_update, success_message};

fn main() -> ExitCode {
    let args = Args::parse();
    match apply_update(&args) {
        Ok(update) => {
            let message = success_message(&update, &args.catalog);
            if let Err(err) = writeln!(io::stdout().lock(), "{message}") {
                drop(err);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            if let Err(write_err) = writeln!(io::stderr().lock(), "{err}") {
                drop(write_err);
            }
            ExitCode::FAILURE
        }
    }
}
