//! opsgraph - dependency graph layout for startup task plans

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = opsgraph::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
