pub mod cli;
pub mod commands;
pub mod utils;

use clap::Parser;
use cli::SniptWeb;
use commands::handle_command;
use std::process;
use utils::init_logging;

/// Run the snipt-web harness
pub fn run_main() {
    let args = SniptWeb::parse();
    init_logging(args.global.verbose);

    if let Err(e) = handle_command(args.command, &args.global) {
        tracing::error!(error = %e, "command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
