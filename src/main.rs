//! crudbase CLI entry point
//!
//! Parses arguments and delegates to `cli::run`. Errors print as JSON on
//! stderr with exit code 1.

use clap::Parser;
use crudbase::cli::{self, Cli};

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    if let Err(e) = cli::run(args).await {
        cli::write_error(&e);
        std::process::exit(1);
    }
}
