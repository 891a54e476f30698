use aimeals::cli::{parse_args, run_cli_command};

use color_eyre::Result;
use std::io;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    // RUST_LOG controls the level (e.g. RUST_LOG=aimeals=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let command = parse_args(std::env::args());
    if let Err(e) = run_cli_command(command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
