use anyhow::Result;
use log::error;
use std::process;

use repopulse::{app, cli, logging};

fn main() {
    if let Err(e) = run() {
        error!("Application error: {}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = cli::parse_args();
    cli::validate_args(&args)?;

    let config = app::load_configuration(&args)?;

    let log_config = app::configure_logging(&args, &config)?;
    logging::init_logger(log_config)?;

    // Single runtime for the whole application.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(app::run(args, config))
}
