use clap::Parser;
use screener_core::logging;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // File logging when the state dir is writable, stderr otherwise.
    let verbosity = cli.verbosity();
    if let Err(err) = logging::init_logging(verbosity) {
        logging::init_logging_stderr(verbosity);
        tracing::warn!("file logging unavailable, using stderr: {:#}", err);
    }

    if let Err(err) = cli.run().await {
        eprintln!("screener error: {:#}", err);
        std::process::exit(1);
    }
}
