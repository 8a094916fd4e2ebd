use pagedrop_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // Before anything else; falls back to stderr when the state dir is unusable.
    let target = logging::init();
    tracing::debug!(?target, "logging ready");

    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("pagedrop error: {:#}", err);
        std::process::exit(1);
    }
}
