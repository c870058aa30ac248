use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use posting_harvest::app;
use posting_harvest::cli::Cli;
use posting_harvest::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match app::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "posting-harvest failed");
            ExitCode::FAILURE
        }
    }
}
