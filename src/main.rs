use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use structgen::Cli;

/// Exit status when the run could not start at all.
const FATAL_EXIT: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    structgen_logger::init(cli.log_level());

    match cli.run().await {
        Ok(summary) => {
            if let Err(e) = summary.report(&mut io::stdout().lock(), &mut io::stderr().lock()) {
                error!("failed to write report: {}", e);
                return ExitCode::from(FATAL_EXIT);
            }
            ExitCode::from(summary.exit_code())
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::from(FATAL_EXIT)
        }
    }
}
