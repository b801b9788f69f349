use std::process::ExitCode;

use clap::Parser;
use ragflow_uploader::cli::{run, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(summary) => {
            println!("{summary}");
            if summary.has_failures() {
                tracing::warn!(failed = summary.failed(), "CLI finished with failed uploads");
                ExitCode::FAILURE
            } else {
                tracing::info!("CLI completed successfully");
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "CLI exited with error");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
