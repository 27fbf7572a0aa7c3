use clap::Parser;
use std::io;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

use govdigest::cli::{self, menu};
use govdigest::pipeline::Stage;

#[derive(Parser)]
#[command(name = "govdigest", version)]
#[command(about = "Summarize DAO governance proposals with LLM pros & cons analysis", long_about = None)]
struct Cli {
    #[command(flatten)]
    run: cli::run::RunArgs,

    /// Exit immediately instead of waiting for ENTER
    #[arg(long)]
    no_wait: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut input = io::stdin().lock();
    let mut out = io::stdout();

    let code = match cli::run::run(cli.run, &mut input, &mut out).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(stage = %Stage::Aborted, "Unexpected error: {:#}", e);
            ExitCode::FAILURE
        }
    };

    // Always reach the closing banner, even after an abort
    let _ = menu::print_completion_banner(&mut out);
    if !cli.no_wait {
        let _ = menu::wait_for_enter(&mut input, &mut out);
    }

    code
}
