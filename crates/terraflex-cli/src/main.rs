//! `terraflex` — a remote state backend speaking the terraform-compatible
//! HTTP backend protocol.

mod commands;
mod startup;

use clap::Parser;
use commands::{Cli, Commands};
use std::process::ExitCode;
use tracing::{error, Level};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    match runtime.block_on(run_command(&cli)) {
        Ok(code) => code,
        Err(err) => {
            error!(%err, "terraflex failed");
            ExitCode::FAILURE
        }
    }
}

async fn run_command(cli: &Cli) -> Result<ExitCode, terraflex_core::Error> {
    match &cli.command {
        Commands::Init(args) => {
            commands::init::run(args)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Start(args) => {
            commands::start::run(args).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Wrap(args) => {
            let code = commands::wrap::run(args).await?;
            Ok(if code == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        Commands::PrintBindings(args) => {
            commands::print_bindings::run(args).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
