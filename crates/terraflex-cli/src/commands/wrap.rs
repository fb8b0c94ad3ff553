//! `terraflex wrap` — start the server, wait for readiness, run a
//! command against it, then stop the server.

use crate::startup::initialize_controller;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use terraflex_core::Result;
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct WrapArgs {
    /// Print server access logs
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Port to run the server on
    #[arg(long, default_value_t = 8600)]
    pub port: u16,

    /// Path to the configuration file
    #[arg(long, default_value = "terraflex.yaml")]
    pub config: PathBuf,

    /// Command to run once the server is ready
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

async fn wait_until_ready(port: u16) {
    let url = format!("http://127.0.0.1:{port}/ready");
    loop {
        if let Ok(response) = reqwest::get(&url).await {
            if response.status().is_success() {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}

pub async fn run(args: &WrapArgs) -> Result<i32> {
    let controller = Arc::new(initialize_controller(&args.config).await?);
    let app = terraflex_server::build(controller);

    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| terraflex_core::Error::io(addr.to_string(), e))?;

    if args.verbose {
        info!(%addr, "wrap: server listening");
    }

    let server_task = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            warn!(%err, "wrap: server task exited with an error");
        }
    });

    wait_until_ready(args.port).await;

    let (program, rest) = args
        .command
        .split_first()
        .expect("clap enforces at least one argument");
    let status = std::process::Command::new(program)
        .args(rest)
        .status()
        .map_err(|e| terraflex_core::Error::DriverFailure(format!("failed to run wrapped command: {e}")))?;

    server_task.abort();

    Ok(status.code().unwrap_or(1))
}
