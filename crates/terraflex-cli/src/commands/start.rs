//! `terraflex start` — run the HTTP server in the foreground.

use crate::startup::initialize_controller;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use terraflex_core::Result;
use tracing::info;

#[derive(Args, Debug)]
pub struct StartArgs {
    /// Port to listen on
    #[arg(long, default_value_t = 8600)]
    pub port: u16,

    /// Path to the configuration file
    #[arg(long, default_value = "terraflex.yaml")]
    pub config: PathBuf,
}

pub async fn run(args: &StartArgs) -> Result<()> {
    let controller = Arc::new(initialize_controller(&args.config).await?);
    let app = terraflex_server::build(controller);

    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], args.port));
    info!(%addr, "starting terraflex server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| terraflex_core::Error::io(addr.to_string(), e))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| terraflex_core::Error::DriverFailure(format!("server exited: {e}")))
}
