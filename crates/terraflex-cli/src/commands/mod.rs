//! Subcommand definitions.

pub mod init;
pub mod print_bindings;
pub mod start;
pub mod wrap;

use clap::{Parser, Subcommand};

/// The `terraflex` command-line entry point.
#[derive(Parser, Debug)]
#[command(name = "terraflex")]
#[command(author = "Terraflex Contributors")]
#[command(version)]
#[command(about = "Remote state backend for terraform-compatible HTTP backends", long_about = None)]
pub struct Cli {
    /// Increase logging verbosity: -v for info, -vv for debug, -vvv for trace
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a starter `terraflex.yaml` in the current directory
    Init(init::InitArgs),

    /// Start the HTTP server
    Start(start::StartArgs),

    /// Start the server, run a command against it, then stop the server
    Wrap(wrap::WrapArgs),

    /// Print the `backend "http"` block for a configured stack
    #[command(name = "print-bindings")]
    PrintBindings(print_bindings::PrintBindingsArgs),
}
