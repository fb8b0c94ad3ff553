//! `terraflex print-bindings` — emit the `backend "http"` snippet a
//! terraform-compatible client should use to talk to a configured stack.

use clap::Args;
use std::path::PathBuf;
use terraflex_core::{Error, Result};

#[derive(Args, Debug)]
pub struct PrintBindingsArgs {
    /// Name of the stack to print bindings for
    pub stack: String,

    /// Port the server will listen on
    #[arg(long, default_value_t = 8600)]
    pub port: u16,

    /// Path to the configuration file
    #[arg(long, default_value = "terraflex.yaml")]
    pub config: PathBuf,
}

/// Whether a storage provider `type` tag is lock-capable, without
/// constructing the driver (construction may clone a repository over the
/// network or otherwise touch disk, which a read-only print command must
/// not do).
fn type_is_lockable(provider_type: &str) -> bool {
    matches!(provider_type, "local" | "git")
}

pub async fn run(args: &PrintBindingsArgs) -> Result<()> {
    let config = terraflex_config::load(&args.config)?;
    let stack = config
        .stacks
        .get(&args.stack)
        .ok_or_else(|| Error::UnknownStack(args.stack.clone()))?;

    let provider_cfg = config
        .storage_providers
        .get(&stack.state_storage.provider)
        .ok_or_else(|| Error::UnknownProvider(stack.state_storage.provider.clone()))?;

    let is_lockable = type_is_lockable(&provider_cfg.provider_type);

    let address = format!("http://host:{}/{}/state", args.port, args.stack);
    println!("backend \"http\" {{");
    println!("  address         = \"{address}\"");
    if is_lockable {
        let lock_address = format!("http://host:{}/{}/lock", args.port, args.stack);
        println!("  lock_address    = \"{lock_address}\"");
        println!("  lock_method     = \"PUT\"");
        println!("  unlock_address  = \"{lock_address}\"");
        println!("  unlock_method   = \"DELETE\"");
    }
    println!("}}");

    Ok(())
}
