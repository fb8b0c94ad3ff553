//! `terraflex init` — write a starter configuration document.
//!
//! The interactive prompt flow the original tool offers is out of scope
//! here; this command is a non-interactive producer of the same
//! validated document the wizard would have written; edit the result by
//! hand for anything beyond a single local-directory stack.

use clap::Args;
use std::path::PathBuf;
use terraflex_core::Result;

const CONFIG_FILE_NAME: &str = "terraflex.yaml";

const STARTER_TEMPLATE: &str = r#"version: "2.0.0"
storage_providers:
  local:
    type: local
    folder: ./terraflex-state
transformers: {}
stacks:
  main:
    state_storage:
      provider: local
      params:
        path: terraform.tfstate
    transformers: []
"#;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration file
    #[arg(long)]
    pub force: bool,

    /// Directory to write `terraflex.yaml` into
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
}

pub fn run(args: &InitArgs) -> Result<()> {
    let path = args.dir.join(CONFIG_FILE_NAME);
    if path.exists() && !args.force {
        println!("{} already exists; pass --force to overwrite", path.display());
        return Ok(());
    }

    std::fs::write(&path, STARTER_TEMPLATE).map_err(|e| terraflex_core::Error::io(path.display().to_string(), e))?;
    println!("Wrote {}", path.display());
    println!("Edit it to match your storage target, then run `terraflex start`.");
    Ok(())
}
