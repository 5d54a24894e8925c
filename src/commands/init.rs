use super::current_dir;
use anyhow::Result;
use clap::Parser;
use gwt::config::{Config, CONFIG_FILE};
use gwt::error::GwtError;
use gwt::output::{CliOutput, Output, OutputConfig};
use std::path::Path;

#[derive(Parser)]
#[command(about = "Create a .worktree.yaml in the current directory")]
#[command(long_about = r#"
Writes a starter .worktree.yaml:

    version: 1
    copy: [.env, .env.local]
    setup: [npm install]
    settings:
      root: ~/git-worktrees
      auto_clean_merged: true
      confirm_delete: true

Fails if the file already exists.
"#)]
pub struct Args {}

pub fn run(_args: Args) -> Result<()> {
    let mut output = CliOutput::new(OutputConfig::default());
    init_in(&current_dir()?, &mut output)
}

fn init_in(dir: &Path, output: &mut dyn Output) -> Result<()> {
    if dir.join(CONFIG_FILE).exists() {
        return Err(GwtError::Conflict(format!("{CONFIG_FILE} already exists")).into());
    }

    Config::starter().save(dir)?;
    output.success(&format!("✓ Created {CONFIG_FILE}"));
    output.info("Edit this file to customize your worktree setup");
    Ok(())
}
