use super::repo_git;
use anyhow::Result;
use clap::Parser;
use gwt::core::worktree::remove;
use gwt::error::GwtError;
use gwt::output::{CliOutput, Output, OutputConfig};

#[derive(Parser)]
#[command(about = "Remove the worktree of a branch")]
#[command(long_about = r#"
Removes the worktree checked out on <branch>. The branch itself is kept.

git refuses to remove a worktree with modified or untracked files; pass
--force to remove it anyway.
"#)]
pub struct Args {
    #[arg(help = "Branch whose worktree to remove")]
    branch: String,

    #[arg(short, long, help = "Remove even with uncommitted changes")]
    force: bool,
}

pub fn run(args: Args) -> Result<()> {
    let mut output = CliOutput::new(OutputConfig::default());
    run_with_output(&args, &mut output)
}

fn run_with_output(args: &Args, output: &mut dyn Output) -> Result<()> {
    let git = repo_git()?;
    let path = git
        .find_worktree_for_branch(&args.branch)?
        .ok_or_else(|| GwtError::NotFound(args.branch.clone()))?;

    if let Err(e) = remove::remove(&git, &path, args.force) {
        if remove::is_dirty_refusal(&e) {
            output.warning("the worktree has local changes; use --force to remove it anyway");
        }
        return Err(e.into());
    }

    output.success(&format!("✓ Removed worktree: {}", args.branch));
    Ok(())
}
