use super::repo_git;
use anyhow::Result;
use clap::Parser;
use gwt::error::GwtError;
use gwt::output::{CliOutput, Output, OutputConfig};

#[derive(Parser)]
#[command(about = "Print the path of a branch's worktree")]
#[command(long_about = r#"
Prints the path of the worktree checked out on <branch> and nothing else.
The shell integration (see `gwt shell`) changes into that directory.
"#)]
pub struct Args {
    #[arg(help = "Branch to switch to")]
    branch: String,
}

pub fn run(args: Args) -> Result<()> {
    let git = repo_git()?;
    let path = git
        .find_worktree_for_branch(&args.branch)?
        .ok_or_else(|| GwtError::NotFound(args.branch.clone()))?;

    CliOutput::new(OutputConfig::default()).handoff(&path);
    Ok(())
}
