use super::{current_dir, repo_git};
use anyhow::Result;
use clap::Parser;
use gwt::core::OutputSink;
use gwt::core::worktree::done::update_base_then_remove;
use gwt::error::GwtError;
use gwt::git::GitCommand;
use gwt::output::{CliOutput, Output, OutputConfig};

#[derive(Parser)]
#[command(about = "Finish a branch: update the base branch and remove the worktree")]
#[command(long_about = r#"
Fast-forwards <base> and removes the worktree of <branch>, deleting the
branch when it is fully merged.

If <base> is checked out in a worktree, `git pull --ff-only` runs there.
Otherwise the local <base> ref is fast-forwarded from origin without a
checkout. <branch> defaults to the branch of the current worktree and
<base> to the repository's default branch.

With --print-path, the base worktree's path is printed on success so the
shell integration can move there.
"#)]
pub struct Args {
    #[arg(help = "Branch to finish (default: the current worktree's branch)")]
    branch: Option<String>,

    #[arg(help = "Base branch to update (default: the default branch)")]
    base: Option<String>,

    #[arg(long, help = "Print the base worktree path on success")]
    print_path: bool,

    #[arg(short, long, help = "Be verbose; show detailed progress")]
    verbose: bool,
}

pub fn run(args: Args) -> Result<()> {
    let mut output = CliOutput::new(OutputConfig::new(false, args.verbose));
    let git = repo_git()?;
    run_with_output(&git, &args, &mut output)
}

fn run_with_output(git: &GitCommand, args: &Args, output: &mut dyn Output) -> Result<()> {
    let branch = match &args.branch {
        Some(branch) => branch.clone(),
        None => current_branch(git)?,
    };
    let base = args.base.clone().unwrap_or_else(|| git.default_branch());

    let result = update_base_then_remove(git, &branch, &base, &mut OutputSink(&mut *output))?;

    if result.used_base_worktree {
        output.success(&format!("✓ Updated base branch {base}"));
    } else {
        output.success(&format!("✓ Updated local base branch ref {base}"));
    }
    output.success(&format!("✓ Done: removed {branch}"));

    if args.print_path {
        output.handoff(&result.base_path);
    }
    Ok(())
}

/// The branch of the worktree containing the current directory.
fn current_branch(git: &GitCommand) -> Result<String> {
    let branch = git.current_branch_in(&current_dir()?).unwrap_or_default();
    if branch.is_empty() || branch == "HEAD" {
        return Err(GwtError::Conflict(
            "usage: gwt done <branch> [base] (or run inside a worktree)".to_string(),
        )
        .into());
    }
    Ok(branch)
}
