use super::{current_dir, repo_git};
use anyhow::Result;
use clap::Parser;
use gwt::config::Config;
use gwt::core::OutputSink;
use gwt::core::worktree::clean::{clean_merged, CleanReport};
use gwt::output::{CliOutput, Output, OutputConfig};

#[derive(Parser)]
#[command(about = "Remove worktrees whose branches are merged")]
#[command(long_about = r#"
Removes every worktree whose branch is merged into the default branch, then
deletes the branch. The main worktree, the default branch, main and master
are never removed.

Requires settings.auto_clean_merged in .worktree.yaml.
"#)]
pub struct Args {
    #[arg(short, long, help = "Be verbose; show detailed progress")]
    verbose: bool,
}

pub fn run(args: Args) -> Result<()> {
    let mut output = CliOutput::new(OutputConfig::new(false, args.verbose));
    let git = repo_git()?;
    let config = Config::load(&current_dir()?)?;

    let report = clean_merged(&git, &config, &mut OutputSink(&mut output))?;
    print_report(&report, &mut output);
    Ok(())
}

fn print_report(report: &CleanReport, output: &mut dyn Output) {
    if report.removed.is_empty() && report.failed.is_empty() {
        output.info("No merged worktrees to clean");
        return;
    }

    for removed in &report.removed {
        output.info(&format!("Removing merged worktree: {}", removed.branch));
        output.success("  ✓ Done");
    }
    for (branch, err) in &report.failed {
        output.info(&format!("Removing merged worktree: {branch}"));
        output.error(&format!("  ✗ Failed: {err}"));
    }

    output.success(&format!("✓ Cleaned {} worktree(s)", report.removed.len()));
}
