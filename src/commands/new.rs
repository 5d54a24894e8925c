use super::{cancel_on_interrupt, cancelled, current_dir, repo_git};
use anyhow::Result;
use clap::Parser;
use gwt::core::pipeline::{drive, Outcome, Pipeline, StepKind, StepStatus};
use gwt::core::worktree::setup::SetupOptions;
use gwt::core::{CancelToken, WorktreeRunner};
use gwt::error::GwtError;
use gwt::git::GitCommand;
use gwt::output::{CliOutput, Output, OutputConfig, OutputFormat};
use gwt::ui::{self, FlowOutcome};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(about = "Create a worktree for a branch")]
#[command(long_about = r#"
Creates a worktree for <branch> under <root>/<project>/<branch>, where <root>
is settings.root from .worktree.yaml and <project> comes from the origin URL.

An existing local branch is checked out; otherwise a new branch is created
from --from (the repository's default branch when omitted). The paths listed
under `copy` are then copied from the current directory and the `setup`
commands run inside the new worktree, in order.

On a terminal a live progress view is shown; press q to cancel. With
--verbose, --timed, --plain, --json or --no-tui the steps are printed instead.
"#)]
pub struct Args {
    #[arg(help = "Branch to check out or create")]
    branch: String,

    #[arg(short, long, help = "Base branch for a new branch")]
    from: Option<String>,

    #[arg(short, long, help = "Stream setup command output")]
    verbose: bool,

    #[arg(short, long, help = "Print each setup command and how long it took")]
    timed: bool,

    #[arg(long, help = "Print progress instead of showing the live view")]
    no_tui: bool,

    #[arg(long, help = "Print key=value lines")]
    plain: bool,

    #[arg(long, help = "Print a JSON document")]
    json: bool,
}

#[derive(Debug, Serialize)]
struct CreatedJson<'a> {
    status: &'static str,
    branch: &'a str,
    from: &'a str,
    path: &'a Path,
}

pub fn run(args: Args) -> Result<()> {
    let format = OutputFormat::from_flags(args.plain, args.json)?;
    if args.json && (args.verbose || args.timed) {
        return Err(GwtError::Conflict(
            "--json cannot be combined with --verbose or --timed".to_string(),
        )
        .into());
    }

    let git = repo_git()?;
    let source_dir = current_dir()?;
    let from = args.from.clone().unwrap_or_else(|| git.default_branch());
    let mut output = CliOutput::new(OutputConfig::new(false, args.verbose).with_format(format));

    let use_tui = !args.no_tui
        && !format.is_machine()
        && !args.verbose
        && !args.timed
        && ui::has_interactive_tty();

    if use_tui {
        return match ui::create::run(git, &args.branch, &from, source_dir) {
            FlowOutcome::Selected(path) => {
                output.handoff(&path);
                Ok(())
            }
            FlowOutcome::Cancelled => Err(cancelled()),
            FlowOutcome::Failed(e) => Err(e.into()),
        };
    }

    let options = SetupOptions {
        verbose: args.verbose,
        timed: args.timed,
    };
    run_scripted(git, &args.branch, &from, source_dir, options, &mut output)
}

/// Create the worktree without the live view, reporting each finished step.
fn run_scripted(
    git: GitCommand,
    branch: &str,
    from: &str,
    source_dir: PathBuf,
    options: SetupOptions,
    output: &mut dyn Output,
) -> Result<()> {
    let format = output.format();
    let trace: Box<dyn Write + Send> = match format {
        OutputFormat::Json => Box::new(io::sink()),
        _ => Box::new(io::stderr()),
    };

    let cancel = CancelToken::new();
    cancel_on_interrupt(&cancel);

    let mut runner = WorktreeRunner::new(git, options, trace);
    let mut pipeline = Pipeline::new(branch, from, source_dir);
    let mut reporter = StepReporter::new(format);
    reporter.header(output);

    let outcome = drive(&mut pipeline, &mut runner, &cancel, |p| reporter.observe(p, output));
    match outcome {
        Outcome::Success { path } => {
            reporter.finish(branch, from, &path, output)?;
            Ok(())
        }
        Outcome::Failure { error, .. } => Err(error.into()),
        Outcome::Cancelled => Err(cancelled()),
    }
}

/// Prints each pipeline step once, as it completes.
struct StepReporter {
    format: OutputFormat,
    reported: Vec<StepKind>,
    setup_announced: bool,
}

impl StepReporter {
    fn new(format: OutputFormat) -> Self {
        Self {
            format,
            reported: Vec::new(),
            setup_announced: false,
        }
    }

    fn header(&self, output: &mut dyn Output) {
        match self.format {
            OutputFormat::Pretty => output.result("Creating worktree (non-TUI)"),
            OutputFormat::Plain => output.info("Creating worktree"),
            OutputFormat::Json => {}
        }
    }

    fn observe(&mut self, pipeline: &Pipeline, output: &mut dyn Output) {
        for step in pipeline.steps() {
            if step.status != StepStatus::Done || self.reported.contains(&step.kind) {
                continue;
            }
            self.reported.push(step.kind);
            self.step_done(step.kind, pipeline, output);
        }

        let setup = pipeline.setup();
        if !self.setup_announced
            && pipeline.step(StepKind::RunSetup).status != StepStatus::Pending
            && !setup.commands.is_empty()
        {
            self.setup_announced = true;
            match self.format {
                OutputFormat::Pretty => output.info("Running setup commands:"),
                OutputFormat::Plain => output.data("running_setup=true"),
                OutputFormat::Json => {}
            }
        }
    }

    fn step_done(&self, kind: StepKind, pipeline: &Pipeline, output: &mut dyn Output) {
        match (kind, self.format) {
            (StepKind::CreateWorktree, OutputFormat::Pretty) => {
                output.info(&format!("→ Project: {}", pipeline.project().unwrap_or_default()));
                output.info(&format!("→ From: {}", pipeline.from_branch()));
                output.info(&format!("→ Path: {}", display(pipeline.path())));
                output.success("✓ Worktree created");
            }
            (StepKind::CreateWorktree, OutputFormat::Plain) => {
                output.data(&format!("project={}", pipeline.project().unwrap_or_default()));
                output.data(&format!("from={}", pipeline.from_branch()));
                output.data(&format!("path={}", display(pipeline.path())));
                output.data("worktree_created=true");
            }
            (StepKind::CopyFiles, OutputFormat::Pretty) => output.success("✓ Files copied"),
            (StepKind::CopyFiles, OutputFormat::Plain) => output.data("files_copied=true"),
            _ => {}
        }
    }

    fn finish(&self, branch: &str, from: &str, path: &Path, output: &mut dyn Output) -> Result<()> {
        match self.format {
            OutputFormat::Pretty => {
                output.success("✓ Done");
                output.handoff(path);
            }
            OutputFormat::Plain => {
                output.data("status=ok");
                output.data(&format!("path={}", path.display()));
            }
            OutputFormat::Json => {
                let doc = CreatedJson {
                    status: "ok",
                    branch,
                    from,
                    path,
                };
                output.data(&serde_json::to_string_pretty(&doc)?);
            }
        }
        Ok(())
    }
}

fn display(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_default()
}
