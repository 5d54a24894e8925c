//! Executes create-flow tasks against git and the filesystem.

use super::pipeline::{Event, StepKind, StepOutput, Task, TaskRunner};
use super::worktree::{copy, create, setup};
use super::{CancelToken, NullSink};
use crate::config::Config;
use crate::error::GwtError;
use crate::git::GitCommand;
use std::io::Write;
use std::time::Instant;

/// The production [`TaskRunner`].
///
/// Setup commands write their trace (per [`setup::SetupOptions`]) to `trace`;
/// the interactive view passes `io::sink()` and renders from pipeline state.
pub struct WorktreeRunner {
    git: GitCommand,
    options: setup::SetupOptions,
    trace: Box<dyn Write + Send>,
}

impl WorktreeRunner {
    pub fn new(
        git: GitCommand,
        options: setup::SetupOptions,
        trace: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            git,
            options,
            trace,
        }
    }

    fn create_worktree(
        &self,
        branch: &str,
        from: &str,
        root: &std::path::Path,
    ) -> Result<StepOutput, GwtError> {
        let project = self.git.project_name()?;
        let target = create::worktree_path(root, &project, branch);
        let created = create::create(&self.git, branch, from, &target, &mut NullSink)?;
        Ok(StepOutput::Worktree {
            project,
            path: created.path,
        })
    }
}

impl TaskRunner for WorktreeRunner {
    fn run(&mut self, task: Task, cancel: &CancelToken) -> Event {
        let (step, result) = match task {
            Task::LoadConfig { dir } => {
                (StepKind::LoadConfig, Config::load(&dir).map(StepOutput::Config))
            }
            Task::CreateWorktree { branch, from, root } => {
                (StepKind::CreateWorktree, self.create_worktree(&branch, &from, &root))
            }
            Task::CopyFiles {
                src,
                dest,
                patterns,
            } => (
                StepKind::CopyFiles,
                copy::copy_files(&src, &dest, &patterns).map(StepOutput::FilesCopied),
            ),
            Task::RunCommand { command, workdir } => {
                let start = Instant::now();
                let result = setup::run_setup_commands(
                    &workdir,
                    std::slice::from_ref(&command),
                    self.options,
                    &mut self.trace,
                    cancel,
                );
                return match result {
                    Err(GwtError::Cancelled) => Event::Cancel,
                    result => Event::CommandCompleted {
                        command,
                        duration: start.elapsed(),
                        error: result.err(),
                    },
                };
            }
        };
        Event::StepCompleted { step, result }
    }
}
