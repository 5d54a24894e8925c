//! The create-worktree flow as an explicit state machine.
//!
//! A [`Pipeline`] sequences four steps: load configuration, create the
//! worktree, copy files, and run the setup commands one at a time. It never
//! performs I/O itself. [`Pipeline::start`] and [`Pipeline::handle`] are the
//! only transitions; each returns the [`Effect`]s a driver must carry out
//! (run a task, schedule a tick, report the final outcome). Drivers feed the
//! results back as [`Event`]s.
//!
//! Guarantees:
//! - at most one step is running;
//! - once a step fails, every later step stays pending;
//! - exactly one [`Effect::Terminated`] is ever produced, and events after
//!   it are ignored;
//! - ticks are requested only while a setup command is in flight.

use crate::config::Config;
use crate::core::CancelToken;
use crate::error::GwtError;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// How often the elapsed time of a running setup command is refreshed.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    LoadConfig,
    CreateWorktree,
    CopyFiles,
    RunSetup,
}

impl StepKind {
    pub const ALL: [StepKind; 4] = [
        StepKind::LoadConfig,
        StepKind::CreateWorktree,
        StepKind::CopyFiles,
        StepKind::RunSetup,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StepKind::LoadConfig => "Loading configuration",
            StepKind::CreateWorktree => "Creating worktree",
            StepKind::CopyFiles => "Copying files",
            StepKind::RunSetup => "Running setup commands",
        }
    }

    fn next(self) -> Option<StepKind> {
        match self {
            StepKind::LoadConfig => Some(StepKind::CreateWorktree),
            StepKind::CreateWorktree => Some(StepKind::CopyFiles),
            StepKind::CopyFiles => Some(StepKind::RunSetup),
            StepKind::RunSetup => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Running,
    Done,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub kind: StepKind,
    pub status: StepStatus,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

/// A finished setup command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupRecord {
    pub command: String,
    pub duration: Duration,
    pub error: Option<String>,
}

/// The setup command currently executing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveCommand {
    pub command: String,
    pub started: Instant,
    pub elapsed: Duration,
}

/// Progress of the run-setup step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupRun {
    /// Every configured command, in declared order.
    pub commands: Vec<String>,
    /// Finished commands, in the order they ran.
    pub history: Vec<SetupRecord>,
    pub active: Option<ActiveCommand>,
}

/// What a finished step hands back to the pipeline.
#[derive(Debug)]
pub enum StepOutput {
    Config(Config),
    Worktree { project: String, path: PathBuf },
    FilesCopied(usize),
}

#[derive(Debug)]
pub enum Event {
    StepCompleted {
        step: StepKind,
        result: Result<StepOutput, GwtError>,
    },
    CommandCompleted {
        command: String,
        duration: Duration,
        error: Option<GwtError>,
    },
    Tick(Instant),
    Cancel,
}

/// A unit of work for a driver. Carries everything needed to run it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    LoadConfig {
        dir: PathBuf,
    },
    CreateWorktree {
        branch: String,
        from: String,
        root: PathBuf,
    },
    CopyFiles {
        src: PathBuf,
        dest: PathBuf,
        patterns: Vec<String>,
    },
    RunCommand {
        command: String,
        workdir: PathBuf,
    },
}

#[derive(Debug)]
pub enum Effect {
    Run(Task),
    ScheduleTick,
    Terminated(Outcome),
}

#[derive(Debug)]
pub enum Outcome {
    Success { path: PathBuf },
    Failure { step: StepKind, error: GwtError },
    Cancelled,
}

#[derive(Debug)]
pub struct Pipeline {
    branch: String,
    from: String,
    source_dir: PathBuf,
    steps: Vec<Step>,
    state: RunState,
    started: bool,
    tick_pending: bool,
    config: Option<Config>,
    project: Option<String>,
    path: Option<PathBuf>,
    files_copied: usize,
    setup: SetupRun,
}

impl Pipeline {
    /// A pipeline creating `branch` from `from`, copying files out of
    /// `source_dir` (which is also where the configuration is read).
    pub fn new(
        branch: impl Into<String>,
        from: impl Into<String>,
        source_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            branch: branch.into(),
            from: from.into(),
            source_dir: source_dir.into(),
            steps: StepKind::ALL
                .iter()
                .map(|&kind| Step {
                    kind,
                    status: StepStatus::Pending,
                    error: None,
                })
                .collect(),
            state: RunState::Running,
            started: false,
            tick_pending: false,
            config: None,
            project: None,
            path: None,
            files_copied: 0,
            setup: SetupRun::default(),
        }
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn from_branch(&self) -> &str {
        &self.from
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, kind: StepKind) -> &Step {
        &self.steps[kind as usize]
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state != RunState::Running
    }

    pub fn setup(&self) -> &SetupRun {
        &self.setup
    }

    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn files_copied(&self) -> usize {
        self.files_copied
    }

    /// The step currently running, if any.
    pub fn running_step(&self) -> Option<StepKind> {
        self.steps
            .iter()
            .find(|s| s.status == StepStatus::Running)
            .map(|s| s.kind)
    }

    /// Begin the run. Calling it again has no effect.
    pub fn start(&mut self) -> Vec<Effect> {
        if self.started || self.is_terminated() {
            return Vec::new();
        }
        self.started = true;
        self.enter(StepKind::LoadConfig)
    }

    /// Apply one event and return the resulting effects.
    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        if !self.started || self.is_terminated() {
            return Vec::new();
        }
        match event {
            Event::StepCompleted { step, result } => self.on_step_completed(step, result),
            Event::CommandCompleted {
                command,
                duration,
                error,
            } => self.on_command_completed(command, duration, error),
            Event::Tick(now) => self.on_tick(now),
            Event::Cancel => self.on_cancel(),
        }
    }

    fn on_step_completed(
        &mut self,
        step: StepKind,
        result: Result<StepOutput, GwtError>,
    ) -> Vec<Effect> {
        // RunSetup completes through command events only.
        if self.running_step() != Some(step) || step == StepKind::RunSetup {
            tracing::debug!(?step, "ignoring completion for a step that is not running");
            return Vec::new();
        }

        match result {
            Ok(output) => {
                self.apply(output);
                self.set_status(step, StepStatus::Done, None);
                match step.next() {
                    Some(next) => self.enter(next),
                    None => self.succeed(),
                }
            }
            Err(error) => self.fail(step, error),
        }
    }

    fn on_command_completed(
        &mut self,
        command: String,
        duration: Duration,
        error: Option<GwtError>,
    ) -> Vec<Effect> {
        let is_active = self
            .setup
            .active
            .as_ref()
            .is_some_and(|active| active.command == command);
        if !is_active {
            tracing::debug!(%command, "ignoring completion for a command that is not running");
            return Vec::new();
        }

        self.setup.active = None;
        self.setup.history.push(SetupRecord {
            command,
            duration,
            error: error.as_ref().map(ToString::to_string),
        });

        if let Some(error) = error {
            return self.fail(StepKind::RunSetup, error);
        }
        self.dispatch_next_command()
    }

    fn on_tick(&mut self, now: Instant) -> Vec<Effect> {
        self.tick_pending = false;
        match self.setup.active.as_mut() {
            Some(active) => {
                active.elapsed = now.saturating_duration_since(active.started);
                self.schedule_tick()
            }
            None => Vec::new(),
        }
    }

    fn on_cancel(&mut self) -> Vec<Effect> {
        if let Some(step) = self.running_step() {
            self.set_status(step, StepStatus::Error, Some("cancelled".to_string()));
        }
        self.setup.active = None;
        self.state = RunState::Cancelled;
        vec![Effect::Terminated(Outcome::Cancelled)]
    }

    /// Mark `step` running and produce the work it needs.
    fn enter(&mut self, step: StepKind) -> Vec<Effect> {
        self.set_status(step, StepStatus::Running, None);
        let task = match step {
            StepKind::LoadConfig => Task::LoadConfig {
                dir: self.source_dir.clone(),
            },
            StepKind::CreateWorktree => Task::CreateWorktree {
                branch: self.branch.clone(),
                from: self.from.clone(),
                root: self
                    .config
                    .as_ref()
                    .map(|c| c.settings.root.clone())
                    .unwrap_or_default(),
            },
            StepKind::CopyFiles => Task::CopyFiles {
                src: self.source_dir.clone(),
                dest: self.path.clone().unwrap_or_default(),
                patterns: self
                    .config
                    .as_ref()
                    .map(|c| c.copy.clone())
                    .unwrap_or_default(),
            },
            StepKind::RunSetup => {
                self.setup.commands = self
                    .config
                    .as_ref()
                    .map(|c| c.setup.clone())
                    .unwrap_or_default();
                return self.dispatch_next_command();
            }
        };
        vec![Effect::Run(task)]
    }

    /// Start the next setup command, or finish the step when none are left.
    fn dispatch_next_command(&mut self) -> Vec<Effect> {
        let index = self.setup.history.len();
        let Some(command) = self.setup.commands.get(index).cloned() else {
            self.set_status(StepKind::RunSetup, StepStatus::Done, None);
            return self.succeed();
        };

        self.setup.active = Some(ActiveCommand {
            command: command.clone(),
            started: Instant::now(),
            elapsed: Duration::ZERO,
        });
        let mut effects = vec![Effect::Run(Task::RunCommand {
            command,
            workdir: self.path.clone().unwrap_or_default(),
        })];
        effects.extend(self.schedule_tick());
        effects
    }

    fn schedule_tick(&mut self) -> Vec<Effect> {
        if self.tick_pending {
            return Vec::new();
        }
        self.tick_pending = true;
        vec![Effect::ScheduleTick]
    }

    fn apply(&mut self, output: StepOutput) {
        match output {
            StepOutput::Config(config) => self.config = Some(config),
            StepOutput::Worktree { project, path } => {
                self.project = Some(project);
                self.path = Some(path);
            }
            StepOutput::FilesCopied(count) => self.files_copied = count,
        }
    }

    fn fail(&mut self, step: StepKind, error: GwtError) -> Vec<Effect> {
        self.set_status(step, StepStatus::Error, Some(error.to_string()));
        self.state = RunState::Failed;
        vec![Effect::Terminated(Outcome::Failure { step, error })]
    }

    fn succeed(&mut self) -> Vec<Effect> {
        self.state = RunState::Succeeded;
        vec![Effect::Terminated(Outcome::Success {
            path: self.path.clone().unwrap_or_default(),
        })]
    }

    fn set_status(&mut self, step: StepKind, status: StepStatus, error: Option<String>) {
        let entry = &mut self.steps[step as usize];
        entry.status = status;
        entry.error = error;
    }
}

/// Executes pipeline tasks. Each call runs one task to completion and
/// reports it as the matching event.
pub trait TaskRunner {
    fn run(&mut self, task: Task, cancel: &CancelToken) -> Event;
}

/// Run `pipeline` to completion on the current thread.
///
/// Ticks are not delivered: there is nothing to redraw between blocking
/// tasks. `observe` sees the pipeline after every transition.
pub fn drive(
    pipeline: &mut Pipeline,
    runner: &mut dyn TaskRunner,
    cancel: &CancelToken,
    mut observe: impl FnMut(&Pipeline),
) -> Outcome {
    let mut queue: VecDeque<Effect> = pipeline.start().into();
    observe(pipeline);

    while let Some(effect) = queue.pop_front() {
        match effect {
            Effect::Run(task) => {
                let event = if cancel.is_cancelled() {
                    Event::Cancel
                } else {
                    runner.run(task, cancel)
                };
                queue.extend(pipeline.handle(event));
                observe(pipeline);
            }
            Effect::ScheduleTick => {}
            Effect::Terminated(outcome) => return outcome,
        }
    }

    // Only reachable if the pipeline was already finished before the call.
    Outcome::Cancelled
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(setup: &[&str]) -> Config {
        let mut config = Config::starter();
        config.settings.root = PathBuf::from("/wt");
        config.setup = setup.iter().map(|s| s.to_string()).collect();
        config
    }

    /// Answers each task from a script; records what it was asked to run.
    struct ScriptedRunner {
        config: Config,
        fail_step: Option<StepKind>,
        fail_command: Option<String>,
        ran: Vec<Task>,
    }

    impl ScriptedRunner {
        fn new(config: Config) -> Self {
            Self {
                config,
                fail_step: None,
                fail_command: None,
                ran: Vec::new(),
            }
        }
    }

    impl TaskRunner for ScriptedRunner {
        fn run(&mut self, task: Task, _cancel: &CancelToken) -> Event {
            self.ran.push(task.clone());
            let (step, output) = match task {
                Task::LoadConfig { .. } => {
                    (StepKind::LoadConfig, StepOutput::Config(self.config.clone()))
                }
                Task::CreateWorktree { root, branch, .. } => (
                    StepKind::CreateWorktree,
                    StepOutput::Worktree {
                        project: "app".to_string(),
                        path: root.join("app").join(branch),
                    },
                ),
                Task::CopyFiles { .. } => (StepKind::CopyFiles, StepOutput::FilesCopied(2)),
                Task::RunCommand { command, .. } => {
                    let error = (self.fail_command.as_deref() == Some(command.as_str())).then(|| {
                        GwtError::SetupCommand {
                            command: command.clone(),
                            code: Some(1),
                            output: String::new(),
                        }
                    });
                    return Event::CommandCompleted {
                        command,
                        duration: Duration::from_millis(5),
                        error,
                    };
                }
            };
            let result = if self.fail_step == Some(step) {
                Err(GwtError::Conflict(format!("{} broke", step.label())))
            } else {
                Ok(output)
            };
            Event::StepCompleted { step, result }
        }
    }

    fn statuses(p: &Pipeline) -> Vec<StepStatus> {
        p.steps().iter().map(|s| s.status).collect()
    }

    #[test]
    fn test_start_runs_load_config() {
        let mut p = Pipeline::new("feature", "main", "/repo");
        let effects = p.start();
        assert_eq!(effects.len(), 1);
        assert!(matches!(
            &effects[0],
            Effect::Run(Task::LoadConfig { dir }) if dir == Path::new("/repo")
        ));
        assert_eq!(p.running_step(), Some(StepKind::LoadConfig));
        assert!(p.start().is_empty());
    }

    #[test]
    fn test_events_before_start_are_ignored() {
        let mut p = Pipeline::new("feature", "main", "/repo");
        assert!(p.handle(Event::Cancel).is_empty());
        assert_eq!(p.state(), RunState::Running);
    }

    #[test]
    fn test_full_success_runs_commands_in_order() {
        let mut p = Pipeline::new("feature", "main", "/repo");
        let mut runner = ScriptedRunner::new(config(&["a", "b", "c"]));
        let outcome = drive(&mut p, &mut runner, &CancelToken::new(), |_| {});

        match outcome {
            Outcome::Success { path } => assert_eq!(path, PathBuf::from("/wt/app/feature")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(p.state(), RunState::Succeeded);
        assert!(statuses(&p).iter().all(|s| *s == StepStatus::Done));
        let history: Vec<_> = p.setup().history.iter().map(|r| r.command.as_str()).collect();
        assert_eq!(history, vec!["a", "b", "c"]);
        assert_eq!(p.files_copied(), 2);
        assert_eq!(p.project(), Some("app"));

        assert!(matches!(
            &runner.ran[1],
            Task::CreateWorktree { branch, from, root }
                if branch == "feature" && from == "main" && root == Path::new("/wt")
        ));
        assert!(matches!(
            &runner.ran[2],
            Task::CopyFiles { src, dest, .. }
                if src == Path::new("/repo") && dest == Path::new("/wt/app/feature")
        ));
        assert!(matches!(
            &runner.ran[3],
            Task::RunCommand { workdir, .. } if workdir == Path::new("/wt/app/feature")
        ));
    }

    #[test]
    fn test_zero_setup_commands_completes_immediately() {
        let mut p = Pipeline::new("feature", "main", "/repo");
        let mut runner = ScriptedRunner::new(config(&[]));
        let outcome = drive(&mut p, &mut runner, &CancelToken::new(), |_| {});

        assert!(matches!(outcome, Outcome::Success { .. }));
        assert_eq!(p.step(StepKind::RunSetup).status, StepStatus::Done);
        assert!(p.setup().history.is_empty());
        assert!(!runner.ran.iter().any(|t| matches!(t, Task::RunCommand { .. })));
    }

    #[test]
    fn test_step_failure_freezes_later_steps() {
        for (k, failing) in StepKind::ALL[..3].iter().enumerate() {
            let mut p = Pipeline::new("feature", "main", "/repo");
            let mut runner = ScriptedRunner::new(config(&["a"]));
            runner.fail_step = Some(*failing);

            let mut terminations = 0;
            let mut queue: VecDeque<Effect> = p.start().into();
            while let Some(effect) = queue.pop_front() {
                match effect {
                    Effect::Run(task) => {
                        let event = runner.run(task, &CancelToken::new());
                        queue.extend(p.handle(event));
                    }
                    Effect::ScheduleTick => {}
                    Effect::Terminated(outcome) => {
                        terminations += 1;
                        assert!(
                            matches!(outcome, Outcome::Failure { step, .. } if step == *failing)
                        );
                    }
                }
            }

            assert_eq!(terminations, 1);
            assert_eq!(p.state(), RunState::Failed);
            let s = statuses(&p);
            assert!(s[..k].iter().all(|x| *x == StepStatus::Done));
            assert_eq!(s[k], StepStatus::Error);
            assert!(s[k + 1..].iter().all(|x| *x == StepStatus::Pending));
            assert!(p.step(*failing).error.as_deref().unwrap().contains("broke"));
        }
    }

    #[test]
    fn test_failing_command_stops_the_rest() {
        let mut p = Pipeline::new("feature", "main", "/repo");
        let mut runner = ScriptedRunner::new(config(&["echo A", "false", "echo B"]));
        runner.fail_command = Some("false".to_string());

        let outcome = drive(&mut p, &mut runner, &CancelToken::new(), |_| {});
        match outcome {
            Outcome::Failure { step, error } => {
                assert_eq!(step, StepKind::RunSetup);
                assert!(error.to_string().contains("false"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        let history: Vec<_> = p.setup().history.iter().map(|r| r.command.as_str()).collect();
        assert_eq!(history, vec!["echo A", "false"]);
        assert!(p.setup().history[1].error.is_some());
        assert!(!runner
            .ran
            .iter()
            .any(|t| matches!(t, Task::RunCommand { command, .. } if command == "echo B")));
        assert_eq!(p.step(StepKind::RunSetup).status, StepStatus::Error);
    }

    #[test]
    fn test_events_after_termination_are_ignored() {
        let mut p = Pipeline::new("feature", "main", "/repo");
        p.start();
        let effects = p.handle(Event::Cancel);
        assert!(matches!(effects.as_slice(), [Effect::Terminated(Outcome::Cancelled)]));
        assert_eq!(p.state(), RunState::Cancelled);
        assert_eq!(p.step(StepKind::LoadConfig).status, StepStatus::Error);

        assert!(p.handle(Event::Cancel).is_empty());
        assert!(p
            .handle(Event::StepCompleted {
                step: StepKind::LoadConfig,
                result: Ok(StepOutput::Config(config(&[]))),
            })
            .is_empty());
        assert_eq!(p.step(StepKind::CreateWorktree).status, StepStatus::Pending);
    }

    #[test]
    fn test_stale_step_completion_is_ignored() {
        let mut p = Pipeline::new("feature", "main", "/repo");
        p.start();
        let effects = p.handle(Event::StepCompleted {
            step: StepKind::CopyFiles,
            result: Ok(StepOutput::FilesCopied(1)),
        });
        assert!(effects.is_empty());
        assert_eq!(p.running_step(), Some(StepKind::LoadConfig));
    }

    #[test]
    fn test_ticks_only_while_command_in_flight() {
        let mut p = Pipeline::new("feature", "main", "/repo");
        p.start();
        // No command running: a tick does nothing.
        assert!(p.handle(Event::Tick(Instant::now())).is_empty());

        p.handle(Event::StepCompleted {
            step: StepKind::LoadConfig,
            result: Ok(StepOutput::Config(config(&["slow"]))),
        });
        p.handle(Event::StepCompleted {
            step: StepKind::CreateWorktree,
            result: Ok(StepOutput::Worktree {
                project: "app".to_string(),
                path: PathBuf::from("/wt/app/feature"),
            }),
        });
        let effects = p.handle(Event::StepCompleted {
            step: StepKind::CopyFiles,
            result: Ok(StepOutput::FilesCopied(0)),
        });
        assert_eq!(effects.len(), 2);
        assert!(matches!(effects[1], Effect::ScheduleTick));

        let started = p.setup().active.as_ref().unwrap().started;
        let effects = p.handle(Event::Tick(started + Duration::from_millis(250)));
        assert!(matches!(effects.as_slice(), [Effect::ScheduleTick]));
        assert_eq!(
            p.setup().active.as_ref().unwrap().elapsed,
            Duration::from_millis(250)
        );

        let effects = p.handle(Event::CommandCompleted {
            command: "slow".to_string(),
            duration: Duration::from_millis(300),
            error: None,
        });
        assert!(matches!(effects.as_slice(), [Effect::Terminated(Outcome::Success { .. })]));
        assert!(p.handle(Event::Tick(Instant::now())).is_empty());
    }

    #[test]
    fn test_single_pending_tick_across_commands() {
        let mut p = Pipeline::new("feature", "main", "/repo");
        p.start();
        p.handle(Event::StepCompleted {
            step: StepKind::LoadConfig,
            result: Ok(StepOutput::Config(config(&["a", "b"]))),
        });
        p.handle(Event::StepCompleted {
            step: StepKind::CreateWorktree,
            result: Ok(StepOutput::Worktree {
                project: "app".to_string(),
                path: PathBuf::from("/wt/app/feature"),
            }),
        });
        p.handle(Event::StepCompleted {
            step: StepKind::CopyFiles,
            result: Ok(StepOutput::FilesCopied(0)),
        });
        // First command finishes before its tick fires: no second tick.
        let effects = p.handle(Event::CommandCompleted {
            command: "a".to_string(),
            duration: Duration::from_millis(1),
            error: None,
        });
        assert_eq!(effects.len(), 1);
        assert!(matches!(
            &effects[0],
            Effect::Run(Task::RunCommand { command, .. }) if command == "b"
        ));
    }

    #[test]
    fn test_cancel_during_setup() {
        let mut p = Pipeline::new("feature", "main", "/repo");
        p.start();
        p.handle(Event::StepCompleted {
            step: StepKind::LoadConfig,
            result: Ok(StepOutput::Config(config(&["a"]))),
        });
        p.handle(Event::StepCompleted {
            step: StepKind::CreateWorktree,
            result: Ok(StepOutput::Worktree {
                project: "app".to_string(),
                path: PathBuf::from("/wt/app/feature"),
            }),
        });
        p.handle(Event::StepCompleted {
            step: StepKind::CopyFiles,
            result: Ok(StepOutput::FilesCopied(0)),
        });

        let effects = p.handle(Event::Cancel);
        assert!(matches!(effects.as_slice(), [Effect::Terminated(Outcome::Cancelled)]));
        assert!(p.setup().active.is_none());
        // The killed command reporting back later changes nothing.
        assert!(p
            .handle(Event::CommandCompleted {
                command: "a".to_string(),
                duration: Duration::from_millis(1),
                error: Some(GwtError::Cancelled),
            })
            .is_empty());
        assert!(p.setup().history.is_empty());
    }

    #[test]
    fn test_drive_with_cancelled_token() {
        let mut p = Pipeline::new("feature", "main", "/repo");
        let mut runner = ScriptedRunner::new(config(&[]));
        let cancel = CancelToken::new();
        cancel.cancel();

        let outcome = drive(&mut p, &mut runner, &cancel, |_| {});
        assert!(matches!(outcome, Outcome::Cancelled));
        assert!(runner.ran.is_empty());
    }

    #[test]
    fn test_drive_observes_each_transition() {
        let mut p = Pipeline::new("feature", "main", "/repo");
        let mut runner = ScriptedRunner::new(config(&["a"]));
        let mut seen = Vec::new();
        drive(&mut p, &mut runner, &CancelToken::new(), |p| {
            seen.push(p.running_step());
        });
        assert_eq!(
            seen,
            vec![
                Some(StepKind::LoadConfig),
                Some(StepKind::CreateWorktree),
                Some(StepKind::CopyFiles),
                Some(StepKind::RunSetup),
                None,
            ]
        );
    }
}
