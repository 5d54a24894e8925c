//! Live progress view for `gwt new`.
//!
//! Renders an inline region on stderr while a worker thread carries out the
//! pipeline's tasks. Every thread talks to the render loop through one
//! event channel; the loop is the only place the [`Pipeline`] is mutated.

use super::FlowOutcome;
use crate::core::pipeline::{
    Effect, Event, Outcome, Pipeline, RunState, StepStatus, Task, TaskRunner, TICK_INTERVAL,
};
use crate::core::worktree::setup::{format_duration, SetupOptions};
use crate::core::{CancelToken, WorktreeRunner};
use crate::error::GwtError;
use crate::git::GitCommand;
use crossterm::event::{self, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use ratatui::backend::CrosstermBackend;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::{Terminal, TerminalOptions, Viewport};
use std::io::{self, Stderr, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const SPINNER: &[&str] = &["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];
const FRAME_INTERVAL: Duration = Duration::from_millis(80);
const KEY_POLL: Duration = Duration::from_millis(50);

/// Setup trace entries kept on screen; older ones scroll away.
const TRACE_ROWS: usize = 6;
const VIEW_HEIGHT: u16 = 20;

const CHECK: &str = "✓";
const CROSS: &str = "✗";
const BULLET: &str = "•";

/// Create `branch` from `from` with a live view, copying from `source_dir`.
pub fn run(git: GitCommand, branch: &str, from: &str, source_dir: PathBuf) -> FlowOutcome {
    match run_view(git, branch, from, source_dir) {
        Ok(outcome) => match outcome {
            Outcome::Success { path } => FlowOutcome::Selected(path),
            Outcome::Failure { error, .. } => FlowOutcome::Failed(error),
            Outcome::Cancelled => FlowOutcome::Cancelled,
        },
        Err(e) => FlowOutcome::Failed(e),
    }
}

/// Restores cooked mode however the view exits.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self, GwtError> {
        enable_raw_mode().map_err(|e| GwtError::io("failed to enable raw mode", e))?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

fn run_view(
    git: GitCommand,
    branch: &str,
    from: &str,
    source_dir: PathBuf,
) -> Result<Outcome, GwtError> {
    let cancel = CancelToken::new();
    let (event_tx, event_rx) = mpsc::channel::<Event>();

    let runner = WorktreeRunner::new(git, SetupOptions::default(), Box::new(io::sink()));
    let task_tx = spawn_worker(runner, cancel.clone(), event_tx.clone());
    let tick_tx = spawn_ticker(event_tx.clone());

    let interrupt_tx = event_tx.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = interrupt_tx.send(Event::Cancel);
    }) {
        tracing::debug!(error = %e, "could not install interrupt handler");
    }

    let guard = RawModeGuard::enable()?;
    let stop_keys = Arc::new(AtomicBool::new(false));
    let keys = spawn_key_reader(event_tx, stop_keys.clone());

    let mut terminal = Terminal::with_options(
        CrosstermBackend::new(io::stderr()),
        TerminalOptions {
            viewport: Viewport::Inline(VIEW_HEIGHT),
        },
    )
    .map_err(|e| GwtError::io("failed to initialize terminal", e))?;

    let mut pipeline = Pipeline::new(branch, from, source_dir);
    let started = pipeline.start();
    let result = render_loop(
        &mut terminal,
        &mut pipeline,
        started,
        &event_rx,
        &task_tx,
        &tick_tx,
        &cancel,
    );

    stop_keys.store(true, Ordering::SeqCst);
    let _ = keys.join();
    drop(guard);
    let _ = terminal.show_cursor();
    let mut stderr = io::stderr();
    let _ = writeln!(stderr);
    let _ = stderr.flush();

    // The worker exits once `task_tx` drops; a killed setup command returns
    // promptly, so it is not joined here.
    result
}

fn render_loop(
    terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    pipeline: &mut Pipeline,
    initial: Vec<Effect>,
    events: &Receiver<Event>,
    tasks: &Sender<Task>,
    ticks: &Sender<()>,
    cancel: &CancelToken,
) -> Result<Outcome, GwtError> {
    let mut frame = 0usize;
    let mut outcome = apply_effects(initial, tasks, ticks);

    loop {
        draw(terminal, pipeline, frame)?;
        if let Some(outcome) = outcome {
            return Ok(outcome);
        }

        match events.recv_timeout(FRAME_INTERVAL) {
            Ok(event) => {
                if matches!(event, Event::Cancel) {
                    cancel.cancel();
                }
                outcome = apply_effects(pipeline.handle(event), tasks, ticks);
            }
            Err(RecvTimeoutError::Timeout) => frame = frame.wrapping_add(1),
            Err(RecvTimeoutError::Disconnected) => {
                cancel.cancel();
                outcome = apply_effects(pipeline.handle(Event::Cancel), tasks, ticks);
            }
        }
    }
}

/// Hand tasks and tick requests to their threads; return the outcome if the
/// pipeline terminated.
fn apply_effects(
    effects: Vec<Effect>,
    tasks: &Sender<Task>,
    ticks: &Sender<()>,
) -> Option<Outcome> {
    let mut outcome = None;
    for effect in effects {
        match effect {
            Effect::Run(task) => {
                if tasks.send(task).is_err() {
                    tracing::debug!("worker gone, dropping task");
                }
            }
            Effect::ScheduleTick => {
                let _ = ticks.send(());
            }
            Effect::Terminated(o) => outcome = Some(o),
        }
    }
    outcome
}

fn draw(
    terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    pipeline: &Pipeline,
    frame: usize,
) -> Result<(), GwtError> {
    let lines = render_lines(pipeline, frame);
    terminal
        .draw(|f| f.render_widget(Paragraph::new(lines), f.area()))
        .map_err(|e| GwtError::io("failed to draw", e))?;
    Ok(())
}

fn spawn_worker(
    mut runner: WorktreeRunner,
    cancel: CancelToken,
    events: Sender<Event>,
) -> Sender<Task> {
    let (tx, rx) = mpsc::channel::<Task>();
    thread::spawn(move || {
        for task in rx {
            let event = runner.run(task, &cancel);
            if events.send(event).is_err() {
                break;
            }
        }
    });
    tx
}

fn spawn_ticker(events: Sender<Event>) -> Sender<()> {
    let (tx, rx) = mpsc::channel::<()>();
    thread::spawn(move || {
        for () in rx {
            thread::sleep(TICK_INTERVAL);
            if events.send(Event::Tick(Instant::now())).is_err() {
                break;
            }
        }
    });
    tx
}

fn spawn_key_reader(events: Sender<Event>, stop: Arc<AtomicBool>) -> JoinHandle<()> {
    thread::spawn(move || {
        while !stop.load(Ordering::SeqCst) {
            match event::poll(KEY_POLL) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(_) => break,
            }
            let Ok(event::Event::Key(key)) = event::read() else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let quit = match key.code {
                KeyCode::Char('q') | KeyCode::Esc => true,
                KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
                _ => false,
            };
            if quit && events.send(Event::Cancel).is_err() {
                break;
            }
        }
    })
}

/// The view for the current pipeline state. `frame` animates the spinner.
pub fn render_lines(pipeline: &Pipeline, frame: usize) -> Vec<Line<'static>> {
    let spinner = SPINNER[frame % SPINNER.len()];
    let title = Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD);
    let error = Style::default().fg(Color::Red);
    let info = Style::default().fg(Color::Cyan);

    let mut lines = vec![Line::from(Span::styled("Creating worktree", title)), Line::default()];

    for step in pipeline.steps() {
        let (icon, style) = match step.status {
            StepStatus::Pending => (BULLET, Style::default().fg(Color::DarkGray)),
            StepStatus::Running => (spinner, Style::default().fg(Color::Yellow)),
            StepStatus::Done => (CHECK, Style::default().fg(Color::Green)),
            StepStatus::Error => (CROSS, error),
        };
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(icon.to_string(), style),
            Span::raw(format!(" {}", step.kind.label())),
        ]));
        if let Some(err) = &step.error {
            lines.push(Line::from(Span::styled(format!("    → {err}"), error)));
        }
    }

    let setup = pipeline.setup();
    if !setup.commands.is_empty() || !setup.history.is_empty() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled("Setup command trace", info)));

        let total = setup.commands.len();
        let mut trace: Vec<Line<'static>> = setup
            .history
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let icon = if record.error.is_some() { CROSS } else { CHECK };
                Line::from(format!(
                    "  {icon} [{}/{total}] {} ({})",
                    i + 1,
                    record.command,
                    format_duration(record.duration)
                ))
            })
            .collect();
        if let Some(active) = &setup.active {
            trace.push(Line::from(format!(
                "  {spinner} [{}/{total}] {} ({})",
                setup.history.len() + 1,
                active.command,
                format_duration(active.elapsed)
            )));
        }
        let skip = trace.len().saturating_sub(TRACE_ROWS);
        lines.extend(trace.into_iter().skip(skip));
    }

    lines.push(Line::default());
    match pipeline.state() {
        RunState::Running => lines.push(Line::from(Span::styled(
            "q to cancel",
            Style::default().fg(Color::DarkGray),
        ))),
        RunState::Succeeded => {
            lines.push(Line::from(Span::styled(
                "✓ Worktree created successfully!",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )));
            if let Some(path) = pipeline.path() {
                lines.push(Line::from(Span::styled(format!("📁 {}", path.display()), info)));
            }
        }
        RunState::Failed => {
            lines.push(Line::from(Span::styled("Failed to create worktree", error)))
        }
        RunState::Cancelled => lines.push(Line::from(Span::styled("Cancelled", error))),
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::core::pipeline::{StepKind, StepOutput};

    fn text(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    fn config(setup: &[&str]) -> Config {
        let mut config = Config::starter();
        config.setup = setup.iter().map(|s| s.to_string()).collect();
        config
    }

    fn through_copy(p: &mut Pipeline, setup: &[&str]) {
        p.start();
        p.handle(Event::StepCompleted {
            step: StepKind::LoadConfig,
            result: Ok(StepOutput::Config(config(setup))),
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
            result: Ok(StepOutput::FilesCopied(1)),
        });
    }

    #[test]
    fn test_initial_view() {
        let mut p = Pipeline::new("feature", "main", "/repo");
        p.start();
        let view = text(&render_lines(&p, 0));
        assert_eq!(view[0], "Creating worktree");
        assert_eq!(view[2], format!("  {} Loading configuration", SPINNER[0]));
        assert_eq!(view[3], "  • Creating worktree");
        assert!(!view.iter().any(|l| l.contains("Setup command trace")));
        assert_eq!(view.last().map(String::as_str), Some("q to cancel"));
    }

    #[test]
    fn test_spinner_advances_with_frame() {
        let mut p = Pipeline::new("feature", "main", "/repo");
        p.start();
        let view = text(&render_lines(&p, 3));
        assert!(view[2].contains(SPINNER[3]));
    }

    #[test]
    fn test_setup_trace_shows_history_and_active() {
        let mut p = Pipeline::new("feature", "main", "/repo");
        through_copy(&mut p, &["npm install", "make"]);
        p.handle(Event::CommandCompleted {
            command: "npm install".to_string(),
            duration: Duration::from_millis(1250),
            error: None,
        });

        let view = text(&render_lines(&p, 0));
        assert!(view.contains(&"Setup command trace".to_string()));
        assert!(view.contains(&"  ✓ [1/2] npm install (1.25s)".to_string()));
        assert!(view.iter().any(|l| l.contains("[2/2] make (")));
    }

    #[test]
    fn test_failed_step_shows_error_under_it() {
        let mut p = Pipeline::new("feature", "main", "/repo");
        p.start();
        p.handle(Event::StepCompleted {
            step: StepKind::LoadConfig,
            result: Err(GwtError::Conflict("bad yaml".to_string())),
        });

        let view = text(&render_lines(&p, 0));
        assert_eq!(view[2], "  ✗ Loading configuration");
        assert_eq!(view[3], "    → bad yaml");
        assert_eq!(view.last().map(String::as_str), Some("Failed to create worktree"));
    }

    #[test]
    fn test_success_shows_path() {
        let mut p = Pipeline::new("feature", "main", "/repo");
        through_copy(&mut p, &[]);

        let view = text(&render_lines(&p, 0));
        assert!(view.contains(&"✓ Worktree created successfully!".to_string()));
        assert_eq!(view.last().map(String::as_str), Some("📁 /wt/app/feature"));
    }

    #[test]
    fn test_trace_keeps_most_recent_rows() {
        let commands: Vec<String> = (1..=8).map(|i| format!("step{i}")).collect();
        let refs: Vec<&str> = commands.iter().map(String::as_str).collect();
        let mut p = Pipeline::new("feature", "main", "/repo");
        through_copy(&mut p, &refs);
        for command in &commands[..7] {
            p.handle(Event::CommandCompleted {
                command: command.clone(),
                duration: Duration::from_millis(1),
                error: None,
            });
        }

        let view = text(&render_lines(&p, 0));
        let trace: Vec<_> = view.iter().filter(|l| l.contains("/8]")).collect();
        assert_eq!(trace.len(), TRACE_ROWS);
        assert!(trace[0].contains("[3/8] step3"));
        assert!(trace[TRACE_ROWS - 1].contains("[8/8] step8"));
    }

    #[test]
    fn test_apply_effects_routes_work() {
        let (task_tx, task_rx) = mpsc::channel();
        let (tick_tx, tick_rx) = mpsc::channel();
        let outcome = apply_effects(
            vec![
                Effect::Run(Task::LoadConfig {
                    dir: PathBuf::from("/repo"),
                }),
                Effect::ScheduleTick,
            ],
            &task_tx,
            &tick_tx,
        );
        assert!(outcome.is_none());
        assert!(matches!(task_rx.try_recv(), Ok(Task::LoadConfig { .. })));
        assert!(tick_rx.try_recv().is_ok());

        let outcome =
            apply_effects(vec![Effect::Terminated(Outcome::Cancelled)], &task_tx, &tick_tx);
        assert!(matches!(outcome, Some(Outcome::Cancelled)));
    }
}
