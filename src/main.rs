/// gwt - git worktree manager
///
/// Dispatches subcommands to the modules in `commands`. Errors are printed
/// to stderr; a cancelled run exits with 130.
use anyhow::Result;
use clap::{Parser, Subcommand};
use gwt::error::GwtError;
use gwt::logging::init_logging;

mod commands;

#[derive(Parser)]
#[command(name = "gwt")]
#[command(version = gwt::VERSION)]
#[command(about = "Manage one git worktree per branch")]
#[command(long_about = r#"
gwt keeps one worktree per branch under <root>/<project>/<branch>.

New worktrees get the files listed under `copy` in .worktree.yaml and run its
`setup` commands. `gwt done` fast-forwards the base branch and removes the
finished worktree; `gwt clean` removes every worktree already merged.

Install the shell integration (`gwt shell --install`) so that switching and
creating worktrees changes the current directory.
"#)]
struct Cli {
    #[arg(long, global = true, help = "Print debug traces (or set GWT_LOG)")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    New(commands::new::Args),
    #[command(visible_alias = "ls")]
    List(commands::list::Args),
    #[command(visible_alias = "rm")]
    Remove(commands::remove::Args),
    #[command(visible_alias = "sw")]
    Switch(commands::switch::Args),
    Done(commands::done::Args),
    Clean(commands::clean::Args),
    Init(commands::init::Args),
    Shell(commands::shell::Args),
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(e) = dispatch(cli.command) {
        if matches!(e.downcast_ref::<GwtError>(), Some(GwtError::Cancelled)) {
            std::process::exit(commands::CANCELLED_EXIT_CODE);
        }
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::New(args) => commands::new::run(args),
        Command::List(args) => commands::list::run(args),
        Command::Remove(args) => commands::remove::run(args),
        Command::Switch(args) => commands::switch::run(args),
        Command::Done(args) => commands::done::run(args),
        Command::Clean(args) => commands::clean::run(args),
        Command::Init(args) => commands::init::run(args),
        Command::Shell(args) => commands::shell::run(args),
    }
}
