use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use gwt::config::contract_home;
use gwt::error::GwtError;
use gwt::output::{CliOutput, Output, OutputConfig};
use std::fs;
use std::path::{Path, PathBuf};

const TEMPLATE: &str = include_str!("shell_wrapper.sh");

const BLOCK_START: &str = "# >>> gwt shell integration >>>\n";
const BLOCK_END: &str = "# <<< gwt shell integration <<<\n";

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
}

impl Shell {
    fn name(self) -> &'static str {
        match self {
            Shell::Bash => "bash",
            Shell::Zsh => "zsh",
        }
    }

    /// The shell named by `$SHELL`, if it is one gwt supports.
    fn detect() -> Option<Self> {
        let shell = std::env::var("SHELL").ok()?;
        if shell.contains("zsh") {
            Some(Shell::Zsh)
        } else if shell.contains("bash") {
            Some(Shell::Bash)
        } else {
            None
        }
    }
}

#[derive(Parser)]
#[command(about = "Print or install the shell integration")]
#[command(long_about = r#"
Prints a shell function that wraps gwt so that `gwt switch`, `gwt list`,
`gwt new` and `gwt done` change the current directory to the selected
worktree. Add it to your shell with:

    eval "$(gwt shell zsh)"

The wrapper also accepts `gwt new <branch> -c [prompt | issue <link>]`,
which starts claude in the new worktree.

--install writes the function to ~/.config/gwt/shell.<shell> and adds a
managed `source` line to your rc file (a backup is kept as <rc>.bak.gwt).
The rc file defaults to ~/.zshrc or ~/.bashrc (~/.bash_profile when there
is no ~/.bashrc), and to ~/.profile for other shells. --remove takes it out
again.
"#)]
pub struct Args {
    #[arg(value_enum, help = "Target shell (default: from $SHELL, else bash)")]
    shell: Option<Shell>,

    #[arg(long, conflicts_with = "remove", help = "Install into your shell rc file")]
    install: bool,

    #[arg(long, help = "Remove the integration from your shell rc file")]
    remove: bool,

    #[arg(long, value_name = "FILE", help = "rc file to edit (default: from $SHELL)")]
    rc: Option<PathBuf>,
}

pub fn run(args: Args) -> Result<()> {
    let shell = args.shell.or_else(Shell::detect);
    let mut output = CliOutput::new(OutputConfig::default());
    let bin = std::env::current_exe().context("Cannot locate the gwt executable")?;
    let script = render(&bin, shell.unwrap_or(Shell::Bash));

    if !args.install && !args.remove {
        output.data(&script);
        return Ok(());
    }

    let home = dirs::home_dir().context("Cannot determine the home directory")?;
    let rc = args.rc.unwrap_or_else(|| default_rc(&home, shell));
    let script_name = match shell {
        Some(shell) => format!("shell.{}", shell.name()),
        None => "shell.sh".to_string(),
    };
    let script_path = home.join(".config").join("gwt").join(script_name);

    if args.install {
        install(&rc, &script_path, &script, &home)?;
        output.success(&format!("✓ Installed gwt shell integration into {}", rc.display()));
        output.info(&format!("Wrote shell helper to {}", script_path.display()));
        output.info("Open a new shell or source your rc file to activate.");
    } else {
        remove(&rc, &script_path)?;
        output.success(&format!("✓ Removed gwt shell integration from {}", rc.display()));
    }
    Ok(())
}

/// The wrapper script with the binary path, version and shell filled in.
pub fn render(bin: &Path, shell: Shell) -> String {
    TEMPLATE
        .replace("@GWT_BIN@", &bin.display().to_string())
        .replace("@GWT_VERSION@", gwt::VERSION)
        .replace("@GWT_SHELL@", shell.name())
}

fn default_rc(home: &Path, shell: Option<Shell>) -> PathBuf {
    match shell {
        Some(Shell::Zsh) => home.join(".zshrc"),
        Some(Shell::Bash) => {
            let bashrc = home.join(".bashrc");
            if bashrc.exists() {
                bashrc
            } else {
                home.join(".bash_profile")
            }
        }
        None => home.join(".profile"),
    }
}

fn install(rc: &Path, script_path: &Path, script: &str, home: &Path) -> Result<()> {
    if let Some(dir) = script_path.parent() {
        fs::create_dir_all(dir)
            .map_err(|e| GwtError::io(format!("failed to create {}", dir.display()), e))?;
    }
    fs::write(script_path, script)
        .map_err(|e| GwtError::io(format!("failed to write {}", script_path.display()), e))?;

    let existing = fs::read_to_string(rc).unwrap_or_default();
    if rc.exists() {
        let backup = PathBuf::from(format!("{}.bak.gwt", rc.display()));
        fs::write(&backup, &existing)
            .map_err(|e| GwtError::io(format!("failed to write {}", backup.display()), e))?;
    }

    let source_line = format!("source {}", contract_home(script_path, Some(home)).display());
    let content = with_block(&without_block(&existing), &source_line);
    if let Some(dir) = rc.parent() {
        fs::create_dir_all(dir)
            .map_err(|e| GwtError::io(format!("failed to create {}", dir.display()), e))?;
    }
    fs::write(rc, content)
        .map_err(|e| GwtError::io(format!("failed to write {}", rc.display()), e))?;
    Ok(())
}

fn remove(rc: &Path, script_path: &Path) -> Result<()> {
    let content = fs::read_to_string(rc)
        .map_err(|e| GwtError::io(format!("failed to read {}", rc.display()), e))?;
    if !content.contains(BLOCK_START) {
        anyhow::bail!("No gwt shell block found in {}", rc.display());
    }
    fs::write(rc, without_block(&content))
        .map_err(|e| GwtError::io(format!("failed to write {}", rc.display()), e))?;

    if let Err(e) = fs::remove_file(script_path) {
        tracing::debug!(error = %e, path = %script_path.display(), "shell helper not removed");
    }
    Ok(())
}

/// `content` with the managed block appended, separated by a newline.
fn with_block(content: &str, source_line: &str) -> String {
    let mut out = content.to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(BLOCK_START);
    out.push_str(source_line);
    out.push('\n');
    out.push_str(BLOCK_END);
    out
}

/// `content` without the managed block; unchanged if there is none or it
/// is not terminated.
fn without_block(content: &str) -> String {
    let Some(start) = content.find(BLOCK_START) else {
        return content.to_string();
    };
    let after = start + BLOCK_START.len();
    match content[after..].find(BLOCK_END) {
        Some(end) => format!("{}{}", &content[..start], &content[after + end + BLOCK_END.len()..]),
        None => content.to_string(),
    }
}
