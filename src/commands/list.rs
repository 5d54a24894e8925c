use super::{current_dir, repo_git};
use anyhow::Result;
use clap::Parser;
use gwt::config::Config;
use gwt::core::worktree::scan::{self, RootItem};
use gwt::git::{GitCommand, Worktree};
use gwt::output::{CliOutput, Output, OutputConfig, OutputFormat};
use gwt::ui::{self, FlowOutcome};
use serde::Serialize;
use std::path::Path;
use tabled::{builder::Builder, settings::Style};

#[derive(Parser)]
#[command(about = "List worktrees")]
#[command(long_about = r#"
Lists the worktrees of the current repository. On a terminal an interactive
picker is shown: choose a worktree to switch to it (the path is printed for
the shell integration) or delete it.

With --root, every worktree of every project under the worktree root is
listed instead (settings.root, or --path). Discovery does not need to run
inside a repository.
"#)]
pub struct Args {
    #[arg(long, help = "List worktrees of all projects under the root")]
    root: bool,

    #[arg(long, value_name = "DIR", help = "Root directory to scan (implies --root)")]
    path: Option<String>,

    #[arg(long, help = "Print a table instead of the interactive picker")]
    no_tui: bool,

    #[arg(long, help = "Print tab-separated lines")]
    plain: bool,

    #[arg(long, help = "Print a JSON document")]
    json: bool,
}

#[derive(Serialize)]
struct RootJson<'a> {
    root: &'a Path,
    items: &'a [RootItem],
}

pub fn run(args: Args) -> Result<()> {
    let format = OutputFormat::from_flags(args.plain, args.json)?;
    let mut output = CliOutput::new(OutputConfig::new(false, false).with_format(format));

    if args.root || args.path.is_some() {
        let config = Config::load(&current_dir()?)?;
        let (items, root) = scan::scan(args.path.as_deref(), &config, &GitCommand::new(false));
        return print_root(&items, &root, &mut output);
    }

    let git = repo_git()?;
    if !args.no_tui && format == OutputFormat::Pretty && ui::has_interactive_tty() {
        let config = Config::load(&current_dir()?)?;
        return match ui::list::run(&git, &config, &mut output) {
            FlowOutcome::Selected(path) => {
                output.handoff(&path);
                Ok(())
            }
            FlowOutcome::Cancelled => Ok(()),
            FlowOutcome::Failed(e) => Err(e.into()),
        };
    }

    let worktrees = git.list_worktrees()?;
    print_worktrees(&worktrees, &mut output)
}

fn print_worktrees(worktrees: &[Worktree], output: &mut dyn Output) -> Result<()> {
    match output.format() {
        OutputFormat::Json => output.data(&serde_json::to_string_pretty(worktrees)?),
        _ if worktrees.is_empty() => empty(output, "No worktrees found for this repository"),
        OutputFormat::Plain => {
            output.data("branch\thead\tpath");
            for wt in worktrees {
                output.data(&format!("{}\t{}\t{}", wt.branch, wt.head, wt.path.display()));
            }
        }
        OutputFormat::Pretty => {
            output.result("Worktrees");
            let rows = worktrees
                .iter()
                .map(|wt| vec![wt.branch.clone(), wt.head.clone(), wt.path.display().to_string()]);
            output.data(&table(&["Branch", "HEAD", "Path"], rows));
        }
    }
    Ok(())
}

fn print_root(items: &[RootItem], root: &Path, output: &mut dyn Output) -> Result<()> {
    match output.format() {
        OutputFormat::Json => {
            let doc = RootJson { root, items };
            output.data(&serde_json::to_string_pretty(&doc)?);
        }
        OutputFormat::Plain => {
            output.data(&format!("root={}", root.display()));
            if items.is_empty() {
                output.data("count=0");
                return Ok(());
            }
            output.data("project\tbranch\thead\tpath");
            for item in items {
                output.data(&format!(
                    "{}\t{}\t{}\t{}",
                    item.project,
                    item.branch,
                    item.head,
                    item.path.display()
                ));
            }
        }
        OutputFormat::Pretty if items.is_empty() => {
            output.info(&format!("No worktrees found under: {}", root.display()));
        }
        OutputFormat::Pretty => {
            output.result(&format!("All Worktrees (root: {})", root.display()));
            let rows = items.iter().map(|item| {
                vec![
                    item.project.clone(),
                    item.branch.clone(),
                    item.head.clone(),
                    item.path.display().to_string(),
                ]
            });
            output.data(&table(&["Project", "Branch", "HEAD", "Path"], rows));
        }
    }
    Ok(())
}

fn empty(output: &mut dyn Output, message: &str) {
    match output.format() {
        OutputFormat::Plain => output.data("count=0"),
        _ => output.info(message),
    }
}

fn table(header: &[&str], rows: impl Iterator<Item = Vec<String>>) -> String {
    let mut builder = Builder::new();
    builder.push_record(header.iter().copied());
    for row in rows {
        builder.push_record(row);
    }
    let mut table = builder.build();
    table.with(Style::blank());
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gwt::output::TestOutput;
    use std::path::PathBuf;

    fn output(format: OutputFormat) -> TestOutput {
        TestOutput::with_config(OutputConfig::new(false, false).with_format(format))
    }

    fn worktrees() -> Vec<Worktree> {
        vec![
            Worktree {
                path: PathBuf::from("/src/app"),
                branch: "main".to_string(),
                head: "1111111".to_string(),
            },
            Worktree {
                path: PathBuf::from("/wt/app/feature"),
                branch: "feature".to_string(),
                head: "2222222".to_string(),
            },
        ]
    }

    fn items() -> Vec<RootItem> {
        vec![RootItem {
            project: "app".to_string(),
            branch: "feature".to_string(),
            path: PathBuf::from("/wt/app/feature"),
            head: "2222222".to_string(),
        }]
    }

    #[test]
    fn test_plain_worktrees() {
        let mut out = output(OutputFormat::Plain);
        print_worktrees(&worktrees(), &mut out).unwrap();
        assert_eq!(
            out.stdout(),
            "branch\thead\tpath\nmain\t1111111\t/src/app\nfeature\t2222222\t/wt/app/feature\n"
        );
    }

    #[test]
    fn test_empty_worktrees_per_format() {
        let mut out = output(OutputFormat::Plain);
        print_worktrees(&[], &mut out).unwrap();
        assert_eq!(out.stdout(), "count=0\n");

        let mut out = output(OutputFormat::Json);
        print_worktrees(&[], &mut out).unwrap();
        assert_eq!(out.stdout(), "[]\n");

        let mut out = output(OutputFormat::Pretty);
        print_worktrees(&[], &mut out).unwrap();
        assert!(out.stdout().is_empty());
    }

    #[test]
    fn test_pretty_worktrees_table_on_stdout() {
        let mut out = output(OutputFormat::Pretty);
        print_worktrees(&worktrees(), &mut out).unwrap();
        let stdout = out.stdout();
        assert!(stdout.contains("Branch"));
        assert!(stdout.contains("/wt/app/feature"));
        assert!(out.has_result("Worktrees"));
    }

    #[test]
    fn test_json_worktrees_array() {
        let mut out = output(OutputFormat::Json);
        print_worktrees(&worktrees(), &mut out).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&out.stdout()).unwrap();
        assert_eq!(doc.as_array().map(Vec::len), Some(2));
        assert_eq!(doc[1]["branch"], "feature");
    }

    #[test]
    fn test_plain_root() {
        let mut out = output(OutputFormat::Plain);
        print_root(&items(), Path::new("/wt"), &mut out).unwrap();
        assert_eq!(
            out.stdout(),
            "root=/wt\nproject\tbranch\thead\tpath\napp\tfeature\t2222222\t/wt/app/feature\n"
        );

        let mut out = output(OutputFormat::Plain);
        print_root(&[], Path::new("/wt"), &mut out).unwrap();
        assert_eq!(out.stdout(), "root=/wt\ncount=0\n");
    }

    #[test]
    fn test_json_root_document() {
        let mut out = output(OutputFormat::Json);
        print_root(&items(), Path::new("/wt"), &mut out).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&out.stdout()).unwrap();
        assert_eq!(doc["root"], "/wt");
        assert_eq!(doc["items"][0]["project"], "app");
    }
}
