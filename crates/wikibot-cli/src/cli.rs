use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use wikibot_core::{
    get_log_location, load_config, parse_runpage, save_page, BotSettings, EditMode, EditOutcome,
    PageEdit,
};

use crate::fs_store::FsStore;

#[derive(Parser)]
#[command(name = "wikibot")]
#[command(about = "wikibot toolkit CLI", long_about = None)]
pub struct Cli {
    /// Also log to this file (resolved like a bot log file).
    #[arg(long, global = true, env = "WIKIBOT_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level used when `RUST_LOG` is unset (default: info).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Task whose merged config supplies `log_file` and `log_level`.
    #[arg(long, global = true)]
    pub bot_task: Option<String>,

    /// Directory holding `default_config.json` and `config.json`.
    #[arg(long, global = true, default_value = ".")]
    pub config_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the merged configuration for a task.
    Config {
        #[arg(short, long)]
        task: String,
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },
    /// Check a runpage body read from a file or stdin.
    Runpage {
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Print where a log file would be written.
    LogPath { filename: PathBuf },
    /// Apply an edit to a directory of page files.
    Apply {
        #[arg(long)]
        dir: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "replace")]
        mode: String,
        #[arg(long)]
        text: String,
        #[arg(long, default_value = "")]
        summary: String,
        #[arg(long, default_value = "wikibot")]
        username: String,
        #[arg(long)]
        minor: bool,
        /// Do not flag the edit as a bot edit.
        #[arg(long)]
        no_bot: bool,
        #[arg(long)]
        new_ok: bool,
        #[arg(long)]
        no_change_ok: bool,
    },
}

/// Where and how verbosely to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    /// Log file, if file logging is wanted.
    pub file: Option<PathBuf>,
    /// Default filter level.
    pub level: String,
}

impl Cli {
    /// Settings of `--bot-task`, if one was given.
    pub fn settings(&self) -> Result<Option<BotSettings>> {
        let Some(task) = &self.bot_task else {
            return Ok(None);
        };
        let map = load_config(task, &self.config_dir)
            .with_context(|| format!("loading config for task {}", task))?;
        Ok(Some(BotSettings::from_map(&map)?))
    }

    /// Resolve logging from flags, falling back to the task's settings.
    pub fn log_target(&self) -> Result<LogTarget> {
        let settings = self.settings()?;
        let file = self
            .log_file
            .clone()
            .or_else(|| settings.as_ref().map(|s| s.log_file.clone()));
        let level = self
            .log_level
            .clone()
            .or_else(|| settings.map(|s| s.log_level))
            .unwrap_or_else(|| "info".to_string());
        Ok(LogTarget { file, level })
    }

    /// Run the command, returning the process exit status.
    pub fn run(self) -> Result<u8> {
        match self.command {
            Command::Config { ref task, ref dir } => {
                let config = load_config(task, dir)
                    .with_context(|| format!("loading config for task {}", task))?;
                println!("{}", serde_json::to_string_pretty(&config)?);
                Ok(0)
            }
            Command::Runpage { ref file } => {
                let body = match file {
                    Some(path) => std::fs::read_to_string(path)
                        .with_context(|| format!("reading {}", path.display()))?,
                    None => {
                        let mut body = String::new();
                        std::io::stdin().read_to_string(&mut body)?;
                        body
                    }
                };
                if parse_runpage(&body) {
                    println!("running permitted");
                    Ok(0)
                } else {
                    println!("running disabled");
                    Ok(1)
                }
            }
            Command::LogPath { ref filename } => {
                println!("{}", get_log_location(filename)?.display());
                Ok(0)
            }
            Command::Apply {
                dir,
                title,
                mode,
                text,
                summary,
                username,
                minor,
                no_bot,
                new_ok,
                no_change_ok,
            } => {
                let mode: EditMode = mode.parse()?;
                let store = FsStore::new(dir, username);
                let edit = PageEdit {
                    title,
                    text,
                    summary,
                    minor,
                    bot: !no_bot,
                    mode,
                    new_ok,
                    no_change_ok,
                };
                match save_page(&store, &edit)? {
                    EditOutcome::NoOp => println!("{}: no change", edit.title),
                    EditOutcome::Create(_) => println!("{}: created", edit.title),
                    EditOutcome::NewContent(_) => println!("{}: saved", edit.title),
                }
                Ok(0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wikibot_core::DocumentStore;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("wikibot").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_config() {
        let cli = parse(&["config", "--task", "archive"]);
        assert!(matches!(
            cli.command,
            Command::Config { ref task, ref dir } if task == "archive" && dir == &PathBuf::from(".")
        ));
        assert_eq!(cli.log_level, None);
    }

    #[test]
    fn test_apply_creates_page() {
        let dir = TempDir::new().unwrap();
        let dir_arg = dir.path().to_str().unwrap();
        let cli = parse(&[
            "apply", "--dir", dir_arg, "--title", "Sandbox", "--mode", "append", "--text",
            "hello", "--new-ok",
        ]);
        assert_eq!(cli.run().unwrap(), 0);

        let store = FsStore::new(dir.path(), "wikibot");
        assert_eq!(store.fetch("Sandbox").unwrap().body, "hello");
    }

    #[test]
    fn test_apply_rejects_delete() {
        let dir = TempDir::new().unwrap();
        let dir_arg = dir.path().to_str().unwrap();
        let cli = parse(&[
            "apply", "--dir", dir_arg, "--title", "Sandbox", "--mode", "delete", "--text", "x",
        ]);
        assert!(cli.run().is_err());
    }

    #[test]
    fn test_runpage_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.txt");
        std::fs::write(&path, "<!-- stop switch -->\nTrue\n").unwrap();
        let cli = parse(&["runpage", "--file", path.to_str().unwrap()]);
        assert_eq!(cli.run().unwrap(), 0);

        std::fs::write(&path, "False").unwrap();
        let cli = parse(&["runpage", "--file", path.to_str().unwrap()]);
        assert_eq!(cli.run().unwrap(), 1);
    }

    #[test]
    fn test_config_command() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("default_config.json"),
            r#"{"*": {"edit_delay_secs": 5}}"#,
        )
        .unwrap();
        let cli = parse(&["config", "--task", "t", "--dir", dir.path().to_str().unwrap()]);
        assert_eq!(cli.run().unwrap(), 0);
    }

    #[test]
    fn test_apply_flags_bot_edit_by_default() {
        let cli = parse(&["apply", "--dir", "/pages", "--title", "T", "--text", "x"]);
        assert!(matches!(cli.command, Command::Apply { no_bot: false, .. }));
        let cli = parse(&["apply", "--dir", "/pages", "--title", "T", "--text", "x", "--no-bot"]);
        assert!(matches!(cli.command, Command::Apply { no_bot: true, .. }));
    }

    #[test]
    fn test_log_target_from_settings() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("default_config.json"),
            r#"{"*": {"log_level": "debug"}, "archive": {"log_file": "/var/log/archive.log"}}"#,
        )
        .unwrap();
        let dir_arg = dir.path().to_str().unwrap();

        let cli = parse(&["--bot-task", "archive", "--config-dir", dir_arg, "log-path", "x.log"]);
        assert_eq!(
            cli.log_target().unwrap(),
            LogTarget {
                file: Some(PathBuf::from("/var/log/archive.log")),
                level: "debug".to_string(),
            }
        );

        let cli = parse(&[
            "--bot-task", "archive", "--config-dir", dir_arg, "--log-level", "warn",
            "--log-file", "/tmp/cli.log", "log-path", "x.log",
        ]);
        assert_eq!(
            cli.log_target().unwrap(),
            LogTarget {
                file: Some(PathBuf::from("/tmp/cli.log")),
                level: "warn".to_string(),
            }
        );
    }

    #[test]
    fn test_log_target_without_task() {
        let cli = parse(&["log-path", "x.log"]);
        assert_eq!(
            cli.log_target().unwrap(),
            LogTarget {
                file: None,
                level: "info".to_string(),
            }
        );
    }

    #[test]
    fn test_global_flags_have_help() {
        use clap::CommandFactory;

        let command = Cli::command();
        for id in ["log_file", "log_level", "bot_task", "config_dir"] {
            let arg = command
                .get_arguments()
                .find(|a| a.get_id() == id)
                .unwrap();
            assert!(arg.get_help().is_some(), "{} has no help", id);
        }
    }
}
