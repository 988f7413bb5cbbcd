use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::builder::NonEmptyStringValueParser;
use clap::{Args, Parser, Subcommand};
use jobapp::config::{AppConfig, TelemetryConfig};
use jobapp::error::AppError;
use jobapp::telemetry;
use tracing::debug;

use crate::commands;
use crate::shell;

#[derive(Parser, Debug)]
#[command(
    name = "jobapp",
    about = "Compile, send and track job application cover letters",
    version
)]
struct Cli {
    /// Settings file (defaults to $JOBAPP_CONFIG, then ./config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile the letter, e-mail it and record the application
    Send(VariableArgs),
    /// Compile the letter without sending or recording anything
    Build(VariableArgs),
    /// Show ledger records for a vacancy
    Query(QueryArgs),
    /// Show every ledger record in file order
    List,
    /// Append a ledger record by hand, e.g. after a sent-but-not-recorded run
    Record(RecordArgs),
    /// Write a default settings file and create an empty ledger
    Init(InitArgs),
    /// Interactive menu over the other commands
    Shell,
}

#[derive(Args, Debug, Default, Clone)]
pub(crate) struct VariableArgs {
    /// JSON object of template variables overriding the configured values
    #[arg(long)]
    pub(crate) vars: Option<PathBuf>,
    /// Ask for each template variable on stdin before running
    #[arg(long)]
    pub(crate) prompt: bool,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct QueryArgs {
    /// Vacancy identifier to look up
    pub(crate) identifier: String,
    /// Match records where any field contains the text instead of the identifier alone
    #[arg(long)]
    pub(crate) contains: bool,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct RecordArgs {
    /// Vacancy identifier
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    pub(crate) id: String,
    /// Position title
    #[arg(long)]
    pub(crate) title: String,
    /// Hiring organization
    #[arg(long)]
    pub(crate) organization: String,
    /// Submission date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct InitArgs {
    /// Overwrite an existing settings file
    #[arg(long)]
    pub(crate) force: bool,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

fn load_settings(path: &Path) -> Result<AppConfig, AppError> {
    let config = AppConfig::load_from(path)?;
    telemetry::init(&config.telemetry)?;
    debug!(path = %path.display(), environment = ?config.environment, "settings loaded");
    Ok(config)
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config_path = AppConfig::config_path(cli.config.as_deref());

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Init(args) => {
            telemetry::init(&TelemetryConfig::default())?;
            commands::init(&config_path, args.force, &mut out)
        }
        Command::Send(args) => {
            commands::send(&load_settings(&config_path)?, &args, &mut input, &mut out)
        }
        Command::Build(args) => {
            commands::build(&load_settings(&config_path)?, &args, &mut input, &mut out)
        }
        Command::Query(args) => commands::query(&load_settings(&config_path)?, &args, &mut out),
        Command::List => commands::list(&load_settings(&config_path)?, &mut out),
        Command::Record(args) => commands::record(&load_settings(&config_path)?, &args, &mut out),
        Command::Shell => shell::run(&load_settings(&config_path)?, &mut input, &mut out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn record_requires_a_non_empty_identifier() {
        let parsed = Cli::try_parse_from([
            "jobapp",
            "record",
            "--id",
            "",
            "--title",
            "Clerk",
            "--organization",
            "Dept of Y",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn global_config_flag_is_accepted_after_the_subcommand() {
        let cli = Cli::try_parse_from(["jobapp", "query", "55555", "--config", "alt.json"])
            .expect("parses");
        assert_eq!(cli.config, Some(PathBuf::from("alt.json")));
        match cli.command {
            Command::Query(args) => {
                assert_eq!(args.identifier, "55555");
                assert!(!args.contains);
            }
            other => panic!("expected query, got {other:?}"),
        }
    }

    #[test]
    fn record_date_uses_iso_format() {
        assert_eq!(
            parse_date(" 2025-09-24 "),
            Ok(NaiveDate::from_ymd_opt(2025, 9, 24).expect("valid date"))
        );
        assert!(parse_date("09/24/2025").is_err());
    }
}
