use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use chrono::Local;
use jobapp::config::AppConfig;
use jobapp::error::AppError;
use jobapp::workflows::ledger::{ApplicationLedger, ApplicationRecord, CsvLedger, VacancyId};
use jobapp::workflows::letter::{PdfLatexCompiler, TemplateVariables};
use jobapp::workflows::mailer::SmtpDispatcher;
use jobapp::workflows::submission::{
    SubmissionError, SubmissionOrchestrator, SubmissionSettings,
};
use tracing::info;

use crate::cli::{QueryArgs, RecordArgs, VariableArgs};
use crate::prompt;

type LiveOrchestrator = SubmissionOrchestrator<CsvLedger, PdfLatexCompiler, SmtpDispatcher>;

fn orchestrator(config: &AppConfig) -> Result<LiveOrchestrator, AppError> {
    let compiler = PdfLatexCompiler::new(config.builder.clone(), &config.writer)
        .map_err(SubmissionError::from)?;

    Ok(SubmissionOrchestrator::new(
        Arc::new(CsvLedger::from_config(&config.ledger)),
        Arc::new(compiler),
        Arc::new(SmtpDispatcher::from_config(&config.mailer)),
        SubmissionSettings::from_config(config),
    ))
}

/// Configured variables, overridden by `--vars`, then by answers to `--prompt`.
pub(crate) fn resolve_variables(
    config: &AppConfig,
    args: &VariableArgs,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<TemplateVariables, AppError> {
    let mut variables = TemplateVariables::from(config.template.variables.clone());
    if let Some(path) = &args.vars {
        variables.merge(TemplateVariables::from_json_file(path)?);
    }
    if args.prompt {
        prompt::fill_in(&mut variables, &config.template.required, input, out)?;
    }
    Ok(variables)
}

pub(crate) fn send(
    config: &AppConfig,
    args: &VariableArgs,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<(), AppError> {
    config.validate()?;
    let variables = resolve_variables(config, args, input, out)?;
    submit(config, &variables, out)
}

pub(crate) fn submit(
    config: &AppConfig,
    variables: &TemplateVariables,
    out: &mut dyn Write,
) -> Result<(), AppError> {
    let outcome = orchestrator(config)?.submit(variables)?;
    writeln!(out, "{}", outcome.summary())?;
    Ok(())
}

pub(crate) fn build(
    config: &AppConfig,
    args: &VariableArgs,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<(), AppError> {
    config.validate()?;
    let variables = resolve_variables(config, args, input, out)?;
    let artifact = orchestrator(config)?.build(&variables)?;
    writeln!(out, "built: {}", artifact.path().display())?;
    Ok(())
}

pub(crate) fn query(
    config: &AppConfig,
    args: &QueryArgs,
    out: &mut dyn Write,
) -> Result<(), AppError> {
    let ledger = CsvLedger::from_config(&config.ledger);
    let needle = args.identifier.trim();
    let records = if args.contains {
        ledger.search(needle)?
    } else {
        ledger.find(&VacancyId::new(needle))?
    };

    if records.is_empty() {
        writeln!(out, "no records for vacancy {needle}")?;
    }
    for record in &records {
        writeln!(out, "{record}")?;
    }
    Ok(())
}

pub(crate) fn list(config: &AppConfig, out: &mut dyn Write) -> Result<(), AppError> {
    let records = CsvLedger::from_config(&config.ledger).load_all()?;
    if records.is_empty() {
        writeln!(out, "ledger is empty")?;
        return Ok(());
    }

    for record in &records {
        writeln!(out, "{record}")?;
    }
    writeln!(out, "{} application(s)", records.len())?;
    Ok(())
}

/// Manual append. Refuses identifiers the ledger already holds.
pub(crate) fn record(
    config: &AppConfig,
    args: &RecordArgs,
    out: &mut dyn Write,
) -> Result<(), AppError> {
    let ledger = CsvLedger::from_config(&config.ledger);
    let identifier = VacancyId::new(&args.id);
    if ledger.exists(&identifier)? {
        writeln!(
            out,
            "already-applied: vacancy {identifier} is already in the ledger"
        )?;
        return Ok(());
    }

    let submitted_on = args.date.unwrap_or_else(|| Local::now().date_naive());
    let record = ApplicationRecord::new(submitted_on, identifier, &args.title, &args.organization);
    ledger.append(&record)?;
    info!(identifier = %record.identifier, "application recorded by hand");
    writeln!(out, "recorded: {record}")?;
    Ok(())
}

/// Write default settings unless present, then make sure the ledger exists.
pub(crate) fn init(config_path: &Path, force: bool, out: &mut dyn Write) -> Result<(), AppError> {
    let config = if config_path.exists() && !force {
        writeln!(out, "settings already present at {}", config_path.display())?;
        AppConfig::load_from(config_path)?
    } else {
        let config = AppConfig::write_default(config_path, force)?;
        writeln!(out, "wrote default settings to {}", config_path.display())?;
        config
    };

    initialize_ledger(&config, out)
}

fn initialize_ledger(config: &AppConfig, out: &mut dyn Write) -> Result<(), AppError> {
    let ledger = CsvLedger::from_config(&config.ledger);
    if ledger.initialize()? {
        writeln!(out, "created empty ledger at {}", ledger.path().display())?;
    } else {
        writeln!(out, "ledger already present at {}", ledger.path().display())?;
    }
    Ok(())
}
