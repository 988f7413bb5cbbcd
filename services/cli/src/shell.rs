use std::io::{BufRead, Write};

use jobapp::config::AppConfig;
use jobapp::error::AppError;
use jobapp::workflows::letter::ApplicationDetails;
use tracing::warn;

use crate::cli::{QueryArgs, RecordArgs, VariableArgs};
use crate::{commands, prompt};

type Action = fn(&AppConfig, &mut dyn BufRead, &mut dyn Write) -> Result<(), AppError>;

struct MenuEntry {
    key: &'static str,
    label: &'static str,
    action: Action,
}

const MENU: &[MenuEntry] = &[
    MenuEntry {
        key: "1",
        label: "Review variables and send an application",
        action: send,
    },
    MenuEntry {
        key: "2",
        label: "Compile the letter only",
        action: build,
    },
    MenuEntry {
        key: "3",
        label: "Look up a vacancy",
        action: query,
    },
    MenuEntry {
        key: "4",
        label: "List the ledger",
        action: list,
    },
    MenuEntry {
        key: "5",
        label: "Record an application by hand",
        action: record,
    },
];

/// Menu loop over the ledger and send commands. A failed entry is reported
/// and the menu is shown again; end of input or `q` leaves.
pub(crate) fn run(
    config: &AppConfig,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<(), AppError> {
    loop {
        writeln!(out)?;
        for entry in MENU {
            writeln!(out, "  {}) {}", entry.key, entry.label)?;
        }
        writeln!(out, "  q) Quit")?;

        let Some(choice) = prompt::ask("choice", input, out)? else {
            return Ok(());
        };
        if matches!(choice.as_str(), "q" | "quit" | "exit") {
            return Ok(());
        }

        match MENU.iter().find(|entry| entry.key == choice) {
            Some(entry) => {
                if let Err(err) = (entry.action)(config, &mut *input, &mut *out) {
                    warn!(entry = entry.label, error = %err, "menu action failed");
                    writeln!(out, "failed: {err}")?;
                }
            }
            None => writeln!(out, "unknown choice `{choice}`")?,
        }
    }
}

fn send(
    config: &AppConfig,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<(), AppError> {
    config.validate()?;
    let args = VariableArgs {
        vars: None,
        prompt: true,
    };
    let variables = commands::resolve_variables(config, &args, input, out)?;
    let details = ApplicationDetails::from_variables(&variables, &config.template.fields)?;

    let question = format!(
        "Send the application for {} (vacancy {}) to {}?",
        details.title, details.identifier, details.recipient_address
    );
    if !prompt::confirm(&question, input, out)? {
        writeln!(out, "cancelled")?;
        return Ok(());
    }
    commands::submit(config, &variables, out)
}

fn build(
    config: &AppConfig,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<(), AppError> {
    let args = VariableArgs {
        vars: None,
        prompt: true,
    };
    commands::build(config, &args, input, out)
}

fn query(
    config: &AppConfig,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<(), AppError> {
    let Some(identifier) = prompt::ask("vacancy id", input, out)? else {
        return Ok(());
    };
    let args = QueryArgs {
        identifier,
        contains: false,
    };
    commands::query(config, &args, out)
}

fn list(
    config: &AppConfig,
    _input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<(), AppError> {
    commands::list(config, out)
}

fn record(
    config: &AppConfig,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<(), AppError> {
    let Some(id) = prompt::ask("vacancy id", input, out)? else {
        return Ok(());
    };
    let Some(title) = prompt::ask("title", input, out)? else {
        return Ok(());
    };
    let Some(organization) = prompt::ask("organization", input, out)? else {
        return Ok(());
    };
    if id.is_empty() {
        writeln!(out, "a vacancy id is required")?;
        return Ok(());
    }

    let args = RecordArgs {
        id,
        title,
        organization,
        date: None,
    };
    commands::record(config, &args, out)
}
