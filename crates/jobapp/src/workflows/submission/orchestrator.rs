use std::sync::Arc;

use chrono::{Local, NaiveDateTime, Timelike};
use tracing::{error, info, warn};

use crate::config::{AppConfig, FieldMapping};
use crate::workflows::ledger::{ApplicationLedger, ApplicationRecord, LedgerError, VacancyId};
use crate::workflows::letter::{
    ApplicationDetails, ArtifactCompiler, ArtifactRef, CompileError, RenderError,
    TemplateRenderer, TemplateVariables,
};
use crate::workflows::mailer::{MessageComposer, NotificationDispatcher, TransportError};

/// Everything the pipeline needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct SubmissionSettings {
    pub renderer: TemplateRenderer,
    pub fields: FieldMapping,
    pub composer: MessageComposer,
}

impl SubmissionSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            renderer: TemplateRenderer::from_config(&config.template),
            fields: config.template.fields.clone(),
            composer: MessageComposer::from_config(&config.mailer),
        }
    }
}

/// Terminal state of a run that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Sent {
        record: ApplicationRecord,
        artifact: ArtifactRef,
    },
    AlreadyApplied {
        identifier: VacancyId,
    },
}

impl SubmissionOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            SubmissionOutcome::Sent { .. } => "sent",
            SubmissionOutcome::AlreadyApplied { .. } => "already-applied",
        }
    }

    /// One-line human readable summary, prefixed with the outcome label.
    pub fn summary(&self) -> String {
        match self {
            SubmissionOutcome::Sent { record, artifact } => format!(
                "{}: vacancy {} ({}, {}) with {}",
                self.label(),
                record.identifier,
                record.title,
                record.organization,
                artifact.path().display()
            ),
            SubmissionOutcome::AlreadyApplied { identifier } => {
                format!("{}: vacancy {identifier} is already in the ledger", self.label())
            }
        }
    }
}

/// Error raised by a failed run. Only `SentNotRecorded` follows a delivered e-mail.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(
        "application for vacancy {} was sent but not recorded; record it manually: {source}",
        .record.identifier
    )]
    SentNotRecorded {
        record: ApplicationRecord,
        #[source]
        source: LedgerError,
    },
}

impl SubmissionError {
    pub fn kind(&self) -> &'static str {
        match self {
            SubmissionError::Render(
                RenderError::MissingVariable { .. } | RenderError::EmptyValue { .. },
            ) => "missing-variable",
            SubmissionError::Render(_) => "render",
            SubmissionError::Ledger(LedgerError::StoreNotFound { .. }) => "store-not-found",
            SubmissionError::Ledger(_) => "ledger",
            SubmissionError::Compile(_) => "compile",
            SubmissionError::Transport(_) => "transport",
            SubmissionError::SentNotRecorded { .. } => "sent-not-recorded",
        }
    }

    /// The e-mail went out; only the ledger row is missing.
    pub fn unrecorded(&self) -> Option<&ApplicationRecord> {
        match self {
            SubmissionError::SentNotRecorded { record, .. } => Some(record),
            _ => None,
        }
    }
}

/// Runs one application through the duplicate guard and the send pipeline.
pub struct SubmissionOrchestrator<L, C, D> {
    ledger: Arc<L>,
    compiler: Arc<C>,
    dispatcher: Arc<D>,
    settings: SubmissionSettings,
}

impl<L, C, D> SubmissionOrchestrator<L, C, D>
where
    L: ApplicationLedger,
    C: ArtifactCompiler,
    D: NotificationDispatcher,
{
    pub fn new(
        ledger: Arc<L>,
        compiler: Arc<C>,
        dispatcher: Arc<D>,
        settings: SubmissionSettings,
    ) -> Self {
        Self {
            ledger,
            compiler,
            dispatcher,
            settings,
        }
    }

    /// Process one application using the local clock.
    pub fn submit(
        &self,
        variables: &TemplateVariables,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        self.submit_at(variables, Local::now().naive_local())
    }

    /// Process one application as of `now`.
    ///
    /// The ledger is only written after the dispatcher reports success, so a
    /// ledger row always means the e-mail went out.
    pub fn submit_at(
        &self,
        variables: &TemplateVariables,
        now: NaiveDateTime,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let details = ApplicationDetails::from_variables(variables, &self.settings.fields)?;

        if self.ledger.exists(&details.identifier)? {
            warn!(identifier = %details.identifier, "vacancy already applied to; skipping");
            return Ok(SubmissionOutcome::AlreadyApplied {
                identifier: details.identifier,
            });
        }

        let artifact = self.build(variables)?;

        let message = self
            .settings
            .composer
            .compose(&details, &artifact, now.hour());
        self.dispatcher.deliver(&message)?;
        info!(identifier = %details.identifier, to = %message.to_address, "application sent");

        let record = details.record(now.date());
        if let Err(source) = self.ledger.append(&record) {
            error!(
                identifier = %record.identifier,
                error = %source,
                "application sent but ledger append failed"
            );
            return Err(SubmissionError::SentNotRecorded { record, source });
        }

        info!(identifier = %record.identifier, "application recorded");
        Ok(SubmissionOutcome::Sent { record, artifact })
    }

    /// Render and compile without consulting the ledger or sending anything.
    pub fn build(&self, variables: &TemplateVariables) -> Result<ArtifactRef, SubmissionError> {
        let body = self.settings.renderer.render(variables)?;
        let artifact = self.compiler.compile(&body)?;
        info!(artifact = %artifact.path().display(), "letter compiled");
        Ok(artifact)
    }
}
