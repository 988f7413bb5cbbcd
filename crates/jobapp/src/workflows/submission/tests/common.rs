use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};

use crate::config::FieldMapping;
use crate::workflows::ledger::{ApplicationLedger, ApplicationRecord, LedgerError, VacancyId};
use crate::workflows::letter::{
    ArtifactCompiler, ArtifactRef, CompileError, EscapePolicy, RenderedBody, TemplateRenderer,
    TemplateVariables,
};
use crate::workflows::mailer::{
    ApplicationMessage, MessageComposer, NotificationDispatcher, TransportError,
};
use crate::workflows::submission::{SubmissionOrchestrator, SubmissionSettings};

/// Ledger held in memory; `None` models a store that was never initialized.
#[derive(Debug)]
pub(super) struct MemoryLedger {
    records: Mutex<Option<Vec<ApplicationRecord>>>,
    fail_appends: bool,
}

impl MemoryLedger {
    pub(super) fn empty() -> Self {
        Self::with_records(Vec::new())
    }

    pub(super) fn with_records(records: Vec<ApplicationRecord>) -> Self {
        Self {
            records: Mutex::new(Some(records)),
            fail_appends: false,
        }
    }

    pub(super) fn missing() -> Self {
        Self {
            records: Mutex::new(None),
            fail_appends: false,
        }
    }

    pub(super) fn read_only() -> Self {
        Self {
            fail_appends: true,
            ..Self::empty()
        }
    }

    pub(super) fn count_for(&self, identifier: &str) -> usize {
        self.snapshot()
            .iter()
            .filter(|record| record.identifier.as_str() == identifier)
            .count()
    }

    pub(super) fn snapshot(&self) -> Vec<ApplicationRecord> {
        self.records
            .lock()
            .expect("ledger mutex poisoned")
            .clone()
            .unwrap_or_default()
    }

    fn not_found() -> LedgerError {
        LedgerError::StoreNotFound {
            path: PathBuf::from("memory://ledger"),
        }
    }
}

impl ApplicationLedger for MemoryLedger {
    fn exists(&self, identifier: &VacancyId) -> Result<bool, LedgerError> {
        let guard = self.records.lock().expect("ledger mutex poisoned");
        let records = guard.as_ref().ok_or_else(Self::not_found)?;
        Ok(records.iter().any(|record| &record.identifier == identifier))
    }

    fn append(&self, record: &ApplicationRecord) -> Result<(), LedgerError> {
        if self.fail_appends {
            return Err(LedgerError::Write {
                path: PathBuf::from("memory://ledger"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        let mut guard = self.records.lock().expect("ledger mutex poisoned");
        guard.get_or_insert_with(Vec::new).push(record.clone());
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<ApplicationRecord>, LedgerError> {
        let guard = self.records.lock().expect("ledger mutex poisoned");
        guard.clone().ok_or_else(Self::not_found)
    }
}

#[derive(Debug, Default)]
pub(super) struct RecordingCompiler {
    calls: AtomicUsize,
    fail: bool,
}

impl RecordingCompiler {
    pub(super) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ArtifactCompiler for RecordingCompiler {
    fn compile(&self, _body: &RenderedBody) -> Result<ArtifactRef, CompileError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CompileError::MissingArtifact {
                path: PathBuf::from("builds/letter.pdf"),
            });
        }
        Ok(ArtifactRef::new("builds/letter.pdf"))
    }
}

#[derive(Debug, Default)]
pub(super) struct RecordingDispatcher {
    messages: Mutex<Vec<ApplicationMessage>>,
    fail: bool,
}

impl RecordingDispatcher {
    pub(super) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(super) fn messages(&self) -> Vec<ApplicationMessage> {
        self.messages.lock().expect("dispatcher mutex poisoned").clone()
    }
}

impl NotificationDispatcher for RecordingDispatcher {
    fn deliver(&self, message: &ApplicationMessage) -> Result<(), TransportError> {
        if self.fail {
            let address = "unreachable relay".to_string();
            let source = address
                .parse::<lettre::Address>()
                .expect_err("space is not a valid address");
            return Err(TransportError::Address { address, source });
        }
        self.messages
            .lock()
            .expect("dispatcher mutex poisoned")
            .push(message.clone());
        Ok(())
    }
}

pub(super) type Orchestrator =
    SubmissionOrchestrator<MemoryLedger, RecordingCompiler, RecordingDispatcher>;

pub(super) fn settings() -> SubmissionSettings {
    SubmissionSettings {
        renderer: TemplateRenderer::new(
            vec!["vacancyID".to_string(), "vacancyTitle".to_string()],
            EscapePolicy::Latex,
        ),
        fields: FieldMapping::default(),
        composer: MessageComposer::new(
            "Sam Applicant",
            "sam@example.com",
            "Thank you for the consideration,",
            Vec::new(),
        ),
    }
}

pub(super) fn orchestrator(
    ledger: &Arc<MemoryLedger>,
    compiler: &Arc<RecordingCompiler>,
    dispatcher: &Arc<RecordingDispatcher>,
) -> Orchestrator {
    SubmissionOrchestrator::new(
        ledger.clone(),
        compiler.clone(),
        dispatcher.clone(),
        settings(),
    )
}

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 24).expect("valid date")
}

pub(super) fn afternoon() -> NaiveDateTime {
    today().and_hms_opt(14, 30, 0).expect("valid time")
}

pub(super) fn variables(identifier: &str) -> TemplateVariables {
    [
        ("vacancyID", identifier),
        ("vacancyTitle", " Budget Analyst "),
        ("stateAgency", "Dept of X"),
        ("hiringManager", "Pat Doe"),
        ("theirEmailAddress", "hr@example.gov"),
    ]
    .into_iter()
    .collect()
}

pub(super) fn existing_record(identifier: &str) -> ApplicationRecord {
    ApplicationRecord::new(
        NaiveDate::from_ymd_opt(2025, 9, 1).expect("valid date"),
        VacancyId::new(identifier),
        "Budget Analyst",
        "Dept of X",
    )
}
