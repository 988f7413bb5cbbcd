use std::sync::Arc;

use super::common::*;
use crate::workflows::ledger::LedgerError;
use crate::workflows::letter::{EscapePolicy, RenderError, TemplateRenderer, TemplateVariables};
use crate::workflows::submission::{
    SubmissionError, SubmissionOrchestrator, SubmissionOutcome, SubmissionSettings,
};

#[test]
fn new_identifier_is_compiled_sent_and_recorded() {
    let ledger = Arc::new(MemoryLedger::empty());
    let compiler = Arc::new(RecordingCompiler::default());
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let orchestrator = orchestrator(&ledger, &compiler, &dispatcher);

    let outcome = orchestrator
        .submit_at(&variables("55555"), afternoon())
        .expect("run succeeds");

    assert_eq!(outcome.label(), "sent");
    let record = match &outcome {
        SubmissionOutcome::Sent { record, artifact } => {
            assert_eq!(record.submitted_on, today());
            assert_eq!(record.identifier.as_str(), "55555");
            assert_eq!(record.title, "Budget Analyst");
            assert_eq!(record.organization, "Dept of X");
            assert_eq!(artifact.file_name(), "letter.pdf");
            record.clone()
        }
        other => panic!("expected sent outcome, got {other:?}"),
    };

    assert_eq!(compiler.calls(), 1);
    let messages = dispatcher.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].to_address, "hr@example.gov");
    assert_eq!(
        messages[0].subject,
        "Application for Budget Analyst; Vacancy 55555"
    );
    assert!(messages[0].body.starts_with("Good afternoon Pat Doe:"));
    assert_eq!(ledger.snapshot(), vec![record]);
}

#[test]
fn known_identifier_short_circuits_before_any_side_effect() {
    let ledger = Arc::new(MemoryLedger::with_records(vec![existing_record("55555")]));
    let compiler = Arc::new(RecordingCompiler::default());
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let orchestrator = orchestrator(&ledger, &compiler, &dispatcher);

    let outcome = orchestrator
        .submit_at(&variables("55555"), afternoon())
        .expect("duplicate is not an error");

    assert_eq!(outcome.label(), "already-applied");
    assert!(outcome.summary().starts_with("already-applied: vacancy 55555"));
    assert_eq!(compiler.calls(), 0);
    assert!(dispatcher.messages().is_empty());
    assert_eq!(ledger.count_for("55555"), 1);
}

#[test]
fn repeated_runs_record_and_send_once() {
    let ledger = Arc::new(MemoryLedger::empty());
    let compiler = Arc::new(RecordingCompiler::default());
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let orchestrator = orchestrator(&ledger, &compiler, &dispatcher);

    let labels: Vec<&str> = (0..5)
        .map(|_| {
            orchestrator
                .submit_at(&variables("55555"), afternoon())
                .expect("run succeeds")
                .label()
        })
        .collect();

    assert_eq!(
        labels,
        vec![
            "sent",
            "already-applied",
            "already-applied",
            "already-applied",
            "already-applied"
        ]
    );
    assert_eq!(ledger.count_for("55555"), 1);
    assert_eq!(compiler.calls(), 1);
    assert_eq!(dispatcher.messages().len(), 1);
}

#[test]
fn transport_failure_leaves_ledger_unchanged() {
    let ledger = Arc::new(MemoryLedger::with_records(vec![existing_record("11111")]));
    let compiler = Arc::new(RecordingCompiler::default());
    let dispatcher = Arc::new(RecordingDispatcher::failing());
    let orchestrator = orchestrator(&ledger, &compiler, &dispatcher);
    let before = ledger.snapshot();

    let err = orchestrator
        .submit_at(&variables("55555"), afternoon())
        .expect_err("transport failure aborts");

    assert!(matches!(err, SubmissionError::Transport(_)));
    assert_eq!(err.kind(), "transport");
    assert!(err.unrecorded().is_none());
    assert_eq!(ledger.snapshot(), before);
}

#[test]
fn compile_failure_never_contacts_the_dispatcher() {
    let ledger = Arc::new(MemoryLedger::empty());
    let compiler = Arc::new(RecordingCompiler::failing());
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let orchestrator = orchestrator(&ledger, &compiler, &dispatcher);

    let err = orchestrator
        .submit_at(&variables("55555"), afternoon())
        .expect_err("compile failure aborts");

    assert_eq!(err.kind(), "compile");
    assert!(dispatcher.messages().is_empty());
    assert!(ledger.snapshot().is_empty());
}

#[test]
fn missing_store_aborts_before_compiling() {
    let ledger = Arc::new(MemoryLedger::missing());
    let compiler = Arc::new(RecordingCompiler::default());
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let orchestrator = orchestrator(&ledger, &compiler, &dispatcher);

    let err = orchestrator
        .submit_at(&variables("55555"), afternoon())
        .expect_err("missing store aborts");

    assert!(matches!(
        err,
        SubmissionError::Ledger(LedgerError::StoreNotFound { .. })
    ));
    assert_eq!(err.kind(), "store-not-found");
    assert_eq!(compiler.calls(), 0);
    assert!(dispatcher.messages().is_empty());
}

#[test]
fn missing_identifier_variable_is_reported_before_ledger_check() {
    let ledger = Arc::new(MemoryLedger::missing());
    let compiler = Arc::new(RecordingCompiler::default());
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let orchestrator = orchestrator(&ledger, &compiler, &dispatcher);

    let vars: TemplateVariables = variables("55555")
        .iter()
        .filter(|(name, _)| *name != "vacancyID")
        .collect();

    match orchestrator.submit_at(&vars, afternoon()) {
        Err(SubmissionError::Render(RenderError::MissingVariable { name })) => {
            assert_eq!(name, "vacancyID")
        }
        other => panic!("expected missing variable, got {other:?}"),
    }
    assert_eq!(compiler.calls(), 0);
}

#[test]
fn blank_identifier_is_refused_before_ledger_and_send() {
    let ledger = Arc::new(MemoryLedger::with_records(vec![existing_record("11111")]));
    let compiler = Arc::new(RecordingCompiler::default());
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let orchestrator = orchestrator(&ledger, &compiler, &dispatcher);
    let before = ledger.snapshot();

    let err = orchestrator
        .submit_at(&variables("   "), afternoon())
        .expect_err("blank identifier aborts");

    assert!(matches!(
        err,
        SubmissionError::Render(RenderError::EmptyValue { ref name }) if name == "vacancyID"
    ));
    assert_eq!(err.kind(), "missing-variable");
    assert_eq!(compiler.calls(), 0);
    assert!(dispatcher.messages().is_empty());
    assert_eq!(ledger.snapshot(), before);
}

#[test]
fn render_failure_after_ledger_check_sends_and_records_nothing() {
    let ledger = Arc::new(MemoryLedger::with_records(vec![existing_record("11111")]));
    let compiler = Arc::new(RecordingCompiler::default());
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let orchestrator = SubmissionOrchestrator::new(
        ledger.clone(),
        compiler.clone(),
        dispatcher.clone(),
        SubmissionSettings {
            renderer: TemplateRenderer::new(vec!["vacancyID".to_string()], EscapePolicy::Reject),
            ..settings()
        },
    );
    let before = ledger.snapshot();

    let mut vars = variables("55555");
    vars.insert("stateAgency", "Parks & Recreation");

    match orchestrator.submit_at(&vars, afternoon()) {
        Err(SubmissionError::Render(RenderError::UnsafeValue { name, character })) => {
            assert_eq!(name, "stateAgency");
            assert_eq!(character, '&');
        }
        other => panic!("expected unsafe value, got {other:?}"),
    }
    assert_eq!(compiler.calls(), 0);
    assert!(dispatcher.messages().is_empty());
    assert_eq!(ledger.snapshot(), before);
}

#[test]
fn ledger_failure_after_send_is_distinguishable() {
    let ledger = Arc::new(MemoryLedger::read_only());
    let compiler = Arc::new(RecordingCompiler::default());
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let orchestrator = orchestrator(&ledger, &compiler, &dispatcher);

    let err = orchestrator
        .submit_at(&variables("55555"), afternoon())
        .expect_err("append failure surfaces");

    assert_eq!(err.kind(), "sent-not-recorded");
    let record = err.unrecorded().expect("record carried for manual recovery");
    assert_eq!(record.identifier.as_str(), "55555");
    assert_eq!(record.title, "Budget Analyst");
    assert_eq!(dispatcher.messages().len(), 1);
    assert!(err.to_string().contains("sent but not recorded"));
}

#[test]
fn build_compiles_without_touching_ledger_or_dispatcher() {
    let ledger = Arc::new(MemoryLedger::missing());
    let compiler = Arc::new(RecordingCompiler::default());
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let orchestrator = orchestrator(&ledger, &compiler, &dispatcher);

    let artifact = orchestrator
        .build(&variables("55555"))
        .expect("build succeeds without a ledger");

    assert_eq!(artifact.file_name(), "letter.pdf");
    assert_eq!(compiler.calls(), 1);
    assert!(dispatcher.messages().is_empty());
}
