//! Duplicate-guarded submission pipeline: check, render, compile, notify, record.

pub mod orchestrator;

#[cfg(test)]
mod tests;

pub use orchestrator::{
    SubmissionError, SubmissionOrchestrator, SubmissionOutcome, SubmissionSettings,
};
