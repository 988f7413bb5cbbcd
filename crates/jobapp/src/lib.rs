//! Cover letter build, send and application ledger workflows.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
