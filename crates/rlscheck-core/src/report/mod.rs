//! Reporting: progress lines, console summary, JSON artifacts and remediation hints.

pub mod console;
pub mod json;
pub mod progress;
pub mod remediation;
pub mod summary;

pub use summary::{summarize, FailureDetail, TestSummary};
