//! pf-expect - Data validation for Priceflow
//!
//! Declarative expectation suites are compiled to SQL over one partition of
//! a table, evaluated independently by a checkpoint and aggregated into a
//! pass/fail result. The newest validation is summarized as Markdown.

pub mod checkpoint;
pub mod error;
pub mod generator;
pub mod report;
pub mod store;
pub mod suite;
pub mod validate;

pub use checkpoint::{Batch, Checkpoint, CheckpointResult, ExpectationResult};
pub use error::{ExpectError, ExpectResult};
pub use report::{render_report, write_report, NO_VALIDATION_MESSAGE};
pub use store::ExpectationStore;
pub use suite::{Expectation, ExpectationConfig, ExpectationSuite};
pub use validate::{run_validation, ValidationReport, ValidationResults, DEFAULT_SUITES};
