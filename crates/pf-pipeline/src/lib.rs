//! pf-pipeline - Pipeline stages for Priceflow
//!
//! Fetches a daily market snapshot and materializes the raw, cleaned and
//! aggregated assets for one partition, in DAG order.

pub mod api;
pub mod assets;
pub mod error;
pub mod job;

pub use api::{MarketDataClient, MarketSnapshot, SAMPLE_PAYLOAD};
pub use assets::{AssetContext, Materialization};
pub use error::{PipelineError, PipelineResult};
pub use job::{
    backfill, run_job, run_job_as_of, AssetOutcome, AssetStatus, JobRunResult, RunConfig,
    RunStatus,
};
