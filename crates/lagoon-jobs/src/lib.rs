//! Job orchestration for the Lagoon capsule-execution platform.
//!
//! A job registers a dataset location as a data asset, runs a capsule or
//! pipeline against it, and captures the output as a new derived asset:
//! three remote stages sequenced by [`JobRunner::run_job`], with
//! bounded-wait polling wherever the platform needs time to make a fresh
//! resource queryable or to finish a computation.

pub mod config;
pub mod error;
pub mod job;
pub mod level;
pub mod maintenance;
pub mod wait;

pub use config::{CaptureResultConfig, JobConfig, RegisterDataConfig, RunCapsuleConfig};
pub use error::JobError;
pub use job::{
    CaptureOutcome, ComputationHandle, DataAssetHandle, JobRunner, OrchestrationResult,
    RegisterOutcome, RunOutcome, derived_asset_name,
};
pub use level::{DATA_LEVEL_KEY, DataLevel};
pub use maintenance::{AssetMaintenance, TagUpdate};
