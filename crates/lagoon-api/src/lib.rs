//! Transport client for the Lagoon capsule-execution platform.
//!
//! This crate owns the wire-shape types and the HTTP client for the
//! platform's REST API. Everything above it (job orchestration, index
//! maintenance) talks through the [`PlatformApi`] trait so tests can
//! substitute scripted in-memory implementations.

pub mod client;
pub mod error;
pub mod types;

pub use client::{HttpPlatformClient, PlatformApi, PlatformConfig};
pub use error::ApiError;
pub use types::{
    ApiResponse, ComputationAsset, ComputationSource, ComputationState, ComputationStateOrString,
    CreateDataAssetRequest, DataAsset, DataSource, ExternalStorageSource, PermissionRole,
    PermissionsRequest, RunCapsuleRequest, SearchQuery, SourceBucket, UpdateDataAssetRequest,
};
