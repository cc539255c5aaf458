//! Wire-shape types for the platform REST API.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A platform response: the HTTP status plus the parsed body.
///
/// Bodies are kept as loosely-typed JSON because the platform attaches
/// fields freely per endpoint version; callers pull out the handful of
/// fields they depend on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `id` field of the body, when present.
    pub fn id(&self) -> Option<&str> {
        self.body.get("id").and_then(Value::as_str)
    }

    /// The `state` field of the body, when present.
    pub fn state(&self) -> Option<ComputationStateOrString> {
        self.body
            .get("state")
            .and_then(Value::as_str)
            .map(ComputationStateOrString::parse)
    }
}

/// Request to index a dataset or computation output as a data asset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreateDataAssetRequest {
    pub name: String,
    pub mount: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_metadata: BTreeMap<String, String>,
    pub source: DataSource,
}

/// Where the bytes behind a data asset live.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    External(ExternalStorageSource),
    Computation(ComputationSource),
}

impl DataSource {
    pub fn computation(id: impl Into<String>) -> Self {
        DataSource::Computation(ComputationSource { id: id.into() })
    }

    pub fn external(&self) -> Option<&ExternalStorageSource> {
        match self {
            DataSource::External(source) => Some(source),
            DataSource::Computation(_) => None,
        }
    }
}

/// An object-storage-backed source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExternalStorageSource {
    pub bucket: String,
    pub prefix: String,
    #[serde(default)]
    pub keep_on_external_storage: bool,
    #[serde(default)]
    pub public: bool,
}

/// A finished computation referenced as an asset source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComputationSource {
    pub id: String,
}

/// Rename/retag an existing data asset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdateDataAssetRequest {
    pub name: String,
    pub tags: BTreeSet<String>,
}

/// Permission grant applied to a data asset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PermissionsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub everyone: Option<PermissionRole>,
}

impl PermissionsRequest {
    /// Grant read access to every platform user.
    pub fn everyone_viewer() -> Self {
        Self {
            everyone: Some(PermissionRole::Viewer),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionRole {
    Viewer,
    Editor,
}

/// A data asset attached to a computation under a mount path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputationAsset {
    pub id: String,
    pub mount: String,
}

impl ComputationAsset {
    pub fn new(id: impl Into<String>, mount: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            mount: mount.into(),
        }
    }
}

/// Request to start a capsule or pipeline run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunCapsuleRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capsule_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_assets: Vec<ComputationAsset>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
}

/// Lifecycle states a computation moves through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputationState {
    Initializing,
    Running,
    Completed,
    Failed,
}

/// Computation state that tolerates states this client does not know yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComputationStateOrString {
    Known(ComputationState),
    Other(String),
}

impl ComputationStateOrString {
    pub fn parse(value: &str) -> Self {
        match value {
            "initializing" => ComputationState::Initializing.into(),
            "running" => ComputationState::Running.into(),
            "completed" => ComputationState::Completed.into(),
            "failed" => ComputationState::Failed.into(),
            other => ComputationStateOrString::Other(other.to_string()),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(
            self,
            ComputationStateOrString::Known(ComputationState::Completed)
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            ComputationStateOrString::Known(ComputationState::Initializing) => "initializing",
            ComputationStateOrString::Known(ComputationState::Running) => "running",
            ComputationStateOrString::Known(ComputationState::Completed) => "completed",
            ComputationStateOrString::Known(ComputationState::Failed) => "failed",
            ComputationStateOrString::Other(value) => value,
        }
    }
}

impl From<ComputationState> for ComputationStateOrString {
    fn from(value: ComputationState) -> Self {
        ComputationStateOrString::Known(value)
    }
}

impl std::fmt::Display for ComputationStateOrString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filters for the data-asset search endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<String>,
}

impl SearchQuery {
    pub fn archived() -> Self {
        Self {
            archived: Some(true),
            ..Self::default()
        }
    }

    pub fn datasets() -> Self {
        Self {
            asset_type: Some("dataset".to_string()),
            ..Self::default()
        }
    }
}

/// A data asset as the search and get endpoints return it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataAsset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Creation time, unix seconds.
    #[serde(default)]
    pub created: i64,
    /// Last-used time, unix seconds; 0 means never used.
    #[serde(default)]
    pub last_used: i64,
    #[serde(default)]
    pub size: u64,
    #[serde(default, rename = "type")]
    pub asset_type: Option<String>,
    #[serde(default)]
    pub source_bucket: Option<SourceBucket>,
}

impl DataAsset {
    /// External assets reference a live object-storage location.
    pub fn is_external(&self) -> bool {
        self.source_bucket.is_some()
    }
}

/// Object-storage location behind an external asset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceBucket {
    pub bucket: String,
    pub prefix: String,
}
