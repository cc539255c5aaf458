//! Declarative job configuration.
//!
//! These types mirror the JSON job documents users feed the orchestrator.
//! Construction is lenient (serde defaults everywhere); contradictions are
//! caught by `validate()` before any remote call goes out.

use std::collections::{BTreeMap, BTreeSet};

use lagoon_api::{
    ComputationAsset, CreateDataAssetRequest, DataSource, ExternalStorageSource, RunCapsuleRequest,
};
use serde::{Deserialize, Serialize};

use crate::error::JobError;

fn default_true() -> bool {
    true
}

/// Settings for registering an externally stored dataset as a data asset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegisterDataConfig {
    /// The name to give the data asset.
    pub asset_name: String,
    /// The mount folder name computations will see.
    pub mount: String,
    /// Object-storage bucket holding the dataset.
    pub bucket: String,
    /// Object-storage prefix under the bucket.
    pub prefix: String,
    /// Whether the bucket is publicly readable.
    #[serde(default)]
    pub public: bool,
    /// Keep the bytes in the external bucket instead of copying them in.
    #[serde(default = "default_true")]
    pub keep_on_external_storage: bool,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub custom_metadata: BTreeMap<String, String>,
    /// Share the registered asset with every platform user.
    #[serde(default)]
    pub viewable_to_everyone: bool,
}

impl RegisterDataConfig {
    pub(crate) fn to_create_request(&self) -> CreateDataAssetRequest {
        CreateDataAssetRequest {
            name: self.asset_name.clone(),
            mount: self.mount.clone(),
            tags: self.tags.clone(),
            custom_metadata: self.custom_metadata.clone(),
            source: DataSource::External(ExternalStorageSource {
                bucket: self.bucket.clone(),
                prefix: self.prefix.clone(),
                keep_on_external_storage: self.keep_on_external_storage,
                public: self.public,
            }),
        }
    }
}

/// Settings for running a capsule or pipeline.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunCapsuleConfig {
    /// ID of the capsule to run. Exactly one of `capsule_id` and
    /// `pipeline_id` must be set.
    #[serde(default)]
    pub capsule_id: Option<String>,
    /// ID of the pipeline to run.
    #[serde(default)]
    pub pipeline_id: Option<String>,
    /// Data assets to attach, each under its mount path.
    #[serde(default)]
    pub data_assets: Vec<ComputationAsset>,
    /// Positional parameters handed to the capsule.
    #[serde(default)]
    pub run_parameters: Vec<String>,
    /// Seconds between completion checks. 0 means fire-and-forget: the
    /// run is submitted and the job moves on without waiting.
    #[serde(default)]
    pub pause_interval_seconds: u64,
    /// Pin a specific capsule version.
    #[serde(default)]
    pub capsule_version: Option<u32>,
    /// Upper bound on the completion wait, when polling.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl RunCapsuleConfig {
    pub fn validate(&self) -> Result<(), JobError> {
        match (self.capsule_id.as_deref(), self.pipeline_id.as_deref()) {
            (Some(capsule), None) if !capsule.is_empty() => {}
            (None, Some(pipeline)) if !pipeline.is_empty() => {}
            _ => {
                return Err(JobError::Configuration(
                    "exactly one of capsule_id and pipeline_id must be set".to_string(),
                ));
            }
        }
        for asset in &self.data_assets {
            if asset.id.is_empty() || asset.mount.is_empty() {
                return Err(JobError::Configuration(format!(
                    "data asset entries need both an id and a mount, got id={:?} mount={:?}",
                    asset.id, asset.mount
                )));
            }
        }
        Ok(())
    }

    /// A copy of this config with one more data asset attached. The
    /// original is left untouched so callers keep an unmodified view of
    /// what they submitted.
    pub fn with_data_asset(&self, id: &str, mount: &str) -> Self {
        let mut derived = self.clone();
        derived.data_assets.push(ComputationAsset::new(id, mount));
        derived
    }

    pub(crate) fn to_run_request(&self) -> RunCapsuleRequest {
        RunCapsuleRequest {
            capsule_id: self.capsule_id.clone(),
            pipeline_id: self.pipeline_id.clone(),
            version: self.capsule_version,
            data_assets: self.data_assets.clone(),
            parameters: self.run_parameters.clone(),
        }
    }
}

/// Settings for capturing a computation's output as a data asset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureResultConfig {
    /// Label for the processing step, used when deriving an asset name.
    #[serde(default)]
    pub process_name: Option<String>,
    /// Mount folder name; defaults to the resolved asset name.
    #[serde(default)]
    pub mount: Option<String>,
    /// Explicit name for the captured asset. When absent the name is
    /// derived from the input asset name, `process_name` and the capture
    /// time.
    #[serde(default)]
    pub asset_name: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub custom_metadata: BTreeMap<String, String>,
    /// Share the captured asset with every platform user.
    #[serde(default)]
    pub viewable_to_everyone: bool,
}

impl CaptureResultConfig {
    pub fn validate(&self) -> Result<(), JobError> {
        if self.asset_name.is_none() && self.process_name.is_none() {
            return Err(JobError::Configuration(
                "capture needs either asset_name or process_name".to_string(),
            ));
        }
        Ok(())
    }
}

/// One job: optional register stage, a run stage, optional capture stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(default)]
    pub register_config: Option<RegisterDataConfig>,
    pub run_capsule_config: RunCapsuleConfig,
    #[serde(default)]
    pub capture_result_config: Option<CaptureResultConfig>,
    /// Stamp data-level classification (raw on registration, derived on
    /// capture) onto asset tags and custom metadata.
    #[serde(default = "default_true")]
    pub add_classification_tags: bool,
}

impl JobConfig {
    pub fn validate(&self) -> Result<(), JobError> {
        self.run_capsule_config.validate()?;
        if let Some(capture) = &self.capture_result_config {
            capture.validate()?;
            if capture.asset_name.is_none() && self.register_config.is_none() {
                return Err(JobError::Configuration(
                    "capture has no asset_name and no register stage to derive one from"
                        .to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_config() -> RunCapsuleConfig {
        RunCapsuleConfig {
            capsule_id: Some("123-abc".to_string()),
            ..RunCapsuleConfig::default()
        }
    }

    #[test]
    fn run_config_requires_exactly_one_target() {
        let neither = RunCapsuleConfig::default();
        assert!(matches!(
            neither.validate(),
            Err(JobError::Configuration(_))
        ));

        let both = RunCapsuleConfig {
            capsule_id: Some("123-abc".to_string()),
            pipeline_id: Some("456-def".to_string()),
            ..RunCapsuleConfig::default()
        };
        assert!(matches!(both.validate(), Err(JobError::Configuration(_))));

        assert!(run_config().validate().is_ok());
        let pipeline_only = RunCapsuleConfig {
            pipeline_id: Some("456-def".to_string()),
            ..RunCapsuleConfig::default()
        };
        assert!(pipeline_only.validate().is_ok());
    }

    #[test]
    fn run_config_rejects_half_specified_assets() {
        let config = RunCapsuleConfig {
            data_assets: vec![ComputationAsset::new("999888", "")],
            ..run_config()
        };
        assert!(matches!(config.validate(), Err(JobError::Configuration(_))));
    }

    #[test]
    fn with_data_asset_leaves_the_original_untouched() {
        let config = run_config();
        let derived = config.with_data_asset("abc-123", "input");
        assert!(config.data_assets.is_empty());
        assert_eq!(
            derived.data_assets,
            vec![ComputationAsset::new("abc-123", "input")]
        );
    }

    #[test]
    fn capture_without_any_name_source_is_rejected() {
        let capture = CaptureResultConfig::default();
        assert!(matches!(
            capture.validate(),
            Err(JobError::Configuration(_))
        ));
    }

    #[test]
    fn job_config_requires_a_name_source_for_capture() {
        let config = JobConfig {
            register_config: None,
            run_capsule_config: run_config(),
            capture_result_config: Some(CaptureResultConfig {
                process_name: Some("processed".to_string()),
                ..CaptureResultConfig::default()
            }),
            add_classification_tags: true,
        };
        // process_name alone is not enough without a register stage to
        // borrow the input name from.
        assert!(matches!(config.validate(), Err(JobError::Configuration(_))));

        let explicit = JobConfig {
            capture_result_config: Some(CaptureResultConfig {
                asset_name: Some("some_asset".to_string()),
                ..CaptureResultConfig::default()
            }),
            ..config
        };
        assert!(explicit.validate().is_ok());
    }

    #[test]
    fn configs_deserialize_with_defaults() {
        let config: JobConfig = serde_json::from_str(
            r#"{
                "register_config": {
                    "asset_name": "ecephys_123",
                    "mount": "ecephys",
                    "bucket": "some-bucket",
                    "prefix": "ecephys_123"
                },
                "run_capsule_config": {"capsule_id": "123-abc"}
            }"#,
        )
        .unwrap();
        let register = config.register_config.as_ref().unwrap();
        assert!(register.keep_on_external_storage);
        assert!(register.tags.is_empty());
        assert!(register.custom_metadata.is_empty());
        assert!(!register.viewable_to_everyone);
        assert_eq!(config.run_capsule_config.pause_interval_seconds, 0);
        assert!(config.add_classification_tags);
        assert!(config.validate().is_ok());
    }
}
