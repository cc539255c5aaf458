//! Register → run → capture orchestration.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use lagoon_api::{
    ApiResponse, ComputationStateOrString, CreateDataAssetRequest, DataSource, PermissionsRequest,
    PlatformApi,
};
use serde_json::Value;

use crate::config::{CaptureResultConfig, JobConfig, RegisterDataConfig, RunCapsuleConfig};
use crate::error::JobError;
use crate::level::{self, DataLevel};
use crate::wait;

/// Default window for a freshly created asset to become queryable.
const AVAILABILITY_INTERVAL: Duration = Duration::from_secs(10);
const AVAILABILITY_TIMEOUT: Duration = Duration::from_secs(300);

/// A data asset the job created or referenced, reduced to what later
/// stages need.
#[derive(Clone, Debug, PartialEq)]
pub struct DataAssetHandle {
    pub id: String,
    pub name: String,
    pub mount: String,
    pub tags: BTreeSet<String>,
}

/// A submitted computation and its last observed state.
#[derive(Clone, Debug, PartialEq)]
pub struct ComputationHandle {
    pub computation_id: String,
    pub state: ComputationStateOrString,
}

#[derive(Clone, Debug)]
pub struct RegisterOutcome {
    pub handle: DataAssetHandle,
    pub response: ApiResponse,
}

#[derive(Clone, Debug)]
pub struct RunOutcome {
    pub handle: ComputationHandle,
    /// The final polled computation response when polling was requested,
    /// otherwise the submission response.
    pub response: ApiResponse,
}

#[derive(Clone, Debug)]
pub struct CaptureOutcome {
    pub handle: DataAssetHandle,
    pub response: ApiResponse,
}

/// What [`JobRunner::run_job`] hands back: one entry per configured stage.
#[derive(Clone, Debug, Default)]
pub struct OrchestrationResult {
    pub register: Option<RegisterOutcome>,
    pub run: Option<RunOutcome>,
    pub capture: Option<CaptureOutcome>,
}

/// Sequences the three job stages against a [`PlatformApi`].
///
/// One runner drives one job at a time; a run owns its handles for the
/// duration of `run_job` and nothing is persisted across runs. Timeouts
/// only stop the local wait loops; an in-flight remote computation is
/// never cancelled.
pub struct JobRunner<A> {
    api: A,
    availability_interval: Duration,
    availability_timeout: Duration,
}

impl<A: PlatformApi> JobRunner<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            availability_interval: AVAILABILITY_INTERVAL,
            availability_timeout: AVAILABILITY_TIMEOUT,
        }
    }

    /// Override the window used to wait for fresh assets to appear.
    pub fn with_availability_window(mut self, interval: Duration, timeout: Duration) -> Self {
        self.availability_interval = interval;
        self.availability_timeout = timeout;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Run the configured stages in order, threading the registered
    /// asset into the run and the computation id into the capture.
    ///
    /// Failures propagate immediately; earlier stages' side effects are
    /// left in place.
    pub async fn run_job(&self, config: &JobConfig) -> Result<OrchestrationResult, JobError> {
        config.validate()?;

        let mut result = OrchestrationResult::default();

        if let Some(register_config) = &config.register_config {
            result.register = Some(
                self.register_data(register_config, config.add_classification_tags)
                    .await?,
            );
        }

        let run_config = match &result.register {
            Some(outcome) => config
                .run_capsule_config
                .with_data_asset(&outcome.handle.id, &outcome.handle.mount),
            None => config.run_capsule_config.clone(),
        };
        let run = self.run_capsule(&run_config).await?;

        if let Some(capture_config) = &config.capture_result_config {
            let fallback = config
                .register_config
                .as_ref()
                .map(|register| register.asset_name.as_str());
            result.capture = Some(
                self.capture_result(
                    &run.handle.computation_id,
                    capture_config,
                    fallback,
                    config.add_classification_tags,
                )
                .await?,
            );
        }
        result.run = Some(run);

        Ok(result)
    }

    /// Register an externally stored dataset and optionally share it.
    pub async fn register_data(
        &self,
        config: &RegisterDataConfig,
        add_classification_tags: bool,
    ) -> Result<RegisterOutcome, JobError> {
        let mut request = config.to_create_request();
        if add_classification_tags {
            level::apply(DataLevel::Raw, &mut request.tags, &mut request.custom_metadata);
        }

        // Bucket-backed assets must leave the bytes in the bucket.
        if let Some(external) = request.source.external() {
            if !external.keep_on_external_storage {
                return Err(JobError::Configuration(format!(
                    "externally stored data asset {} must keep_on_external_storage",
                    request.name
                )));
            }
        }

        let (handle, response) = self
            .create_asset(request, config.viewable_to_everyone)
            .await?;
        Ok(RegisterOutcome { handle, response })
    }

    /// Validate inputs, submit the run, and (unless fire-and-forget)
    /// wait for completion.
    pub async fn run_capsule(&self, config: &RunCapsuleConfig) -> Result<RunOutcome, JobError> {
        config.validate()?;

        // Every referenced asset must exist before anything is started
        // remotely; a missing input aborts the job with nothing running.
        for asset in &config.data_assets {
            let response = self.api.get_data_asset(&asset.id).await?;
            if response.status == 404 {
                return Err(JobError::NotFound {
                    id: asset.id.clone(),
                });
            }
            if !response.is_success() {
                return Err(JobError::Retrieval {
                    id: asset.id.clone(),
                    status: response.status,
                });
            }
        }

        let request = config.to_run_request();
        let response = self.api.run_capsule(&request).await?;
        let Some(computation_id) = response.id().map(str::to_string) else {
            return Err(JobError::Submission {
                status: response.status,
                body: response.body.to_string(),
            });
        };
        tracing::info!(computation_id = %computation_id, "computation submitted");

        if config.pause_interval_seconds == 0 {
            let state = response
                .state()
                .unwrap_or_else(|| ComputationStateOrString::Other("unknown".to_string()));
            return Ok(RunOutcome {
                handle: ComputationHandle {
                    computation_id,
                    state,
                },
                response,
            });
        }

        let interval = Duration::from_secs(config.pause_interval_seconds);
        let timeout = config.timeout_seconds.map(Duration::from_secs);
        let api = &self.api;
        let poll_id = computation_id.clone();
        let last = wait::until(
            move || {
                let id = poll_id.clone();
                async move {
                    let response = api.get_computation(&id).await?;
                    let done = response.state().is_some_and(|state| state.is_completed());
                    tracing::debug!(computation_id = %id, status = response.status, "polled computation");
                    Ok::<_, JobError>((done, response))
                }
            },
            interval,
            timeout,
        )
        .await?;

        let state = last
            .state()
            .unwrap_or_else(|| ComputationStateOrString::Other("unknown".to_string()));
        if !state.is_completed() {
            return Err(JobError::Timeout {
                computation_id,
                last_state: state.to_string(),
            });
        }
        tracing::info!(computation_id = %computation_id, "computation completed");
        Ok(RunOutcome {
            handle: ComputationHandle {
                computation_id,
                state,
            },
            response: last,
        })
    }

    /// Register a finished computation's output as a derived data asset.
    pub async fn capture_result(
        &self,
        computation_id: &str,
        config: &CaptureResultConfig,
        fallback_input_asset_name: Option<&str>,
        add_classification_tags: bool,
    ) -> Result<CaptureOutcome, JobError> {
        let name = match &config.asset_name {
            Some(name) => name.clone(),
            None => {
                let process_name = config.process_name.as_deref().ok_or_else(|| {
                    JobError::Configuration(
                        "capture needs either asset_name or process_name".to_string(),
                    )
                })?;
                let input_name = fallback_input_asset_name.ok_or_else(|| {
                    JobError::Configuration(
                        "capture has no asset_name and no input asset name to derive one from"
                            .to_string(),
                    )
                })?;
                derived_asset_name(input_name, process_name, Utc::now())
            }
        };
        let mount = config.mount.clone().unwrap_or_else(|| name.clone());

        let mut tags = config.tags.clone();
        let mut custom_metadata = config.custom_metadata.clone();
        if add_classification_tags {
            level::apply(DataLevel::Derived, &mut tags, &mut custom_metadata);
        }

        let request = CreateDataAssetRequest {
            name,
            mount,
            tags,
            custom_metadata,
            source: DataSource::computation(computation_id),
        };
        let (handle, response) = self
            .create_asset(request, config.viewable_to_everyone)
            .await?;
        Ok(CaptureOutcome { handle, response })
    }

    /// Shared creation path for registration and capture: create the
    /// asset, then optionally wait for it to appear and share it.
    async fn create_asset(
        &self,
        request: CreateDataAssetRequest,
        viewable_to_everyone: bool,
    ) -> Result<(DataAssetHandle, ApiResponse), JobError> {
        let response = self.api.create_data_asset(&request).await?;
        let Some(id) = response.id().map(str::to_string) else {
            return Err(JobError::Registration {
                name: request.name,
                status: response.status,
                body: response.body.to_string(),
            });
        };
        tracing::info!(asset_id = %id, name = %request.name, "created data asset");

        if viewable_to_everyone {
            self.publish_to_everyone(&id).await?;
        }

        let name = response
            .body
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(&request.name)
            .to_string();
        let handle = DataAssetHandle {
            id,
            name,
            mount: request.mount,
            tags: request.tags,
        };
        Ok((handle, response))
    }

    /// Wait for a freshly created asset to become queryable, then grant
    /// viewer access to everyone.
    async fn publish_to_everyone(&self, id: &str) -> Result<(), JobError> {
        let api = &self.api;
        let last = wait::until(
            move || {
                let id = id.to_string();
                async move {
                    let response = api.get_data_asset(&id).await?;
                    Ok::<_, JobError>((response.status == 200, response))
                }
            },
            self.availability_interval,
            Some(self.availability_timeout),
        )
        .await?;
        if last.status != 200 {
            return Err(JobError::NotFound { id: id.to_string() });
        }

        let response = self
            .api
            .update_permissions(id, &PermissionsRequest::everyone_viewer())
            .await?;
        if !response.is_success() {
            return Err(JobError::Permissions {
                id: id.to_string(),
                status: response.status,
            });
        }
        tracing::info!(asset_id = %id, "data asset shared with everyone");
        Ok(())
    }
}

/// `{input}_{process}_{YYYYMMDD_HHMMSS}`, the platform's naming scheme
/// for processed results. Second granularity keeps names unique across
/// consecutive captures of the same input.
pub fn derived_asset_name(
    input_asset_name: &str,
    process_name: &str,
    at: DateTime<Utc>,
) -> String {
    format!(
        "{input_asset_name}_{process_name}_{}",
        at.format("%Y%m%d_%H%M%S")
    )
}
