use lagoon_api::ApiError;
use thiserror::Error;

/// Failures a job surfaces to its caller.
///
/// All of these are fatal for the current stage; the orchestrator never
/// retries a creation or submission. Side effects of earlier stages are
/// not rolled back: a registered asset whose capsule run fails stays
/// registered.
#[derive(Debug, Error)]
pub enum JobError {
    /// Contradictory or incomplete configuration, detected before any
    /// remote call is issued.
    #[error("invalid job configuration: {0}")]
    Configuration(String),

    /// A referenced or awaited remote resource does not exist.
    #[error("unable to find data asset {id}")]
    NotFound { id: String },

    /// A non-404 failure while checking that a resource exists.
    #[error("error retrieving data asset {id}: status {status}")]
    Retrieval { id: String, status: u16 },

    /// Asset creation was accepted but the response carries no id.
    #[error("registration of {name} returned no asset id (status {status}): {body}")]
    Registration {
        name: String,
        status: u16,
        body: String,
    },

    /// Run submission was accepted but the response carries no id.
    #[error("run submission returned no computation id (status {status}): {body}")]
    Submission { status: u16, body: String },

    /// Sharing an asset with everyone failed.
    #[error("sharing data asset {id} failed: status {status}")]
    Permissions { id: String, status: u16 },

    /// The poll window closed before the computation completed. The
    /// remote computation keeps running; only the local wait stopped.
    #[error("computation {computation_id} did not complete within the poll window (last state: {last_state})")]
    Timeout {
        computation_id: String,
        last_state: String,
    },

    /// The data-asset search endpoint answered with something unusable.
    #[error("data asset search failed: status {status}")]
    Search { status: u16 },

    #[error(transparent)]
    Api(#[from] ApiError),
}
