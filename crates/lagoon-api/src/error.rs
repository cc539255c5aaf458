use thiserror::Error;

/// Transport-level failures.
///
/// HTTP status codes are deliberately NOT errors here: the platform
/// reports "not found", "still pending" and friends through statuses and
/// bodies that the jobs layer interprets. Only failures to reach the
/// service or to read its response surface as `ApiError`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid client configuration: {0}")]
    Configuration(String),

    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unreadable response from {endpoint}: {source}")]
    Body {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}
