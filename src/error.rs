// Gateway error taxonomy. Per-container failures (SampleUnavailable,
// RestartFailed) are logged and skipped by batch passes; NotFound surfaces
// to API callers as a 404.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("container runtime unreachable: {0}")]
    RuntimeUnavailable(#[source] bollard::errors::Error),

    #[error("container not found: {0}")]
    NotFound(String),

    #[error("stats sample unavailable for container {id}: {reason}")]
    SampleUnavailable { id: String, reason: String },

    #[error("restart of container {id} failed: {reason}")]
    RestartFailed { id: String, reason: String },
}
