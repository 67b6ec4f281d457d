// Container runtime gateway via bollard.

mod stats;

use crate::error::GatewayError;
use crate::models::{ContainerInfo, ContainerMetric, ContainerState};
use async_trait::async_trait;
use bollard::Docker;
use bollard::query_parameters::{
    ListContainersOptions, LogsOptions, RestartContainerOptions, StatsOptions,
};
use bollard::models::ContainerSummary;
use chrono::DateTime;
use futures_util::StreamExt;

/// Grace period the daemon waits before killing a container on restart.
const RESTART_GRACE_SECS: i32 = 10;

/// Upper bound for any single Docker API request.
const API_TIMEOUT_SECS: u64 = 60;

/// Length of the display identifier derived from the runtime's native id.
const SHORT_ID_LEN: usize = 12;

/// Runtime introspection surface used by the sampling worker, the heal
/// policy, and the API layer. The production adapter is [`DockerRepo`];
/// tests substitute in-memory fakes.
#[async_trait]
pub trait ContainerGateway: Send + Sync {
    /// Enumerate containers. Ids are truncated to 12 chars and the leading
    /// name separator is stripped from display names.
    async fn list_containers(
        &self,
        include_stopped: bool,
    ) -> Result<Vec<ContainerInfo>, GatewayError>;

    /// One non-streaming resource-usage snapshot for a listed container.
    async fn sample(&self, container: &ContainerInfo) -> Result<ContainerMetric, GatewayError>;

    /// Last `tail` lines of combined stdout/stderr, decoded from the
    /// runtime's multiplexed log-frame format.
    async fn logs(&self, id: &str, tail: usize) -> Result<Vec<String>, GatewayError>;

    /// Graceful restart with a bounded grace period before forceful kill.
    async fn restart(&self, id: &str) -> Result<(), GatewayError>;
}

/// Resolve a container by display name; `NotFound` if nothing matches.
pub async fn find_by_name(
    gateway: &dyn ContainerGateway,
    name: &str,
) -> Result<ContainerInfo, GatewayError> {
    let containers = gateway.list_containers(true).await?;
    containers
        .into_iter()
        .find(|c| c.name == name)
        .ok_or_else(|| GatewayError::NotFound(name.to_string()))
}

pub struct DockerRepo {
    docker: Docker,
}

impl DockerRepo {
    pub fn connect(host: &str) -> anyhow::Result<Self> {
        let docker = if let Some(path) = host.strip_prefix("unix://") {
            Docker::connect_with_unix(path, API_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)?
        } else {
            Docker::connect_with_http(host, API_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)?
        };
        Ok(Self { docker })
    }
}

#[async_trait]
impl ContainerGateway for DockerRepo {
    async fn list_containers(
        &self,
        include_stopped: bool,
    ) -> Result<Vec<ContainerInfo>, GatewayError> {
        let options = ListContainersOptions {
            all: include_stopped,
            ..Default::default()
        };
        let summaries = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(GatewayError::RuntimeUnavailable)?;
        Ok(summaries.iter().map(summary_to_info).collect())
    }

    async fn sample(&self, container: &ContainerInfo) -> Result<ContainerMetric, GatewayError> {
        // stream=false makes the daemon take two samples so the pre-CPU
        // counters needed for the delta are populated.
        let options = StatsOptions {
            stream: false,
            one_shot: false,
            ..Default::default()
        };
        let mut stream = self.docker.stats(&container.id, Some(options));
        match stream.next().await {
            Some(Ok(raw)) => Ok(stats::build_metric(container, &raw)),
            Some(Err(e)) => Err(GatewayError::SampleUnavailable {
                id: container.id.clone(),
                reason: e.to_string(),
            }),
            None => Err(GatewayError::SampleUnavailable {
                id: container.id.clone(),
                reason: "stats stream ended without a sample".to_string(),
            }),
        }
    }

    async fn logs(&self, id: &str, tail: usize) -> Result<Vec<String>, GatewayError> {
        let options = LogsOptions {
            stdout: true,
            stderr: true,
            timestamps: true,
            tail: tail.to_string(),
            ..Default::default()
        };
        let mut stream = self.docker.logs(id, Some(options));
        let mut lines = Vec::new();
        while let Some(entry) = stream.next().await {
            match entry {
                // The demuxed stream has the 8-byte frame headers already
                // stripped; each item is raw line text.
                Ok(output) => {
                    let chunk = output.into_bytes();
                    for line in String::from_utf8_lossy(&chunk).lines() {
                        if !line.is_empty() {
                            lines.push(line.to_string());
                        }
                    }
                }
                Err(e) => return Err(not_found_or_unavailable(id, e)),
            }
        }
        Ok(lines)
    }

    async fn restart(&self, id: &str) -> Result<(), GatewayError> {
        let options = RestartContainerOptions {
            t: Some(RESTART_GRACE_SECS),
            ..Default::default()
        };
        self.docker
            .restart_container(id, Some(options))
            .await
            .map_err(|e| GatewayError::RestartFailed {
                id: id.to_string(),
                reason: e.to_string(),
            })
    }
}

fn not_found_or_unavailable(id: &str, e: bollard::errors::Error) -> GatewayError {
    match e {
        bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        } => GatewayError::NotFound(id.to_string()),
        other => GatewayError::RuntimeUnavailable(other),
    }
}

fn summary_to_info(c: &ContainerSummary) -> ContainerInfo {
    let full_id = c.id.clone().unwrap_or_default();
    let id: String = full_id.chars().take(SHORT_ID_LEN).collect();
    let name = c
        .names
        .as_ref()
        .and_then(|n| n.first())
        .map(|n| n.trim_start_matches('/').to_string())
        .unwrap_or_else(|| id.clone());
    let state = c
        .state
        .as_ref()
        .map(|s| s.to_string())
        .unwrap_or_default();
    ContainerInfo {
        id,
        name,
        image: c.image.clone().unwrap_or_default(),
        status: c.status.clone().unwrap_or_default(),
        state: ContainerState::from_docker(&state),
        created: c
            .created
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or(DateTime::UNIX_EPOCH),
    }
}
