// Domain models shared by the gateway, the store, and the API layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Container lifecycle state; serializes to lowercase JSON (e.g. "running").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Running,
    Exited,
    Paused,
    Restarting,
    #[serde(other)]
    Unknown,
}

impl ContainerState {
    /// Parse from the Docker API state string (e.g. "running", "exited").
    pub fn from_docker(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "running" => ContainerState::Running,
            "exited" => ContainerState::Exited,
            "paused" => ContainerState::Paused,
            "restarting" => ContainerState::Restarting,
            _ => ContainerState::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerState::Running => "running",
            ContainerState::Exited => "exited",
            ContainerState::Paused => "paused",
            ContainerState::Restarting => "restarting",
            ContainerState::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ContainerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only snapshot of a container as reported by the runtime.
/// Never persisted; re-fetched on every listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerInfo {
    /// 12-char runtime identifier.
    pub id: String,
    pub name: String,
    pub image: String,
    /// Human-readable status text, e.g. "Up 2 hours (unhealthy)".
    pub status: String,
    pub state: ContainerState,
    pub created: DateTime<Utc>,
}

/// One resource-usage sample for one container. Append-only time series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerMetric {
    pub container_id: String,
    pub name: String,
    pub cpu_percent: f64,
    pub memory_usage: i64,
    pub memory_limit: i64,
    /// Cumulative bytes received, summed over all interfaces.
    pub network_rx: i64,
    /// Cumulative bytes transmitted, summed over all interfaces.
    pub network_tx: i64,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Threshold alert kind; serializes as "high_cpu" / "high_memory".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    HighCpu,
    HighMemory,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::HighCpu => "high_cpu",
            AlertKind::HighMemory => "high_memory",
        }
    }
}

impl std::str::FromStr for AlertKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high_cpu" => Ok(AlertKind::HighCpu),
            "high_memory" => Ok(AlertKind::HighMemory),
            other => anyhow::bail!("unknown alert kind: {other}"),
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A threshold crossing. Once created, never mutated; `active` stays true
/// (there is no resolution transition).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    #[serde(default)]
    pub id: i64,
    pub container_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub severity: String,
    pub active: bool,
    pub timestamp: DateTime<Utc>,
}

/// Audit record for one restart attempt, success or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoHealEvent {
    #[serde(default)]
    pub id: i64,
    pub container_id: String,
    pub name: String,
    pub action: String,
    pub reason: String,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}
