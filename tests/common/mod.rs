// Shared test helpers: in-memory gateway fake, model builders, temp store.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use vigil::docker_repo::ContainerGateway;
use vigil::error::GatewayError;
use vigil::metrics_repo::MetricsRepo;
use vigil::models::{ContainerInfo, ContainerMetric, ContainerState};

/// In-memory gateway: serves canned containers/metrics, records restarts,
/// and counts every call so tests can assert "zero gateway calls".
#[derive(Default)]
pub struct FakeGateway {
    pub containers: Vec<ContainerInfo>,
    pub metrics: Vec<ContainerMetric>,
    pub fail_sample_for: Vec<String>,
    pub fail_restart_for: Vec<String>,
    pub calls: AtomicUsize,
    pub restarts: Mutex<Vec<String>>,
}

#[async_trait]
impl ContainerGateway for FakeGateway {
    async fn list_containers(
        &self,
        include_stopped: bool,
    ) -> Result<Vec<ContainerInfo>, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .containers
            .iter()
            .filter(|c| include_stopped || c.state == ContainerState::Running)
            .cloned()
            .collect())
    }

    async fn sample(&self, container: &ContainerInfo) -> Result<ContainerMetric, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sample_for.contains(&container.id) {
            return Err(GatewayError::SampleUnavailable {
                id: container.id.clone(),
                reason: "container vanished".to_string(),
            });
        }
        self.metrics
            .iter()
            .find(|m| m.container_id == container.id)
            .cloned()
            .ok_or_else(|| GatewayError::SampleUnavailable {
                id: container.id.clone(),
                reason: "no canned metric".to_string(),
            })
    }

    async fn logs(&self, id: &str, _tail: usize) -> Result<Vec<String>, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.containers.iter().any(|c| c.id == id) {
            Ok(vec!["log line".to_string()])
        } else {
            Err(GatewayError::NotFound(id.to_string()))
        }
    }

    async fn restart(&self, id: &str) -> Result<(), GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.restarts.lock().unwrap().push(id.to_string());
        if self.fail_restart_for.iter().any(|f| f == id) {
            return Err(GatewayError::RestartFailed {
                id: id.to_string(),
                reason: "daemon said no".to_string(),
            });
        }
        Ok(())
    }
}

pub fn container(id: &str, name: &str, state: ContainerState, status: &str) -> ContainerInfo {
    ContainerInfo {
        id: id.to_string(),
        name: name.to_string(),
        image: "nginx:latest".to_string(),
        status: status.to_string(),
        state,
        created: DateTime::UNIX_EPOCH,
    }
}

pub fn metric(id: &str, name: &str, cpu: f64, mem_usage: i64, mem_limit: i64) -> ContainerMetric {
    metric_at(id, name, cpu, mem_usage, mem_limit, Utc::now())
}

pub fn metric_at(
    id: &str,
    name: &str,
    cpu: f64,
    mem_usage: i64,
    mem_limit: i64,
    timestamp: DateTime<Utc>,
) -> ContainerMetric {
    ContainerMetric {
        container_id: id.to_string(),
        name: name.to_string(),
        cpu_percent: cpu,
        memory_usage: mem_usage,
        memory_limit: mem_limit,
        network_rx: 0,
        network_tx: 0,
        status: "Up 2 hours".to_string(),
        timestamp,
    }
}

/// Fresh SQLite store in a temp dir. Keep the TempDir alive for the test.
pub async fn temp_repo() -> (TempDir, Arc<MetricsRepo>) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("vigil.db");
    let repo = MetricsRepo::connect(path.to_str().unwrap()).await.unwrap();
    repo.init().await.unwrap();
    (dir, Arc::new(repo))
}
