// Unhealthy-container detection and restart policy. Stateless per pass;
// each invocation is a complete re-evaluation against the live runtime.

use crate::config::AutoHealConfig;
use crate::docker_repo::ContainerGateway;
use crate::metrics_repo::MetricsRepo;
use crate::models::{AutoHealEvent, ContainerInfo, ContainerState};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

pub struct HealService {
    gateway: Arc<dyn ContainerGateway>,
    repo: Arc<MetricsRepo>,
    config: AutoHealConfig,
}

impl HealService {
    pub fn new(
        gateway: Arc<dyn ContainerGateway>,
        repo: Arc<MetricsRepo>,
        config: AutoHealConfig,
    ) -> Self {
        Self {
            gateway,
            repo,
            config,
        }
    }

    /// One full enumerate-classify-restart pass. Every restart attempt,
    /// success or failure, yields exactly one persisted event; failures are
    /// recorded, not retried within the pass.
    pub async fn run_healing_pass(&self) -> Vec<AutoHealEvent> {
        if !self.config.enabled {
            return Vec::new();
        }

        let containers = match self.gateway.list_containers(true).await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "healing pass: listing containers failed");
                return Vec::new();
            }
        };

        let mut events = Vec::new();
        for container in containers {
            if self
                .config
                .exclude_containers
                .iter()
                .any(|n| n == &container.name)
            {
                continue;
            }
            if !is_unhealthy(&container) {
                continue;
            }

            info!(
                container = %container.name,
                state = %container.state,
                status = %container.status,
                "unhealthy container detected"
            );

            let success = match self.gateway.restart(&container.id).await {
                Ok(()) => {
                    info!(container = %container.name, "container restarted");
                    true
                }
                Err(e) => {
                    warn!(container = %container.name, error = %e, "restart failed");
                    false
                }
            };

            let event = AutoHealEvent {
                id: 0,
                container_id: container.id.clone(),
                name: container.name.clone(),
                action: "restart".to_string(),
                reason: format!("Container state: {}", container.state),
                success,
                timestamp: Utc::now(),
            };
            // The restart already happened; losing the audit row must not
            // fail the pass or drop the in-memory result.
            if let Err(e) = self.repo.insert_heal_event(&event).await {
                warn!(container = %event.name, error = %e, "failed to store auto-heal event");
            }
            events.push(event);
        }
        events
    }
}

/// Exited containers are unhealthy regardless of status text; a failing
/// runtime health check only shows up as "unhealthy" inside the status.
pub fn is_unhealthy(container: &ContainerInfo) -> bool {
    container.state == ContainerState::Exited || container.status.contains("unhealthy")
}
