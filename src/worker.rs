// Background sampling worker: enumerate containers, record one metric per
// container, evaluate alerts. One full pass per tick; a tick that fires
// while a pass is still running is skipped, never interleaved.

use crate::alerts;
use crate::config::AlertsConfig;
use crate::docker_repo::ContainerGateway;
use crate::metrics_repo::MetricsRepo;
use std::sync::Arc;
use tokio::time::{Duration, interval};
use tracing::{debug, info, warn};

/// Gateway, store, and shutdown for the sampling worker.
pub struct WorkerDeps {
    pub gateway: Arc<dyn ContainerGateway>,
    pub repo: Arc<MetricsRepo>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

pub struct WorkerConfig {
    pub sample_interval_secs: u64,
    pub thresholds: AlertsConfig,
    pub exclude_containers: Vec<String>,
}

pub fn spawn(deps: WorkerDeps, config: WorkerConfig) -> tokio::task::JoinHandle<()> {
    let WorkerDeps {
        gateway,
        repo,
        mut shutdown_rx,
    } = deps;

    tokio::spawn(async move {
        let mut tick = interval(Duration::from_secs(config.sample_interval_secs));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    match collect_once(
                        gateway.as_ref(),
                        &repo,
                        &config.thresholds,
                        &config.exclude_containers,
                    )
                    .await
                    {
                        Ok(sampled) => {
                            debug!(containers = sampled, "sampling pass complete");
                        }
                        Err(e) => {
                            warn!(error = %e, "sampling pass failed");
                        }
                    }
                }
                _ = &mut shutdown_rx => {
                    debug!("sampling worker shutting down");
                    break;
                }
            }
        }
    })
}

/// One full sampling pass: enumerate running containers, sample each
/// non-excluded one, persist the metric, and evaluate alerts. A failure on a
/// single container is logged and skipped so the pass completes for the rest.
pub async fn collect_once(
    gateway: &dyn ContainerGateway,
    repo: &MetricsRepo,
    thresholds: &AlertsConfig,
    exclude: &[String],
) -> anyhow::Result<usize> {
    let containers = gateway.list_containers(false).await?;

    let mut sampled = 0usize;
    for container in containers {
        if exclude.iter().any(|n| n == &container.name) {
            continue;
        }
        let metric = match gateway.sample(&container).await {
            Ok(m) => m,
            Err(e) => {
                warn!(container = %container.name, error = %e, "sample failed, skipping");
                continue;
            }
        };

        // Observability data loss must not stop the pass.
        if let Err(e) = repo.insert_metric(&metric).await {
            warn!(container = %metric.name, error = %e, "failed to store metric");
        }

        for alert in alerts::evaluate(&metric, thresholds) {
            match repo.insert_alert_if_new(&alert).await {
                Ok(true) => {
                    info!(container = %alert.name, kind = alert.kind.as_str(), "alert raised");
                }
                Ok(false) => {} // active duplicate inside the dedup window
                Err(e) => {
                    warn!(container = %alert.name, error = %e, "failed to store alert");
                }
            }
        }
        sampled += 1;
    }
    Ok(sampled)
}
