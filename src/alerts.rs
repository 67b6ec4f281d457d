// Threshold evaluation for container metrics.

use crate::config::AlertsConfig;
use crate::models::{Alert, AlertKind, ContainerMetric};

const SEVERITY_WARNING: &str = "warning";

/// Evaluate one metric against the configured thresholds. The CPU and memory
/// rules fire independently; a metric may produce both alert kinds at once.
pub fn evaluate(metric: &ContainerMetric, thresholds: &AlertsConfig) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if metric.cpu_percent > thresholds.cpu_threshold {
        alerts.push(make_alert(
            metric,
            AlertKind::HighCpu,
            "High CPU usage detected",
        ));
    }

    // A zero limit means no memory cap is configured; skip the rule entirely.
    if metric.memory_limit > 0 {
        let memory_percent = metric.memory_usage as f64 / metric.memory_limit as f64 * 100.0;
        if memory_percent > thresholds.memory_threshold {
            alerts.push(make_alert(
                metric,
                AlertKind::HighMemory,
                "High memory usage detected",
            ));
        }
    }

    alerts
}

fn make_alert(metric: &ContainerMetric, kind: AlertKind, message: &str) -> Alert {
    Alert {
        id: 0,
        container_id: metric.container_id.clone(),
        name: metric.name.clone(),
        kind,
        message: message.to_string(),
        severity: SEVERITY_WARNING.to_string(),
        active: true,
        timestamp: metric.timestamp,
    }
}
