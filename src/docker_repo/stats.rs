// Convert a raw Docker stats response into a ContainerMetric.

use crate::models::{ContainerInfo, ContainerMetric};
use bollard::models::ContainerStatsResponse;
use chrono::Utc;

/// Build one metric record from a stats snapshot. Exposed for unit tests.
pub(crate) fn build_metric(
    container: &ContainerInfo,
    s: &ContainerStatsResponse,
) -> ContainerMetric {
    let memory_usage = s.memory_stats.as_ref().and_then(|m| m.usage).unwrap_or(0) as i64;
    let memory_limit = s.memory_stats.as_ref().and_then(|m| m.limit).unwrap_or(0) as i64;

    let (network_rx, network_tx) = s.networks.as_ref().map_or((0i64, 0i64), |n| {
        let mut rx = 0i64;
        let mut tx = 0i64;
        for v in n.values() {
            rx += v.rx_bytes.unwrap_or(0) as i64;
            tx += v.tx_bytes.unwrap_or(0) as i64;
        }
        (rx, tx)
    });

    ContainerMetric {
        container_id: container.id.clone(),
        name: container.name.clone(),
        cpu_percent: cpu_percent(s),
        memory_usage,
        memory_limit,
        network_rx,
        network_tx,
        status: container.status.clone(),
        timestamp: Utc::now(),
    }
}

/// Delta-based CPU accounting over two cumulative counters. A cold first
/// sample (previous total of zero) and non-positive deltas both floor to 0.0.
fn cpu_percent(s: &ContainerStatsResponse) -> f64 {
    let cur_total = s
        .cpu_stats
        .as_ref()
        .and_then(|c| c.cpu_usage.as_ref())
        .and_then(|u| u.total_usage)
        .unwrap_or(0);
    let prev_total = s
        .precpu_stats
        .as_ref()
        .and_then(|c| c.cpu_usage.as_ref())
        .and_then(|u| u.total_usage)
        .unwrap_or(0);
    if prev_total == 0 {
        return 0.0;
    }

    let cur_system = s
        .cpu_stats
        .as_ref()
        .and_then(|c| c.system_cpu_usage)
        .unwrap_or(0);
    let prev_system = s
        .precpu_stats
        .as_ref()
        .and_then(|c| c.system_cpu_usage)
        .unwrap_or(0);

    let cpu_delta = cur_total as i64 - prev_total as i64;
    let system_delta = cur_system as i64 - prev_system as i64;
    if cpu_delta <= 0 || system_delta <= 0 {
        return 0.0;
    }

    let cores = s
        .cpu_stats
        .as_ref()
        .and_then(|c| c.online_cpus)
        .unwrap_or(1) as f64;
    (cpu_delta as f64 / system_delta as f64) * cores * 100.0
}
