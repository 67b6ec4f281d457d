// SQLite store for metrics, alerts, and auto-heal events. Every insert is a
// single self-contained statement; SQLite serializes concurrent writers at
// the statement level.

use crate::models::{Alert, AlertKind, AutoHealEvent, ContainerMetric};
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

/// Rolling window within which a second alert of the same kind for the same
/// container is suppressed.
pub const ALERT_DEDUP_WINDOW_MS: i64 = 60 * 60 * 1000;

pub struct MetricsRepo {
    pool: SqlitePool,
}

impl MetricsRepo {
    pub async fn connect(path: &str) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new().connect_with(opts).await?;
        Ok(Self { pool })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS container_metrics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                container_id TEXT NOT NULL,
                name TEXT NOT NULL,
                cpu_percent REAL NOT NULL,
                memory_usage INTEGER NOT NULL,
                memory_limit INTEGER NOT NULL,
                network_rx INTEGER NOT NULL,
                network_tx INTEGER NOT NULL,
                status TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_metrics_container_created
             ON container_metrics(container_id, created_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS alerts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                container_id TEXT NOT NULL,
                name TEXT NOT NULL,
                type TEXT NOT NULL,
                message TEXT NOT NULL,
                severity TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_alerts_dedup
             ON alerts(container_id, type, created_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS autoheal_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                container_id TEXT NOT NULL,
                name TEXT NOT NULL,
                action TEXT NOT NULL,
                reason TEXT NOT NULL,
                success INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_events_created ON autoheal_events(created_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self, metric), fields(repo = "metrics", operation = "insert_metric", container = %metric.name))]
    pub async fn insert_metric(&self, metric: &ContainerMetric) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO container_metrics
             (container_id, name, cpu_percent, memory_usage, memory_limit, network_rx, network_tx, status, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&metric.container_id)
        .bind(&metric.name)
        .bind(metric.cpu_percent)
        .bind(metric.memory_usage)
        .bind(metric.memory_limit)
        .bind(metric.network_rx)
        .bind(metric.network_tx)
        .bind(&metric.status)
        .bind(metric.timestamp.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Latest metric per container, ordered by name.
    pub async fn latest_metrics(&self) -> anyhow::Result<Vec<ContainerMetric>> {
        // SQLite keeps the bare columns from the MAX() row within each group.
        let rows = sqlx::query(
            "SELECT container_id, name, cpu_percent, memory_usage, memory_limit,
                    network_rx, network_tx, status, MAX(created_at) AS created_at
             FROM container_metrics
             GROUP BY container_id
             ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(parse_metric_row).collect()
    }

    /// Metric history for one container within the last `hours`, newest first.
    #[instrument(skip(self), fields(repo = "metrics", operation = "metrics_since"))]
    pub async fn metrics_since(
        &self,
        container_id: &str,
        hours: u32,
    ) -> anyhow::Result<Vec<ContainerMetric>> {
        let cutoff = Utc::now().timestamp_millis() - (hours as i64) * 3600 * 1000;
        let rows = sqlx::query(
            "SELECT container_id, name, cpu_percent, memory_usage, memory_limit,
                    network_rx, network_tx, status, created_at
             FROM container_metrics
             WHERE container_id = $1 AND created_at > $2
             ORDER BY created_at DESC",
        )
        .bind(container_id)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(parse_metric_row).collect()
    }

    /// Inserts the alert unless an active alert of the same (container, kind)
    /// exists within the dedup window. Returns whether a row was written.
    #[instrument(skip(self, alert), fields(repo = "metrics", operation = "insert_alert_if_new", container = %alert.name, kind = alert.kind.as_str()))]
    pub async fn insert_alert_if_new(&self, alert: &Alert) -> anyhow::Result<bool> {
        let cutoff = alert.timestamp.timestamp_millis() - ALERT_DEDUP_WINDOW_MS;
        let duplicates: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM alerts
             WHERE container_id = $1 AND type = $2 AND active = 1 AND created_at > $3",
        )
        .bind(&alert.container_id)
        .bind(alert.kind.as_str())
        .bind(cutoff)
        .fetch_one(&self.pool)
        .await?;
        if duplicates > 0 {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO alerts (container_id, name, type, message, severity, active, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&alert.container_id)
        .bind(&alert.name)
        .bind(alert.kind.as_str())
        .bind(&alert.message)
        .bind(&alert.severity)
        .bind(alert.active)
        .bind(alert.timestamp.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(true)
    }

    /// All alerts still flagged active, newest first.
    pub async fn active_alerts(&self) -> anyhow::Result<Vec<Alert>> {
        let rows = sqlx::query(
            "SELECT id, container_id, name, type, message, severity, active, created_at
             FROM alerts
             WHERE active = 1
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(parse_alert_row).collect()
    }

    #[instrument(skip(self, event), fields(repo = "metrics", operation = "insert_heal_event", container = %event.name))]
    pub async fn insert_heal_event(&self, event: &AutoHealEvent) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO autoheal_events (container_id, name, action, reason, success, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&event.container_id)
        .bind(&event.name)
        .bind(&event.action)
        .bind(&event.reason)
        .bind(event.success)
        .bind(event.timestamp.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Most recent heal events, newest first.
    pub async fn recent_heal_events(&self, limit: u32) -> anyhow::Result<Vec<AutoHealEvent>> {
        let rows = sqlx::query(
            "SELECT id, container_id, name, action, reason, success, created_at
             FROM autoheal_events
             ORDER BY created_at DESC
             LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(parse_event_row).collect()
    }
}

fn timestamp_from_ms(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::UNIX_EPOCH)
}

fn parse_metric_row(row: &SqliteRow) -> anyhow::Result<ContainerMetric> {
    Ok(ContainerMetric {
        container_id: row.try_get("container_id")?,
        name: row.try_get("name")?,
        cpu_percent: row.try_get("cpu_percent")?,
        memory_usage: row.try_get("memory_usage")?,
        memory_limit: row.try_get("memory_limit")?,
        network_rx: row.try_get("network_rx")?,
        network_tx: row.try_get("network_tx")?,
        status: row.try_get("status")?,
        timestamp: timestamp_from_ms(row.try_get("created_at")?),
    })
}

fn parse_alert_row(row: &SqliteRow) -> anyhow::Result<Alert> {
    let kind: String = row.try_get("type")?;
    Ok(Alert {
        id: row.try_get("id")?,
        container_id: row.try_get("container_id")?,
        name: row.try_get("name")?,
        kind: AlertKind::from_str(&kind)?,
        message: row.try_get("message")?,
        severity: row.try_get("severity")?,
        active: row.try_get("active")?,
        timestamp: timestamp_from_ms(row.try_get("created_at")?),
    })
}

fn parse_event_row(row: &SqliteRow) -> anyhow::Result<AutoHealEvent> {
    Ok(AutoHealEvent {
        id: row.try_get("id")?,
        container_id: row.try_get("container_id")?,
        name: row.try_get("name")?,
        action: row.try_get("action")?,
        reason: row.try_get("reason")?,
        success: row.try_get("success")?,
        timestamp: timestamp_from_ms(row.try_get("created_at")?),
    })
}
