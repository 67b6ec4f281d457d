use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;
use vigil::*;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;

    let metrics_repo = Arc::new(metrics_repo::MetricsRepo::connect(&app_config.database.path).await?);
    metrics_repo.init().await?;

    let gateway: Arc<dyn docker_repo::ContainerGateway> =
        Arc::new(docker_repo::DockerRepo::connect(&app_config.docker.host)?);

    let (sampler_shutdown_tx, sampler_shutdown_rx) = tokio::sync::oneshot::channel();
    let sampler_handle = worker::spawn(
        worker::WorkerDeps {
            gateway: gateway.clone(),
            repo: metrics_repo.clone(),
            shutdown_rx: sampler_shutdown_rx,
        },
        worker::WorkerConfig {
            sample_interval_secs: app_config.monitoring.sample_interval_secs,
            thresholds: app_config.alerts.clone(),
            exclude_containers: app_config.autoheal.exclude_containers.clone(),
        },
    );

    let heal = Arc::new(autoheal::HealService::new(
        gateway.clone(),
        metrics_repo.clone(),
        app_config.autoheal.clone(),
    ));
    let (heal_shutdown_tx, heal_shutdown_rx) = tokio::sync::oneshot::channel();
    let heal_handle = heal_worker::spawn(
        heal.clone(),
        app_config.autoheal.effective_interval_secs(),
        heal_shutdown_rx,
    );
    if app_config.autoheal.enabled {
        tracing::info!(
            interval_secs = app_config.autoheal.effective_interval_secs(),
            "auto-healing enabled"
        );
    }

    let app = routes::app(gateway, metrics_repo, heal, app_config.clone());
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Received shutdown signal");
            let _ = sampler_shutdown_tx.send(());
            let _ = heal_shutdown_tx.send(());
            let _ = sampler_handle.await;
            let _ = heal_handle.await;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(s) => s,
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
