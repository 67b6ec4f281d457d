// Sampling pass tests: collect_once against the fake gateway and a temp store

mod common;

use common::{FakeGateway, container, metric, temp_repo};
use vigil::config::AlertsConfig;
use vigil::models::{AlertKind, ContainerState};
use vigil::worker::collect_once;

fn thresholds() -> AlertsConfig {
    AlertsConfig {
        cpu_threshold: 90.0,
        memory_threshold: 90.0,
        restart_limit: 3,
    }
}

#[tokio::test]
async fn collect_once_persists_a_metric_per_running_container() {
    let (_dir, repo) = temp_repo().await;
    let gateway = FakeGateway {
        containers: vec![
            container("aaa111111111", "web", ContainerState::Running, "Up 2 hours"),
            container("bbb222222222", "db", ContainerState::Running, "Up 1 hour"),
            container("ccc333333333", "old", ContainerState::Exited, "Exited (0)"),
        ],
        metrics: vec![
            metric("aaa111111111", "web", 10.0, 100, 1000),
            metric("bbb222222222", "db", 20.0, 200, 1000),
        ],
        ..Default::default()
    };

    let sampled = collect_once(&gateway, &repo, &thresholds(), &[])
        .await
        .unwrap();

    assert_eq!(sampled, 2);
    let latest = repo.latest_metrics().await.unwrap();
    assert_eq!(latest.len(), 2);
    // Stopped containers are not sampled.
    assert!(latest.iter().all(|m| m.container_id != "ccc333333333"));
}

#[tokio::test]
async fn collect_once_skips_excluded_containers() {
    let (_dir, repo) = temp_repo().await;
    let gateway = FakeGateway {
        containers: vec![
            container("aaa111111111", "web", ContainerState::Running, "Up 2 hours"),
            container("bbb222222222", "db", ContainerState::Running, "Up 1 hour"),
        ],
        metrics: vec![
            metric("aaa111111111", "web", 99.0, 0, 0),
            metric("bbb222222222", "db", 10.0, 0, 0),
        ],
        ..Default::default()
    };

    let sampled = collect_once(&gateway, &repo, &thresholds(), &["web".to_string()])
        .await
        .unwrap();

    assert_eq!(sampled, 1);
    let latest = repo.latest_metrics().await.unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].name, "db");
    // Excluded containers never produce alerts either.
    assert!(repo.active_alerts().await.unwrap().is_empty());
}

#[tokio::test]
async fn collect_once_skips_failed_sample_and_completes_the_pass() {
    let (_dir, repo) = temp_repo().await;
    let gateway = FakeGateway {
        containers: vec![
            container("aaa111111111", "web", ContainerState::Running, "Up 2 hours"),
            container("bbb222222222", "db", ContainerState::Running, "Up 1 hour"),
        ],
        metrics: vec![
            metric("aaa111111111", "web", 10.0, 0, 0),
            metric("bbb222222222", "db", 20.0, 0, 0),
        ],
        fail_sample_for: vec!["aaa111111111".to_string()],
        ..Default::default()
    };

    let sampled = collect_once(&gateway, &repo, &thresholds(), &[])
        .await
        .unwrap();

    assert_eq!(sampled, 1);
    let latest = repo.latest_metrics().await.unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].name, "db");
}

#[tokio::test]
async fn high_cpu_metric_raises_one_alert_and_low_memory_raises_none() {
    let (_dir, repo) = temp_repo().await;
    let gateway = FakeGateway {
        containers: vec![container(
            "aaa111111111",
            "web",
            ContainerState::Running,
            "Up 2 hours",
        )],
        // CPU over 90, memory at 10% of limit
        metrics: vec![metric("aaa111111111", "web", 95.0, 100, 1000)],
        ..Default::default()
    };

    collect_once(&gateway, &repo, &thresholds(), &[])
        .await
        .unwrap();

    let alerts = repo.active_alerts().await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::HighCpu);
}

#[tokio::test]
async fn worker_spawn_ticks_and_shutdown_stops_the_loop() {
    let (_dir, repo) = temp_repo().await;
    let gateway = std::sync::Arc::new(FakeGateway {
        containers: vec![container(
            "aaa111111111",
            "web",
            ContainerState::Running,
            "Up 2 hours",
        )],
        metrics: vec![metric("aaa111111111", "web", 10.0, 0, 0)],
        ..Default::default()
    });

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = vigil::worker::spawn(
        vigil::worker::WorkerDeps {
            gateway: gateway.clone(),
            repo: repo.clone(),
            shutdown_rx,
        },
        vigil::worker::WorkerConfig {
            sample_interval_secs: 60,
            thresholds: thresholds(),
            exclude_containers: vec![],
        },
    );

    // The first tick fires immediately; give the pass time to complete.
    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;
    let _ = shutdown_tx.send(());
    handle.await.unwrap();

    let latest = repo.latest_metrics().await.unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].name, "web");
}

#[tokio::test]
async fn repeated_passes_within_the_window_keep_one_alert() {
    let (_dir, repo) = temp_repo().await;
    let gateway = FakeGateway {
        containers: vec![container(
            "aaa111111111",
            "web",
            ContainerState::Running,
            "Up 2 hours",
        )],
        metrics: vec![metric("aaa111111111", "web", 95.0, 0, 0)],
        ..Default::default()
    };

    collect_once(&gateway, &repo, &thresholds(), &[])
        .await
        .unwrap();
    collect_once(&gateway, &repo, &thresholds(), &[])
        .await
        .unwrap();

    assert_eq!(repo.active_alerts().await.unwrap().len(), 1);
}
