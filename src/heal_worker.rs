// Background auto-heal worker, scheduled independently from the sampler.
// The two loops share only the gateway and the store.

use crate::autoheal::HealService;
use std::sync::Arc;
use tokio::time::{Duration, interval};
use tracing::{debug, info};

pub fn spawn(
    heal: Arc<HealService>,
    interval_secs: u64,
    mut shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = interval(Duration::from_secs(interval_secs));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let events = heal.run_healing_pass().await;
                    if !events.is_empty() {
                        info!(actions = events.len(), "healing pass performed actions");
                    }
                }
                _ = &mut shutdown_rx => {
                    debug!("heal worker shutting down");
                    break;
                }
            }
        }
    })
}
