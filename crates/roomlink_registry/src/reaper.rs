//! Background purge of expired pairing requests
//!
//! Expiry is decided at read time, so the reaper only keeps the table small.

use std::sync::Arc;
use std::time::Duration;

use roomlink_db::{LegacyDeviceRepository, RegistryRepository};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::RegistryEngine;

/// Spawn a task that purges expired open requests every `interval`.
pub fn spawn_expired_request_reaper<R, L>(
    engine: Arc<RegistryEngine<R, L>>,
    interval: Duration,
) -> JoinHandle<()>
where
    R: RegistryRepository + 'static,
    L: LegacyDeviceRepository + 'static,
{
    info!("Expired request reaper running every {:?}", interval);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match engine.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => debug!("Purged {} expired registration request(s)", purged),
                Err(e) => warn!("Expired request purge failed: {}", e),
            }
        }
    })
}
