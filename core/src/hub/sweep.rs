//! Background action sweep
//!
//! Low-frequency safety net so actions fire even when no client command
//! happens to save the timer near a threshold. The server still never pushes
//! ticks; displays derive remaining time themselves from the broadcast state.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::BroadcastHub;

/// Spawn the periodic sweep for a hub. The task holds only a weak reference
/// and exits once the hub is dropped.
pub fn spawn_action_sweep(hub: &Arc<BroadcastHub>, interval: Duration) -> JoinHandle<()> {
    let hub: Weak<BroadcastHub> = Arc::downgrade(hub);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let Some(hub) = hub.upgrade() else {
                break;
            };
            hub.sweep_once().await;
        }
    })
}
