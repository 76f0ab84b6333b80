use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use cuelight_core::{
    AppConfig, BroadcastHub, MemoryStore, Role, ServerEvent, SessionId, SystemTimeSource,
    TimeSource, TimerStore,
};

/// Shared state for the REPL: an in-process hub plus one admin session on it.
pub struct CliContext {
    pub config: AppConfig,
    pub hub: Arc<BroadcastHub>,
    pub session: SessionId,
    /// Broadcasts received by our session, drained by the `events` command
    pub events: Mutex<mpsc::UnboundedReceiver<ServerEvent>>,
}

impl CliContext {
    pub async fn new() -> Result<Self, String> {
        let config = AppConfig::load();
        let store: Arc<dyn TimerStore> = Arc::new(MemoryStore::with_config(&config));
        let time: Arc<dyn TimeSource> = Arc::new(SystemTimeSource);
        let hub = BroadcastHub::new(store, time, config.clone());

        let (session, events) = hub
            .connect(Role::Admin)
            .await
            .map_err(|e| e.to_string())?;

        Ok(Self {
            config,
            hub,
            session,
            events: Mutex::new(events),
        })
    }
}
