//! Persistence seam
//!
//! The store is the single source of truth: the engine, scheduler, and hub
//! hold no authoritative state of their own and re-read through this trait on
//! every operation. Each trait call is one atomic read-modify-write, which is
//! what lets concurrent admin commands and the background sweep coexist
//! without an outer lock.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::actions::TimerAction;
use crate::messages::TimerMessage;
use crate::timer::TimerSettings;

/// Errors from the persistence backend itself.
///
/// Absence of an entity is reported via `Option`/`bool` on the individual
/// methods, not as an error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend failure: {reason}")]
    Backend { reason: String },
}

/// Repository contract for timers, actions, messages, and the venue
/// status/visitor counters.
#[async_trait]
pub trait TimerStore: Send + Sync {
    // ─── Timers ─────────────────────────────────────────────────────────────
    async fn get_timer(&self, id: &str) -> Result<Option<TimerSettings>, StoreError>;
    async fn put_timer(&self, timer: TimerSettings) -> Result<(), StoreError>;
    async fn delete_timer(&self, id: &str) -> Result<bool, StoreError>;
    async fn list_timers(&self) -> Result<Vec<TimerSettings>, StoreError>;

    /// The single timer large displays should render. A pointer, not a copy,
    /// so it can never go stale against the timer record.
    async fn current_timer_id(&self) -> Result<Option<String>, StoreError>;
    async fn set_current_timer_id(&self, id: Option<String>) -> Result<(), StoreError>;

    // ─── Actions ────────────────────────────────────────────────────────────
    async fn get_action(&self, id: &str) -> Result<Option<TimerAction>, StoreError>;
    async fn put_action(&self, action: TimerAction) -> Result<(), StoreError>;
    async fn delete_action(&self, id: &str) -> Result<bool, StoreError>;
    async fn actions_for_timer(&self, timer_id: &str) -> Result<Vec<TimerAction>, StoreError>;
    async fn list_actions(&self) -> Result<Vec<TimerAction>, StoreError>;

    /// Atomically claim an action for execution. Returns false if the action
    /// is missing, disabled, or already executed. This check-and-set is the
    /// at-most-once guarantee under concurrent sweeps.
    async fn mark_action_executed(&self, id: &str) -> Result<bool, StoreError>;

    /// Clear the executed flag on every action of the timer (new run).
    async fn clear_executed(&self, timer_id: &str) -> Result<(), StoreError>;

    // ─── Messages ───────────────────────────────────────────────────────────
    async fn get_message(&self, id: &str) -> Result<Option<TimerMessage>, StoreError>;
    async fn put_message(&self, message: TimerMessage) -> Result<(), StoreError>;
    async fn delete_message(&self, id: &str) -> Result<bool, StoreError>;

    /// Messages most-recent-first, optionally scoped to one timer.
    async fn list_messages(
        &self,
        timer_id: Option<&str>,
    ) -> Result<Vec<TimerMessage>, StoreError>;

    // ─── Venue status & visitor counter ─────────────────────────────────────
    async fn status(&self) -> Result<String, StoreError>;
    async fn set_status(&self, status: String) -> Result<(), StoreError>;
    async fn visitor_count(&self) -> Result<u32, StoreError>;
    async fn add_visitors(&self, delta: u32) -> Result<u32, StoreError>;
    async fn reset_visitors(&self) -> Result<u32, StoreError>;
}
