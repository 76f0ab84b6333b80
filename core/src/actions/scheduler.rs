//! Action scheduling and execution
//!
//! `check_and_execute` is driven by every state-changing save of a running
//! countdown timer, plus the periodic hub sweep. Both paths re-read actions
//! and remaining time fresh from the store, so a race between them costs at
//! worst one tick of latency; the store's executed-flag check-and-set makes
//! duplicate firing impossible.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{ActionDraft, ActionKind, TimerAction};
use crate::bus::EventBus;
use crate::clock::TimeSource;
use crate::hub::ServerEvent;
use crate::messages::{MessageChannel, MessageDraft};
use crate::store::{StoreError, TimerStore};

const DEFAULT_TRIGGER_TIME_MS: i64 = 60_000;
const DEFAULT_ACTION_COLOR: &str = "#ffffff";

#[derive(Clone)]
pub struct ActionScheduler {
    store: Arc<dyn TimerStore>,
    time: Arc<dyn TimeSource>,
    bus: EventBus,
    messages: MessageChannel,
    // Suffix keeping ids unique when several actions are created in the same ms
    id_seq: Arc<AtomicU64>,
}

impl ActionScheduler {
    pub fn new(
        store: Arc<dyn TimerStore>,
        time: Arc<dyn TimeSource>,
        bus: EventBus,
        messages: MessageChannel,
    ) -> Self {
        Self {
            store,
            time,
            bus,
            messages,
            id_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    // ─── CRUD ───────────────────────────────────────────────────────────────

    pub async fn create(&self, draft: ActionDraft) -> Result<TimerAction, StoreError> {
        let now = self.time.now_ms();
        let seq = self.id_seq.fetch_add(1, Ordering::Relaxed);
        let action = TimerAction {
            id: format!("action_{now}_{seq}"),
            timer_id: draft.timer_id,
            trigger_time: draft.trigger_time.unwrap_or(DEFAULT_TRIGGER_TIME_MS),
            kind: draft.kind.unwrap_or(ActionKind::Message),
            message: draft.message,
            color: draft.color.or_else(|| Some(DEFAULT_ACTION_COLOR.to_string())),
            flash: draft.flash,
            executed: false,
            enabled: draft.enabled.unwrap_or(true),
        };
        self.store.put_action(action.clone()).await?;
        self.bus.publish(ServerEvent::ActionCreate {
            action: action.clone(),
        });
        Ok(action)
    }

    /// Replace an existing action. Returns None if it does not exist.
    pub async fn update(&self, action: TimerAction) -> Result<Option<TimerAction>, StoreError> {
        if self.store.get_action(&action.id).await?.is_none() {
            return Ok(None);
        }
        self.store.put_action(action.clone()).await?;
        self.bus.publish(ServerEvent::ActionUpdate {
            action: action.clone(),
        });
        Ok(Some(action))
    }

    pub async fn delete(&self, action_id: &str) -> Result<bool, StoreError> {
        let removed = self.store.delete_action(action_id).await?;
        if removed {
            self.bus.publish(ServerEvent::ActionDelete {
                action_id: action_id.to_string(),
            });
        }
        Ok(removed)
    }

    pub async fn get(&self, action_id: &str) -> Result<Option<TimerAction>, StoreError> {
        self.store.get_action(action_id).await
    }

    pub async fn actions_for_timer(&self, timer_id: &str) -> Result<Vec<TimerAction>, StoreError> {
        self.store.actions_for_timer(timer_id).await
    }

    pub async fn list(&self) -> Result<Vec<TimerAction>, StoreError> {
        self.store.list_actions().await
    }

    // ─── Firing ─────────────────────────────────────────────────────────────

    /// Fire every enabled, unexecuted action whose threshold has been reached
    /// or passed at `remaining_ms`.
    ///
    /// Candidates run in descending trigger-time order so the action nearest
    /// the timer's end fires last, matching natural countdown order when
    /// several thresholds are crossed in one observation.
    pub async fn check_and_execute(
        &self,
        timer_id: &str,
        remaining_ms: i64,
    ) -> Result<(), StoreError> {
        let mut due: Vec<TimerAction> = self
            .store
            .actions_for_timer(timer_id)
            .await?
            .into_iter()
            .filter(|a| a.enabled && !a.executed && a.trigger_time >= remaining_ms)
            .collect();
        due.sort_by(|a, b| {
            b.trigger_time
                .cmp(&a.trigger_time)
                .then_with(|| a.id.cmp(&b.id))
        });

        for action in due {
            self.execute(&action.id).await?;
        }
        Ok(())
    }

    /// Execute one action. Returns false if it was already claimed, disabled,
    /// or missing.
    pub async fn execute(&self, action_id: &str) -> Result<bool, StoreError> {
        // Claim before side effects; the loser of a concurrent race does
        // nothing.
        if !self.store.mark_action_executed(action_id).await? {
            return Ok(false);
        }
        let Some(action) = self.store.get_action(action_id).await? else {
            return Ok(false);
        };

        if matches!(action.kind, ActionKind::Message | ActionKind::Both) {
            if let Some(text) = &action.message {
                self.messages
                    .send(MessageDraft {
                        text: text.clone(),
                        color: action.color.clone(),
                        flash: action.flash,
                        timer_id: Some(action.timer_id.clone()),
                    })
                    .await?;
            }
        }

        if matches!(action.kind, ActionKind::Color | ActionKind::Both) {
            if let Some(color) = &action.color {
                self.bus.publish(ServerEvent::ColorChange {
                    timer_id: action.timer_id.clone(),
                    color: color.clone(),
                });
            }
        }

        tracing::info!(
            action = %action.id,
            timer = %action.timer_id,
            trigger_ms = action.trigger_time,
            "action executed"
        );
        self.bus.publish(ServerEvent::ActionExecuted {
            action_id: action.id.clone(),
            timer_id: action.timer_id.clone(),
            action_type: action.kind,
            message: action.message.clone(),
            color: action.color.clone(),
            flash: action.flash,
            timestamp: self.time.now_ms(),
        });
        Ok(true)
    }

    /// Re-arm every action of the timer for a new run.
    pub async fn reset_all(&self, timer_id: &str) -> Result<(), StoreError> {
        self.store.clear_executed(timer_id).await
    }
}
