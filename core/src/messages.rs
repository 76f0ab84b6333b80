//! Ephemeral broadcast messages
//!
//! Annotations pushed to every viewer (manually by staff, or as the payload
//! of a fired action). Plain CRUD with a broadcast side effect; display
//! policy such as most-recent-wins is a client concern.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::bus::EventBus;
use crate::clock::TimeSource;
use crate::hub::ServerEvent;
use crate::store::{StoreError, TimerStore};

const DEFAULT_MESSAGE_COLOR: &str = "#ffffff";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerMessage {
    pub id: String,
    pub text: String,
    pub color: String,
    pub flash: bool,
    pub timestamp: i64,
    pub timer_id: Option<String>,
}

/// Fields accepted by `send`; id and timestamp are assigned server-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageDraft {
    pub text: String,
    pub color: Option<String>,
    pub flash: bool,
    pub timer_id: Option<String>,
}

#[derive(Clone)]
pub struct MessageChannel {
    store: Arc<dyn TimerStore>,
    time: Arc<dyn TimeSource>,
    bus: EventBus,
    // Suffix keeping ids unique when several messages land in the same ms
    id_seq: Arc<AtomicU64>,
}

impl MessageChannel {
    pub fn new(store: Arc<dyn TimerStore>, time: Arc<dyn TimeSource>, bus: EventBus) -> Self {
        Self {
            store,
            time,
            bus,
            id_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Persist and broadcast a message.
    pub async fn send(&self, draft: MessageDraft) -> Result<TimerMessage, StoreError> {
        let now = self.time.now_ms();
        let seq = self.id_seq.fetch_add(1, Ordering::Relaxed);
        let message = TimerMessage {
            id: format!("msg_{now}_{seq}"),
            text: draft.text,
            color: draft
                .color
                .unwrap_or_else(|| DEFAULT_MESSAGE_COLOR.to_string()),
            flash: draft.flash,
            timestamp: now,
            timer_id: draft.timer_id,
        };
        self.store.put_message(message.clone()).await?;
        tracing::debug!(id = %message.id, "message sent");
        self.bus.publish(ServerEvent::MessageNew {
            message: message.clone(),
        });
        Ok(message)
    }

    /// Remove a message; broadcasts only when something was removed.
    pub async fn delete(&self, message_id: &str) -> Result<bool, StoreError> {
        let removed = self.store.delete_message(message_id).await?;
        if removed {
            self.bus.publish(ServerEvent::MessageDelete {
                message_id: message_id.to_string(),
            });
        }
        Ok(removed)
    }

    /// Messages most-recent-first, optionally scoped to one timer.
    pub async fn get_all(
        &self,
        timer_id: Option<&str>,
    ) -> Result<Vec<TimerMessage>, StoreError> {
        self.store.list_messages(timer_id).await
    }
}
