//! In-memory reference store
//!
//! Backs the hub in single-process deployments and in tests. Every trait
//! method takes the lock once, so each call is atomic with respect to every
//! other caller.

use async_trait::async_trait;
use hashbrown::HashMap;
use tokio::sync::RwLock;

use super::{StoreError, TimerStore};
use crate::actions::TimerAction;
use crate::config::AppConfig;
use crate::messages::TimerMessage;
use crate::timer::TimerSettings;

#[derive(Debug, Default)]
struct StoreInner {
    timers: HashMap<String, TimerSettings>,
    current_timer_id: Option<String>,
    actions: HashMap<String, TimerAction>,
    messages: HashMap<String, TimerMessage>,
    status: String,
    visitors: u32,
}

#[derive(Debug)]
pub struct MemoryStore {
    inner: RwLock<StoreInner>,
    message_limit: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_config(&AppConfig::default())
    }

    pub fn with_config(config: &AppConfig) -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                status: config.initial_status.clone(),
                ..StoreInner::default()
            }),
            message_limit: config.message_history_limit,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TimerStore for MemoryStore {
    async fn get_timer(&self, id: &str) -> Result<Option<TimerSettings>, StoreError> {
        Ok(self.inner.read().await.timers.get(id).cloned())
    }

    async fn put_timer(&self, timer: TimerSettings) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .timers
            .insert(timer.id.clone(), timer);
        Ok(())
    }

    async fn delete_timer(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.timers.remove(id).is_some())
    }

    async fn list_timers(&self) -> Result<Vec<TimerSettings>, StoreError> {
        let inner = self.inner.read().await;
        let mut timers: Vec<_> = inner.timers.values().cloned().collect();
        timers.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(timers)
    }

    async fn current_timer_id(&self) -> Result<Option<String>, StoreError> {
        Ok(self.inner.read().await.current_timer_id.clone())
    }

    async fn set_current_timer_id(&self, id: Option<String>) -> Result<(), StoreError> {
        self.inner.write().await.current_timer_id = id;
        Ok(())
    }

    async fn get_action(&self, id: &str) -> Result<Option<TimerAction>, StoreError> {
        Ok(self.inner.read().await.actions.get(id).cloned())
    }

    async fn put_action(&self, action: TimerAction) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .actions
            .insert(action.id.clone(), action);
        Ok(())
    }

    async fn delete_action(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.actions.remove(id).is_some())
    }

    async fn actions_for_timer(&self, timer_id: &str) -> Result<Vec<TimerAction>, StoreError> {
        let inner = self.inner.read().await;
        let mut actions: Vec<_> = inner
            .actions
            .values()
            .filter(|a| a.timer_id == timer_id)
            .cloned()
            .collect();
        actions.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(actions)
    }

    async fn list_actions(&self) -> Result<Vec<TimerAction>, StoreError> {
        let inner = self.inner.read().await;
        let mut actions: Vec<_> = inner.actions.values().cloned().collect();
        actions.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(actions)
    }

    async fn mark_action_executed(&self, id: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.actions.get_mut(id) {
            Some(action) if action.enabled && !action.executed => {
                action.executed = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn clear_executed(&self, timer_id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        for action in inner.actions.values_mut() {
            if action.timer_id == timer_id {
                action.executed = false;
            }
        }
        Ok(())
    }

    async fn get_message(&self, id: &str) -> Result<Option<TimerMessage>, StoreError> {
        Ok(self.inner.read().await.messages.get(id).cloned())
    }

    async fn put_message(&self, message: TimerMessage) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.messages.insert(message.id.clone(), message);

        // Cap history, dropping oldest first
        while inner.messages.len() > self.message_limit {
            let oldest = inner
                .messages
                .values()
                .min_by_key(|m| (m.timestamp, m.id.clone()))
                .map(|m| m.id.clone());
            match oldest {
                Some(id) => inner.messages.remove(&id),
                None => break,
            };
        }
        Ok(())
    }

    async fn delete_message(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.messages.remove(id).is_some())
    }

    async fn list_messages(
        &self,
        timer_id: Option<&str>,
    ) -> Result<Vec<TimerMessage>, StoreError> {
        let inner = self.inner.read().await;
        let mut messages: Vec<_> = inner
            .messages
            .values()
            .filter(|m| match timer_id {
                Some(id) => m.timer_id.as_deref() == Some(id),
                None => true,
            })
            .cloned()
            .collect();
        messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
        Ok(messages)
    }

    async fn status(&self) -> Result<String, StoreError> {
        Ok(self.inner.read().await.status.clone())
    }

    async fn set_status(&self, status: String) -> Result<(), StoreError> {
        self.inner.write().await.status = status;
        Ok(())
    }

    async fn visitor_count(&self) -> Result<u32, StoreError> {
        Ok(self.inner.read().await.visitors)
    }

    async fn add_visitors(&self, delta: u32) -> Result<u32, StoreError> {
        let mut inner = self.inner.write().await;
        inner.visitors = inner.visitors.saturating_add(delta);
        Ok(inner.visitors)
    }

    async fn reset_visitors(&self) -> Result<u32, StoreError> {
        let mut inner = self.inner.write().await;
        inner.visitors = 0;
        Ok(0)
    }
}
