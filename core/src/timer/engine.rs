//! Timer state machine
//!
//! All transitions are read-modify-write through the store; the engine keeps
//! no state of its own. Every successful mutation persists, re-checks
//! scheduled actions for running countdown timers, and publishes exactly one
//! event on the bus.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use super::{TimerDraft, TimerMode, TimerSettings, TimerState, TimerType};
use crate::actions::ActionScheduler;
use crate::bus::EventBus;
use crate::clock::TimeSource;
use crate::config::AppConfig;
use crate::hub::ServerEvent;
use crate::store::{StoreError, TimerStore};

/// Domain failures of timer operations. Expected races (two staff clicking
/// at once) surface as values, not panics.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("timer not found")]
    NotFound,

    #[error("operation not valid in the timer's current state")]
    InvalidState,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct TimerEngine {
    store: Arc<dyn TimerStore>,
    time: Arc<dyn TimeSource>,
    bus: EventBus,
    scheduler: ActionScheduler,
    config: AppConfig,
    // Suffix keeping ids unique when several timers are created in the same ms
    id_seq: Arc<AtomicU64>,
}

impl TimerEngine {
    pub fn new(
        store: Arc<dyn TimerStore>,
        time: Arc<dyn TimeSource>,
        bus: EventBus,
        scheduler: ActionScheduler,
        config: AppConfig,
    ) -> Self {
        Self {
            store,
            time,
            bus,
            scheduler,
            config,
            id_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    // ─── Operations ─────────────────────────────────────────────────────────

    /// Create an idle timer, applying configured defaults for missing fields.
    /// Does not select it as current.
    pub async fn create(&self, draft: TimerDraft) -> Result<TimerSettings, EngineError> {
        let now = self.time.now_ms();
        let seq = self.id_seq.fetch_add(1, Ordering::Relaxed);
        let timer = TimerSettings {
            id: draft.id.unwrap_or_else(|| format!("timer_{now}_{seq}")),
            title: draft
                .title
                .unwrap_or_else(|| self.config.default_title.clone()),
            kind: draft.kind.unwrap_or(TimerType::Countdown),
            duration_ms: draft.duration_ms.unwrap_or(self.config.default_duration_ms),
            start_time: None,
            end_time: None,
            paused_at: None,
            elapsed_time: 0,
            state: TimerState::Idle,
            mode: TimerMode::Normal,
            show_seconds: draft.show_seconds.unwrap_or(true),
            play_sound: draft.play_sound.unwrap_or(false),
            color: draft
                .color
                .unwrap_or_else(|| self.config.default_color.clone()),
            overtime_color: draft
                .overtime_color
                .unwrap_or_else(|| self.config.default_overtime_color.clone()),
            message: draft.message,
        };
        self.store.put_timer(timer.clone()).await?;
        tracing::info!(timer = %timer.id, title = %timer.title, "timer created");
        self.bus.publish(ServerEvent::TimerUpdate {
            timer: timer.clone(),
        });
        Ok(timer)
    }

    /// Start or resume a timer.
    ///
    /// Resuming from pause rebuilds the wall-clock window from the captured
    /// progress; a fresh start also re-arms the timer's actions.
    pub async fn start(&self, timer_id: &str) -> Result<TimerSettings, EngineError> {
        let mut timer = self
            .store
            .get_timer(timer_id)
            .await?
            .ok_or(EngineError::NotFound)?;
        let now = self.time.now_ms();

        match timer.state {
            TimerState::Paused => {
                let start = now - timer.elapsed_time;
                timer.start_time = Some(start);
                timer.end_time = Some(start + timer.duration_ms);
            }
            TimerState::Completed => return Err(EngineError::InvalidState),
            TimerState::Idle | TimerState::Running => {
                timer.start_time = Some(now);
                timer.end_time = Some(now + timer.duration_ms);
                timer.elapsed_time = 0;
                self.scheduler.reset_all(timer_id).await?;
            }
        }

        timer.state = TimerState::Running;
        timer.mode = TimerMode::Normal;
        timer.paused_at = None;
        tracing::info!(timer = %timer.id, "timer started");
        self.save(timer).await
    }

    /// Pause a running timer, capturing its progress.
    pub async fn pause(&self, timer_id: &str) -> Result<TimerSettings, EngineError> {
        let mut timer = self
            .store
            .get_timer(timer_id)
            .await?
            .ok_or(EngineError::NotFound)?;
        if timer.state != TimerState::Running {
            return Err(EngineError::InvalidState);
        }

        let now = self.time.now_ms();
        timer.elapsed_time = now - timer.start_time.unwrap_or(now);
        timer.paused_at = Some(now);
        timer.state = TimerState::Paused;
        tracing::info!(timer = %timer.id, elapsed_ms = timer.elapsed_time, "timer paused");
        self.save(timer).await
    }

    /// Return a timer to idle, clearing progress and re-arming its actions.
    /// Duration is untouched. Resetting an idle timer is a no-op that returns
    /// the same idle state.
    pub async fn reset(&self, timer_id: &str) -> Result<TimerSettings, EngineError> {
        let mut timer = self
            .store
            .get_timer(timer_id)
            .await?
            .ok_or(EngineError::NotFound)?;

        timer.start_time = None;
        timer.end_time = None;
        timer.paused_at = None;
        timer.elapsed_time = 0;
        timer.state = TimerState::Idle;
        timer.mode = TimerMode::Normal;
        self.scheduler.reset_all(timer_id).await?;
        tracing::info!(timer = %timer.id, "timer reset");
        self.save(timer).await
    }

    /// Make a timer the one large displays render.
    pub async fn select(&self, timer_id: &str) -> Result<TimerSettings, EngineError> {
        let timer = self
            .store
            .get_timer(timer_id)
            .await?
            .ok_or(EngineError::NotFound)?;
        self.store
            .set_current_timer_id(Some(timer_id.to_string()))
            .await?;
        tracing::info!(timer = %timer.id, "timer selected");
        self.bus.publish(ServerEvent::TimerUpdate {
            timer: timer.clone(),
        });
        Ok(timer)
    }

    /// Delete a timer. Clears the current pointer if it pointed here; clients
    /// get a distinct delete event so they remove rather than patch.
    pub async fn delete(&self, timer_id: &str) -> Result<(), EngineError> {
        if !self.store.delete_timer(timer_id).await? {
            return Err(EngineError::NotFound);
        }
        if self.store.current_timer_id().await?.as_deref() == Some(timer_id) {
            self.store.set_current_timer_id(None).await?;
        }
        tracing::info!(timer = %timer_id, "timer deleted");
        self.bus.publish(ServerEvent::TimerDelete {
            timer_id: timer_id.to_string(),
        });
        Ok(())
    }

    // ─── Reads ──────────────────────────────────────────────────────────────

    pub async fn get(&self, timer_id: &str) -> Result<Option<TimerSettings>, StoreError> {
        self.store.get_timer(timer_id).await
    }

    /// The currently selected timer, if the pointer is set and still valid.
    pub async fn current(&self) -> Result<Option<TimerSettings>, StoreError> {
        match self.store.current_timer_id().await? {
            Some(id) => self.store.get_timer(&id).await,
            None => Ok(None),
        }
    }

    pub async fn list(&self) -> Result<Vec<TimerSettings>, StoreError> {
        self.store.list_timers().await
    }

    // ─── Persistence ────────────────────────────────────────────────────────

    /// Persist a timer, refresh its informational mode flag, drive the action
    /// check for running countdowns, and publish the update.
    async fn save(&self, mut timer: TimerSettings) -> Result<TimerSettings, EngineError> {
        let now = self.time.now_ms();
        timer.mode = if timer.is_overtime(now) {
            TimerMode::Overtime
        } else {
            TimerMode::Normal
        };
        self.store.put_timer(timer.clone()).await?;

        if timer.kind == TimerType::Countdown && timer.state == TimerState::Running {
            self.scheduler
                .check_and_execute(&timer.id, timer.remaining_ms(now))
                .await?;
        }

        self.bus.publish(ServerEvent::TimerUpdate {
            timer: timer.clone(),
        });
        Ok(timer)
    }

    /// Periodic sweep entry point for one timer: fire due actions and flip
    /// the overtime flag when the target has been exhausted. Remaining time
    /// is re-read fresh each call, so racing an explicit transition can only
    /// delay a firing by one tick, never duplicate it.
    pub async fn tick(&self, timer_id: &str) -> Result<(), EngineError> {
        let Some(timer) = self.store.get_timer(timer_id).await? else {
            return Ok(());
        };
        if timer.state != TimerState::Running {
            return Ok(());
        }
        let now = self.time.now_ms();

        if timer.kind == TimerType::Countdown {
            self.scheduler
                .check_and_execute(&timer.id, timer.remaining_ms(now))
                .await?;
        }

        if timer.is_overtime(now) && timer.mode != TimerMode::Overtime {
            self.save(timer).await?;
        }
        Ok(())
    }
}
