//! Scheduled timer actions
//!
//! An action is a one-shot side effect bound to a remaining-time threshold of
//! one timer: "at 60 seconds left, send a message / flip the color". The
//! scheduler fires each due action at most once per run of its timer.

mod scheduler;

#[cfg(test)]
mod scheduler_tests;

pub use scheduler::ActionScheduler;

use serde::{Deserialize, Serialize};

/// Side effect an action performs when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Message,
    Color,
    Both,
}

/// A scheduled side effect bound to one timer.
///
/// Thresholds are expressed in remaining time rather than elapsed time: that
/// is how operators think ("2 minutes left, flash red"), and it stays correct
/// if the timer's duration is edited between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerAction {
    pub id: String,

    /// Owning timer
    pub timer_id: String,

    /// Remaining time in milliseconds at which this fires
    pub trigger_time: i64,

    #[serde(rename = "type")]
    pub kind: ActionKind,

    pub message: Option<String>,

    pub color: Option<String>,

    pub flash: bool,

    /// Fired already during the current run
    #[serde(default)]
    pub executed: bool,

    /// Disabled actions never fire
    pub enabled: bool,
}

/// Fields accepted when creating an action; missing ones take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDraft {
    pub timer_id: String,
    pub trigger_time: Option<i64>,
    #[serde(rename = "type")]
    pub kind: Option<ActionKind>,
    pub message: Option<String>,
    pub color: Option<String>,
    #[serde(default)]
    pub flash: bool,
    pub enabled: Option<bool>,
}
