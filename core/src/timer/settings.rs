//! Timer record and time math
//!
//! A `TimerSettings` is the authoritative state shared by the server and all
//! clients. While running, `end_time = start_time + duration` is the source of
//! truth and remaining/elapsed are recomputed against "now" on every read.
//! While paused, `elapsed_time` carries the progress instead.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Completed,
}

/// What the timer counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerType {
    /// Remaining time decreases toward zero
    Countdown,
    /// Elapsed time increases toward the target
    Countup,
    /// Wall-clock passthrough, duration is ignored
    Clock,
}

/// Display flag mirroring whether the target has been exhausted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    Normal,
    Overtime,
}

/// A named countdown/count-up/clock device
///
/// Field names on the wire are camelCase to match what display clients expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSettings {
    pub id: String,

    pub title: String,

    #[serde(rename = "type")]
    pub kind: TimerType,

    /// Target length in milliseconds; ignored for clock timers
    #[serde(rename = "duration")]
    pub duration_ms: i64,

    // ─── Progress (epoch ms, authoritative while running) ───────────────────
    pub start_time: Option<i64>,

    pub end_time: Option<i64>,

    pub paused_at: Option<i64>,

    /// Progress captured at pause time; authoritative while paused
    #[serde(default)]
    pub elapsed_time: i64,

    // ─── State ──────────────────────────────────────────────────────────────
    pub state: TimerState,

    pub mode: TimerMode,

    // ─── Display ────────────────────────────────────────────────────────────
    pub show_seconds: bool,

    pub play_sound: bool,

    pub color: String,

    pub overtime_color: String,

    pub message: Option<String>,
}

impl TimerSettings {
    /// Remaining time in milliseconds at `now_ms`. Never negative.
    ///
    /// Idle and completed timers report the full duration, paused timers
    /// report duration minus captured progress, running timers derive from
    /// the end timestamp.
    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        if self.kind == TimerType::Clock {
            return 0;
        }
        match self.state {
            TimerState::Idle | TimerState::Completed => self.duration_ms,
            TimerState::Paused => (self.duration_ms - self.elapsed_time).max(0),
            TimerState::Running => match self.end_time {
                Some(end) => (end - now_ms).max(0),
                None => self.duration_ms,
            },
        }
    }

    /// Elapsed time in milliseconds at `now_ms`.
    pub fn elapsed_ms(&self, now_ms: i64) -> i64 {
        match self.state {
            TimerState::Idle | TimerState::Completed => 0,
            TimerState::Paused => self.elapsed_time,
            TimerState::Running => match self.start_time {
                Some(start) => (now_ms - start).max(0),
                None => 0,
            },
        }
    }

    /// Whether the target has been exhausted while still running.
    ///
    /// Countdown: remaining hit zero. Countup: elapsed passed the target.
    /// Clock timers have no target.
    pub fn is_overtime(&self, now_ms: i64) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        match self.kind {
            TimerType::Countdown => self.remaining_ms(now_ms) == 0,
            TimerType::Countup => self.elapsed_ms(now_ms) > self.duration_ms,
            TimerType::Clock => false,
        }
    }

    /// Color the display should use at `now_ms`.
    pub fn display_color(&self, now_ms: i64) -> &str {
        if self.is_overtime(now_ms) {
            &self.overtime_color
        } else {
            &self.color
        }
    }
}

/// Partial settings accepted by the create operation; missing fields take
/// configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerDraft {
    pub id: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<TimerType>,
    #[serde(rename = "duration")]
    pub duration_ms: Option<i64>,
    pub show_seconds: Option<bool>,
    pub play_sound: Option<bool>,
    pub color: Option<String>,
    pub overtime_color: Option<String>,
    pub message: Option<String>,
}

/// Format a millisecond value as `HH:MM:SS` / `MM:SS` for display.
pub fn format_ms(ms: i64, show_hours: bool, show_seconds: bool) -> String {
    let total_seconds = ms.max(0) / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    let mut result = String::new();
    if show_hours || hours > 0 {
        result.push_str(&format!("{hours:02}:"));
    }
    result.push_str(&format!("{minutes:02}"));
    if show_seconds {
        result.push_str(&format!(":{seconds:02}"));
    }
    result
}
