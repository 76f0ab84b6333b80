//! Timer system
//!
//! This module provides:
//! - **Settings**: the shared timer record and its wall-clock-derived math
//! - **Engine**: state transitions (create/start/pause/reset/select/delete)
//!
//! All progress values are derived from epoch timestamps on the record, never
//! from a local counter, so every connected display converges on the same
//! remaining time no matter its refresh cadence.

mod engine;
mod settings;


pub use engine::{EngineError, TimerEngine};
pub use settings::{TimerDraft, TimerMode, TimerSettings, TimerState, TimerType, format_ms};
