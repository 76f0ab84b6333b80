//! Application configuration
//!
//! Loaded/stored through confy in the platform config directory. Fields all
//! carry serde defaults so older config files keep loading after upgrades.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Venue status shown to viewers before staff set one
    #[serde(default = "default_status")]
    pub initial_status: String,

    /// Default title for timers created without one
    #[serde(default = "default_title")]
    pub default_title: String,

    /// Default timer length in milliseconds
    #[serde(default = "default_duration_ms")]
    pub default_duration_ms: i64,

    /// Display color for timers created without one
    #[serde(default = "default_color")]
    pub default_color: String,

    /// Display color once a timer runs past its target
    #[serde(default = "default_overtime_color")]
    pub default_overtime_color: String,

    /// Interval of the background action sweep, in milliseconds
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,

    /// Maximum broadcast messages retained; oldest are dropped first
    #[serde(default = "default_message_history_limit")]
    pub message_history_limit: usize,
}

fn default_status() -> String {
    "preparing".to_string()
}

fn default_title() -> String {
    "Countdown".to_string()
}

fn default_duration_ms() -> i64 {
    5 * 60 * 1000
}

fn default_color() -> String {
    "#3b82f6".to_string()
}

fn default_overtime_color() -> String {
    "#ef4444".to_string()
}

fn default_sweep_interval_ms() -> u64 {
    1000
}

fn default_message_history_limit() -> usize {
    50
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            initial_status: default_status(),
            default_title: default_title(),
            default_duration_ms: default_duration_ms(),
            default_color: default_color(),
            default_overtime_color: default_overtime_color(),
            sweep_interval_ms: default_sweep_interval_ms(),
            message_history_limit: default_message_history_limit(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Self {
        confy::load("cuelight", None).unwrap_or_default()
    }

    pub fn save(self) {
        confy::store("cuelight", None, self).expect("Failed to save configuration");
    }
}
