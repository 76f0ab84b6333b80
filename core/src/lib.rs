pub mod actions;
pub mod bus;
pub mod clock;
pub mod config;
pub mod hub;
pub mod messages;
pub mod store;
pub mod timer;

// Re-exports for convenience
pub use actions::{ActionDraft, ActionKind, ActionScheduler, TimerAction};
pub use bus::{EventBus, Topic};
pub use clock::{ManualTimeSource, SystemTimeSource, TimeSource};
pub use config::AppConfig;
pub use hub::{
    BroadcastHub, ClientCommand, CommandError, CommandReply, Role, ServerEvent, SessionId,
    Snapshot, spawn_action_sweep,
};
pub use messages::{MessageChannel, MessageDraft, TimerMessage};
pub use store::{MemoryStore, StoreError, TimerStore};
pub use timer::{
    EngineError, TimerDraft, TimerEngine, TimerMode, TimerSettings, TimerState, TimerType,
    format_ms,
};
