//! Topic-keyed event fan-out
//!
//! In-process pub/sub channel shared by every component that mutates state.
//! Events about the same topic are delivered FIFO; there is no ordering
//! guarantee between topics. Slow subscribers lag and drop oldest events,
//! which is recoverable because any client can re-request a snapshot.

use tokio::sync::broadcast;

use crate::hub::ServerEvent;

/// Logical broadcast topics, mirroring the channels the rest of the system
/// is organized around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Timer,
    Status,
    Visitors,
    Message,
}

impl Topic {
    pub const ALL: [Topic; 4] = [Topic::Timer, Topic::Status, Topic::Visitors, Topic::Message];
}

impl ServerEvent {
    /// Topic an event is published under.
    pub fn topic(&self) -> Topic {
        match self {
            ServerEvent::TimerUpdate { .. }
            | ServerEvent::TimerDelete { .. }
            | ServerEvent::ColorChange { .. }
            | ServerEvent::ActionCreate { .. }
            | ServerEvent::ActionUpdate { .. }
            | ServerEvent::ActionDelete { .. }
            | ServerEvent::ActionExecuted { .. } => Topic::Timer,
            ServerEvent::StatusUpdate { .. } => Topic::Status,
            ServerEvent::CountUpdate { .. } => Topic::Visitors,
            ServerEvent::MessageNew { .. } | ServerEvent::MessageDelete { .. } => Topic::Message,
            // Snapshots are delivered point-to-point on connect and never
            // published; routed with timer traffic if one ever is.
            ServerEvent::Snapshot(_) => Topic::Timer,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventBus {
    timer: broadcast::Sender<ServerEvent>,
    status: broadcast::Sender<ServerEvent>,
    visitors: broadcast::Sender<ServerEvent>,
    message: broadcast::Sender<ServerEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (timer, _) = broadcast::channel(capacity);
        let (status, _) = broadcast::channel(capacity);
        let (visitors, _) = broadcast::channel(capacity);
        let (message, _) = broadcast::channel(capacity);
        Self {
            timer,
            status,
            visitors,
            message,
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<ServerEvent> {
        match topic {
            Topic::Timer => &self.timer,
            Topic::Status => &self.status,
            Topic::Visitors => &self.visitors,
            Topic::Message => &self.message,
        }
    }

    /// Publish an event on its topic. A send with no subscribers is fine.
    pub fn publish(&self, event: ServerEvent) {
        let _ = self.sender(event.topic()).send(event);
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<ServerEvent> {
        self.sender(topic).subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
