//! Client sessions

use tokio::sync::mpsc;

use super::protocol::{Role, ServerEvent};

/// Opaque handle identifying one connected client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Server-side record of a connected client.
#[derive(Debug)]
pub(super) struct ClientSession {
    pub role: Role,
    pub tx: mpsc::UnboundedSender<ServerEvent>,
}
