//! Wire protocol
//!
//! Closed, tagged unions for everything that crosses the client boundary.
//! Payload shapes are validated by serde at the edge instead of trusting
//! duck-typed objects; tag strings and camelCase field names match what the
//! display clients already speak.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actions::{ActionKind, TimerAction};
use crate::messages::TimerMessage;
use crate::store::StoreError;
use crate::timer::{EngineError, TimerDraft, TimerSettings};

/// Role a session connects with. Supplied by the external auth layer and
/// fixed for the lifetime of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Viewer,
    Staff,
    Admin,
}

impl Role {
    /// Staff and admins may issue mutating commands.
    pub fn is_operator(self) -> bool {
        matches!(self, Role::Staff | Role::Admin)
    }
}

/// Full current state sent to a client the moment it connects, so joining
/// late never requires replaying events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub status: String,
    pub visitors: u32,
    /// Server clock at snapshot time, for client-side offset correction
    pub server_time: i64,
    /// The current timer, if one is selected
    pub timer: Option<TimerSettings>,
    /// Recent messages, most recent first
    pub messages: Vec<TimerMessage>,
}

/// Events broadcast from the server to connected clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    #[serde(rename = "state")]
    Snapshot(Snapshot),

    #[serde(rename = "timer:update")]
    TimerUpdate { timer: TimerSettings },

    #[serde(rename = "timer:delete")]
    TimerDelete { timer_id: String },

    /// Presentation-only color override fired by a color action
    #[serde(rename = "timer:color:change")]
    ColorChange { timer_id: String, color: String },

    #[serde(rename = "timer:action:create")]
    ActionCreate { action: TimerAction },

    #[serde(rename = "timer:action:update")]
    ActionUpdate { action: TimerAction },

    #[serde(rename = "timer:action:delete")]
    ActionDelete { action_id: String },

    #[serde(rename = "timer:action:executed")]
    ActionExecuted {
        action_id: String,
        timer_id: String,
        action_type: ActionKind,
        message: Option<String>,
        color: Option<String>,
        flash: bool,
        timestamp: i64,
    },

    #[serde(rename = "message:new")]
    MessageNew { message: TimerMessage },

    #[serde(rename = "message:delete")]
    MessageDelete { message_id: String },

    #[serde(rename = "status:update")]
    StatusUpdate { status: String },

    #[serde(rename = "count:update")]
    CountUpdate { visitors: u32 },
}

/// Commands clients send to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ClientCommand {
    /// Re-announce after connect; idempotent, never duplicates a session
    #[serde(rename = "join")]
    Join,

    #[serde(rename = "timer:create")]
    TimerCreate {
        #[serde(flatten)]
        settings: TimerDraft,
    },

    #[serde(rename = "timer:start")]
    TimerStart { timer_id: String },

    #[serde(rename = "timer:pause")]
    TimerPause { timer_id: String },

    #[serde(rename = "timer:reset")]
    TimerReset { timer_id: String },

    #[serde(rename = "timer:select")]
    TimerSelect { timer_id: String },

    #[serde(rename = "timer:delete")]
    TimerDelete { timer_id: String },

    #[serde(rename = "timer:get-current")]
    TimerGetCurrent,

    #[serde(rename = "timer:get-list")]
    TimerGetList,

    #[serde(rename = "message:send")]
    MessageSend {
        text: String,
        color: Option<String>,
        flash: Option<bool>,
        timer_id: Option<String>,
    },

    #[serde(rename = "message:delete")]
    MessageDelete { message_id: String },

    #[serde(rename = "message:getAll")]
    MessageGetAll,

    #[serde(rename = "status:update")]
    StatusSet { status: String },

    #[serde(rename = "visitor:increment")]
    VisitorIncrement { increment: Option<u32> },

    #[serde(rename = "visitor:reset")]
    VisitorReset,
}

impl ClientCommand {
    /// Read-only commands are open to every role; everything else requires
    /// an operator.
    pub fn requires_operator(&self) -> bool {
        !matches!(
            self,
            ClientCommand::Join
                | ClientCommand::TimerGetCurrent
                | ClientCommand::TimerGetList
                | ClientCommand::MessageGetAll
        )
    }

    /// Command tag for logging.
    pub fn name(&self) -> &'static str {
        match self {
            ClientCommand::Join => "join",
            ClientCommand::TimerCreate { .. } => "timer:create",
            ClientCommand::TimerStart { .. } => "timer:start",
            ClientCommand::TimerPause { .. } => "timer:pause",
            ClientCommand::TimerReset { .. } => "timer:reset",
            ClientCommand::TimerSelect { .. } => "timer:select",
            ClientCommand::TimerDelete { .. } => "timer:delete",
            ClientCommand::TimerGetCurrent => "timer:get-current",
            ClientCommand::TimerGetList => "timer:get-list",
            ClientCommand::MessageSend { .. } => "message:send",
            ClientCommand::MessageDelete { .. } => "message:delete",
            ClientCommand::MessageGetAll => "message:getAll",
            ClientCommand::StatusSet { .. } => "status:update",
            ClientCommand::VisitorIncrement { .. } => "visitor:increment",
            ClientCommand::VisitorReset => "visitor:reset",
        }
    }
}

/// Acknowledgement returned to the issuing client.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandReply {
    Ack,
    Timer(TimerSettings),
    Timers(Vec<TimerSettings>),
    CurrentTimer(Option<TimerSettings>),
    Message(TimerMessage),
    Messages(Vec<TimerMessage>),
    Visitors(u32),
}

/// Failures surfaced to the issuing client only; never broadcast.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("not found")]
    NotFound,

    #[error("operation not valid in the current state")]
    InvalidState,

    #[error("unknown session")]
    UnknownSession,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<EngineError> for CommandError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotFound => CommandError::NotFound,
            EngineError::InvalidState => CommandError::InvalidState,
            EngineError::Store(e) => CommandError::Store(e),
        }
    }
}
