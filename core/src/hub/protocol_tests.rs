//! Wire-format tests
//!
//! The tag strings and camelCase field names are what deployed display
//! clients parse; these tests pin them down.

use serde_json::{Value, json};

use super::protocol::{ClientCommand, Role, ServerEvent};
use crate::timer::{TimerDraft, TimerMode, TimerSettings, TimerState, TimerType};

fn sample_timer() -> TimerSettings {
    TimerSettings {
        id: "timer_1".to_string(),
        title: "Main stage".to_string(),
        kind: TimerType::Countdown,
        duration_ms: 300_000,
        start_time: Some(1_000_000),
        end_time: Some(1_300_000),
        paused_at: None,
        elapsed_time: 0,
        state: TimerState::Running,
        mode: TimerMode::Normal,
        show_seconds: true,
        play_sound: false,
        color: "#3b82f6".to_string(),
        overtime_color: "#ef4444".to_string(),
        message: None,
    }
}

#[test]
fn timer_update_wire_shape() {
    let event = ServerEvent::TimerUpdate {
        timer: sample_timer(),
    };
    let value = serde_json::to_value(&event).unwrap();

    assert_eq!(value["type"], "timer:update");
    let timer = &value["timer"];
    assert_eq!(timer["type"], "countdown");
    assert_eq!(timer["duration"], 300_000);
    assert_eq!(timer["startTime"], 1_000_000);
    assert_eq!(timer["endTime"], 1_300_000);
    assert_eq!(timer["state"], "running");
    assert_eq!(timer["mode"], "normal");
    assert_eq!(timer["showSeconds"], true);
    assert_eq!(timer["overtimeColor"], "#ef4444");
}

#[test]
fn timer_delete_uses_camel_case_id() {
    let event = ServerEvent::TimerDelete {
        timer_id: "timer_1".to_string(),
    };
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["type"], "timer:delete");
    assert_eq!(value["timerId"], "timer_1");
}

#[test]
fn action_executed_wire_shape() {
    let event = ServerEvent::ActionExecuted {
        action_id: "action_1".to_string(),
        timer_id: "timer_1".to_string(),
        action_type: crate::actions::ActionKind::Both,
        message: Some("1 minute!".to_string()),
        color: Some("#ef4444".to_string()),
        flash: true,
        timestamp: 1_240_000,
    };
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["type"], "timer:action:executed");
    assert_eq!(value["actionId"], "action_1");
    assert_eq!(value["actionType"], "both");
    assert_eq!(value["flash"], true);
    assert_eq!(value["timestamp"], 1_240_000);
}

#[test]
fn commands_parse_from_tagged_json() {
    let command: ClientCommand =
        serde_json::from_value(json!({ "type": "timer:start", "timerId": "timer_1" })).unwrap();
    assert_eq!(
        command,
        ClientCommand::TimerStart {
            timer_id: "timer_1".to_string()
        }
    );

    // Create settings ride flattened next to the tag
    let command: ClientCommand = serde_json::from_value(json!({
        "type": "timer:create",
        "title": "Doors",
        "duration": 60_000
    }))
    .unwrap();
    let ClientCommand::TimerCreate { settings } = command else {
        panic!("expected create");
    };
    assert_eq!(settings.title.as_deref(), Some("Doors"));
    assert_eq!(settings.duration_ms, Some(60_000));

    let command: ClientCommand = serde_json::from_value(json!({
        "type": "message:send",
        "text": "doors open",
        "flash": true
    }))
    .unwrap();
    assert_eq!(
        command,
        ClientCommand::MessageSend {
            text: "doors open".to_string(),
            color: None,
            flash: Some(true),
            timer_id: None,
        }
    );

    let command: ClientCommand =
        serde_json::from_value(json!({ "type": "timer:get-current" })).unwrap();
    assert_eq!(command, ClientCommand::TimerGetCurrent);
}

#[test]
fn malformed_commands_are_rejected_at_the_boundary() {
    assert!(serde_json::from_value::<ClientCommand>(json!({ "type": "timer:start" })).is_err());
    assert!(serde_json::from_value::<ClientCommand>(json!({ "type": "unknown:event" })).is_err());
    assert!(serde_json::from_value::<ClientCommand>(json!({ "no": "tag" })).is_err());
}

#[test]
fn roles_serialize_lowercase() {
    assert_eq!(serde_json::to_value(Role::Viewer).unwrap(), Value::from("viewer"));
    assert_eq!(serde_json::to_value(Role::Staff).unwrap(), Value::from("staff"));
    assert_eq!(serde_json::to_value(Role::Admin).unwrap(), Value::from("admin"));
    assert!(!Role::Viewer.is_operator());
    assert!(Role::Staff.is_operator());
    assert!(Role::Admin.is_operator());
}

#[test]
fn operator_gate_covers_every_mutating_command() {
    let mutating = [
        ClientCommand::TimerCreate {
            settings: TimerDraft::default(),
        },
        ClientCommand::TimerStart {
            timer_id: String::new(),
        },
        ClientCommand::TimerPause {
            timer_id: String::new(),
        },
        ClientCommand::TimerReset {
            timer_id: String::new(),
        },
        ClientCommand::TimerSelect {
            timer_id: String::new(),
        },
        ClientCommand::TimerDelete {
            timer_id: String::new(),
        },
        ClientCommand::MessageSend {
            text: String::new(),
            color: None,
            flash: None,
            timer_id: None,
        },
        ClientCommand::MessageDelete {
            message_id: String::new(),
        },
        ClientCommand::StatusSet {
            status: String::new(),
        },
        ClientCommand::VisitorIncrement { increment: None },
        ClientCommand::VisitorReset,
    ];
    for command in mutating {
        assert!(command.requires_operator(), "{} must be gated", command.name());
    }

    for command in [
        ClientCommand::Join,
        ClientCommand::TimerGetCurrent,
        ClientCommand::TimerGetList,
        ClientCommand::MessageGetAll,
    ] {
        assert!(!command.requires_operator(), "{} must stay open", command.name());
    }
}
