//! REPL command handlers
//!
//! Each handler drives the hub through the same command path a remote client
//! would use; only action CRUD goes through the scheduler directly, since it
//! has no client command.

use std::io::Write;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;

use cuelight_core::{
    ActionDraft, ActionKind, ClientCommand, CommandReply, TimerDraft, TimerType, format_ms,
};

use crate::CliContext;

fn parse_kind(value: &str) -> Result<TimerType, String> {
    match value {
        "countdown" => Ok(TimerType::Countdown),
        "countup" => Ok(TimerType::Countup),
        "clock" => Ok(TimerType::Clock),
        other => Err(format!(
            "error: unknown timer type '{other}' (countdown, countup, clock)\n"
        )),
    }
}

fn parse_action_kind(value: &str) -> Result<ActionKind, String> {
    match value {
        "message" => Ok(ActionKind::Message),
        "color" => Ok(ActionKind::Color),
        "both" => Ok(ActionKind::Both),
        other => Err(format!(
            "error: unknown action type '{other}' (message, color, both)\n"
        )),
    }
}

async fn send(ctx: &CliContext, command: ClientCommand) -> Result<CommandReply, String> {
    ctx.hub
        .handle_command(ctx.session, command)
        .await
        .map_err(|e| format!("error: {e}\n"))
}

pub async fn create_timer(
    ctx: &CliContext,
    title: Option<String>,
    duration_secs: Option<u64>,
    kind: Option<String>,
) -> Result<bool, String> {
    let kind = kind.as_deref().map(parse_kind).transpose()?;
    let reply = send(
        ctx,
        ClientCommand::TimerCreate {
            settings: TimerDraft {
                title,
                kind,
                duration_ms: duration_secs.map(|s| (s * 1000) as i64),
                ..TimerDraft::default()
            },
        },
    )
    .await?;

    if let CommandReply::Timer(timer) = reply {
        println!("created {} ({})", timer.id, timer.title);
    }
    Ok(false)
}

pub async fn list_timers(ctx: &CliContext) -> Result<bool, String> {
    let reply = send(ctx, ClientCommand::TimerGetList).await?;
    let CommandReply::Timers(timers) = reply else {
        return Ok(false);
    };
    if timers.is_empty() {
        println!("no timers");
        return Ok(false);
    }

    let now = Utc::now().timestamp_millis();
    let current = match send(ctx, ClientCommand::TimerGetCurrent).await? {
        CommandReply::CurrentTimer(timer) => timer.map(|t| t.id),
        _ => None,
    };
    for timer in timers {
        let marker = if current.as_deref() == Some(&timer.id) {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {}  {:?}/{:?}  {}  remaining {}",
            timer.id,
            timer.state,
            timer.mode,
            timer.title,
            format_ms(timer.remaining_ms(now), false, true),
        );
    }
    Ok(false)
}

pub async fn select_timer(ctx: &CliContext, timer_id: &str) -> Result<bool, String> {
    send(
        ctx,
        ClientCommand::TimerSelect {
            timer_id: timer_id.to_string(),
        },
    )
    .await?;
    println!("selected {timer_id}");
    Ok(false)
}

pub async fn start_timer(ctx: &CliContext, timer_id: &str) -> Result<bool, String> {
    send(
        ctx,
        ClientCommand::TimerStart {
            timer_id: timer_id.to_string(),
        },
    )
    .await?;
    println!("started {timer_id}");
    Ok(false)
}

pub async fn pause_timer(ctx: &CliContext, timer_id: &str) -> Result<bool, String> {
    let reply = send(
        ctx,
        ClientCommand::TimerPause {
            timer_id: timer_id.to_string(),
        },
    )
    .await?;
    if let CommandReply::Timer(timer) = reply {
        println!(
            "paused {timer_id} at {}",
            format_ms(timer.elapsed_time, false, true)
        );
    }
    Ok(false)
}

pub async fn reset_timer(ctx: &CliContext, timer_id: &str) -> Result<bool, String> {
    send(
        ctx,
        ClientCommand::TimerReset {
            timer_id: timer_id.to_string(),
        },
    )
    .await?;
    println!("reset {timer_id}");
    Ok(false)
}

pub async fn delete_timer(ctx: &CliContext, timer_id: &str) -> Result<bool, String> {
    send(
        ctx,
        ClientCommand::TimerDelete {
            timer_id: timer_id.to_string(),
        },
    )
    .await?;
    println!("deleted {timer_id}");
    Ok(false)
}

pub async fn add_action(
    ctx: &CliContext,
    timer_id: &str,
    trigger_secs: u64,
    kind: Option<String>,
    message: Option<String>,
    color: Option<String>,
    flash: bool,
) -> Result<bool, String> {
    let kind = kind.as_deref().map(parse_action_kind).transpose()?;
    let action = ctx
        .hub
        .scheduler()
        .create(ActionDraft {
            timer_id: timer_id.to_string(),
            trigger_time: Some((trigger_secs * 1000) as i64),
            kind,
            message,
            color,
            flash,
            enabled: None,
        })
        .await
        .map_err(|e| format!("error: {e}\n"))?;
    println!(
        "added {} at {} remaining",
        action.id,
        format_ms(action.trigger_time, false, true)
    );
    Ok(false)
}

pub async fn list_actions(ctx: &CliContext, timer_id: &str) -> Result<bool, String> {
    let actions = ctx
        .hub
        .scheduler()
        .actions_for_timer(timer_id)
        .await
        .map_err(|e| format!("error: {e}\n"))?;
    if actions.is_empty() {
        println!("no actions for {timer_id}");
        return Ok(false);
    }
    for action in actions {
        println!(
            "{}  at {}  {:?}  executed={} enabled={}  {}",
            action.id,
            format_ms(action.trigger_time, false, true),
            action.kind,
            action.executed,
            action.enabled,
            action.message.as_deref().unwrap_or("-"),
        );
    }
    Ok(false)
}

pub async fn send_message(
    ctx: &CliContext,
    text: String,
    color: Option<String>,
    flash: bool,
    timer_id: Option<String>,
) -> Result<bool, String> {
    let reply = send(
        ctx,
        ClientCommand::MessageSend {
            text,
            color,
            flash: Some(flash),
            timer_id,
        },
    )
    .await?;
    if let CommandReply::Message(message) = reply {
        println!("sent {}", message.id);
    }
    Ok(false)
}

pub async fn list_messages(ctx: &CliContext) -> Result<bool, String> {
    let reply = send(ctx, ClientCommand::MessageGetAll).await?;
    let CommandReply::Messages(messages) = reply else {
        return Ok(false);
    };
    if messages.is_empty() {
        println!("no messages");
        return Ok(false);
    }
    for message in messages {
        println!(
            "{}  {}  {}{}",
            message.id,
            message.text,
            message.color,
            if message.flash { "  (flash)" } else { "" },
        );
    }
    Ok(false)
}

pub async fn set_status(ctx: &CliContext, status: String) -> Result<bool, String> {
    send(ctx, ClientCommand::StatusSet { status: status.clone() }).await?;
    println!("status: {status}");
    Ok(false)
}

pub async fn add_visitors(ctx: &CliContext, count: u32) -> Result<bool, String> {
    let reply = send(
        ctx,
        ClientCommand::VisitorIncrement {
            increment: Some(count),
        },
    )
    .await?;
    if let CommandReply::Visitors(visitors) = reply {
        println!("visitors: {visitors}");
    }
    Ok(false)
}

pub async fn reset_visitors(ctx: &CliContext) -> Result<bool, String> {
    send(ctx, ClientCommand::VisitorReset).await?;
    println!("visitors: 0");
    Ok(false)
}

/// Drain and print broadcasts our session has received since the last call.
pub async fn show_events(ctx: &CliContext) -> Result<bool, String> {
    let mut events = ctx.events.lock().await;
    let mut count = 0;
    while let Ok(event) = events.try_recv() {
        println!("{event:?}");
        count += 1;
    }
    if count == 0 {
        println!("no pending events");
    }
    Ok(false)
}

/// Render the current timer at 10 Hz, deriving remaining time client-side
/// the way displays do. The server pushes no ticks.
pub async fn watch(ctx: &CliContext, seconds: u64) -> Result<bool, String> {
    let deadline = Instant::now() + Duration::from_secs(seconds);
    while Instant::now() < deadline {
        match send(ctx, ClientCommand::TimerGetCurrent).await? {
            CommandReply::CurrentTimer(Some(timer)) => {
                let now = Utc::now().timestamp_millis();
                print!(
                    "\r{}  {}  {:?}/{:?}      ",
                    timer.title,
                    format_ms(timer.remaining_ms(now), false, timer.show_seconds),
                    timer.state,
                    timer.mode,
                );
            }
            _ => print!("\rno current timer      "),
        }
        std::io::stdout().flush().map_err(|e| e.to_string())?;
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    println!();
    Ok(false)
}

pub async fn show_config(ctx: &CliContext) -> Result<bool, String> {
    println!("{:#?}", ctx.config);
    Ok(false)
}
