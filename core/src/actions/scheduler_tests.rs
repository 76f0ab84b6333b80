//! Tests for action scheduling
//!
//! The properties under test: an action fires at most once per timer run, a
//! fresh start re-arms it, disabled actions never fire, and same-pass firing
//! order is descending trigger time.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::{ActionDraft, ActionKind, ActionScheduler};
use crate::bus::{EventBus, Topic};
use crate::clock::ManualTimeSource;
use crate::config::AppConfig;
use crate::hub::ServerEvent;
use crate::messages::MessageChannel;
use crate::store::{MemoryStore, TimerStore};
use crate::timer::{TimerDraft, TimerEngine};

const T0: i64 = 1_000_000;

struct Harness {
    engine: TimerEngine,
    scheduler: ActionScheduler,
    store: Arc<MemoryStore>,
    time: Arc<ManualTimeSource>,
    bus: EventBus,
}

fn harness() -> Harness {
    let time = Arc::new(ManualTimeSource::new(T0));
    let store = Arc::new(MemoryStore::new());
    let bus = EventBus::new(256);
    let messages = MessageChannel::new(store.clone(), time.clone(), bus.clone());
    let scheduler =
        ActionScheduler::new(store.clone(), time.clone(), bus.clone(), messages.clone());
    let engine = TimerEngine::new(
        store.clone(),
        time.clone(),
        bus.clone(),
        scheduler.clone(),
        AppConfig::default(),
    );
    Harness {
        engine,
        scheduler,
        store,
        time,
        bus,
    }
}

fn message_action(timer_id: &str, trigger_time: i64, text: &str) -> ActionDraft {
    ActionDraft {
        timer_id: timer_id.to_string(),
        trigger_time: Some(trigger_time),
        kind: Some(ActionKind::Message),
        message: Some(text.to_string()),
        color: None,
        flash: false,
        enabled: None,
    }
}

fn drain(rx: &mut broadcast::Receiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn message_texts(events: &[ServerEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            ServerEvent::MessageNew { message } => Some(message.text.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn action_fires_exactly_once_across_crossings() {
    let h = harness();
    let action = h
        .scheduler
        .create(message_action("t1", 60_000, "one minute"))
        .await
        .unwrap();

    let mut rx = h.bus.subscribe(Topic::Message);

    // Threshold not reached yet
    h.scheduler.check_and_execute("t1", 70_000).await.unwrap();
    assert!(message_texts(&drain(&mut rx)).is_empty());

    // Crossed: fires once
    h.scheduler.check_and_execute("t1", 50_000).await.unwrap();
    assert_eq!(message_texts(&drain(&mut rx)), vec!["one minute"]);
    assert!(h.scheduler.get(&action.id).await.unwrap().unwrap().executed);

    // Repeated observations past the threshold stay quiet
    h.scheduler.check_and_execute("t1", 40_000).await.unwrap();
    h.scheduler.check_and_execute("t1", 0).await.unwrap();
    assert!(message_texts(&drain(&mut rx)).is_empty());
}

#[tokio::test]
async fn fresh_start_rearms_actions() {
    let h = harness();
    let timer = h
        .engine
        .create(TimerDraft {
            duration_ms: Some(300_000),
            ..TimerDraft::default()
        })
        .await
        .unwrap();
    let action = h
        .scheduler
        .create(message_action(&timer.id, 60_000, "one minute"))
        .await
        .unwrap();

    let mut rx = h.bus.subscribe(Topic::Message);

    h.engine.start(&timer.id).await.unwrap();
    h.time.advance(245_000); // remaining 55s, past the 60s threshold
    h.engine.tick(&timer.id).await.unwrap();
    assert_eq!(message_texts(&drain(&mut rx)).len(), 1);
    assert!(h.scheduler.get(&action.id).await.unwrap().unwrap().executed);

    // Second run: the flag is cleared on the fresh start and fires once more
    h.engine.start(&timer.id).await.unwrap();
    assert!(!h.scheduler.get(&action.id).await.unwrap().unwrap().executed);
    h.time.advance(245_000);
    h.engine.tick(&timer.id).await.unwrap();
    assert_eq!(message_texts(&drain(&mut rx)).len(), 1);
}

#[tokio::test]
async fn disabled_actions_never_fire() {
    let h = harness();
    let action = h
        .scheduler
        .create(ActionDraft {
            enabled: Some(false),
            ..message_action("t1", 60_000, "never")
        })
        .await
        .unwrap();

    let mut rx = h.bus.subscribe(Topic::Message);
    h.scheduler.check_and_execute("t1", 0).await.unwrap();

    assert!(message_texts(&drain(&mut rx)).is_empty());
    assert!(!h.scheduler.get(&action.id).await.unwrap().unwrap().executed);
}

#[tokio::test]
async fn same_pass_fires_in_descending_trigger_order() {
    let h = harness();
    h.scheduler
        .create(message_action("t1", 60_000, "one minute"))
        .await
        .unwrap();
    h.scheduler
        .create(message_action("t1", 120_000, "two minutes"))
        .await
        .unwrap();

    let mut rx = h.bus.subscribe(Topic::Message);
    h.scheduler.check_and_execute("t1", 50_000).await.unwrap();

    // Farthest-from-zero first; the one nearest the end lands last
    assert_eq!(
        message_texts(&drain(&mut rx)),
        vec!["two minutes", "one minute"]
    );
}

#[tokio::test]
async fn color_action_publishes_color_change() {
    let h = harness();
    h.scheduler
        .create(ActionDraft {
            timer_id: "t1".to_string(),
            trigger_time: Some(60_000),
            kind: Some(ActionKind::Color),
            message: None,
            color: Some("#f59e0b".to_string()),
            flash: false,
            enabled: None,
        })
        .await
        .unwrap();

    let mut timer_rx = h.bus.subscribe(Topic::Timer);
    let mut message_rx = h.bus.subscribe(Topic::Message);
    h.scheduler.check_and_execute("t1", 30_000).await.unwrap();

    let timer_events = drain(&mut timer_rx);
    assert!(timer_events.iter().any(|e| matches!(
        e,
        ServerEvent::ColorChange { timer_id, color }
            if timer_id == "t1" && color == "#f59e0b"
    )));
    assert!(timer_events.iter().any(|e| matches!(
        e,
        ServerEvent::ActionExecuted { action_type, .. }
            if *action_type == ActionKind::Color
    )));
    // A pure color action sends no message
    assert!(message_texts(&drain(&mut message_rx)).is_empty());
}

#[tokio::test]
async fn both_action_sends_message_and_color() {
    let h = harness();
    h.scheduler
        .create(ActionDraft {
            timer_id: "t1".to_string(),
            trigger_time: Some(60_000),
            kind: Some(ActionKind::Both),
            message: Some("final stretch".to_string()),
            color: Some("#ef4444".to_string()),
            flash: true,
            enabled: None,
        })
        .await
        .unwrap();

    let mut timer_rx = h.bus.subscribe(Topic::Timer);
    let mut message_rx = h.bus.subscribe(Topic::Message);
    h.scheduler.check_and_execute("t1", 10_000).await.unwrap();

    let messages = drain(&mut message_rx);
    assert!(messages.iter().any(|e| matches!(
        e,
        ServerEvent::MessageNew { message }
            if message.text == "final stretch" && message.flash
                && message.timer_id.as_deref() == Some("t1")
    )));
    assert!(drain(&mut timer_rx).iter().any(|e| matches!(
        e,
        ServerEvent::ColorChange { color, .. } if color == "#ef4444"
    )));
}

#[tokio::test]
async fn execute_returns_false_when_claimed_or_missing() {
    let h = harness();
    let action = h
        .scheduler
        .create(message_action("t1", 60_000, "once"))
        .await
        .unwrap();

    assert!(h.scheduler.execute(&action.id).await.unwrap());
    assert!(!h.scheduler.execute(&action.id).await.unwrap());
    assert!(!h.scheduler.execute("missing").await.unwrap());
}

#[tokio::test]
async fn reset_all_only_touches_own_timer() {
    let h = harness();
    let a1 = h
        .scheduler
        .create(message_action("t1", 60_000, "a"))
        .await
        .unwrap();
    let a2 = h
        .scheduler
        .create(message_action("t2", 60_000, "b"))
        .await
        .unwrap();
    h.scheduler.execute(&a1.id).await.unwrap();
    h.scheduler.execute(&a2.id).await.unwrap();

    h.scheduler.reset_all("t1").await.unwrap();
    assert!(!h.scheduler.get(&a1.id).await.unwrap().unwrap().executed);
    assert!(h.scheduler.get(&a2.id).await.unwrap().unwrap().executed);
}

/// The concrete end-to-end scenario: 5 minute countdown, "1 minute!" message
/// action at 60s remaining.
#[tokio::test]
async fn one_minute_warning_fires_exactly_once() {
    let h = harness();
    let timer = h
        .engine
        .create(TimerDraft {
            duration_ms: Some(300_000),
            ..TimerDraft::default()
        })
        .await
        .unwrap();
    let action = h
        .scheduler
        .create(message_action(&timer.id, 60_000, "1 minute!"))
        .await
        .unwrap();

    h.engine.start(&timer.id).await.unwrap();

    let mut rx = h.bus.subscribe(Topic::Message);
    h.time.advance(240_000); // remaining ≈ 60s
    h.engine.tick(&timer.id).await.unwrap();

    let texts = message_texts(&drain(&mut rx));
    assert_eq!(texts, vec!["1 minute!"]);
    assert!(h.scheduler.get(&action.id).await.unwrap().unwrap().executed);

    h.time.advance(1_000); // remaining ≈ 59s
    h.engine.tick(&timer.id).await.unwrap();
    assert!(message_texts(&drain(&mut rx)).is_empty());

    let stored = h.store.list_messages(None).await.unwrap();
    assert_eq!(stored.len(), 1);
}
