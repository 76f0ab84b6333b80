//! Broadcast hub
//!
//! Integration point between client sessions and the domain components:
//! authorizes commands, answers reads, and fans every committed state change
//! out to all connected clients. Sessions receive a full snapshot the moment
//! they connect, so late joiners and reconnects never replay events.

pub mod protocol;

mod session;
mod sweep;

#[cfg(test)]
mod protocol_tests;

pub use protocol::{ClientCommand, CommandError, CommandReply, Role, ServerEvent, Snapshot};
pub use session::SessionId;
pub use sweep::spawn_action_sweep;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use hashbrown::HashMap;
use tokio::sync::{RwLock, broadcast, mpsc};

use crate::actions::ActionScheduler;
use crate::bus::{EventBus, Topic};
use crate::clock::TimeSource;
use crate::config::AppConfig;
use crate::messages::{MessageChannel, MessageDraft};
use crate::store::{StoreError, TimerStore};
use crate::timer::{TimerEngine, TimerState};
use session::ClientSession;

pub struct BroadcastHub {
    engine: TimerEngine,
    scheduler: ActionScheduler,
    messages: MessageChannel,
    store: Arc<dyn TimerStore>,
    time: Arc<dyn TimeSource>,
    bus: EventBus,
    sessions: RwLock<HashMap<SessionId, ClientSession>>,
    next_session: AtomicU64,
}

impl BroadcastHub {
    /// Build the hub and its components over a shared store, and spawn the
    /// per-topic forwarder tasks. Each hub owns its own bus, so multiple
    /// instances (tests, embedded servers) stay fully isolated.
    pub fn new(
        store: Arc<dyn TimerStore>,
        time: Arc<dyn TimeSource>,
        config: AppConfig,
    ) -> Arc<Self> {
        let bus = EventBus::default();
        let messages = MessageChannel::new(store.clone(), time.clone(), bus.clone());
        let scheduler =
            ActionScheduler::new(store.clone(), time.clone(), bus.clone(), messages.clone());
        let engine = TimerEngine::new(
            store.clone(),
            time.clone(),
            bus.clone(),
            scheduler.clone(),
            config,
        );

        let hub = Arc::new(Self {
            engine,
            scheduler,
            messages,
            store,
            time,
            bus,
            sessions: RwLock::new(HashMap::new()),
            next_session: AtomicU64::new(1),
        });
        hub.spawn_forwarders();
        hub
    }

    // ─── Component access ───────────────────────────────────────────────────

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn scheduler(&self) -> &ActionScheduler {
        &self.scheduler
    }

    pub fn messages(&self) -> &MessageChannel {
        &self.messages
    }

    // ─── Connection lifecycle ───────────────────────────────────────────────

    /// Register a client with the role the auth layer validated for it.
    /// The first event on the returned channel is the state snapshot.
    pub async fn connect(
        &self,
        role: Role,
    ) -> Result<(SessionId, mpsc::UnboundedReceiver<ServerEvent>), StoreError> {
        let id = SessionId(self.next_session.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();

        // Register before building the snapshot: anything committed in the
        // gap is superseded by the snapshot that follows it in the queue.
        self.sessions
            .write()
            .await
            .insert(id, ClientSession { role, tx: tx.clone() });

        let snapshot = self.snapshot().await?;
        let _ = tx.send(ServerEvent::Snapshot(snapshot));

        tracing::info!(%id, ?role, "client connected");
        Ok((id, rx))
    }

    /// Idempotent re-announce after connect. Re-subscribes the session; the
    /// authorization role stays the one supplied at connect time.
    pub async fn join(&self, session_id: SessionId) -> bool {
        let known = self.sessions.read().await.contains_key(&session_id);
        if known {
            tracing::debug!(%session_id, "session re-announced");
        }
        known
    }

    pub async fn disconnect(&self, session_id: SessionId) {
        if self.sessions.write().await.remove(&session_id).is_some() {
            tracing::info!(%session_id, "client disconnected");
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Full current state for a (re)connecting client.
    pub async fn snapshot(&self) -> Result<Snapshot, StoreError> {
        let timer = match self.store.current_timer_id().await? {
            Some(id) => self.store.get_timer(&id).await?,
            None => None,
        };
        Ok(Snapshot {
            status: self.store.status().await?,
            visitors: self.store.visitor_count().await?,
            server_time: self.time.now_ms(),
            timer,
            messages: self.store.list_messages(None).await?,
        })
    }

    // ─── Commands ───────────────────────────────────────────────────────────

    /// Authorize and dispatch one client command. Domain failures come back
    /// as typed errors for the caller alone; a failing command never affects
    /// other sessions.
    pub async fn handle_command(
        &self,
        session_id: SessionId,
        command: ClientCommand,
    ) -> Result<CommandReply, CommandError> {
        let role = self
            .sessions
            .read()
            .await
            .get(&session_id)
            .map(|s| s.role)
            .ok_or(CommandError::UnknownSession)?;

        if command.requires_operator() && !role.is_operator() {
            tracing::warn!(%session_id, command = command.name(), "permission denied");
            return Err(CommandError::PermissionDenied);
        }

        let result = self.dispatch(session_id, command).await;
        if let Err(CommandError::Store(err)) = &result {
            tracing::error!(%session_id, error = %err, "store failure while handling command");
        }
        result
    }

    async fn dispatch(
        &self,
        session_id: SessionId,
        command: ClientCommand,
    ) -> Result<CommandReply, CommandError> {
        match command {
            ClientCommand::Join => {
                self.join(session_id).await;
                Ok(CommandReply::Ack)
            }

            ClientCommand::TimerCreate { settings } => {
                Ok(CommandReply::Timer(self.engine.create(settings).await?))
            }
            ClientCommand::TimerStart { timer_id } => {
                Ok(CommandReply::Timer(self.engine.start(&timer_id).await?))
            }
            ClientCommand::TimerPause { timer_id } => {
                Ok(CommandReply::Timer(self.engine.pause(&timer_id).await?))
            }
            ClientCommand::TimerReset { timer_id } => {
                Ok(CommandReply::Timer(self.engine.reset(&timer_id).await?))
            }
            ClientCommand::TimerSelect { timer_id } => {
                Ok(CommandReply::Timer(self.engine.select(&timer_id).await?))
            }
            ClientCommand::TimerDelete { timer_id } => {
                self.engine.delete(&timer_id).await?;
                Ok(CommandReply::Ack)
            }
            ClientCommand::TimerGetCurrent => {
                Ok(CommandReply::CurrentTimer(self.engine.current().await?))
            }
            ClientCommand::TimerGetList => Ok(CommandReply::Timers(self.engine.list().await?)),

            ClientCommand::MessageSend {
                text,
                color,
                flash,
                timer_id,
            } => {
                let message = self
                    .messages
                    .send(MessageDraft {
                        text,
                        color,
                        flash: flash.unwrap_or(false),
                        timer_id,
                    })
                    .await?;
                Ok(CommandReply::Message(message))
            }
            ClientCommand::MessageDelete { message_id } => {
                if self.messages.delete(&message_id).await? {
                    Ok(CommandReply::Ack)
                } else {
                    Err(CommandError::NotFound)
                }
            }
            ClientCommand::MessageGetAll => {
                Ok(CommandReply::Messages(self.messages.get_all(None).await?))
            }

            ClientCommand::StatusSet { status } => {
                self.store.set_status(status.clone()).await?;
                tracing::info!(%status, "status updated");
                self.bus.publish(ServerEvent::StatusUpdate { status });
                Ok(CommandReply::Ack)
            }
            ClientCommand::VisitorIncrement { increment } => {
                let visitors = self
                    .store
                    .add_visitors(increment.unwrap_or(1))
                    .await?;
                self.bus.publish(ServerEvent::CountUpdate { visitors });
                Ok(CommandReply::Visitors(visitors))
            }
            ClientCommand::VisitorReset => {
                let visitors = self.store.reset_visitors().await?;
                self.bus.publish(ServerEvent::CountUpdate { visitors });
                Ok(CommandReply::Visitors(visitors))
            }
        }
    }

    // ─── Fan-out ────────────────────────────────────────────────────────────

    fn spawn_forwarders(self: &Arc<Self>) {
        for topic in Topic::ALL {
            let mut rx = self.bus.subscribe(topic);
            let hub = Arc::downgrade(self);
            tokio::spawn(async move {
                loop {
                    match rx.recv().await {
                        Ok(event) => {
                            let Some(hub) = hub.upgrade() else { break };
                            hub.fan_out(event).await;
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(?topic, skipped, "broadcast forwarder lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            });
        }
    }

    /// Deliver one event to every live session. Senders are collected under
    /// the read lock and the lock released before sending.
    async fn fan_out(&self, event: ServerEvent) {
        let targets: Vec<(SessionId, mpsc::UnboundedSender<ServerEvent>)> = {
            let sessions = self.sessions.read().await;
            sessions
                .iter()
                .map(|(id, s)| (*id, s.tx.clone()))
                .collect()
        };

        let mut dead = Vec::new();
        for (id, tx) in targets {
            if tx.send(event.clone()).is_err() {
                dead.push(id);
            }
        }

        if !dead.is_empty() {
            let mut sessions = self.sessions.write().await;
            for id in dead {
                sessions.remove(&id);
                tracing::debug!(session = %id, "pruned disconnected session");
            }
        }
    }

    // ─── Sweep ──────────────────────────────────────────────────────────────

    /// One pass of the periodic sweep over all running timers. Store faults
    /// are logged and skipped; the sweep must keep running.
    pub async fn sweep_once(&self) {
        let timers = match self.store.list_timers().await {
            Ok(timers) => timers,
            Err(err) => {
                tracing::error!(error = %err, "sweep could not list timers");
                return;
            }
        };
        for timer in timers {
            if timer.state != TimerState::Running {
                continue;
            }
            if let Err(err) = self.engine.tick(&timer.id).await {
                tracing::error!(timer = %timer.id, error = %err, "sweep tick failed");
            }
        }
    }
}
