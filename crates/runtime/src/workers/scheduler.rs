//! Scheduler worker that owns every live [`CastSession`].
//!
//! Receives commands from [`crate::RuntimeHandle`], advances channeling casts
//! on each tick, and publishes lifecycle events to the EventBus. Commands and
//! ticks are processed one at a time, so hooks never run concurrently.

use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use game_core::{
    AbilityId, AbilityRegistry, AbortReason, ActorStore, CastEnv, CastError, CastSession,
    CastState, DiceSource, GameError, InterruptReason, Messenger, SessionId, SessionInfo, Tick,
    UserId,
};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::directory::ActorDirectory;
use crate::events::{Event, EventBus, SchedulerEvent, SessionEvent, TickReport};
use crate::fanout::MessageHub;

const ALREADY_CASTING: &str = "You are already casting.";
const UNKNOWN_ABILITY: &str = "You don't know how to cast that.";

/// Commands that can be sent to the scheduler worker
pub enum Command {
    /// Start a cast for `source` on `target`.
    BeginCast {
        source: UserId,
        target: UserId,
        ability: AbilityId,
        reply: oneshot::Sender<Result<SessionInfo, CastError>>,
    },
    /// Cancel the live cast of `source`, if any.
    Interrupt {
        source: UserId,
        reason: InterruptReason,
        reply: oneshot::Sender<bool>,
    },
    /// Advance every channeling cast by one tick.
    Tick { reply: oneshot::Sender<TickReport> },
    /// Snapshot of the live cast of `source`.
    QuerySession {
        source: UserId,
        reply: oneshot::Sender<Option<SessionInfo>>,
    },
    /// Snapshots of all live casts, ordered by source.
    LiveSessions {
        reply: oneshot::Sender<Vec<SessionInfo>>,
    },
    /// Abort everything and stop the worker.
    Shutdown { reply: oneshot::Sender<()> },
}

/// Background task that owns cast sessions.
pub struct SchedulerWorker {
    registry: Arc<AbilityRegistry>,
    directory: Arc<ActorDirectory>,
    hub: Arc<MessageHub>,
    dice: Box<dyn DiceSource>,
    sessions: BTreeMap<UserId, CastSession>,
    next_session: u64,
    tick: Tick,
    tick_interval: Option<Duration>,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
}

impl SchedulerWorker {
    pub fn new(
        registry: Arc<AbilityRegistry>,
        directory: Arc<ActorDirectory>,
        hub: Arc<MessageHub>,
        dice: Box<dyn DiceSource>,
        tick_interval: Option<Duration>,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            registry,
            directory,
            hub,
            dice,
            sessions: BTreeMap::new(),
            next_session: 1,
            tick: Tick::ZERO,
            tick_interval,
            command_rx,
            event_bus,
        }
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        info!(
            target: "runtime::scheduler",
            abilities = self.registry.len(),
            tick_ms = self.tick_interval.map(|period| period.as_millis() as u64),
            "scheduler worker started"
        );

        let mut ticker = self.tick_interval.map(|period| {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        loop {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(command) => {
                        if self.handle_command(command).is_break() {
                            break;
                        }
                    }
                    None => {
                        self.abort_all(InterruptReason::Shutdown);
                        break;
                    }
                },
                _ = next_tick(&mut ticker) => {
                    self.advance();
                }
            }
        }

        info!(target: "runtime::scheduler", tick = %self.tick, "scheduler worker stopped");
    }

    fn handle_command(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::BeginCast {
                source,
                target,
                ability,
                reply,
            } => {
                let result = self.begin_cast(source, target, &ability);
                if let Err(err) = &result {
                    log_rejection(source, &ability, err);
                }
                if reply.send(result).is_err() {
                    debug!(target: "runtime::scheduler", "BeginCast reply channel closed (caller dropped)");
                }
            }
            Command::Interrupt {
                source,
                reason,
                reply,
            } => {
                let interrupted = self.interrupt(source, reason);
                if reply.send(interrupted).is_err() {
                    debug!(target: "runtime::scheduler", "Interrupt reply channel closed (caller dropped)");
                }
            }
            Command::Tick { reply } => {
                let report = self.advance();
                if reply.send(report).is_err() {
                    debug!(target: "runtime::scheduler", "Tick reply channel closed (caller dropped)");
                }
            }
            Command::QuerySession { source, reply } => {
                let info = self.sessions.get(&source).map(CastSession::info);
                if reply.send(info).is_err() {
                    debug!(target: "runtime::scheduler", "QuerySession reply channel closed (caller dropped)");
                }
            }
            Command::LiveSessions { reply } => {
                let infos = self.sessions.values().map(CastSession::info).collect();
                if reply.send(infos).is_err() {
                    debug!(target: "runtime::scheduler", "LiveSessions reply channel closed (caller dropped)");
                }
            }
            Command::Shutdown { reply } => {
                self.abort_all(InterruptReason::Shutdown);
                if reply.send(()).is_err() {
                    debug!(target: "runtime::scheduler", "Shutdown reply channel closed (caller dropped)");
                }
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Validates the request, claims the caster's slot and runs `on_initiate`.
    ///
    /// Instant abilities are resolved before this returns.
    fn begin_cast(
        &mut self,
        source: UserId,
        target: UserId,
        ability: &AbilityId,
    ) -> Result<SessionInfo, CastError> {
        let definition = match self.registry.lookup(ability.as_str()) {
            Ok(definition) => definition,
            Err(err) => {
                self.hub.send_to_user(source, UNKNOWN_ABILITY);
                return Err(err);
            }
        };

        self.directory.get_actor(source)?;
        self.directory.get_actor(target)?;

        if let Some(live) = self.sessions.get(&source) {
            self.hub.send_to_user(source, ALREADY_CASTING);
            return Err(CastError::AlreadyCasting {
                actor: source,
                session: live.id(),
            });
        }

        let id = SessionId(self.next_session);
        if let Err(err) = self.directory.set_active_session(source, Some(id)) {
            if matches!(err, CastError::AlreadyCasting { .. }) {
                self.hub.send_to_user(source, ALREADY_CASTING);
            }
            return Err(err);
        }
        self.next_session += 1;

        let mut session = CastSession::new(id, source, target, definition, self.tick);
        debug!(
            target: "runtime::scheduler",
            session = %id,
            %source,
            %target,
            ability = %ability,
            "cast started"
        );
        self.event_bus
            .publish(Event::Session(SessionEvent::Started {
                session: session.info(),
                tick: self.tick,
            }));

        let mut env = CastEnv::new(&*self.directory, &*self.hub, self.dice.as_mut());
        session.initiate(&mut env);

        let info = session.info();
        if session.state().is_terminal() {
            self.finish(session);
        } else {
            self.sessions.insert(source, session);
        }
        Ok(info)
    }

    fn interrupt(&mut self, source: UserId, reason: InterruptReason) -> bool {
        let Some(mut session) = self.sessions.remove(&source) else {
            return false;
        };
        session.interrupt(reason);
        self.finish(session);
        true
    }

    /// One scheduler tick over every live session.
    fn advance(&mut self) -> TickReport {
        self.tick = self.tick.next();
        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };

        let mut finished = Vec::new();
        {
            let mut env = CastEnv::new(&*self.directory, &*self.hub, self.dice.as_mut());
            for (source, session) in self.sessions.iter_mut() {
                match session.tick(&mut env) {
                    CastState::Channeling => {
                        report.channeling += 1;
                        self.event_bus
                            .publish(Event::Session(SessionEvent::Channeled {
                                session: session.id(),
                                source: *source,
                                remaining_ticks: session.remaining_ticks(),
                                tick: self.tick,
                            }));
                    }
                    CastState::Resolved | CastState::Aborted | CastState::Initiated => {
                        finished.push(*source);
                    }
                }
            }
        }

        for source in finished {
            if let Some(session) = self.sessions.remove(&source) {
                match self.finish(session) {
                    CastState::Resolved => report.resolved += 1,
                    _ => report.aborted += 1,
                }
            }
        }

        self.event_bus
            .publish(Event::Scheduler(SchedulerEvent::Ticked(report)));
        report
    }

    fn abort_all(&mut self, reason: InterruptReason) {
        let sessions = std::mem::take(&mut self.sessions);
        for (_, mut session) in sessions {
            session.interrupt(reason);
            self.finish(session);
        }
    }

    /// Releases the caster's slot, logs the outcome and publishes it.
    fn finish(&self, session: CastSession) -> CastState {
        let source = session.source();
        match self.directory.set_active_session(source, None) {
            Ok(()) | Err(CastError::ActorNotFound(_)) => {}
            Err(err) => {
                error!(
                    target: "runtime::scheduler",
                    session = %session.id(),
                    %source,
                    error = %err,
                    "failed to release casting slot"
                );
            }
        }

        let info = session.info();
        let event = match session.abort_reason() {
            None => {
                debug!(
                    target: "runtime::scheduler",
                    session = %info.id,
                    %source,
                    ability = %info.ability,
                    "cast resolved"
                );
                SessionEvent::Resolved {
                    session: info,
                    tick: self.tick,
                }
            }
            Some(reason) => {
                if let AbortReason::HookFailed { phase, message } = reason {
                    warn!(
                        target: "runtime::scheduler",
                        session = %info.id,
                        %source,
                        ability = %info.ability,
                        %phase,
                        error = %message,
                        "ability hook failed"
                    );
                } else {
                    debug!(
                        target: "runtime::scheduler",
                        session = %info.id,
                        %source,
                        ability = %info.ability,
                        %reason,
                        "cast aborted"
                    );
                }
                SessionEvent::Aborted {
                    reason: reason.clone(),
                    session: info,
                    tick: self.tick,
                }
            }
        };

        self.event_bus.publish(Event::Session(event));
        session.state()
    }
}

fn log_rejection(source: UserId, ability: &AbilityId, err: &CastError) {
    let severity = err.severity();
    if severity.is_internal() {
        error!(
            target: "runtime::scheduler",
            %source,
            %ability,
            code = err.error_code(),
            error = %err,
            "cast rejected"
        );
    } else if severity.is_recoverable() {
        debug!(
            target: "runtime::scheduler",
            %source,
            %ability,
            code = err.error_code(),
            "cast rejected"
        );
    } else {
        warn!(
            target: "runtime::scheduler",
            %source,
            %ability,
            code = err.error_code(),
            severity = severity.as_str(),
            error = %err,
            "cast rejected"
        );
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
