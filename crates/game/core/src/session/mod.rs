//! Casting session state machine.
//!
//! One [`CastSession`] tracks one in-progress cast from request to a terminal
//! state. The session is driven from outside (the scheduler calls
//! [`CastSession::initiate`], [`CastSession::tick`] and
//! [`CastSession::interrupt`]) and never spawns or sleeps, so every transition
//! is testable without a clock.
//!
//! ```text
//!            ┌──────── on_initiate = false ────────┐
//!            │                                      ▼
//! Initiated ─┼─ channel_ticks = 0 ──▶ Resolved    Aborted
//!            │                          ▲           ▲
//!            └─▶ Channeling ── ticks ───┘           │
//!                     └───── interrupt / failure ───┘
//! ```
//!
//! Hook failures and panics are caught here and turned into
//! [`CastState::Aborted`]; nothing a script does can unwind into the caller.

mod context;

pub use context::{ActorRef, CastContext, CastEnv};

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::ability::{AbilityDefinition, AbilityScript};
use crate::error::{CastError, HookError, HookResult};
use crate::state::{AbilityId, SessionId, Tick, UserId};

/// Lifecycle state of a cast.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr, strum::EnumIs,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum CastState {
    Initiated,
    Channeling,
    Resolved,
    Aborted,
}

impl CastState {
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Aborted)
    }
}

/// Why the outside world cancelled a cast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum InterruptReason {
    /// Explicit cancel by the caster or an admin.
    Cancelled,
    SourceDied,
    SourceMoved,
    TargetDied,
    TargetMoved,
    Shutdown,
}

/// Hook being invoked when a failure occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum HookPhase {
    Initiate,
    ChannelTick,
    Resolve,
}

/// Why a session ended in [`CastState::Aborted`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AbortReason {
    /// `on_initiate` returned `false`.
    Declined,
    Interrupted(InterruptReason),
    /// Source or target vanished before or during a hook.
    ActorNotFound(UserId),
    /// A hook returned an error or panicked.
    HookFailed { phase: HookPhase, message: String },
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Declined => f.write_str("declined"),
            Self::Interrupted(reason) => write!(f, "interrupted ({reason})"),
            Self::ActorNotFound(id) => write!(f, "actor {id} not found"),
            Self::HookFailed { phase, message } => write!(f, "{phase} hook failed: {message}"),
        }
    }
}

/// Read-only snapshot of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionInfo {
    pub id: SessionId,
    pub source: UserId,
    pub target: UserId,
    pub ability: AbilityId,
    pub state: CastState,
    pub remaining_ticks: u32,
    pub elapsed_ticks: u32,
    pub created_at: Tick,
    pub abort_reason: Option<AbortReason>,
}

/// One in-progress cast.
pub struct CastSession {
    id: SessionId,
    source: UserId,
    target: UserId,
    ability: Arc<AbilityDefinition>,
    state: CastState,
    remaining_ticks: u32,
    elapsed_ticks: u32,
    created_at: Tick,
    abort_reason: Option<AbortReason>,
}

impl CastSession {
    pub fn new(
        id: SessionId,
        source: UserId,
        target: UserId,
        ability: Arc<AbilityDefinition>,
        created_at: Tick,
    ) -> Self {
        let remaining_ticks = ability.channel_ticks();
        Self {
            id,
            source,
            target,
            ability,
            state: CastState::Initiated,
            remaining_ticks,
            elapsed_ticks: 0,
            created_at,
            abort_reason: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn source(&self) -> UserId {
        self.source
    }

    pub fn target(&self) -> UserId {
        self.target
    }

    pub fn ability(&self) -> &Arc<AbilityDefinition> {
        &self.ability
    }

    pub fn state(&self) -> CastState {
        self.state
    }

    pub fn remaining_ticks(&self) -> u32 {
        self.remaining_ticks
    }

    pub fn elapsed_ticks(&self) -> u32 {
        self.elapsed_ticks
    }

    pub fn created_at(&self) -> Tick {
        self.created_at
    }

    pub fn abort_reason(&self) -> Option<&AbortReason> {
        self.abort_reason.as_ref()
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id,
            source: self.source,
            target: self.target,
            ability: self.ability.id().clone(),
            state: self.state,
            remaining_ticks: self.remaining_ticks,
            elapsed_ticks: self.elapsed_ticks,
            created_at: self.created_at,
            abort_reason: self.abort_reason.clone(),
        }
    }

    /// Runs `on_initiate` and moves to the next state.
    ///
    /// Instant abilities resolve within this call. Calling it again after the
    /// first time is a no-op.
    pub fn initiate(&mut self, env: &mut CastEnv<'_>) -> CastState {
        if self.state != CastState::Initiated {
            return self.state;
        }

        match self.run_hook(HookPhase::Initiate, env, |script, cast| script.on_initiate(cast)) {
            Ok(true) if self.remaining_ticks == 0 => self.resolve(env),
            Ok(true) => self.state = CastState::Channeling,
            Ok(false) => self.abort(AbortReason::Declined),
            Err(reason) => self.abort(reason),
        }
        self.state
    }

    /// Advances a channeling session by one scheduler tick.
    ///
    /// While channel ticks remain, one is consumed and `on_channel_tick` runs
    /// (if the script channels). The first tick after the last channel tick
    /// resolves the cast. No-op outside [`CastState::Channeling`].
    pub fn tick(&mut self, env: &mut CastEnv<'_>) -> CastState {
        if self.state != CastState::Channeling {
            return self.state;
        }

        if self.remaining_ticks == 0 {
            self.resolve(env);
            return self.state;
        }

        self.remaining_ticks -= 1;
        self.elapsed_ticks += 1;

        let outcome = if self.ability.script().channels() {
            self.run_hook(HookPhase::ChannelTick, env, |script, cast| {
                script.on_channel_tick(cast)
            })
        } else {
            self.ensure_actors(HookPhase::ChannelTick, env)
        };

        if let Err(reason) = outcome {
            self.abort(reason);
        }
        self.state
    }

    /// Cancels a live session. Returns `false` if it was already terminal.
    pub fn interrupt(&mut self, reason: InterruptReason) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.abort(AbortReason::Interrupted(reason));
        true
    }

    fn resolve(&mut self, env: &mut CastEnv<'_>) {
        match self.run_hook(HookPhase::Resolve, env, |script, cast| script.on_resolve(cast)) {
            Ok(()) => self.state = CastState::Resolved,
            Err(reason) => self.abort(reason),
        }
    }

    fn abort(&mut self, reason: AbortReason) {
        self.state = CastState::Aborted;
        self.abort_reason = Some(reason);
    }

    /// Both participants must exist before any hook runs.
    fn ensure_actors(&self, phase: HookPhase, env: &CastEnv<'_>) -> Result<(), AbortReason> {
        for id in [self.source, self.target] {
            match env.actors.get_actor(id) {
                Ok(_) => {}
                Err(CastError::ActorNotFound(id)) => return Err(AbortReason::ActorNotFound(id)),
                Err(error) => {
                    return Err(AbortReason::HookFailed {
                        phase,
                        message: error.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Invokes one hook inside the session boundary.
    fn run_hook<T>(
        &self,
        phase: HookPhase,
        env: &mut CastEnv<'_>,
        hook: impl FnOnce(&dyn AbilityScript, &mut CastContext<'_>) -> HookResult<T>,
    ) -> Result<T, AbortReason> {
        self.ensure_actors(phase, env)?;

        let ability = Arc::clone(&self.ability);
        let mut cast = CastContext::new(&ability, self.source, self.target, env);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| hook(ability.script(), &mut cast)));

        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(HookError::ActorNotFound(id))) => Err(AbortReason::ActorNotFound(id)),
            Ok(Err(error)) => Err(AbortReason::HookFailed {
                phase,
                message: error.to_string(),
            }),
            Err(payload) => Err(AbortReason::HookFailed {
                phase,
                message: format!("hook panicked: {}", panic_message(&*payload)),
            }),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::dice::ScriptedDice;
    use crate::memory::{InMemoryActors, RecordingMessenger};
    use crate::state::{Actor, ActorName, RoomId};

    const CASTER: UserId = UserId(1);
    const ALLY: UserId = UserId(2);
    const TAVERN: RoomId = RoomId(7);

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Call {
        Initiate,
        ChannelTick,
        Resolve,
    }

    #[derive(Clone, Copy, Default)]
    enum Failure {
        #[default]
        None,
        Error,
        Panic,
    }

    /// Script that records which hooks ran and can be told to misbehave.
    #[derive(Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<Call>>>,
        accept: bool,
        channels: bool,
        fail_in: Option<HookPhase>,
        failure: Failure,
    }

    impl Recorder {
        fn accepting() -> Self {
            Self {
                accept: true,
                ..Self::default()
            }
        }

        fn failing(mut self, phase: HookPhase, failure: Failure) -> Self {
            self.fail_in = Some(phase);
            self.failure = failure;
            self
        }

        fn record(&self, call: Call, phase: HookPhase) -> HookResult<()> {
            self.calls.lock().unwrap().push(call);
            if self.fail_in != Some(phase) {
                return Ok(());
            }
            match self.failure {
                Failure::None => Ok(()),
                Failure::Error => Err(HookError::script("fizzled")),
                Failure::Panic => panic!("script exploded"),
            }
        }
    }

    impl AbilityScript for Recorder {
        fn on_initiate(&self, _cast: &mut CastContext<'_>) -> HookResult<bool> {
            self.record(Call::Initiate, HookPhase::Initiate)?;
            Ok(self.accept)
        }

        fn channels(&self) -> bool {
            self.channels
        }

        fn on_channel_tick(&self, _cast: &mut CastContext<'_>) -> HookResult<()> {
            self.record(Call::ChannelTick, HookPhase::ChannelTick)
        }

        fn on_resolve(&self, cast: &mut CastContext<'_>) -> HookResult<()> {
            self.record(Call::Resolve, HookPhase::Resolve)?;
            cast.target().adjust_health(5)?;
            Ok(())
        }
    }

    struct Harness {
        actors: InMemoryActors,
        messenger: RecordingMessenger,
        dice: ScriptedDice,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                actors: InMemoryActors::with_actors([
                    Actor::new(CASTER, ActorName::proper("aldric"), TAVERN, 20).with_health(10),
                    Actor::new(ALLY, ActorName::common("squire"), TAVERN, 20).with_health(10),
                ]),
                messenger: RecordingMessenger::new(),
                dice: ScriptedDice::new([1]),
            }
        }

        fn env(&mut self) -> CastEnv<'_> {
            CastEnv::new(&self.actors, &self.messenger, &mut self.dice)
        }
    }

    fn session(script: Recorder, channel_ticks: u32) -> (CastSession, Arc<Mutex<Vec<Call>>>) {
        let calls = Arc::clone(&script.calls);
        let ability = AbilityDefinition::new("recorder", "Recorder", script).with_channel_ticks(channel_ticks);
        let session = CastSession::new(SessionId(1), CASTER, ALLY, Arc::new(ability), Tick(3));
        (session, calls)
    }

    fn calls(log: &Arc<Mutex<Vec<Call>>>) -> Vec<Call> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn declined_initiation_aborts_without_other_hooks() {
        let mut world = Harness::new();
        let (mut cast, log) = session(Recorder::default(), 1);

        assert_eq!(cast.initiate(&mut world.env()), CastState::Aborted);
        assert_eq!(cast.abort_reason(), Some(&AbortReason::Declined));

        assert_eq!(cast.tick(&mut world.env()), CastState::Aborted);
        assert_eq!(calls(&log), vec![Call::Initiate]);
        assert_eq!(world.actors.health(ALLY), Some(10));
    }

    #[test]
    fn channel_then_resolve() {
        let mut world = Harness::new();
        let script = Recorder {
            channels: true,
            ..Recorder::accepting()
        };
        let (mut cast, log) = session(script, 2);

        assert_eq!(cast.initiate(&mut world.env()), CastState::Channeling);
        assert_eq!(cast.remaining_ticks(), 2);

        assert_eq!(cast.tick(&mut world.env()), CastState::Channeling);
        assert_eq!(cast.tick(&mut world.env()), CastState::Channeling);
        assert_eq!(cast.remaining_ticks(), 0);
        assert_eq!(cast.elapsed_ticks(), 2);
        assert_eq!(world.actors.health(ALLY), Some(10));

        assert_eq!(cast.tick(&mut world.env()), CastState::Resolved);
        assert_eq!(world.actors.health(ALLY), Some(15));
        assert_eq!(
            calls(&log),
            vec![
                Call::Initiate,
                Call::ChannelTick,
                Call::ChannelTick,
                Call::Resolve
            ]
        );

        // Terminal sessions ignore further ticks.
        assert_eq!(cast.tick(&mut world.env()), CastState::Resolved);
        assert_eq!(calls(&log).len(), 4);
    }

    #[test]
    fn non_channeling_script_skips_tick_hook() {
        let mut world = Harness::new();
        let (mut cast, log) = session(Recorder::accepting(), 1);

        cast.initiate(&mut world.env());
        assert_eq!(cast.tick(&mut world.env()), CastState::Channeling);
        assert_eq!(cast.tick(&mut world.env()), CastState::Resolved);
        assert_eq!(calls(&log), vec![Call::Initiate, Call::Resolve]);
    }

    #[test]
    fn instant_ability_resolves_during_initiate() {
        let mut world = Harness::new();
        let (mut cast, log) = session(Recorder::accepting(), 0);

        assert_eq!(cast.initiate(&mut world.env()), CastState::Resolved);
        assert_eq!(calls(&log), vec![Call::Initiate, Call::Resolve]);
        assert_eq!(world.actors.health(ALLY), Some(15));
    }

    #[test]
    fn interrupt_while_channeling_prevents_resolve() {
        let mut world = Harness::new();
        let (mut cast, log) = session(Recorder::accepting(), 1);

        cast.initiate(&mut world.env());
        assert!(cast.interrupt(InterruptReason::TargetMoved));
        assert_eq!(cast.state(), CastState::Aborted);
        assert_eq!(
            cast.abort_reason(),
            Some(&AbortReason::Interrupted(InterruptReason::TargetMoved))
        );

        cast.tick(&mut world.env());
        cast.tick(&mut world.env());
        assert_eq!(calls(&log), vec![Call::Initiate]);
        assert_eq!(world.actors.health(ALLY), Some(10));

        // A second interrupt on a terminal session reports nothing happened.
        assert!(!cast.interrupt(InterruptReason::Cancelled));
    }

    #[test]
    fn hook_error_aborts_with_phase() {
        let mut world = Harness::new();
        let script = Recorder::accepting().failing(HookPhase::Resolve, Failure::Error);
        let (mut cast, _log) = session(script, 0);

        assert_eq!(cast.initiate(&mut world.env()), CastState::Aborted);
        assert_eq!(
            cast.abort_reason(),
            Some(&AbortReason::HookFailed {
                phase: HookPhase::Resolve,
                message: "fizzled".into(),
            })
        );
    }

    #[test]
    fn hook_panic_is_contained() {
        let mut world = Harness::new();
        let script = Recorder {
            channels: true,
            ..Recorder::accepting()
        }
        .failing(HookPhase::ChannelTick, Failure::Panic);
        let (mut cast, log) = session(script, 3);

        cast.initiate(&mut world.env());
        assert_eq!(cast.tick(&mut world.env()), CastState::Aborted);

        match cast.abort_reason() {
            Some(AbortReason::HookFailed { phase, message }) => {
                assert_eq!(*phase, HookPhase::ChannelTick);
                assert!(message.contains("script exploded"), "{message}");
            }
            other => panic!("unexpected abort reason: {other:?}"),
        }
        assert_eq!(calls(&log), vec![Call::Initiate, Call::ChannelTick]);
    }

    #[test]
    fn vanished_target_aborts_before_resolve() {
        let mut world = Harness::new();
        let (mut cast, log) = session(Recorder::accepting(), 1);

        cast.initiate(&mut world.env());
        world.actors.remove(ALLY);

        assert_eq!(cast.tick(&mut world.env()), CastState::Aborted);
        assert_eq!(cast.abort_reason(), Some(&AbortReason::ActorNotFound(ALLY)));
        assert_eq!(calls(&log), vec![Call::Initiate]);
    }

    #[test]
    fn vanished_source_aborts_initiation() {
        let mut world = Harness::new();
        world.actors.remove(CASTER);
        let (mut cast, log) = session(Recorder::accepting(), 0);

        assert_eq!(cast.initiate(&mut world.env()), CastState::Aborted);
        assert_eq!(cast.abort_reason(), Some(&AbortReason::ActorNotFound(CASTER)));
        assert!(calls(&log).is_empty());
    }

    #[test]
    fn info_reflects_progress() {
        let mut world = Harness::new();
        let (mut cast, _log) = session(Recorder::accepting(), 2);

        cast.initiate(&mut world.env());
        cast.tick(&mut world.env());

        let info = cast.info();
        assert_eq!(info.id, SessionId(1));
        assert_eq!(info.ability.as_str(), "recorder");
        assert_eq!(info.state, CastState::Channeling);
        assert_eq!(info.remaining_ticks, 1);
        assert_eq!(info.elapsed_ticks, 1);
        assert_eq!(info.created_at, Tick(3));
        assert_eq!(info.abort_reason, None);
    }

    #[test]
    fn abort_reason_display() {
        assert_eq!(AbortReason::Declined.to_string(), "declined");
        assert_eq!(
            AbortReason::Interrupted(InterruptReason::SourceDied).to_string(),
            "interrupted (source_died)"
        );
        assert_eq!(
            AbortReason::HookFailed {
                phase: HookPhase::ChannelTick,
                message: "boom".into()
            }
            .to_string(),
            "channel_tick hook failed: boom"
        );
    }
}
