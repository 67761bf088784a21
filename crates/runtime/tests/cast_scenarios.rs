use std::sync::Arc;
use std::time::Duration;

use game_core::{
    AbortReason, Actor, ActorName, ActorStore, CastError, CastState, InterruptReason, RoomId,
    ScriptedDice, UserId,
};
use runtime::{
    ActorDirectory, Event, Runtime, RuntimeConfig, RuntimeError, SessionEvent, TickReport, Topic,
};
use tokio::sync::{broadcast, mpsc};

const ALDRIC: UserId = UserId(1);
const MIRA: UserId = UserId(2);
const TESS: UserId = UserId(3);
const GOBLIN: UserId = UserId(4);

const TAVERN: RoomId = RoomId(100);
const CELLAR: RoomId = RoomId(101);

struct Table {
    runtime: Runtime,
    aldric: mpsc::Receiver<String>,
    mira: mpsc::Receiver<String>,
    tess: mpsc::Receiver<String>,
}

impl Table {
    fn directory(&self) -> &Arc<ActorDirectory> {
        self.runtime.directory()
    }

    fn health(&self, id: UserId) -> u32 {
        self.directory().get_actor(id).unwrap().vitals.health()
    }
}

fn tavern() -> Arc<ActorDirectory> {
    let directory = Arc::new(ActorDirectory::new());
    for actor in [
        Actor::new(ALDRIC, ActorName::proper("Aldric"), TAVERN, 30).with_health(20),
        Actor::new(MIRA, ActorName::proper("Mira"), TAVERN, 25).with_health(10),
        Actor::new(TESS, ActorName::proper("Tess"), TAVERN, 15),
        Actor::new(GOBLIN, ActorName::common("goblin"), TAVERN, 8),
    ] {
        directory.insert(actor).unwrap();
    }
    directory
}

async fn table(faces: impl IntoIterator<Item = u32>) -> Table {
    table_with(RuntimeConfig::manual_ticks(), faces).await
}

async fn table_with(config: RuntimeConfig, faces: impl IntoIterator<Item = u32>) -> Table {
    let runtime = Runtime::builder()
        .config(config)
        .directory(tavern())
        .registry(game_content::standard_registry().unwrap())
        .dice(ScriptedDice::new(faces))
        .build()
        .await
        .unwrap();

    let hub = runtime.hub();
    Table {
        aldric: hub.connect(ALDRIC),
        mira: hub.connect(MIRA),
        tess: hub.connect(TESS),
        runtime,
    }
}

fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<String> {
    let mut received = Vec::new();
    while let Ok(text) = rx.try_recv() {
        received.push(text);
    }
    received
}

fn session_events(rx: &mut broadcast::Receiver<Event>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let Event::Session(event) = event {
            events.push(event);
        }
    }
    events
}

fn cast_error(result: runtime::Result<game_core::SessionInfo>) -> CastError {
    match result {
        Err(RuntimeError::Cast(err)) => err,
        other => panic!("expected cast error, got {other:?}"),
    }
}

/// Heal Scenario Walkthrough
///
/// 1. Aldric begins healing Mira (2d3, scripted to roll 1 + 2)
/// 2. The chant is announced and continued for one channel tick
/// 3. The heal resolves on the next tick
/// 4. Verify health, per-recipient messages and lifecycle events
#[tokio::test]
async fn test_heal_another_actor_scenario() {
    println!("\n════════════════════════════════════════════════════════");
    println!("  CASTING ENGINE - Heal Scenario Test");
    println!("════════════════════════════════════════════════════════\n");

    let mut table = table([1, 2]).await;
    let handle = table.runtime.handle();
    let mut events = handle.subscribe(Topic::Session);

    // ================================================================
    // PHASE 1: Initiation
    // ================================================================
    println!("🪄 PHASE 1: Aldric begins to heal Mira");
    let info = handle.begin_cast(ALDRIC, MIRA, "heal").await.unwrap();
    assert_eq!(info.state, CastState::Channeling);
    assert_eq!(info.remaining_ticks, 1);
    assert!(table.directory().get_actor(ALDRIC).unwrap().is_casting());
    println!("  ✓ Session {} channeling\n", info.id);

    // ================================================================
    // PHASE 2: Channeling
    // ================================================================
    println!("⏳ PHASE 2: Channel tick");
    let report = handle.tick().await.unwrap();
    assert_eq!(
        report,
        TickReport {
            tick: game_core::Tick(1),
            channeling: 1,
            resolved: 0,
            aborted: 0,
        }
    );
    assert_eq!(table.health(MIRA), 10, "no healing before resolution");
    println!("  ✓ {report:?}\n");

    // ================================================================
    // PHASE 3: Resolution
    // ================================================================
    println!("✨ PHASE 3: Resolution");
    let report = handle.tick().await.unwrap();
    assert_eq!(report.resolved, 1);
    assert_eq!(table.health(MIRA), 13);
    assert_eq!(table.health(ALDRIC), 20);
    assert!(handle.session(ALDRIC).await.unwrap().is_none());
    assert!(!table.directory().get_actor(ALDRIC).unwrap().is_casting());
    println!("  ✓ Mira healed to {}\n", table.health(MIRA));

    // ================================================================
    // PHASE 4: Messages
    // ================================================================
    println!("📜 PHASE 4: Narrative delivery");
    assert_eq!(
        drain(&mut table.aldric),
        vec![
            "You begin to chant softly.",
            "You continue chanting...",
            "You stop chanting and touch Mira with glowing hands, healing <ansi fg=\"healing\">3 hitpoints</ansi>.",
        ]
    );
    assert_eq!(
        drain(&mut table.mira),
        vec![
            "Aldric begins to chant softly.",
            "Aldric continues chanting...",
            "Aldric stops chanting and touches you with glowing hands, healing <ansi fg=\"healing\">3 hitpoints</ansi>.",
        ]
    );
    assert_eq!(
        drain(&mut table.tess),
        vec![
            "Aldric begins to chant softly.",
            "Aldric continues chanting...",
            "Aldric stops chanting and touches Mira with glowing hands, providing health.",
        ]
    );
    println!("  ✓ Caster, target and onlooker each saw their own view\n");

    // ================================================================
    // PHASE 5: Events
    // ================================================================
    let events = session_events(&mut events);
    assert!(matches!(events[0], SessionEvent::Started { .. }));
    assert!(matches!(
        events[1],
        SessionEvent::Channeled {
            remaining_ticks: 0,
            ..
        }
    ));
    assert!(matches!(events[2], SessionEvent::Resolved { .. }));
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|event| event.session_id() == info.id));

    table.runtime.shutdown().await.unwrap();
    println!("✓ Scenario complete\n");
}

#[tokio::test]
async fn test_self_cast_excludes_caster_once() {
    let mut table = table([3, 3]).await;
    let handle = table.runtime.handle();

    handle.begin_cast(ALDRIC, ALDRIC, "heal").await.unwrap();
    handle.tick().await.unwrap();
    handle.tick().await.unwrap();

    assert_eq!(table.health(ALDRIC), 26);
    assert_eq!(
        drain(&mut table.aldric).last().map(String::as_str),
        Some(
            "You stop chanting and embrace yourself with glowing hands, healing <ansi fg=\"healing\">6 hitpoints</ansi>."
        )
    );

    let broadcast =
        "Aldric stops chanting and embraces themselves with glowing hands, providing health.";
    assert_eq!(drain(&mut table.mira).last().map(String::as_str), Some(broadcast));
    assert_eq!(drain(&mut table.tess).last().map(String::as_str), Some(broadcast));
}

#[tokio::test]
async fn test_declined_cast_releases_slot() {
    let mut table = table([2, 2]).await;
    let handle = table.runtime.handle();
    table.directory().move_to(MIRA, CELLAR).unwrap();

    let info = handle.begin_cast(ALDRIC, MIRA, "heal").await.unwrap();
    assert_eq!(info.state, CastState::Aborted);
    assert_eq!(info.abort_reason, Some(AbortReason::Declined));
    assert_eq!(drain(&mut table.aldric), vec!["Mira is not here."]);
    assert!(drain(&mut table.tess).is_empty());

    let report = handle.tick().await.unwrap();
    assert_eq!(report.channeling, 0);
    assert_eq!(table.health(MIRA), 10);
    assert!(handle.live_sessions().await.unwrap().is_empty());

    // The slot is free again right away.
    let retry = handle.begin_cast(ALDRIC, TESS, "heal").await.unwrap();
    assert_eq!(retry.state, CastState::Channeling);
}

#[tokio::test]
async fn test_interrupt_after_one_tick_skips_resolution() {
    let mut table = table([3, 3]).await;
    let handle = table.runtime.handle();
    let mut events = handle.subscribe(Topic::Session);

    handle.begin_cast(ALDRIC, MIRA, "heal").await.unwrap();
    handle.tick().await.unwrap();
    assert!(
        handle
            .interrupt(ALDRIC, InterruptReason::Cancelled)
            .await
            .unwrap()
    );

    let report = handle.tick().await.unwrap();
    assert_eq!(report, TickReport { tick: game_core::Tick(2), ..TickReport::default() });
    assert_eq!(table.health(MIRA), 10);
    assert_eq!(
        drain(&mut table.aldric),
        vec!["You begin to chant softly.", "You continue chanting..."]
    );
    assert!(!table.directory().get_actor(ALDRIC).unwrap().is_casting());

    // Nothing left to interrupt.
    assert!(
        !handle
            .interrupt(ALDRIC, InterruptReason::Cancelled)
            .await
            .unwrap()
    );

    let last = session_events(&mut events).pop().unwrap();
    match last {
        SessionEvent::Aborted { reason, session, .. } => {
            assert_eq!(reason, AbortReason::Interrupted(InterruptReason::Cancelled));
            assert_eq!(session.state, CastState::Aborted);
            assert_eq!(session.elapsed_ticks, 1);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn test_second_cast_is_rejected() {
    let mut table = table([1]).await;
    let handle = table.runtime.handle();

    let first = handle.begin_cast(ALDRIC, MIRA, "heal").await.unwrap();
    drain(&mut table.aldric);

    let err = cast_error(handle.begin_cast(ALDRIC, TESS, "heal").await);
    assert_eq!(
        err,
        CastError::AlreadyCasting {
            actor: ALDRIC,
            session: first.id,
        }
    );
    assert_eq!(drain(&mut table.aldric), vec!["You are already casting."]);

    let live = handle.live_sessions().await.unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].target, MIRA);
}

#[tokio::test]
async fn test_unknown_ability_and_missing_actor() {
    let mut table = table([1]).await;
    let handle = table.runtime.handle();

    let err = cast_error(handle.begin_cast(ALDRIC, MIRA, "fireball").await);
    assert!(matches!(err, CastError::AbilityNotFound(_)));
    assert_eq!(
        drain(&mut table.aldric),
        vec!["You don't know how to cast that."]
    );

    let err = cast_error(handle.begin_cast(ALDRIC, UserId(99), "heal").await);
    assert_eq!(err, CastError::ActorNotFound(UserId(99)));
    assert!(handle.live_sessions().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_vanished_target_aborts_cast() {
    let table = table([1]).await;
    let handle = table.runtime.handle();

    handle.begin_cast(ALDRIC, MIRA, "heal").await.unwrap();
    table.directory().remove(MIRA).unwrap();

    let report = handle.tick().await.unwrap();
    assert_eq!(report.aborted, 1);
    assert!(!table.directory().get_actor(ALDRIC).unwrap().is_casting());
}

#[tokio::test]
async fn test_instant_smite_resolves_in_begin_cast() {
    let mut table = table([3]).await;
    let handle = table.runtime.handle();

    let info = handle.begin_cast(MIRA, GOBLIN, "smite").await.unwrap();
    assert_eq!(info.state, CastState::Resolved);
    assert_eq!(table.health(GOBLIN), 5);
    assert!(handle.session(MIRA).await.unwrap().is_none());
    assert_eq!(
        drain(&mut table.tess),
        vec!["Holy light bursts from Mira's hand and smites the goblin."]
    );
}

#[tokio::test]
async fn test_parallel_casts_resolve_on_same_tick() {
    let table = table([1]).await;
    let handle = table.runtime.handle();

    handle.begin_cast(ALDRIC, TESS, "heal").await.unwrap();
    handle.begin_cast(MIRA, MIRA, "heal").await.unwrap();
    assert_eq!(handle.live_sessions().await.unwrap().len(), 2);

    assert_eq!(handle.tick().await.unwrap().channeling, 2);
    let report = handle.tick().await.unwrap();
    assert_eq!(report.resolved, 2);
    assert_eq!(table.health(MIRA), 12);
}

#[tokio::test]
async fn test_automatic_ticking_resolves_heal() {
    let config = RuntimeConfig {
        tick_interval: Some(Duration::from_millis(10)),
        ..RuntimeConfig::default()
    };
    let table = table_with(config, [1]).await;
    let handle = table.runtime.handle();
    let mut events = handle.subscribe(Topic::Session);

    handle.begin_cast(ALDRIC, MIRA, "heal").await.unwrap();

    let resolved = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match events.recv().await {
                Ok(Event::Session(SessionEvent::Resolved { session, .. })) => break session,
                Ok(_) => continue,
                Err(err) => panic!("event stream ended: {err}"),
            }
        }
    })
    .await
    .expect("heal should resolve on its own");

    assert_eq!(resolved.source, ALDRIC);
    assert_eq!(table.health(MIRA), 12);
}

#[tokio::test]
async fn test_shutdown_aborts_live_casts() {
    let table = table([1]).await;
    let directory = Arc::clone(table.directory());
    let handle = table.runtime.handle();
    let mut events = handle.subscribe(Topic::Session);

    handle.begin_cast(ALDRIC, MIRA, "heal").await.unwrap();
    table.runtime.shutdown().await.unwrap();

    let last = session_events(&mut events).pop().unwrap();
    assert!(matches!(
        last,
        SessionEvent::Aborted {
            reason: AbortReason::Interrupted(InterruptReason::Shutdown),
            ..
        }
    ));
    assert!(!directory.get_actor(ALDRIC).unwrap().is_casting());
    assert!(matches!(
        handle.tick().await,
        Err(RuntimeError::CommandChannelClosed)
    ));
}

#[tokio::test]
async fn test_builder_requires_directory() {
    let result = Runtime::builder().build().await;
    assert!(matches!(result, Err(RuntimeError::MissingDirectory)));
}

#[tokio::test]
async fn test_zero_buffer_sizes_are_clamped() {
    let config = RuntimeConfig {
        command_buffer_size: 0,
        event_buffer_size: 0,
        outbox_capacity: 0,
        ..RuntimeConfig::manual_ticks()
    };
    let mut table = table_with(config, [3]).await;
    let handle = table.runtime.handle();

    let info = handle.begin_cast(MIRA, GOBLIN, "smite").await.unwrap();
    assert_eq!(info.state, CastState::Resolved);
    assert_eq!(table.health(GOBLIN), 5);
    assert_eq!(
        drain(&mut table.tess),
        vec!["Holy light bursts from Mira's hand and smites the goblin."]
    );
}

#[test]
fn events_serialize_to_json() {
    let event = Event::Scheduler(runtime::SchedulerEvent::Ticked(TickReport::default()));
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("Ticked"));
}
