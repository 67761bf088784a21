//! Headless harness: boots a runtime, seats a small party in one room and
//! plays a heal and a smite end to end while logging everything.

use std::sync::Arc;

use anyhow::{Context, Result};
use game_core::{Actor, ActorName, ActorStore, RoomId, UserId};
use runtime::{
    ActorDirectory, Event, Runtime, RuntimeConfig, SchedulerEvent, SessionEvent, Topic,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const TAVERN: RoomId = RoomId(1);
const HEALER: UserId = UserId(1);
const WOUNDED: UserId = UserId(2);
const GOBLIN: UserId = UserId(3);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RuntimeConfig::from_env();
    info!(?config, "starting cast sandbox");

    let directory = Arc::new(ActorDirectory::new());
    directory.insert(Actor::new(HEALER, ActorName::proper("Aldric"), TAVERN, 30))?;
    directory.insert(Actor::new(WOUNDED, ActorName::proper("Mira"), TAVERN, 25).with_health(7))?;
    directory.insert(Actor::new(GOBLIN, ActorName::common("goblin"), TAVERN, 8))?;

    let registry = game_content::standard_registry().context("bundled abilities are invalid")?;
    for id in registry.ids() {
        let ability = registry.lookup(id.as_str())?;
        let params: Vec<String> = ability
            .config()
            .iter()
            .map(|(name, value)| format!("{name}={value:?}"))
            .collect();
        info!(
            ability = %id,
            channel_ticks = ability.channel_ticks(),
            params = %params.join(", "),
            "ability registered"
        );
    }

    let runtime = Runtime::builder()
        .config(config)
        .directory(Arc::clone(&directory))
        .registry(registry)
        .build()
        .await?;
    let handle = runtime.handle();
    let mut topics = handle.subscribe_multiple(&[Topic::Session, Topic::Scheduler]);
    let mut events = topics
        .remove(&Topic::Session)
        .context("session topic subscription missing")?;
    if let Some(ticks) = topics.remove(&Topic::Scheduler) {
        tokio::spawn(log_ticks(ticks));
    }

    for user in [HEALER, WOUNDED] {
        tokio::spawn(print_outbox(user, runtime.hub().connect(user)));
    }

    let heal = handle.begin_cast(HEALER, WOUNDED, game_content::HEAL).await?;
    info!(session = %heal.id, state = %heal.state, "heal requested");

    // Drive ticks by hand when automatic ticking is off.
    let manual = runtime.config().tick_interval.is_none();
    loop {
        if manual {
            handle.tick().await?;
        }
        match events.recv().await? {
            Event::Session(event) => {
                info!(event = %serde_json::to_string(&event)?, "session event");
                if let SessionEvent::Resolved { .. } | SessionEvent::Aborted { .. } = event {
                    break;
                }
            }
            Event::Scheduler(_) => {}
        }
    }

    let smite = handle.begin_cast(WOUNDED, GOBLIN, game_content::SMITE).await?;
    info!(session = %smite.id, state = %smite.state, "smite cast");

    for id in [HEALER, WOUNDED, GOBLIN] {
        let actor = directory.get_actor(id)?;
        info!(
            actor = %actor.display_name(true),
            health = actor.vitals.health(),
            max_health = actor.vitals.max_health(),
            "final vitals"
        );
    }

    runtime.shutdown().await?;
    Ok(())
}

async fn log_ticks(mut ticks: broadcast::Receiver<Event>) {
    while let Ok(event) = ticks.recv().await {
        if let Event::Scheduler(SchedulerEvent::Ticked(report)) = event {
            debug!(
                tick = %report.tick,
                channeling = report.channeling,
                resolved = report.resolved,
                aborted = report.aborted,
                "scheduler tick"
            );
        }
    }
}

async fn print_outbox(user: UserId, mut outbox: mpsc::Receiver<String>) {
    while let Some(text) = outbox.recv().await {
        info!(%user, "{text}");
    }
}
