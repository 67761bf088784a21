//! High-level runtime orchestrator.
//!
//! The runtime owns the scheduler worker, wires up command/event channels, and
//! exposes a builder-based API for the surrounding server to drive casts.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use game_core::{AbilityRegistry, DiceSource};

use crate::api::{Result, RuntimeError, RuntimeHandle};
use crate::config::RuntimeConfig;
use crate::dice::dice_from_config;
use crate::directory::ActorDirectory;
use crate::events::{Event, EventBus, Topic};
use crate::fanout::MessageHub;
use crate::workers::{Command, SchedulerWorker};

/// Main runtime that orchestrates ability casting
///
/// Design: Runtime owns the worker and the shared world services.
/// [`RuntimeHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    config: RuntimeConfig,
    directory: Arc<ActorDirectory>,
    hub: Arc<MessageHub>,
    scheduler_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    ///
    /// The handle can be shared across clients and async tasks.
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Actor records shared with the surrounding server.
    pub fn directory(&self) -> &Arc<ActorDirectory> {
        &self.directory
    }

    /// Message hub users connect their outboxes to.
    pub fn hub(&self) -> &Arc<MessageHub> {
        &self.hub
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Subscribe to runtime events of one topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.handle.subscribe(topic)
    }

    /// Shutdown the runtime gracefully
    ///
    /// Live casts are aborted with `InterruptReason::Shutdown` and their
    /// slots released before the worker exits.
    pub async fn shutdown(self) -> Result<()> {
        match self.handle.shutdown().await {
            Ok(()) => {}
            Err(RuntimeError::CommandChannelClosed | RuntimeError::ReplyChannelClosed(_)) => {
                debug!(target: "runtime", "scheduler already stopped");
            }
            Err(err) => return Err(err),
        }
        drop(self.handle);

        self.scheduler_handle
            .await
            .map_err(RuntimeError::WorkerJoin)
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    directory: Option<Arc<ActorDirectory>>,
    registry: Option<Arc<AbilityRegistry>>,
    dice: Option<Box<dyn DiceSource>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            directory: None,
            registry: None,
            dice: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the required actor directory
    pub fn directory(mut self, directory: Arc<ActorDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Set the abilities available for casting
    pub fn registry(mut self, registry: impl Into<Arc<AbilityRegistry>>) -> Self {
        self.registry = Some(registry.into());
        self
    }

    /// Replace the dice source chosen from the configuration
    ///
    /// Tests use this to inject `ScriptedDice`.
    pub fn dice(mut self, dice: impl DiceSource + 'static) -> Self {
        self.dice = Some(Box::new(dice));
        self
    }

    /// Build the runtime and spawn the scheduler worker
    pub async fn build(self) -> Result<Runtime> {
        let directory = self.directory.ok_or(RuntimeError::MissingDirectory)?;

        let registry = self.registry.unwrap_or_else(|| {
            warn!(target: "runtime", "no ability registry configured; every cast will fail");
            Arc::new(AbilityRegistry::new())
        });
        let dice = self.dice.unwrap_or_else(|| dice_from_config(&self.config));

        let (command_tx, command_rx) =
            mpsc::channel::<Command>(self.config.command_buffer_size.max(1));
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);
        let hub = Arc::new(MessageHub::new(
            Arc::clone(&directory),
            self.config.outbox_capacity,
        ));

        let handle = RuntimeHandle::new(command_tx, event_bus.clone());

        let scheduler = SchedulerWorker::new(
            registry,
            Arc::clone(&directory),
            Arc::clone(&hub),
            dice,
            self.config.tick_interval,
            command_rx,
            event_bus,
        );

        let scheduler_handle = tokio::spawn(async move {
            scheduler.run().await;
        });

        Ok(Runtime {
            handle,
            config: self.config,
            directory,
            hub,
            scheduler_handle,
        })
    }
}
