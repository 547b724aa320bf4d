//! Deferred process restart.
//!
//! # States
//! ```text
//! Idle → AckSent → (delay) → SpawnAttempted → Spawned
//!                                           → SpawnFailed
//! ```
//!
//! The acknowledgment is returned before the delay starts. A failed spawn is
//! terminal: it is logged and counted but never reported to the requester
//! and never retried.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::control::service::ActionResult;
use crate::lifecycle::process;
use crate::observability::metrics;

pub const RESTART_ACK_MESSAGE: &str = "Service restart initiated";

/// Restart coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartPhase {
    Idle,
    AckSent,
    SpawnAttempted,
    Spawned,
    SpawnFailed,
}

impl RestartPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, RestartPhase::Spawned | RestartPhase::SpawnFailed)
    }

    fn as_str(self) -> &'static str {
        match self {
            RestartPhase::Idle => "idle",
            RestartPhase::AckSent => "ack_sent",
            RestartPhase::SpawnAttempted => "spawn_attempted",
            RestartPhase::Spawned => "spawned",
            RestartPhase::SpawnFailed => "spawn_failed",
        }
    }
}

/// External command that restarts the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl RestartCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// Launches restart commands.
pub trait ProcessSpawner: Send + Sync {
    /// Start `command` detached from the current process. Must not wait for
    /// it to finish.
    fn spawn_detached(&self, command: &RestartCommand) -> io::Result<()>;
}

/// Spawns real OS processes with stdio discarded.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSpawner;

impl ProcessSpawner for SystemSpawner {
    fn spawn_detached(&self, command: &RestartCommand) -> io::Result<()> {
        process::spawn_detached(&command.program, &command.args).map(|_| ())
    }
}

/// Acknowledges restart requests and schedules the spawn.
#[derive(Clone)]
pub struct RestartCoordinator {
    spawner: Arc<dyn ProcessSpawner>,
    command: RestartCommand,
    delay: Duration,
    phase: Arc<watch::Sender<RestartPhase>>,
}

impl RestartCoordinator {
    pub fn new(spawner: Arc<dyn ProcessSpawner>, command: RestartCommand, delay: Duration) -> Self {
        let (phase, _) = watch::channel(RestartPhase::Idle);
        Self {
            spawner,
            command,
            delay,
            phase: Arc::new(phase),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn command(&self) -> &RestartCommand {
        &self.command
    }

    /// Current phase.
    pub fn phase(&self) -> RestartPhase {
        *self.phase.borrow()
    }

    /// Observe phase transitions.
    pub fn subscribe(&self) -> watch::Receiver<RestartPhase> {
        self.phase.subscribe()
    }

    /// Phase one: record the acknowledgment and hand back the pending spawn.
    pub fn acknowledge(&self) -> (ActionResult, PendingRestart) {
        self.phase.send_replace(RestartPhase::AckSent);
        metrics::record_restart_request();
        tracing::info!(
            program = %self.command.program,
            delay_ms = self.delay.as_millis() as u64,
            "Service restart requested"
        );

        let pending = PendingRestart {
            spawner: self.spawner.clone(),
            command: self.command.clone(),
            delay: self.delay,
            phase: self.phase.clone(),
        };
        (ActionResult::ok(RESTART_ACK_MESSAGE), pending)
    }

    /// Acknowledge now and run the spawn on a background task after the
    /// delay. Must be called from within a tokio runtime.
    pub fn request_restart(&self) -> ActionResult {
        let (ack, pending) = self.acknowledge();
        tokio::spawn(async move {
            pending.run().await;
        });
        ack
    }
}

/// Phase two of a restart: the deferred spawn.
pub struct PendingRestart {
    spawner: Arc<dyn ProcessSpawner>,
    command: RestartCommand,
    delay: Duration,
    phase: Arc<watch::Sender<RestartPhase>>,
}

impl PendingRestart {
    /// Wait out the delay, then spawn.
    pub async fn run(self) -> RestartPhase {
        tokio::time::sleep(self.delay).await;
        self.fire()
    }

    /// Spawn the restart command immediately.
    pub fn fire(self) -> RestartPhase {
        self.phase.send_replace(RestartPhase::SpawnAttempted);

        let outcome = match self.spawner.spawn_detached(&self.command) {
            Ok(()) => {
                tracing::info!(program = %self.command.program, "Restart command spawned");
                RestartPhase::Spawned
            }
            Err(e) => {
                tracing::error!(
                    program = %self.command.program,
                    error = %e,
                    "Restart command failed to spawn"
                );
                RestartPhase::SpawnFailed
            }
        };

        metrics::record_restart_spawn(outcome.as_str());
        self.phase.send_replace(outcome);
        outcome
    }
}
