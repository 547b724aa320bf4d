//! Router Control Daemon (v1)
//!
//! Local control plane for the router configuration file.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │               ROUTER CONTROL                 │
//!                        │                                              │
//!     UI / CLI request   │  ┌─────────┐    ┌──────────────┐             │
//!     ───────────────────┼─▶│  http   │───▶│   control    │             │
//!                        │  │ server  │    │   service    │             │
//!                        │  └─────────┘    └──┬────┬───┬──┘             │
//!                        │                    │    │   │                │
//!                        │         ┌──────────┘    │   └─────────┐      │
//!                        │         ▼               ▼             ▼      │
//!                        │  ┌────────────┐  ┌────────────┐ ┌─────────┐  │
//!                        │  │   store    │  │ transformer│ │ restart │  │
//!                        │  │ file+backup│  │  registry  │ │  coord. │  │
//!                        │  └─────┬──────┘  └────────────┘ └────┬────┘  │
//!                        └────────┼─────────────────────────────┼───────┘
//!                                 ▼                             ▼
//!                          config.json + *.bak           detached restart
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use router_control::config::loader::{load_config, load_or_default};
use router_control::config::paths::default_settings_file;
use router_control::config::{ConfigLocations, DaemonConfig, RestartConfig};
use router_control::control::{
    ControlService, RestartCommand, RestartCoordinator, SharedRegistry, SystemSpawner,
    TransformerEntry,
};
use router_control::http::{HttpServer, StaticAssets};
use router_control::lifecycle::process::{self, StopOutcome};
use router_control::lifecycle::{signals, startup, PidFile, Shutdown};
use router_control::observability::{logging, metrics};
use router_control::store::{BackupManager, ConfigStore};

/// How long `restart` waits for the running instance to exit.
const STOP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "router-control")]
#[command(about = "Control-plane daemon for the router configuration", long_about = None)]
struct Cli {
    /// Daemon settings file (TOML). Defaults to ~/.router-control/daemon.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Run the daemon in the foreground (default)
    Start,
    /// Stop the running instance and start a new detached one
    Restart,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => load_or_default(&default_settings_file()?)?,
    };
    logging::init_tracing(&config.observability.log_level);

    let locations = ConfigLocations::resolve(&config.paths)?;

    match cli.command.unwrap_or(Command::Start) {
        Command::Start => start(config, locations, cli.config).await,
        Command::Restart => restart(locations, cli.config).await,
    }
}

async fn start(
    config: DaemonConfig,
    locations: ConfigLocations,
    settings_file: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("router-control v{} starting", env!("CARGO_PKG_VERSION"));

    startup::prepare_directories(&locations).await?;

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let store = ConfigStore::new(&locations.config_file);
    let backups = BackupManager::new(&locations.config_file, &locations.backup_dir);
    startup::report_existing_state(&locations, &backups).await;

    let registry = SharedRegistry::from_entries(config.transformers.iter().map(|t| {
        (
            t.name.clone(),
            TransformerEntry {
                end_point: t.endpoint.clone(),
            },
        )
    }));
    tracing::info!(transformers = registry.len(), "Transformer registry loaded");

    let command = restart_command(&config.restart, settings_file.as_ref())?;
    let restart = RestartCoordinator::new(
        Arc::new(SystemSpawner),
        command,
        Duration::from_millis(config.restart.delay_ms),
    );

    let service = Arc::new(ControlService::new(store, Arc::new(backups), Arc::new(registry), restart));
    let ui = config.ui.enabled.then(|| StaticAssets {
        root: config.ui.assets_dir.clone(),
        max_age: Duration::from_secs(config.ui.max_age_secs),
    });

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        config_file = %locations.config_file.display(),
        "Listening for connections"
    );

    let _pid_file = PidFile::create(&locations.pid_file)?;
    let shutdown = Shutdown::new();
    let server = HttpServer::new(&config.listener, service, ui);
    let run = server.run(listener, shutdown.subscribe());
    tokio::pin!(run);

    tokio::select! {
        result = &mut run => result?,
        _ = signals::wait_for_termination() => {
            shutdown.trigger();
            run.await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Restart command from settings; defaults to `<this executable> restart`.
fn restart_command(
    settings: &RestartConfig,
    settings_file: Option<&PathBuf>,
) -> Result<RestartCommand, std::io::Error> {
    match &settings.program {
        Some(program) => Ok(RestartCommand::new(program.clone(), settings.args.clone())),
        None => {
            let exe = std::env::current_exe()?;
            let mut args = settings.args.clone();
            if let Some(path) = settings_file {
                args.push("--config".to_string());
                args.push(path.display().to_string());
            }
            Ok(RestartCommand::new(exe.display().to_string(), args))
        }
    }
}

async fn restart(
    locations: ConfigLocations,
    settings_file: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    match process::stop_instance(&locations.pid_file, STOP_TIMEOUT).await? {
        StopOutcome::NotRunning => tracing::info!("No running instance found"),
        StopOutcome::Stale => tracing::info!("Previous instance was not running"),
        StopOutcome::Stopped => tracing::info!("Previous instance stopped"),
        StopOutcome::TimedOut => {
            return Err(format!(
                "running instance did not exit within {}s",
                STOP_TIMEOUT.as_secs()
            )
            .into());
        }
    }

    let exe = std::env::current_exe()?;
    let mut args = vec!["start".to_string()];
    if let Some(path) = settings_file {
        args.push("--config".to_string());
        args.push(path.display().to_string());
    }

    let pid = process::spawn_detached(&exe.display().to_string(), &args)?;
    println!("router-control restarted (pid {pid})");
    Ok(())
}
