//! playersync - keep local media players in step
//!
//! Lists MPRIS players in a terminal table. Players marked as synced follow
//! each other's play, pause, stop and seek.
//!
//! Usage:
//!   playersync
//!   playersync --propagate-stop --log-file /tmp/ps.log

mod bridge;
mod dashboard;
mod table;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use playersync_core::{logging, MprisBackend, SyncEngine, SyncOptions};
use tracing::{error, info, warn};

/// How long to wait for the engine to wind down after quitting
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[command(name = "playersync", version, about = "Keep MPRIS media players in synchronized playback")]
struct Args {
    /// Config file (defaults to $XDG_CONFIG_HOME/playersync/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log file (defaults to $TMPDIR/playersync.log)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Propagate Stop to synced players
    #[arg(long, env = "PLAYERSYNC_PROPAGATE_STOP")]
    propagate_stop: bool,

    /// Propagate a pause that happens at the very end of a track
    #[arg(long, env = "PLAYERSYNC_PROPAGATE_PAUSE_AT_END")]
    propagate_pause_at_end: bool,
}

impl Args {
    /// Flags only ever switch behaviour on
    fn apply(&self, options: SyncOptions) -> SyncOptions {
        SyncOptions {
            propagate_stop: options.propagate_stop || self.propagate_stop,
            propagate_pause_at_end: options.propagate_pause_at_end || self.propagate_pause_at_end,
            ..options
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_path = args.log_file.clone().unwrap_or_else(logging::default_log_path);
    logging::init(&log_path)?;

    let options = args.apply(SyncOptions::load(args.config.as_deref())?);
    info!("Starting with {:?}", options);

    let backend = MprisBackend::connect().await?;
    let (ui, mut requests) = bridge::channel();
    let (engine, handle) = SyncEngine::new(Arc::new(backend), Arc::new(ui), options.clone());

    let worker = tokio::spawn(engine.run());

    let result = dashboard::run(&handle, &mut requests, &options);

    // Stop the engine; dropping the receiver unblocks any pending row call
    handle.shutdown();
    drop(requests);
    match tokio::time::timeout(SHUTDOWN_TIMEOUT, worker).await {
        Ok(Ok(Ok(()))) => info!("Engine stopped"),
        Ok(Ok(Err(e))) => error!("Engine failed: {}", e),
        Ok(Err(e)) => error!("Engine task panicked: {}", e),
        Err(_) => warn!("Engine did not stop within {:?}", SHUTDOWN_TIMEOUT),
    }

    result
}
