//! Tracing setup
//!
//! The terminal belongs to the table UI, so log output goes to a file.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once};

use crate::engine::SyncError;

static TRACING_INIT: Once = Once::new();

/// Default log file: `$TMPDIR/playersync.log`
pub fn default_log_path() -> PathBuf {
    std::env::temp_dir().join("playersync.log")
}

/// Install the global subscriber, appending to `path`.
/// `RUST_LOG` directives are honoured on top of the defaults.
pub fn init(path: &Path) -> Result<(), SyncError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| SyncError::Logging(format!("{}: {}", path.display(), e)))?;

    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(parse_directive("playersync_core=info")?)
        .add_directive(parse_directive("playersync=info")?);

    TRACING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_ansi(false)
            .with_target(false)
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .init();
    });

    Ok(())
}

fn parse_directive(directive: &str) -> Result<tracing_subscriber::filter::Directive, SyncError> {
    directive
        .parse()
        .map_err(|e| SyncError::Logging(format!("{}: {}", directive, e)))
}
