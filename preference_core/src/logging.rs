//! Tracing setup and the JSON line-delimited training journal.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::model::ModelKind;

/// Environment variable read by [`init_tracing`].
pub const LOG_ENV: &str = "PREFERENCE_LOG";

/// Install a fmt subscriber filtered by `PREFERENCE_LOG` (default `info`).
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

fn append_json_line<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    serde_json::to_writer(&mut file, value).map_err(io::Error::other)?;
    file.write_all(b"\n")
}

/// One completed trial as written to the journal.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrainingLogEntry {
    pub model: ModelKind,
    pub training_count: usize,
    /// Examples the model has taken since its last reset
    pub examples_seen: usize,
    pub loss: f32,
    pub accuracy: f32,
    pub preferred: [u8; 3],
    pub rejected: [u8; 3],
    pub timestamp_ms: u128,
}

impl TrainingLogEntry {
    pub fn timestamp_now() -> u128 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis()
    }
}

/// Append one trial to the journal at `path`, creating parent directories.
pub fn append_training_entry(path: &Path, entry: &TrainingLogEntry) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    append_json_line(path, entry)
}
