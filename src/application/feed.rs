//! Event Feed
//!
//! Append-only event history plus the latest status snapshot. Subscribers get
//! events over a broadcast channel; optional file sinks mirror both for
//! out-of-process dashboards (events as JSON lines, status as one JSON file).

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex, RwLock};

use crate::domain::{EngineEvent, EngineStatus};

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Feed I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Feed serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub struct EventFeed {
    history: RwLock<Vec<EngineEvent>>,
    sender: broadcast::Sender<EngineEvent>,
    events_writer: Option<Mutex<BufWriter<File>>>,
    status_file: Option<PathBuf>,
    latest_status: RwLock<Option<EngineStatus>>,
}

impl Default for EventFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl EventFeed {
    /// In-memory only
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            history: RwLock::new(Vec::new()),
            sender,
            events_writer: None,
            status_file: None,
            latest_status: RwLock::new(None),
        }
    }

    /// Append every published event to `path` as one JSON line
    pub fn with_events_file(mut self, path: &Path) -> Result<Self, FeedError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        tracing::info!("Writing events to {}", path.display());
        self.events_writer = Some(Mutex::new(BufWriter::new(file)));
        Ok(self)
    }

    /// Rewrite `path` with every status update
    pub fn with_status_file(mut self, path: &Path) -> Self {
        tracing::info!("Writing status snapshots to {}", path.display());
        self.status_file = Some(path.to_path_buf());
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    /// Record events in order. History and subscribers are updated even when
    /// the file sink fails.
    pub async fn publish(&self, events: &[EngineEvent]) -> Result<(), FeedError> {
        if events.is_empty() {
            return Ok(());
        }

        self.history.write().await.extend_from_slice(events);
        for event in events {
            // No receivers is not an error
            let _ = self.sender.send(event.clone());
        }

        if let Some(writer) = &self.events_writer {
            let mut writer = writer.lock().await;
            for event in events {
                let json = serde_json::to_string(event)?;
                writeln!(writer, "{}", json)?;
            }
            writer.flush()?;
        }

        Ok(())
    }

    pub async fn events(&self) -> Vec<EngineEvent> {
        self.history.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.history.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.history.read().await.is_empty()
    }

    /// Store the snapshot and mirror it to the status file
    pub async fn update_status(&self, status: EngineStatus) -> Result<(), FeedError> {
        if let Some(path) = &self.status_file {
            write_json_atomic(path, &status)?;
        }
        *self.latest_status.write().await = Some(status);
        Ok(())
    }

    pub async fn latest_status(&self) -> Option<EngineStatus> {
        self.latest_status.read().await.clone()
    }
}

/// Write through a sibling temp file so readers never see a partial snapshot
fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), FeedError> {
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(value)?;
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Read a JSONL event log. Malformed lines are skipped with a warning.
pub fn read_events_file(path: &Path) -> Result<Vec<EngineEvent>, FeedError> {
    let reader = BufReader::new(File::open(path)?);
    let mut events = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<EngineEvent>(&line) {
            Ok(event) => events.push(event),
            Err(e) => tracing::warn!("Skipping malformed event on line {}: {}", index + 1, e),
        }
    }

    Ok(events)
}
