use super::event_store::check_expected_version;
use crate::common::{EventEnvelope, EventStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

/// Audit log stored as one JSON Lines file per aggregate.
///
/// Appends from this process are serialized; other processes sharing the
/// directory are not coordinated with.
pub struct FileEventStore {
    base_path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileEventStore {
    pub fn new<P: Into<PathBuf>>(base_path: P) -> Self {
        Self {
            base_path: base_path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn stream_path(&self, aggregate_id: &str) -> PathBuf {
        self.base_path.join(format!("{}.jsonl", aggregate_id))
    }

    async fn ensure_base_dir(&self) -> Result<(), String> {
        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| format!("Failed to create event log directory {}: {}", self.base_path.display(), e))
    }

    async fn read_stream(path: &Path) -> Result<Vec<EventEnvelope>, String> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(path)
            .await
            .map_err(|e| format!("Failed to open event file {}: {}", path.display(), e))?;

        let mut lines = BufReader::new(file).lines();
        let mut events = Vec::new();
        let mut line_number = 0usize;
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?
        {
            line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            let event: EventEnvelope = serde_json::from_str(&line).map_err(|e| {
                format!("Failed to deserialize event at {}:{}: {}", path.display(), line_number, e)
            })?;
            events.push(event);
        }
        Ok(events)
    }
}

#[async_trait]
impl EventStore for FileEventStore {
    async fn append_events(
        &self,
        aggregate_id: &str,
        expected_version: u64,
        events: Vec<EventEnvelope>,
    ) -> Result<(), String> {
        let _guard = self.write_lock.lock().await;
        self.ensure_base_dir().await?;

        let path = self.stream_path(aggregate_id);
        let existing = Self::read_stream(&path).await?;
        check_expected_version(aggregate_id, &existing, expected_version)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| format!("Failed to open event file {}: {}", path.display(), e))?;

        for event in events {
            let mut line = serde_json::to_string(&event)
                .map_err(|e| format!("Failed to serialize event: {}", e))?;
            line.push('\n');
            file.write_all(line.as_bytes())
                .await
                .map_err(|e| format!("Failed to write event: {}", e))?;
        }

        file.flush()
            .await
            .map_err(|e| format!("Failed to flush {}: {}", path.display(), e))
    }

    async fn load_events(
        &self,
        aggregate_id: &str,
        from_version: u64,
    ) -> Result<Vec<EventEnvelope>, String> {
        let events = Self::read_stream(&self.stream_path(aggregate_id)).await?;
        Ok(events
            .into_iter()
            .filter(|e| e.aggregate_version > from_version)
            .collect())
    }

    async fn load_events_by_type(
        &self,
        event_type: &str,
        from_timestamp: Option<DateTime<Utc>>,
    ) -> Result<Vec<EventEnvelope>, String> {
        self.ensure_base_dir().await?;

        let mut matching = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.base_path)
            .await
            .map_err(|e| format!("Failed to read directory: {}", e))?;

        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| format!("Failed to read directory entry: {}", e))?
        {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("jsonl") {
                continue;
            }
            for event in Self::read_stream(&path).await? {
                let recent_enough = from_timestamp.map_or(true, |from| event.occurred_at >= from);
                if event.event_type == event_type && recent_enough {
                    matching.push(event);
                }
            }
        }

        matching.sort_by(|a, b| a.occurred_at.cmp(&b.occurred_at));
        Ok(matching)
    }
}
