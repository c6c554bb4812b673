// Conversion tracing
// Per-stage progress records, optionally appended to a JSONL file

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("Trace file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed trace line: {0}")]
    Json(#[from] serde_json::Error),
}

/// Conversion stage a trace entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    TempoMap,
    BeatGrid,
    Extract,
    Humanize,
    Resolve,
    Encode,
}

impl Stage {
    /// Every stage in pipeline order
    pub const ALL: [Stage; 6] = [
        Stage::TempoMap,
        Stage::BeatGrid,
        Stage::Extract,
        Stage::Humanize,
        Stage::Resolve,
        Stage::Encode,
    ];

    /// Fraction of the pipeline complete once this stage finishes
    pub fn progress(&self) -> f32 {
        let position = Stage::ALL.iter().position(|s| s == self).unwrap_or(0);
        (position + 1) as f32 / Stage::ALL.len() as f32
    }
}

/// A single record in the conversion trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    /// RFC 3339 timestamp of when this entry was created
    pub timestamp: String,

    pub stage: Stage,

    /// Pipeline progress [0.0, 1.0]
    pub progress: f32,

    /// Human-readable summary of the stage
    pub message: String,

    /// Stage counters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl TraceEntry {
    /// Entry stamped with the current UTC time
    pub fn new(stage: Stage, progress: f32, message: impl Into<String>) -> Self {
        TraceEntry {
            timestamp: Utc::now().to_rfc3339(),
            stage,
            progress: progress.clamp(0.0, 1.0),
            message: message.into(),
            data: None,
        }
    }

    /// Entry marking `stage` complete, with its counters attached
    pub fn completed<T: Serialize>(stage: Stage, message: impl Into<String>, data: &T) -> Self {
        let mut entry = TraceEntry::new(stage, stage.progress(), message);
        match serde_json::to_value(data) {
            Ok(value) => entry.data = Some(value),
            Err(err) => log::warn!("Failed to serialize {:?} trace data: {}", stage, err),
        }
        entry
    }

    /// One JSONL record, newline included
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self).map(|mut line| {
            line.push('\n');
            line
        })
    }
}

/// Append-only JSONL trace file
pub struct TraceWriter {
    path: PathBuf,
}

impl TraceWriter {
    pub fn new(path: PathBuf) -> Self {
        TraceWriter { path }
    }

    /// Append entries, creating the file if needed
    ///
    /// Earlier runs stay in the file, so one trace can cover a batch of songs.
    pub fn write_batch(&self, entries: &[TraceEntry]) -> Result<(), TraceError> {
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut out = BufWriter::new(file);

        for entry in entries {
            out.write_all(entry.to_json_line()?.as_bytes())?;
        }

        out.flush()?;
        log::debug!("Appended {} trace entries to {}", entries.len(), self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse every non-blank line of a JSONL trace
pub fn read_trace_file(path: &Path) -> Result<Vec<TraceEntry>, TraceError> {
    let reader = BufReader::new(File::open(path)?);

    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            entries.push(serde_json::from_str(&line)?);
        }
    }

    Ok(entries)
}
