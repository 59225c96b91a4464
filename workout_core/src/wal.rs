//! Session journal for persisting finished sessions.
//!
//! Finished sessions are appended to a JSONL (JSON Lines) file with file
//! locking to ensure safe concurrent access. The engine never writes here;
//! the host builds a [`SessionRecord`] once the session is finished.

use crate::engine::SessionEngine;
use crate::scheduler::TickScheduler;
use crate::{FlatBlock, Result, SessionOutcome};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Reported performance for one exercise block
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BlockResult {
    pub block_id: String,
    pub exercise_id: String,
    pub reps: Vec<Option<u32>>,
    pub weight: Vec<Option<f64>>,
}

/// A finished session as written to the journal
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub workout_id: String,
    pub workout_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: SessionOutcome,
    /// Exercise blocks in the order the session walked them
    pub blocks: Vec<BlockResult>,
}

impl SessionRecord {
    /// Snapshot a finished engine's performance data
    ///
    /// Returns None if the session has not finished yet.
    pub fn from_engine<S: TickScheduler>(
        engine: &SessionEngine<S>,
        workout_name: &str,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Option<Self> {
        let outcome = engine.outcome()?;
        let performance = engine.performance();

        let blocks = engine
            .blocks()
            .iter()
            .filter_map(FlatBlock::as_exercise)
            .filter_map(|block| {
                performance.get(&block.id).map(|log| BlockResult {
                    block_id: block.id.clone(),
                    exercise_id: block.exercise_id.clone(),
                    reps: log.reps.clone(),
                    weight: log.weight.clone(),
                })
            })
            .collect();

        Some(SessionRecord {
            id: Uuid::new_v4(),
            workout_id: engine.workout_id().to_string(),
            workout_name: workout_name.to_string(),
            started_at,
            finished_at,
            outcome,
            blocks,
        })
    }

    /// Number of sets with reported reps
    pub fn completed_sets(&self) -> usize {
        self.blocks
            .iter()
            .map(|b| b.reps.iter().filter(|r| r.is_some()).count())
            .sum()
    }

    pub fn total_sets(&self) -> usize {
        self.blocks.iter().map(|b| b.reps.len()).sum()
    }
}

/// Session sink trait for persisting finished sessions
pub trait SessionSink {
    fn append(&mut self, record: &SessionRecord) -> Result<()>;
}

/// JSONL-based session sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    /// Create a new JSONL sink for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl SessionSink for JsonlSink {
    fn append(&mut self, record: &SessionRecord) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(record)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended session {} to journal", record.id);
        Ok(())
    }
}

/// Read all session records from a journal file
///
/// Corrupt or partial lines are skipped with a warning.
pub fn read_records(path: &Path) -> Result<Vec<SessionRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut records = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<SessionRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("Failed to parse session at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} sessions from journal", records.len());
    Ok(records)
}
