//! Session history loading across the journal and the CSV archive.
//!
//! Archived sessions are rebuilt from their per-set CSV rows so callers see
//! one `SessionRecord` type regardless of where a session currently lives.

use crate::csv_rollup::CsvRow;
use crate::wal::{BlockResult, SessionRecord};
use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use csv::ReaderBuilder;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use uuid::Uuid;

/// Largest set index accepted from a CSV row
pub const MAX_SET_INDEX: usize = 1024;

/// Load sessions finished in the last N days from both journal and CSV
///
/// Returns records sorted by `finished_at` (newest first). Sessions present
/// in both places are returned once. A `days` window chrono cannot
/// represent is a `Config` error.
pub fn load_recent_records(
    journal_path: &Path,
    csv_path: &Path,
    days: i64,
) -> Result<Vec<SessionRecord>> {
    let out_of_range = || Error::Config(format!("history window of {} days is out of range", days));
    let cutoff = Duration::try_days(days)
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .ok_or_else(out_of_range)?;
    let mut records = Vec::new();
    let mut seen_ids = HashSet::new();

    if journal_path.exists() {
        for record in crate::wal::read_records(journal_path)? {
            if record.finished_at >= cutoff && seen_ids.insert(record.id) {
                records.push(record);
            }
        }
        tracing::debug!("Loaded {} sessions from journal", records.len());
    }

    if csv_path.exists() {
        let mut csv_count = 0;
        for record in load_records_from_csv(csv_path)? {
            if record.finished_at >= cutoff && seen_ids.insert(record.id) {
                records.push(record);
                csv_count += 1;
            }
        }
        tracing::debug!("Loaded {} sessions from CSV", csv_count);
    }

    records.sort_by(|a, b| b.finished_at.cmp(&a.finished_at));

    tracing::info!(
        "Loaded {} total sessions from last {} days",
        records.len(),
        days
    );

    Ok(records)
}

fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Rebuild records from CSV rows, grouped by session id
///
/// Blocks keep the order they first appear in; each set lands at its
/// recorded index. Unparseable rows are skipped with a warning.
fn load_records_from_csv(path: &Path) -> Result<Vec<SessionRecord>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut order: Vec<Uuid> = Vec::new();
    let mut by_id: HashMap<Uuid, SessionRecord> = HashMap::new();

    for result in reader.deserialize::<CsvRow>() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!("Failed to deserialize CSV row: {}", e);
                continue;
            }
        };

        let (Ok(id), Some(started_at), Some(finished_at)) = (
            Uuid::parse_str(&row.session_id),
            parse_time(&row.started_at),
            parse_time(&row.finished_at),
        ) else {
            tracing::warn!("Skipping CSV row with invalid id or timestamps");
            continue;
        };

        let record = by_id.entry(id).or_insert_with(|| {
            order.push(id);
            SessionRecord {
                id,
                workout_id: row.workout_id.clone(),
                workout_name: row.workout_name.clone(),
                started_at,
                finished_at,
                outcome: row.outcome,
                blocks: Vec::new(),
            }
        });

        let (Some(block_id), Some(set_index)) = (row.block_id, row.set_index) else {
            continue;
        };
        let Some(slots) = set_index.checked_add(1).filter(|_| set_index <= MAX_SET_INDEX) else {
            tracing::warn!(
                "Skipping CSV row for block {} with set index {}",
                block_id,
                set_index
            );
            continue;
        };

        let position = match record.blocks.iter().position(|b| b.block_id == block_id) {
            Some(position) => position,
            None => {
                record.blocks.push(BlockResult {
                    block_id,
                    exercise_id: row.exercise_id.unwrap_or_default(),
                    reps: Vec::new(),
                    weight: Vec::new(),
                });
                record.blocks.len() - 1
            }
        };

        let block = &mut record.blocks[position];
        if block.reps.len() < slots {
            block.reps.resize(slots, None);
            block.weight.resize(slots, None);
        }
        block.reps[set_index] = row.reps;
        block.weight[set_index] = row.weight;
    }

    Ok(order
        .into_iter()
        .filter_map(|id| by_id.remove(&id))
        .collect())
}
