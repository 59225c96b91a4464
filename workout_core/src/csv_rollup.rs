//! CSV rollup for archiving the session journal.
//!
//! Each journal record is flattened to one CSV row per set so the archive
//! can be opened in a spreadsheet. The conversion is append-then-rename so a
//! crash never loses sessions.

use crate::wal::SessionRecord;
use crate::{Result, SessionOutcome};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV archive: one set of one session
///
/// Sessions that finished without any exercise blocks get a single row with
/// empty block columns so they still appear in history.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CsvRow {
    pub session_id: String,
    pub workout_id: String,
    pub workout_name: String,
    pub started_at: String,
    pub finished_at: String,
    pub outcome: SessionOutcome,
    pub block_id: Option<String>,
    pub exercise_id: Option<String>,
    pub set_index: Option<usize>,
    pub reps: Option<u32>,
    pub weight: Option<f64>,
}

fn rows_for(record: &SessionRecord) -> Vec<CsvRow> {
    let base = |block_id: Option<String>,
                exercise_id: Option<String>,
                set_index: Option<usize>,
                reps: Option<u32>,
                weight: Option<f64>| CsvRow {
        session_id: record.id.to_string(),
        workout_id: record.workout_id.clone(),
        workout_name: record.workout_name.clone(),
        started_at: record.started_at.to_rfc3339(),
        finished_at: record.finished_at.to_rfc3339(),
        outcome: record.outcome,
        block_id,
        exercise_id,
        set_index,
        reps,
        weight,
    };

    let mut rows = Vec::new();
    for block in &record.blocks {
        for (set_index, reps) in block.reps.iter().enumerate() {
            rows.push(base(
                Some(block.block_id.clone()),
                Some(block.exercise_id.clone()),
                Some(set_index),
                *reps,
                block.weight.get(set_index).copied().flatten(),
            ));
        }
    }

    if rows.is_empty() {
        rows.push(base(None, None, None, None, None));
    }
    rows
}

/// Roll up journal records into CSV and archive the journal atomically
///
/// This function:
/// 1. Reads all records from the journal
/// 2. Appends one row per set to the CSV file (creates with headers if needed)
/// 3. Syncs the CSV to disk
/// 4. Renames the journal to `.processed`
/// 5. Returns the number of sessions processed
pub fn journal_to_csv_and_archive(journal_path: &Path, csv_path: &Path) -> Result<usize> {
    let records = crate::wal::read_records(journal_path)?;

    if records.is_empty() {
        tracing::info!("No sessions in journal to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    // Only a brand-new file gets a header row
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    let mut row_count = 0;
    for record in &records {
        for row in rows_for(record) {
            writer.serialize(row)?;
            row_count += 1;
        }
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!(
        "Wrote {} sessions ({} rows) to CSV",
        records.len(),
        row_count
    );

    let processed_path = processed_path_for(journal_path);
    std::fs::rename(journal_path, &processed_path)?;

    tracing::info!("Archived journal to {:?}", processed_path);

    Ok(records.len())
}

fn processed_path_for(journal_path: &Path) -> std::path::PathBuf {
    let mut name = journal_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".processed");
    journal_path.with_file_name(name)
}

/// Clean up archived journals
///
/// This removes all `*.processed` files in the given directory.
pub fn cleanup_processed(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.extension().is_some_and(|ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed processed journal: {:?}", path);
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed journal files", count);
    }

    Ok(count)
}
