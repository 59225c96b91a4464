//! Staging buffer for reported set performance.

use crate::{FlatBlock, SetLog};
use std::collections::HashMap;

/// Raw reps/weight reported per set, keyed by exercise block id
///
/// Entries are created up front for every exercise block, never lazily.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PerformanceRecorder {
    entries: HashMap<String, SetLog>,
}

impl PerformanceRecorder {
    /// Pre-size one null-filled entry per exercise block
    ///
    /// Blocks sharing an id share one entry, sized for the larger of them.
    pub fn for_blocks(blocks: &[FlatBlock]) -> Self {
        let mut entries: HashMap<String, SetLog> = HashMap::new();

        for block in blocks.iter().filter_map(FlatBlock::as_exercise) {
            let slots = block.sets.len();
            match entries.get_mut(&block.id) {
                Some(existing) => {
                    tracing::warn!(
                        "Exercise block id {} appears more than once; sets will share one entry",
                        block.id
                    );
                    if existing.len() < slots {
                        *existing = SetLog::with_slots(slots);
                    }
                }
                None => {
                    entries.insert(block.id.clone(), SetLog::with_slots(slots));
                }
            }
        }

        Self { entries }
    }

    /// Write one slot; returns false if the block or set does not exist
    pub fn record(
        &mut self,
        block_id: &str,
        set_index: usize,
        reps: Option<u32>,
        weight: Option<f64>,
    ) -> bool {
        let Some(log) = self.entries.get_mut(block_id) else {
            tracing::warn!("No performance entry for block {}", block_id);
            return false;
        };

        if set_index >= log.len() {
            tracing::warn!(
                "Set {} out of range for block {} ({} sets)",
                set_index,
                block_id,
                log.len()
            );
            return false;
        }

        log.reps[set_index] = reps;
        log.weight[set_index] = weight;
        true
    }

    pub fn get(&self, block_id: &str) -> Option<&SetLog> {
        self.entries.get(block_id)
    }

    pub fn all(&self) -> &HashMap<String, SetLog> {
        &self.entries
    }
}
