//! Core domain types for workout sessions.
//!
//! This module defines the fundamental types used throughout the system:
//! - Workout structure (exercise, rest and group blocks)
//! - The flattened block sequence the session engine walks
//! - Session status and observable snapshots
//! - Per-set performance logs
//!
//! JSON field names follow the document store's camelCase shape.

use serde::{Deserialize, Serialize};

// ============================================================================
// Set Types
// ============================================================================

/// What a set's target value measures
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SetMetric {
    #[default]
    Reps,
    /// Seconds
    Time,
    /// Meters
    Distance,
}

/// A single target set within an exercise block
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSet {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub metric: SetMetric,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

// ============================================================================
// Block Types
// ============================================================================

/// An exercise performed for one or more sets
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseBlock {
    pub id: String,
    pub exercise_id: String,
    pub sets: Vec<WorkoutSet>,
    /// Rest between consecutive sets, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_between_sets: Option<u32>,
}

/// A standalone rest period
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RestBlock {
    pub id: String,
    /// Seconds
    pub duration: u32,
}

/// A superset or circuit of exercise blocks
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupBlock {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_rounds")]
    pub rounds: u32,
    pub blocks: Vec<ExerciseBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_between_rounds: Option<u32>,
}

fn default_rounds() -> u32 {
    1
}

/// One top-level unit of a workout's structure
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkoutBlock {
    Exercise(ExerciseBlock),
    Rest(RestBlock),
    Group(GroupBlock),
}

impl WorkoutBlock {
    pub fn id(&self) -> &str {
        match self {
            WorkoutBlock::Exercise(b) => &b.id,
            WorkoutBlock::Rest(b) => &b.id,
            WorkoutBlock::Group(b) => &b.id,
        }
    }
}

/// A complete workout definition, supplied by the caller
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub blocks: Vec<WorkoutBlock>,
}

/// An entry of the flattened sequence: groups never appear here
#[derive(Clone, Debug, PartialEq)]
pub enum FlatBlock {
    Exercise(ExerciseBlock),
    Rest(RestBlock),
}

impl FlatBlock {
    pub fn id(&self) -> &str {
        match self {
            FlatBlock::Exercise(b) => &b.id,
            FlatBlock::Rest(b) => &b.id,
        }
    }

    /// Get the exercise block (returns None for rest blocks)
    pub fn as_exercise(&self) -> Option<&ExerciseBlock> {
        match self {
            FlatBlock::Exercise(b) => Some(b),
            FlatBlock::Rest(_) => None,
        }
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, FlatBlock::Rest(_))
    }
}

// ============================================================================
// Session Types
// ============================================================================

/// Lifecycle status of a session
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Idle,
    Exercising,
    Resting,
    Finished,
}

/// How a session reached `Finished`
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    /// Advancement ran past the last block
    Completed,
    /// `end()` was called before the last block
    EndedEarly,
}

/// Reported reps and weight for every set of one exercise block
///
/// Both vectors have one slot per set; `None` means not yet reported.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct SetLog {
    pub reps: Vec<Option<u32>>,
    pub weight: Vec<Option<f64>>,
}

impl SetLog {
    /// Null-filled log sized for `sets` slots
    pub fn with_slots(sets: usize) -> Self {
        Self {
            reps: vec![None; sets],
            weight: vec![None; sets],
        }
    }

    pub fn len(&self) -> usize {
        self.reps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reps.is_empty()
    }
}

/// Point-in-time view of a session, handed to observers
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub block_index: usize,
    pub total_blocks: usize,
    pub current_block: Option<FlatBlock>,
    pub next_block: Option<FlatBlock>,
    pub set_index: usize,
    /// Remaining rest seconds, only while resting
    pub timer: Option<u32>,
    pub progress: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tagged_blocks() {
        let json = r#"{
            "id": "w1",
            "name": "Push day",
            "blocks": [
                {"type": "exercise", "id": "e1", "exerciseId": "bench_press",
                 "sets": [{"value": 10}, {"id": "s2", "metric": "reps", "value": 8, "weight": 60}],
                 "restBetweenSets": 90},
                {"type": "rest", "id": "r1", "duration": 120},
                {"type": "group", "id": "g1", "name": "Finisher",
                 "blocks": [{"type": "exercise", "id": "e2", "exerciseId": "pushup", "sets": [{"value": 15}]}]}
            ]
        }"#;

        let workout: Workout = serde_json::from_str(json).unwrap();
        assert_eq!(workout.blocks.len(), 3);
        assert_eq!(workout.description, "");

        match &workout.blocks[0] {
            WorkoutBlock::Exercise(b) => {
                assert_eq!(b.exercise_id, "bench_press");
                assert_eq!(b.rest_between_sets, Some(90));
                assert_eq!(b.sets[0].metric, SetMetric::Reps);
                assert_eq!(b.sets[1].weight, Some(60.0));
            }
            other => panic!("Expected exercise block, got {:?}", other),
        }

        match &workout.blocks[2] {
            WorkoutBlock::Group(g) => {
                assert_eq!(g.rounds, 1);
                assert_eq!(g.rest_between_rounds, None);
            }
            other => panic!("Expected group block, got {:?}", other),
        }
    }

    #[test]
    fn test_block_ids() {
        let rest = WorkoutBlock::Rest(RestBlock {
            id: "r1".into(),
            duration: 30,
        });
        assert_eq!(rest.id(), "r1");

        let flat = FlatBlock::Rest(RestBlock {
            id: "r1".into(),
            duration: 30,
        });
        assert!(flat.is_rest());
        assert!(flat.as_exercise().is_none());
    }

    #[test]
    fn test_set_log_slots() {
        let log = SetLog::with_slots(3);
        assert_eq!(log.len(), 3);
        assert!(log.reps.iter().all(Option::is_none));
        assert!(log.weight.iter().all(Option::is_none));
        assert!(SetLog::default().is_empty());
    }
}
