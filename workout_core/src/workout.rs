//! Loading and structural validation of workout documents.
//!
//! Validation only looks at structure. Exercise ids are never checked
//! against the catalog; an unknown id is a rendering fallback, not an error.

use crate::{Error, Result, Workout, WorkoutBlock};
use std::collections::HashSet;
use std::path::Path;

impl Workout {
    /// Parse a workout from a JSON document
    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Load a workout from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let workout = Self::from_json(&contents)?;
        tracing::info!(
            "Loaded workout {} ({} blocks) from {:?}",
            workout.id,
            workout.blocks.len(),
            path
        );
        Ok(workout)
    }

    /// Load a workout and refuse it if it has structural problems
    pub fn load_validated(path: &Path) -> Result<Self> {
        let workout = Self::load(path)?;
        let errors = workout.validate();
        if !errors.is_empty() {
            return Err(Error::WorkoutValidation(errors.join("; ")));
        }
        Ok(workout)
    }

    /// Check workout structure; returns a list of problems
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen_ids = HashSet::new();

        if self.blocks.is_empty() {
            errors.push(format!("Workout '{}' has no blocks", self.id));
        }

        let mut check_id = |id: &str, errors: &mut Vec<String>| {
            if id.trim().is_empty() {
                errors.push("Block with an empty id".to_string());
            } else if !seen_ids.insert(id.to_string()) {
                errors.push(format!("Duplicate block id '{}'", id));
            }
        };

        for block in &self.blocks {
            check_id(block.id(), &mut errors);

            match block {
                WorkoutBlock::Exercise(exercise) => {
                    if exercise.sets.is_empty() {
                        errors.push(format!("Exercise block '{}' has no sets", exercise.id));
                    }
                }
                WorkoutBlock::Rest(_) => {}
                WorkoutBlock::Group(group) => {
                    if group.rounds == 0 {
                        errors.push(format!("Group '{}' must have at least 1 round", group.id));
                    }
                    if group.blocks.is_empty() {
                        errors.push(format!("Group '{}' has no exercise blocks", group.id));
                    }
                    for child in &group.blocks {
                        check_id(&child.id, &mut errors);
                        if child.sets.is_empty() {
                            errors.push(format!(
                                "Exercise block '{}' in group '{}' has no sets",
                                child.id, group.id
                            ));
                        }
                    }
                }
            }
        }

        errors
    }
}
