//! Exercise metadata lookup for the presentation layer.
//!
//! The session engine only ever handles exercise ids. Names and media links
//! live here and are consulted when rendering; a miss is never an error.

use crate::config::CustomExercise;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Display metadata for one exercise
#[derive(Clone, Debug, PartialEq)]
pub struct ExerciseInfo {
    pub id: String,
    pub name: String,
    pub media_url: Option<String>,
    pub tags: Vec<String>,
}

/// Read-only table of exercise metadata keyed by exercise id
#[derive(Clone, Debug, Default)]
pub struct ExerciseCatalog {
    pub exercises: HashMap<String, ExerciseInfo>,
}

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<ExerciseCatalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached built-in catalog
pub fn default_catalog() -> &'static ExerciseCatalog {
    &DEFAULT_CATALOG
}

/// Builds the catalog of built-in exercises
///
/// **Note**: prefer `default_catalog()` unless you need an owned copy to
/// extend with custom exercises.
pub fn build_default_catalog() -> ExerciseCatalog {
    let entries: [(&str, &str, &[&str], Option<&str>); 12] = [
        (
            "back_squat",
            "Barbell Back Squat",
            &["lower", "barbell"],
            Some("https://www.youtube.com/watch?v=ultWZbUMPL8"),
        ),
        (
            "bench_press",
            "Barbell Bench Press",
            &["upper", "push", "barbell"],
            Some("https://www.youtube.com/watch?v=rT7DgCr-3pg"),
        ),
        (
            "deadlift",
            "Conventional Deadlift",
            &["lower", "hinge", "barbell"],
            Some("https://www.youtube.com/watch?v=op9kVnSso6Q"),
        ),
        (
            "overhead_press",
            "Standing Overhead Press",
            &["upper", "push", "barbell"],
            None,
        ),
        (
            "barbell_row",
            "Bent-over Barbell Row",
            &["upper", "pull", "barbell"],
            None,
        ),
        (
            "pullup",
            "Pull-up",
            &["upper", "pull", "bodyweight"],
            Some("https://www.youtube.com/watch?v=eGo4IYlbE5g"),
        ),
        ("pushup", "Push-up", &["upper", "push", "bodyweight"], None),
        (
            "walking_lunge",
            "Walking Lunge",
            &["lower", "unilateral"],
            None,
        ),
        ("plank", "Front Plank", &["core", "isometric"], None),
        (
            "kb_swing",
            "Kettlebell Swing (2-hand)",
            &["hinge", "conditioning"],
            Some("https://www.youtube.com/watch?v=YSxHifyI6s8"),
        ),
        (
            "burpee",
            "Burpee",
            &["conditioning", "bodyweight"],
            Some("https://www.youtube.com/watch?v=TU8QYVW0gDU"),
        ),
        ("rowing_erg", "Rowing Ergometer", &["conditioning", "machine"], None),
    ];

    let exercises = entries
        .into_iter()
        .map(|(id, name, tags, url)| {
            (
                id.to_string(),
                ExerciseInfo {
                    id: id.to_string(),
                    name: name.to_string(),
                    media_url: url.map(str::to_string),
                    tags: tags.iter().map(|t| t.to_string()).collect(),
                },
            )
        })
        .collect();

    ExerciseCatalog { exercises }
}

impl ExerciseCatalog {
    pub fn lookup(&self, exercise_id: &str) -> Option<&ExerciseInfo> {
        self.exercises.get(exercise_id)
    }

    /// Human-readable name, falling back to the raw id on a miss
    pub fn display_name(&self, exercise_id: &str) -> String {
        match self.lookup(exercise_id) {
            Some(info) => info.name.clone(),
            None => {
                tracing::debug!("No metadata for exercise {}", exercise_id);
                exercise_id.to_string()
            }
        }
    }

    /// Copy of this catalog with custom exercises added (or overriding)
    pub fn with_custom(&self, custom: &[CustomExercise]) -> Self {
        let mut catalog = self.clone();
        for exercise in custom {
            catalog.exercises.insert(
                exercise.id.clone(),
                ExerciseInfo {
                    id: exercise.id.clone(),
                    name: exercise.name.clone(),
                    media_url: exercise.media_url.clone(),
                    tags: vec!["custom".into()],
                },
            );
        }
        catalog
    }

    /// Check catalog consistency; returns a list of problems
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (key, info) in &self.exercises {
            if key != &info.id {
                errors.push(format!("Exercise keyed as '{}' has id '{}'", key, info.id));
            }
            if info.name.trim().is_empty() {
                errors.push(format!("Exercise '{}' has an empty name", info.id));
            }
        }

        errors
    }
}
