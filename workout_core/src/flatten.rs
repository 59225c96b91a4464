//! Flattening of nested workout structure into a linear block queue.

use crate::{FlatBlock, WorkoutBlock};

/// Expand a workout's top-level blocks into the sequence a session walks
///
/// Group blocks are replaced in place by their exercise children, in order.
/// Exercise and rest blocks pass through unchanged. A group's `rounds` and
/// `rest_between_rounds` do not repeat anything here: each child appears
/// exactly once, so every exercise block id maps to one performance entry.
pub fn flatten(blocks: &[WorkoutBlock]) -> Vec<FlatBlock> {
    let mut flat = Vec::with_capacity(blocks.len());

    for block in blocks {
        match block {
            WorkoutBlock::Exercise(exercise) => flat.push(FlatBlock::Exercise(exercise.clone())),
            WorkoutBlock::Rest(rest) => flat.push(FlatBlock::Rest(rest.clone())),
            WorkoutBlock::Group(group) => {
                if group.rounds > 1 {
                    tracing::debug!(
                        "Group {} declares {} rounds; children are flattened once",
                        group.id,
                        group.rounds
                    );
                }
                flat.extend(group.blocks.iter().cloned().map(FlatBlock::Exercise));
            }
        }
    }

    flat
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExerciseBlock, GroupBlock, RestBlock, WorkoutSet};

    fn exercise(id: &str) -> ExerciseBlock {
        ExerciseBlock {
            id: id.into(),
            exercise_id: format!("{}_movement", id),
            sets: vec![WorkoutSet {
                id: String::new(),
                metric: Default::default(),
                value: 10.0,
                weight: None,
            }],
            rest_between_sets: None,
        }
    }

    fn ids(flat: &[FlatBlock]) -> Vec<&str> {
        flat.iter().map(|b| b.id()).collect()
    }

    #[test]
    fn test_group_children_substituted_in_place() {
        let blocks = vec![
            WorkoutBlock::Exercise(exercise("a")),
            WorkoutBlock::Group(GroupBlock {
                id: "g".into(),
                name: "Superset".into(),
                rounds: 1,
                blocks: vec![exercise("b"), exercise("c")],
                rest_between_rounds: None,
            }),
            WorkoutBlock::Rest(RestBlock {
                id: "d".into(),
                duration: 60,
            }),
        ];

        let flat = flatten(&blocks);
        assert_eq!(ids(&flat), vec!["a", "b", "c", "d"]);
        assert!(flat[3].is_rest());
    }

    #[test]
    fn test_rounds_do_not_repeat_children() {
        let blocks = vec![WorkoutBlock::Group(GroupBlock {
            id: "g".into(),
            name: "Circuit".into(),
            rounds: 3,
            blocks: vec![exercise("b"), exercise("c")],
            rest_between_rounds: Some(45),
        })];

        let flat = flatten(&blocks);
        assert_eq!(ids(&flat), vec!["b", "c"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(flatten(&[]).is_empty());
    }

    #[test]
    fn test_empty_group_contributes_nothing() {
        let blocks = vec![
            WorkoutBlock::Group(GroupBlock {
                id: "g".into(),
                name: String::new(),
                rounds: 1,
                blocks: vec![],
                rest_between_rounds: None,
            }),
            WorkoutBlock::Exercise(exercise("a")),
        ];

        assert_eq!(ids(&flatten(&blocks)), vec!["a"]);
    }
}
