#![forbid(unsafe_code)]

//! Core domain model and session engine for lift.
//!
//! This crate provides:
//! - Workout block types and flattening
//! - The session state machine with its rest countdown
//! - Per-set performance recording
//! - Collaborators around the engine: exercise catalog, workout loading,
//!   session journal, CSV rollup, history, configuration

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod flatten;
pub mod scheduler;
pub mod recorder;
pub mod engine;
pub mod workout;
pub mod wal;
pub mod csv_rollup;
pub mod history;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{default_catalog, ExerciseCatalog, ExerciseInfo};
pub use config::Config;
pub use flatten::flatten;
pub use scheduler::{ManualTicker, TickScheduler, TICK_INTERVAL};
pub use recorder::PerformanceRecorder;
pub use engine::SessionEngine;
pub use wal::{read_records, BlockResult, JsonlSink, SessionRecord, SessionSink};
pub use history::load_recent_records;
