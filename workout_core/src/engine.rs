//! Session state machine for walking a workout.
//!
//! A [`SessionEngine`] owns one run through a workout:
//! - Flattens the workout once on construction (and on `reset`)
//! - Tracks the current block, set, and status
//! - Arms a single rest countdown through an injected [`TickScheduler`]
//! - Stages reported reps/weight in a [`PerformanceRecorder`]
//!
//! Every operation is synchronous. Calls that make no sense in the current
//! status are ignored rather than reported as errors, so a stale UI event can
//! never break a live session.

use crate::flatten::flatten;
use crate::recorder::PerformanceRecorder;
use crate::scheduler::{Countdown, ManualTicker, TickScheduler, TICK_INTERVAL};
use crate::{FlatBlock, SessionOutcome, SessionSnapshot, SessionStatus, Workout, WorkoutSet};
use std::time::Duration;

type Observer = Box<dyn FnMut(&SessionSnapshot)>;

/// Drives one workout session from `Idle` to `Finished`
pub struct SessionEngine<S: TickScheduler = ManualTicker> {
    workout_id: String,
    blocks: Vec<FlatBlock>,
    status: SessionStatus,
    block_index: usize,
    set_index: usize,
    countdown: Countdown<S>,
    performance: PerformanceRecorder,
    outcome: Option<SessionOutcome>,
    observers: Vec<Observer>,
}

impl<S: TickScheduler> SessionEngine<S> {
    /// Create an idle session for `workout` ticking once per second
    pub fn new(workout: &Workout, scheduler: S) -> Self {
        Self::with_interval(workout, scheduler, TICK_INTERVAL)
    }

    /// Create an idle session with a custom tick interval
    ///
    /// Each tick still counts as one second of rest; the interval only tells
    /// the scheduler how often to deliver them.
    pub fn with_interval(workout: &Workout, scheduler: S, interval: Duration) -> Self {
        let blocks = flatten(&workout.blocks);
        let performance = PerformanceRecorder::for_blocks(&blocks);

        tracing::debug!(
            "Session created for workout {} ({} flattened blocks)",
            workout.id,
            blocks.len()
        );

        Self {
            workout_id: workout.id.clone(),
            blocks,
            status: SessionStatus::Idle,
            block_index: 0,
            set_index: 0,
            countdown: Countdown::new(scheduler, interval),
            performance,
            outcome: None,
            observers: Vec::new(),
        }
    }

    /// Discard all progress and reinitialize with `workout`
    ///
    /// Observers stay subscribed.
    pub fn reset(&mut self, workout: &Workout) {
        self.countdown.cancel();
        self.workout_id = workout.id.clone();
        self.blocks = flatten(&workout.blocks);
        self.performance = PerformanceRecorder::for_blocks(&self.blocks);
        self.status = SessionStatus::Idle;
        self.block_index = 0;
        self.set_index = 0;
        self.outcome = None;

        tracing::debug!("Session reset for workout {}", workout.id);
        self.notify();
    }

    // ========================================================================
    // Mutating operations
    // ========================================================================

    /// Begin the session at the first block
    pub fn start(&mut self) {
        if self.status != SessionStatus::Idle {
            tracing::debug!("Ignoring start(): session is {:?}", self.status);
            return;
        }
        if self.blocks.is_empty() {
            tracing::debug!("Ignoring start(): workout {} has no blocks", self.workout_id);
            return;
        }

        self.block_index = 0;
        self.set_index = 0;
        self.enter_current_block();

        tracing::info!("Session started for workout {}", self.workout_id);
        self.notify();
    }

    /// Record the current set and move on
    pub fn complete_set(&mut self, reps: Option<u32>, weight: Option<f64>) {
        if self.status != SessionStatus::Exercising {
            tracing::debug!("Ignoring complete_set(): session is {:?}", self.status);
            return;
        }

        let Some(FlatBlock::Exercise(block)) = self.blocks.get(self.block_index) else {
            tracing::debug!("Ignoring complete_set(): current block is not an exercise");
            return;
        };

        let block_id = block.id.clone();
        let set_count = block.sets.len();
        let rest = block.rest_between_sets.unwrap_or(0);

        self.performance
            .record(&block_id, self.set_index, reps, weight);

        tracing::debug!(
            "Completed set {} of {} in block {}",
            self.set_index + 1,
            set_count,
            block_id
        );

        if self.set_index + 1 < set_count {
            if rest > 0 {
                // Set index moves forward when the rest completes
                self.status = SessionStatus::Resting;
                self.countdown.arm(rest);
            } else {
                self.set_index += 1;
            }
        } else {
            self.advance();
        }

        self.notify();
    }

    /// End the current rest immediately
    ///
    /// Identical in effect to letting the countdown run out.
    pub fn skip_rest(&mut self) {
        if self.status != SessionStatus::Resting {
            tracing::debug!("Ignoring skip_rest(): session is {:?}", self.status);
            return;
        }

        self.countdown.expire();
        tracing::debug!("Rest skipped in block {}", self.block_index);
        self.rest_complete();
        self.notify();
    }

    /// Finish the session now, wherever it is
    pub fn end(&mut self) {
        if self.status == SessionStatus::Finished {
            tracing::debug!("Ignoring end(): session already finished");
            return;
        }

        self.finish(SessionOutcome::EndedEarly);
        self.notify();
    }

    /// One scheduler tick; counts one second off the active rest
    pub fn tick(&mut self) {
        if self.status != SessionStatus::Resting {
            return;
        }

        if self.countdown.tick() {
            tracing::debug!("Rest countdown reached zero");
            self.rest_complete();
        }
        self.notify();
    }

    /// Register a callback invoked with a snapshot after every state change
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&SessionSnapshot) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    // ========================================================================
    // Read-only state
    // ========================================================================

    pub fn workout_id(&self) -> &str {
        &self.workout_id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status == SessionStatus::Finished
    }

    /// How the session finished, once it has
    pub fn outcome(&self) -> Option<SessionOutcome> {
        self.outcome
    }

    /// The flattened block sequence
    pub fn blocks(&self) -> &[FlatBlock] {
        &self.blocks
    }

    pub fn current_block_index(&self) -> usize {
        self.block_index
    }

    pub fn current_block(&self) -> Option<&FlatBlock> {
        if self.is_finished() {
            return None;
        }
        self.blocks.get(self.block_index)
    }

    /// Peek at the block after the current one
    pub fn next_block(&self) -> Option<&FlatBlock> {
        if self.is_finished() {
            return None;
        }
        self.blocks.get(self.block_index + 1)
    }

    pub fn current_set_index(&self) -> usize {
        self.set_index
    }

    /// Target for the current set, if the current block is an exercise
    pub fn current_set(&self) -> Option<&WorkoutSet> {
        self.current_block()
            .and_then(FlatBlock::as_exercise)
            .and_then(|b| b.sets.get(self.set_index))
    }

    /// Remaining rest seconds, only while resting
    pub fn timer(&self) -> Option<u32> {
        if self.status == SessionStatus::Resting {
            Some(self.countdown.remaining())
        } else {
            None
        }
    }

    /// Position through the block sequence as a percentage
    pub fn progress(&self) -> f64 {
        if self.is_finished() {
            return 100.0;
        }
        if self.blocks.is_empty() {
            return 0.0;
        }
        (self.block_index as f64 / self.blocks.len() as f64 * 100.0).min(100.0)
    }

    pub fn performance(&self) -> &PerformanceRecorder {
        &self.performance
    }

    pub fn scheduler(&self) -> &S {
        self.countdown.scheduler()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            block_index: self.block_index,
            total_blocks: self.blocks.len(),
            current_block: self.current_block().cloned(),
            next_block: self.next_block().cloned(),
            set_index: self.set_index,
            timer: self.timer(),
            progress: self.progress(),
        }
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Move to the next flattened block
    fn advance(&mut self) {
        self.block_index += 1;
        self.set_index = 0;
        self.enter_current_block();
    }

    /// Set status for the block at `block_index`, arming rest if needed
    ///
    /// Zero-length rest blocks are passed straight through.
    fn enter_current_block(&mut self) {
        loop {
            match self.blocks.get(self.block_index) {
                None => {
                    self.finish(SessionOutcome::Completed);
                    return;
                }
                Some(FlatBlock::Rest(rest)) if rest.duration == 0 => {
                    tracing::debug!("Passing through zero-length rest {}", rest.id);
                    self.block_index += 1;
                }
                Some(FlatBlock::Rest(rest)) => {
                    let duration = rest.duration;
                    self.status = SessionStatus::Resting;
                    self.countdown.arm(duration);
                    return;
                }
                Some(FlatBlock::Exercise(_)) => {
                    self.status = SessionStatus::Exercising;
                    return;
                }
            }
        }
    }

    /// Shared path for natural expiry and skip
    fn rest_complete(&mut self) {
        match self.blocks.get(self.block_index) {
            // Rest between sets of the same block
            Some(FlatBlock::Exercise(_)) => {
                self.set_index += 1;
                self.status = SessionStatus::Exercising;
            }
            _ => self.advance(),
        }
    }

    fn finish(&mut self, outcome: SessionOutcome) {
        self.countdown.cancel();
        self.status = SessionStatus::Finished;
        self.outcome = Some(outcome);
        tracing::info!(
            "Session for workout {} finished ({:?})",
            self.workout_id,
            outcome
        );
    }

    fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for observer in self.observers.iter_mut() {
            observer(&snapshot);
        }
    }
}
