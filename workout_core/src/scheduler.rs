//! Countdown scheduling for rest periods.
//!
//! The engine never sleeps or spawns anything. Instead it asks an injected
//! [`TickScheduler`] to start or stop delivering ticks, and the host calls
//! `SessionEngine::tick` once per interval. Tests drive ticks by hand with
//! [`ManualTicker`].

use std::time::Duration;

/// Default tick granularity
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Host-side timing source
pub trait TickScheduler {
    /// Begin delivering ticks every `interval`
    fn register_tick(&mut self, interval: Duration);

    /// Stop delivering ticks
    fn cancel_tick(&mut self);
}

/// Tick source for hosts and tests that call `tick()` themselves
///
/// Records registrations so callers can assert the engine never runs two
/// timers at once.
#[derive(Clone, Debug, Default)]
pub struct ManualTicker {
    running: bool,
    registrations: usize,
    cancellations: usize,
    interval: Option<Duration>,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a tick registration is currently live
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn registrations(&self) -> usize {
        self.registrations
    }

    pub fn cancellations(&self) -> usize {
        self.cancellations
    }

    /// Interval of the most recent registration
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }
}

impl TickScheduler for ManualTicker {
    fn register_tick(&mut self, interval: Duration) {
        debug_assert!(!self.running, "tick registered while another is live");
        self.running = true;
        self.registrations += 1;
        self.interval = Some(interval);
    }

    fn cancel_tick(&mut self) {
        self.running = false;
        self.cancellations += 1;
    }
}

/// Single rest countdown owned by a session
///
/// At most one countdown is active. Expiry is reported exactly once per
/// `arm`; ticks while inactive do nothing.
#[derive(Debug)]
pub struct Countdown<S: TickScheduler> {
    scheduler: S,
    interval: Duration,
    remaining: u32,
    active: bool,
}

impl<S: TickScheduler> Countdown<S> {
    pub fn new(scheduler: S, interval: Duration) -> Self {
        Self {
            scheduler,
            interval,
            remaining: 0,
            active: false,
        }
    }

    /// Start counting down from `seconds`, replacing any live countdown
    pub fn arm(&mut self, seconds: u32) {
        self.cancel();
        self.remaining = seconds;
        self.active = true;
        self.scheduler.register_tick(self.interval);
        tracing::debug!("Countdown armed for {}s", seconds);
    }

    /// Advance one tick; returns true when this tick expired the countdown
    pub fn tick(&mut self) -> bool {
        if !self.active {
            return false;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.deactivate();
            return true;
        }
        false
    }

    /// Force the remaining time to zero; returns true if a countdown was live
    pub fn expire(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.remaining = 0;
        self.deactivate();
        true
    }

    /// Stop without reporting expiry. Safe to call when nothing is armed.
    pub fn cancel(&mut self) {
        if self.active {
            self.deactivate();
            tracing::debug!("Countdown cancelled with {}s left", self.remaining);
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.scheduler.cancel_tick();
    }
}
