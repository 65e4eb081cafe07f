// ── Cover position estimator ──
//
// Openings report only a motion state, never a position. The estimator
// tracks an assumed position (0 = closed, 100 = open) by linear
// interpolation over elapsed time and tells the caller when a partial
// move must be ended with an explicit stop.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::model::OpeningState;

/// Positions at or below this are reported as closed.
const CLOSED_THRESHOLD: f64 = 5.0;

/// Full-travel durations of a cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TravelTimes {
    pub opening: Duration,
    pub closing: Duration,
}

impl Default for TravelTimes {
    fn default() -> Self {
        Self {
            opening: Duration::from_secs(30),
            closing: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Stopped,
    Opening,
    Closing,
}

/// Outcome of one estimator step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Not moving.
    Idle,
    Moving,
    /// The target was reached on this step. `needs_stop` is set when the
    /// cover would otherwise keep going to an end stop.
    Reached { needs_stop: bool },
}

#[derive(Debug, Clone)]
pub struct CoverEstimator {
    travel: TravelTimes,
    position: f64,
    target: f64,
    direction: Direction,
    last_tick: Instant,
}

impl CoverEstimator {
    /// A stopped, fully open cover.
    pub fn new(travel: TravelTimes, now: Instant) -> Self {
        Self {
            travel,
            position: 100.0,
            target: 100.0,
            direction: Direction::Stopped,
            last_tick: now,
        }
    }

    /// Start from a known position instead of fully open.
    #[must_use]
    pub fn with_position(mut self, position: f64) -> Self {
        self.position = position.clamp(0.0, 100.0);
        self.target = self.position;
        self
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// Estimated position, rounded to a whole percent.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::as_conversions
    )]
    pub fn position(&self) -> u8 {
        self.position.round().clamp(0.0, 100.0) as u8
    }

    pub fn is_closed(&self) -> bool {
        self.position <= CLOSED_THRESHOLD
    }

    /// Begin moving towards `target`. Returns the motion command to send,
    /// or `None` when the cover is already there.
    pub fn start(&mut self, target: f64, now: Instant) -> Option<OpeningState> {
        self.target = target.clamp(0.0, 100.0);
        self.last_tick = now;

        if (self.target - self.position).abs() < f64::EPSILON {
            debug!(position = self.position, "cover already at target");
            self.direction = Direction::Stopped;
            return None;
        }
        if self.target > self.position {
            self.direction = Direction::Opening;
            Some(OpeningState::Open)
        } else {
            self.direction = Direction::Closing;
            Some(OpeningState::Close)
        }
    }

    /// Advance the estimate to `now`.
    pub fn tick(&mut self, now: Instant) -> Progress {
        let elapsed = now.saturating_duration_since(self.last_tick).as_secs_f64();
        self.last_tick = now;

        match self.direction {
            Direction::Stopped => Progress::Idle,
            Direction::Opening => {
                self.position = (self.position + rate(elapsed, self.travel.opening)).min(100.0);
                if self.position >= self.target {
                    self.finish()
                } else {
                    Progress::Moving
                }
            }
            Direction::Closing => {
                self.position = (self.position - rate(elapsed, self.travel.closing)).max(0.0);
                if self.position <= self.target {
                    self.finish()
                } else {
                    Progress::Moving
                }
            }
        }
    }

    /// Record a manual stop at `now`.
    pub fn stop(&mut self, now: Instant) {
        self.tick(now);
        self.direction = Direction::Stopped;
        self.target = self.position;
    }

    /// Estimated time left until the target is reached.
    pub fn remaining(&self) -> Duration {
        let (distance, travel) = match self.direction {
            Direction::Stopped => return Duration::ZERO,
            Direction::Opening => (self.target - self.position, self.travel.opening),
            Direction::Closing => (self.position - self.target, self.travel.closing),
        };
        travel.mul_f64((distance / 100.0).max(0.0))
    }

    fn finish(&mut self) -> Progress {
        self.direction = Direction::Stopped;
        Progress::Reached {
            needs_stop: self.target > 0.0 && self.target < 100.0,
        }
    }
}

/// Percent travelled in `elapsed` seconds for a full-travel `duration`.
fn rate(elapsed: f64, duration: Duration) -> f64 {
    let full = duration.as_secs_f64();
    if full <= 0.0 {
        100.0
    } else {
        elapsed * 100.0 / full
    }
}
