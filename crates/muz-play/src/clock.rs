//! Song clock kept in step with a polled audio position.
//!
//! The audio backend reports its playback position at its own granularity:
//! it can stall, jump backward or skip ahead. [`ClockSync`] advances a local
//! time by the frame delta, trusts the reported position only when it looks
//! sane, and blends corrections in gradually:
//!
//! ```text
//! local = prior + delta + (target - (prior + delta)) * delta / 1000
//! ```

/// Positions below this are trusted unconditionally (playback just started).
pub const STARTUP_GRACE_MS: i64 = 300;

/// Accumulated untrusted time after which the reported position wins.
pub const RESYNC_THRESHOLD_MS: f64 = 500.0;

/// Which rule decided the target time for a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Playback ended during this step.
    Finished,
    /// Playback had already ended; time free-runs.
    Ended,
    /// Too much drift built up; snapped to the reported position.
    Resynced,
    /// Position did not move; advanced by the frame delta.
    Interpolated,
    /// Position went backward; ignored.
    JumpedBackward,
    /// Position leapt ahead; ignored.
    JumpedForward,
    /// Early in playback; position trusted.
    Grace,
    /// Position trusted.
    Healthy,
}

#[derive(Debug, Clone)]
pub struct ClockSync {
    local_time: f64,
    last_observed: f64,
    drift: f64,
    interpolate: bool,
    finished: bool,
}

impl ClockSync {
    /// `interpolate` enables the stalled-position rule.
    pub fn new(start_ms: i64, interpolate: bool) -> Self {
        Self {
            local_time: start_ms as f64,
            last_observed: start_ms as f64,
            drift: 0.0,
            interpolate,
            finished: false,
        }
    }

    /// Move to `start_ms` after (re)starting playback. Drift is kept.
    pub fn restart(&mut self, start_ms: i64) {
        self.local_time = start_ms as f64;
        self.last_observed = start_ms as f64;
        self.finished = false;
    }

    /// Make the next step adopt the reported position.
    pub fn force_resync(&mut self) {
        self.drift = RESYNC_THRESHOLD_MS;
    }

    /// Current song time in ms.
    pub fn now(&self) -> f64 {
        self.local_time
    }

    pub fn drift(&self) -> f64 {
        self.drift
    }

    pub fn last_observed(&self) -> f64 {
        self.last_observed
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advance by `delta` ms given the audio position `observed`
    /// (negative when playback is not running).
    ///
    /// The first matching rule wins: finished, forced resync, stalled
    /// position, startup grace, backward jump, forward jump, healthy. Stalls
    /// are checked before the grace rule so a position stuck near 0 still
    /// builds drift, and adopting a grace position clears that drift.
    pub fn step(&mut self, delta: f64, observed: i64) -> SyncOutcome {
        let prior = self.local_time;
        let position = observed as f64;

        let outcome = if observed < 0 {
            self.local_time += delta;
            if self.finished {
                SyncOutcome::Ended
            } else {
                self.finished = true;
                SyncOutcome::Finished
            }
        } else if self.drift >= RESYNC_THRESHOLD_MS {
            log::debug!("forced time sync at {} ms", observed);
            self.adopt(position);
            SyncOutcome::Resynced
        } else if self.interpolate && position == self.last_observed {
            if delta > 0.0 {
                log::debug!("playback position stalled, interpolating {} ms", delta);
            }
            self.local_time += delta;
            self.drift += delta;
            SyncOutcome::Interpolated
        } else if observed < STARTUP_GRACE_MS {
            self.adopt(position);
            SyncOutcome::Grace
        } else if position < self.last_observed {
            log::debug!("playback position jumped backward ({} ms)", position - self.last_observed);
            self.hold_course(delta);
            SyncOutcome::JumpedBackward
        } else if position > prior + delta * 2.0 {
            log::debug!("playback position jumped forward ({} ms)", position - self.last_observed);
            self.hold_course(delta);
            SyncOutcome::JumpedForward
        } else {
            self.adopt(position);
            SyncOutcome::Healthy
        };

        let residual = self.local_time - (prior + delta);
        self.local_time = prior + delta + residual * (delta / 1000.0);
        outcome
    }

    fn adopt(&mut self, position: f64) {
        self.local_time = position;
        self.last_observed = position;
        self.drift = 0.0;
    }

    /// Advance from the last trusted position, ignoring the report.
    fn hold_course(&mut self, delta: f64) {
        self.last_observed += delta;
        self.local_time = self.last_observed;
        self.drift += delta;
    }
}
