use crate::governor::{DEFAULT_FPS, MAX_FPS, MIN_FPS};
use std::time::{Duration, Instant};

/// Paces ticks and guards against reentrancy. It never runs business logic
/// itself; the engine asks it whether a tick is due and brackets the tick with
/// [`TickScheduler::begin`] / [`TickScheduler::finish`].
#[derive(Debug, Clone)]
pub struct TickScheduler {
    interval: Duration,
    running: bool,
    is_ticking: bool,
    last_tick: Option<Instant>,
    dropped: u64,
    completed: u64,
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_FPS)
    }
}

impl TickScheduler {
    pub fn new(rate_hz: u32) -> Self {
        Self {
            interval: interval_for(rate_hz),
            running: true,
            is_ticking: false,
            last_tick: None,
            dropped: 0,
            completed: 0,
        }
    }

    pub fn set_rate(&mut self, rate_hz: u32) {
        self.interval = interval_for(rate_hz);
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn rate_hz(&self) -> f32 {
        1.0 / self.interval.as_secs_f32()
    }

    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            // Don't hand the first tick after a pause the whole paused span as dt.
            self.last_tick = None;
        }
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_ticking(&self) -> bool {
        self.is_ticking
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Returns the `dt` to tick with when a tick is due at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<f32> {
        if !self.running {
            return None;
        }
        match self.last_tick {
            None => {
                self.last_tick = Some(now);
                Some(self.interval.as_secs_f32())
            }
            Some(last) => {
                let since = now.saturating_duration_since(last);
                if since < self.interval {
                    return None;
                }
                self.last_tick = Some(now);
                // Clamp so a stall doesn't fling every animation forward.
                Some(since.as_secs_f32().min(self.interval.as_secs_f32() * 4.0))
            }
        }
    }

    /// Time until the next tick is due, for host loops that sleep.
    pub fn until_next(&self, now: Instant) -> Duration {
        match self.last_tick {
            Some(last) => self
                .interval
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// Enters a tick. A tick requested while one is in flight is dropped, not
    /// queued.
    pub fn begin(&mut self) -> bool {
        if !self.running {
            return false;
        }
        if self.is_ticking {
            self.dropped += 1;
            tracing::warn!(dropped = self.dropped, "tick still in flight, dropping");
            return false;
        }
        self.is_ticking = true;
        true
    }

    pub fn finish(&mut self) {
        if self.is_ticking {
            self.is_ticking = false;
            self.completed += 1;
        }
    }
}

fn interval_for(rate_hz: u32) -> Duration {
    Duration::from_secs_f32(1.0 / rate_hz.clamp(MIN_FPS, MAX_FPS) as f32)
}
