//! Millisecond clocks shared by the recorder and the player.
//!
//! Timeline timestamps are offsets from a session start, so all a clock has to
//! provide is a monotonic millisecond reading from an arbitrary origin.

use std::cell::Cell;
use std::time::Instant;

/// Milliseconds elapsed since a session started.
pub type ElapsedMillis = u64;

/// Monotonic millisecond source.
pub trait Clock {
    /// Current reading in milliseconds. Never decreases.
    fn now_millis(&self) -> u64;
}

/// Wall clock backed by [`Instant`], counting from its creation.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Clock that only moves when told to.
///
/// Used by tests and by hosts that pace playback from their own frame
/// timestamps instead of the system clock.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward by `millis`.
    pub fn advance(&self, millis: u64) {
        self.now.set(self.now.get().saturating_add(millis));
    }

    /// Jumps to an absolute reading. Readings earlier than the current one are
    /// ignored so the clock stays monotonic.
    pub fn set(&self, millis: u64) {
        if millis > self.now.get() {
            self.now.set(millis);
        }
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.get()
    }
}
