//! Decay timer and the scheduling seam to the host.
//!
//! The engine decides when the timer runs; a [`TimerDriver`] supplied by the
//! host does the actual scheduling and feeds `Event::Tick` back. No internal
//! thread is ever spawned.

/// Host scheduling primitive for the repeating decay timer
pub trait TimerDriver {
    fn start_repeating(&mut self, interval_ms: u64);
    fn stop(&mut self);
}

/// Driver for hosts that poll [`crate::DrainEngine::timer_running`] instead
/// of being told.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullDriver;

impl TimerDriver for NullDriver {
    fn start_repeating(&mut self, _interval_ms: u64) {}
    fn stop(&mut self) {}
}

/// Deterministic driver over a virtual millisecond clock.
///
/// Each start restarts the phase. Leftover time carries between
/// [`VirtualTimer::advance`] calls while running and is discarded on stop.
#[derive(Clone, Debug, Default)]
pub struct VirtualTimer {
    interval_ms: u64,
    running: bool,
    phase_ms: u64,
}

impl VirtualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward, returning the number of ticks that fell due.
    pub fn advance(&mut self, ms: u64) -> u64 {
        if !self.running || self.interval_ms == 0 {
            return 0;
        }
        self.phase_ms = self.phase_ms.saturating_add(ms);
        let due = self.phase_ms / self.interval_ms;
        self.phase_ms %= self.interval_ms;
        due
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl TimerDriver for VirtualTimer {
    fn start_repeating(&mut self, interval_ms: u64) {
        self.interval_ms = interval_ms;
        self.running = true;
        self.phase_ms = 0;
    }

    fn stop(&mut self) {
        self.running = false;
        self.phase_ms = 0;
    }
}

/// The engine's view of the decay timer: a running flag kept in step with
/// the host driver.
#[derive(Clone, Debug)]
pub struct DrainTimer<D> {
    driver: D,
    interval_ms: u64,
    running: bool,
}

impl<D: TimerDriver> DrainTimer<D> {
    pub fn new(driver: D, interval_ms: u64) -> Self {
        Self {
            driver,
            interval_ms,
            running: false,
        }
    }

    /// Start if stopped. A running timer keeps its phase.
    pub fn resume(&mut self) {
        if !self.running {
            self.running = true;
            self.driver.start_repeating(self.interval_ms);
            tracing::debug!("Drain timer started ({} ms)", self.interval_ms);
        }
    }

    /// Stop if running. Idempotent.
    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            self.driver.stop();
            tracing::debug!("Drain timer stopped");
        }
    }

    pub fn toggle(&mut self) {
        if self.running {
            self.stop();
        } else {
            self.resume();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}
