// Host clock - Wall-clock time driving the coarse timers
// Monotonic seconds; never used for sound placement

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Monotonic wall-clock source for the host event loop
pub trait HostClock {
    /// Seconds since an arbitrary fixed origin
    fn now(&self) -> f64;
}

/// Host clock backed by `std::time::Instant`
#[derive(Debug, Clone, Copy)]
pub struct SystemHostClock {
    origin: Instant,
}

impl SystemHostClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemHostClock {
    fn default() -> Self {
        Self::new()
    }
}

impl HostClock for SystemHostClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Host clock whose time only moves when told to.
/// Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct SimulatedHostClock {
    now: Rc<Cell<f64>>,
}

impl SimulatedHostClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward. Going backwards is ignored (monotonic).
    pub fn set(&self, time: f64) {
        if time > self.now.get() {
            self.now.set(time);
        }
    }

    pub fn advance(&self, delta: f64) {
        self.set(self.now.get() + delta);
    }
}

impl HostClock for SimulatedHostClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}
