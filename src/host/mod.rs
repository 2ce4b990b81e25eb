// Host event loop - Wall clock and coarse timers
// Stands in for the cooperative event loop the metronome runs inside

pub mod clock;
pub mod timer;

pub use clock::{HostClock, SimulatedHostClock, SystemHostClock};
pub use timer::{TimerId, TimerQueue};
