// Audio clock - Precise time base and sample-accurate click dispatch
//
// The scheduler decides *when* to dispatch on a coarse timer, but the sound
// itself is placed by the clock at the exact requested time. A clock lives
// for one running session and releases its resources when dropped.

use crate::error::MetronomeResult;
use crate::host::HostClock;
use std::rc::Rc;

/// Metronome click type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickType {
    /// Click on first beat of bar (accent/downbeat)
    Accent,
    /// Click on other beats
    Regular,
}

impl ClickType {
    pub fn for_accent(is_accent: bool) -> Self {
        if is_accent {
            ClickType::Accent
        } else {
            ClickType::Regular
        }
    }
}

/// Whether a running session produces sound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioStatus {
    Audible,
    /// No audio clock could be acquired; beats are still tracked and shown
    Silent,
}

/// Monotonic, sub-millisecond time source able to place sounds precisely
pub trait AudioClock {
    /// Seconds elapsed since this clock was created
    fn now(&self) -> f64;

    /// Fire-and-forget: sound `click` exactly at clock time `at`
    fn schedule_click(&mut self, at: f64, click: ClickType);

    /// Silence clicks dispatched but not yet finished
    fn cancel_scheduled(&mut self);

    fn status(&self) -> AudioStatus {
        AudioStatus::Audible
    }
}

/// Creates a fresh audio clock for each running session
pub trait ClockProvider {
    /// Fails with `MetronomeError::Capability` when audio is unavailable
    fn acquire(&mut self) -> MetronomeResult<Box<dyn AudioClock>>;
}

/// Clock with no audio output, timed from the host clock.
/// Keeps the beat indicator alive when audio cannot start.
pub struct SilentClock {
    host: Rc<dyn HostClock>,
    origin: f64,
}

impl SilentClock {
    pub fn new(host: Rc<dyn HostClock>) -> Self {
        let origin = host.now();
        Self { host, origin }
    }
}

impl AudioClock for SilentClock {
    fn now(&self) -> f64 {
        self.host.now() - self.origin
    }

    fn schedule_click(&mut self, _at: f64, _click: ClickType) {}

    fn cancel_scheduled(&mut self) {}

    fn status(&self) -> AudioStatus {
        AudioStatus::Silent
    }
}
