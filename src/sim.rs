// Simulation - Deterministic host loop and recording audio clock
//
// Drives a metronome on simulated time: no audio device, no sleeping.
// Timers can fire late by a seeded random amount to mimic a preemptible
// host scheduler.

use crate::audio::clock::{AudioClock, ClickType, ClockProvider};
use crate::config::MetronomeConfig;
use crate::error::{MetronomeError, MetronomeResult};
use crate::handle::MetronomeHandle;
use crate::host::{HostClock, SimulatedHostClock};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::rc::Rc;

/// A click handed to a simulated audio clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickRecord {
    /// Index of the clock (session) that received it, from 0
    pub session: usize,
    /// Requested time on that session's clock
    pub clock_time: f64,
    /// Requested time on the host timeline
    pub host_time: f64,
    /// Session clock time when the click was dispatched
    pub dispatched_at: f64,
    pub click: ClickType,
    /// Silenced by `cancel_scheduled` before it started
    pub cancelled: bool,
}

#[derive(Debug)]
struct ProviderState {
    available: bool,
    acquired: usize,
    released: usize,
    clicks: Vec<ClickRecord>,
}

/// Clock provider handing out simulated clocks and recording what they do.
/// Clones share the same record.
#[derive(Debug, Clone)]
pub struct SimulatedClockProvider {
    host: SimulatedHostClock,
    state: Rc<RefCell<ProviderState>>,
}

impl SimulatedClockProvider {
    pub fn new(host: SimulatedHostClock) -> Self {
        Self {
            host,
            state: Rc::new(RefCell::new(ProviderState {
                available: true,
                acquired: 0,
                released: 0,
                clicks: Vec::new(),
            })),
        }
    }

    /// Make acquisition fail (as before a user gesture unlocks audio)
    pub fn set_available(&self, available: bool) {
        self.state.borrow_mut().available = available;
    }

    /// Clocks handed out so far
    pub fn acquired(&self) -> usize {
        self.state.borrow().acquired
    }

    /// Clocks dropped so far
    pub fn released(&self) -> usize {
        self.state.borrow().released
    }

    pub fn live_clocks(&self) -> usize {
        let state = self.state.borrow();
        state.acquired - state.released
    }

    /// Every click dispatched, including cancelled ones
    pub fn clicks(&self) -> Vec<ClickRecord> {
        self.state.borrow().clicks.clone()
    }

    /// Clicks that were (or will be) heard
    pub fn sounded_clicks(&self) -> Vec<ClickRecord> {
        self.state
            .borrow()
            .clicks
            .iter()
            .filter(|c| !c.cancelled)
            .copied()
            .collect()
    }
}

impl ClockProvider for SimulatedClockProvider {
    fn acquire(&mut self) -> MetronomeResult<Box<dyn AudioClock>> {
        let mut state = self.state.borrow_mut();
        if !state.available {
            return Err(MetronomeError::Capability(
                "audio output locked until user gesture".to_string(),
            ));
        }
        let session = state.acquired;
        state.acquired += 1;
        Ok(Box::new(SimulatedClock {
            host: self.host.clone(),
            origin: self.host.now(),
            session,
            state: Rc::clone(&self.state),
        }))
    }
}

struct SimulatedClock {
    host: SimulatedHostClock,
    origin: f64,
    session: usize,
    state: Rc<RefCell<ProviderState>>,
}

impl AudioClock for SimulatedClock {
    fn now(&self) -> f64 {
        self.host.now() - self.origin
    }

    fn schedule_click(&mut self, at: f64, click: ClickType) {
        let record = ClickRecord {
            session: self.session,
            clock_time: at,
            host_time: self.origin + at,
            dispatched_at: self.now(),
            click,
            cancelled: false,
        };
        self.state.borrow_mut().clicks.push(record);
    }

    fn cancel_scheduled(&mut self) {
        let now = self.now();
        let session = self.session;
        for record in self.state.borrow_mut().clicks.iter_mut() {
            if record.session == session && record.clock_time > now {
                record.cancelled = true;
            }
        }
    }
}

impl Drop for SimulatedClock {
    fn drop(&mut self) {
        self.state.borrow_mut().released += 1;
    }
}

/// Beat indicator updates with the host time they arrived at
#[derive(Debug, Clone, Default)]
pub struct BeatLog {
    entries: Rc<RefCell<Vec<(f64, Option<usize>)>>>,
}

impl BeatLog {
    pub fn entries(&self) -> Vec<(f64, Option<usize>)> {
        self.entries.borrow().clone()
    }

    /// Beat indices only, `None` signals dropped
    pub fn beats(&self) -> Vec<usize> {
        self.entries.borrow().iter().filter_map(|(_, b)| *b).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

/// Simulated host event loop
pub struct Simulation {
    host: SimulatedHostClock,
    provider: SimulatedClockProvider,
    jitter: Option<(StdRng, f64)>,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation {
    pub fn new() -> Self {
        let host = SimulatedHostClock::new();
        let provider = SimulatedClockProvider::new(host.clone());
        Self {
            host,
            provider,
            jitter: None,
        }
    }

    /// Timers fire up to `max_late` seconds after their deadline
    pub fn with_jitter(seed: u64, max_late: f64) -> Self {
        let mut sim = Self::new();
        sim.jitter = Some((StdRng::seed_from_u64(seed), max_late.max(0.0)));
        sim
    }

    pub fn host_clock(&self) -> SimulatedHostClock {
        self.host.clone()
    }

    pub fn provider(&self) -> SimulatedClockProvider {
        self.provider.clone()
    }

    pub fn now(&self) -> f64 {
        self.host.now()
    }

    pub fn create_handle(&self, tempo: i64) -> MetronomeHandle {
        self.create_handle_with_config(tempo, MetronomeConfig::default())
    }

    pub fn create_handle_with_config(&self, tempo: i64, config: MetronomeConfig) -> MetronomeHandle {
        MetronomeHandle::create(
            tempo,
            Box::new(self.provider.clone()),
            Rc::new(self.host.clone()),
            config,
        )
    }

    /// Register a listener logging every beat update with its host time
    pub fn record_beats(&self, handle: &mut MetronomeHandle) -> BeatLog {
        let log = BeatLog::default();
        let entries = Rc::clone(&log.entries);
        let host = self.host.clone();
        handle.on_beat(move |beat| entries.borrow_mut().push((host.now(), beat)));
        log
    }

    /// Fire the handle's timers with deadlines before `target`, then leave
    /// time at `target`. Timers due exactly at `target` stay pending.
    pub fn run_until(&mut self, handle: &mut MetronomeHandle, target: f64) {
        while let Some(deadline) = handle.next_deadline() {
            if deadline >= target {
                break;
            }
            let late = match self.jitter.as_mut() {
                Some((rng, max_late)) if *max_late > 0.0 => rng.gen_range(0.0..*max_late),
                _ => 0.0,
            };
            self.host.set(deadline + late);
            handle.pump();
        }
        self.host.set(target);
    }

    pub fn advance(&mut self, handle: &mut MetronomeHandle, delta: f64) {
        let target = self.now() + delta;
        self.run_until(handle, target);
    }
}
