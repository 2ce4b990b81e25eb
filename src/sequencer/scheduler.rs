// Beat scheduler - Look-ahead dispatch of metronome clicks
//
// Two clocks cooperate: a coarse, jittery host timer calls `tick()`, and each
// tick hands every beat falling inside the look-ahead window to the audio
// clock, which sounds it at the exact time. Timer jitter therefore only
// changes *when a beat is decided*, never *when it is heard*.

use super::queue::{BeatEvent, EventQueue, QueueReader};
use super::tempo::Tempo;
use crate::audio::clock::{AudioClock, AudioStatus, ClickType, ClockProvider, SilentClock};
use crate::config::MetronomeConfig;
use crate::error::MetronomeResult;
use crate::host::HostClock;
use std::rc::Rc;

/// Whether the look-ahead loop is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Running,
}

impl TransportState {
    pub fn is_running(&self) -> bool {
        matches!(self, TransportState::Running)
    }
}

/// Owns the audio clock for the current session, the beat counter and the
/// queue of dispatched beats
pub struct BeatScheduler {
    provider: Box<dyn ClockProvider>,
    host_clock: Rc<dyn HostClock>,
    clock: Option<Box<dyn AudioClock>>,
    queue: EventQueue,
    state: TransportState,

    tempo: Tempo,
    muted: bool,
    debug: bool,
    beats_per_measure: usize,
    look_ahead: f64,

    beat_counter: usize,
    next_event_time: f64,
}

impl BeatScheduler {
    pub fn new(
        provider: Box<dyn ClockProvider>,
        host_clock: Rc<dyn HostClock>,
        tempo: Tempo,
        config: &MetronomeConfig,
    ) -> Self {
        Self {
            provider,
            host_clock,
            clock: None,
            queue: EventQueue::new(),
            state: TransportState::Stopped,
            tempo,
            muted: false,
            debug: config.debug,
            beats_per_measure: config.beats_per_measure.max(1),
            look_ahead: config.look_ahead_secs,
            beat_counter: 0,
            next_event_time: 0.0,
        }
    }

    /// Acquire a fresh audio clock and begin scheduling from beat 0.
    /// No-op when already running. On capability failure nothing changes.
    pub fn start(&mut self) -> MetronomeResult<AudioStatus> {
        self.start_from(0)
    }

    /// Like `start`, continuing the measure at `beat`
    pub fn start_from(&mut self, beat: usize) -> MetronomeResult<AudioStatus> {
        if let Some(status) = self.running_status() {
            return Ok(status);
        }
        let clock = self.provider.acquire()?;
        Ok(self.begin(clock, beat))
    }

    /// Start on a clock with no audio output, timed from the host clock
    pub fn start_silent_from(&mut self, beat: usize) -> AudioStatus {
        if let Some(status) = self.running_status() {
            return status;
        }
        let clock = Box::new(SilentClock::new(Rc::clone(&self.host_clock)));
        self.begin(clock, beat)
    }

    fn running_status(&self) -> Option<AudioStatus> {
        if self.state.is_running() {
            self.clock.as_ref().map(|c| c.status())
        } else {
            None
        }
    }

    fn begin(&mut self, clock: Box<dyn AudioClock>, beat: usize) -> AudioStatus {
        let status = clock.status();
        self.next_event_time = clock.now();
        self.beat_counter = beat % self.beats_per_measure;
        self.queue.clear();
        self.clock = Some(clock);
        self.state = TransportState::Running;
        log::debug!(
            "Scheduler started at {} (beat {}, {:?})",
            self.tempo,
            self.beat_counter,
            status
        );
        status
    }

    /// Dispatch every beat inside the look-ahead window.
    /// Returns the number of beats dispatched.
    pub fn tick(&mut self) -> usize {
        if !self.state.is_running() {
            return 0;
        }
        let Some(clock) = self.clock.as_mut() else {
            return 0;
        };

        let now = clock.now();
        let horizon = now + self.look_ahead;
        let mut dispatched = 0;

        while self.next_event_time < horizon {
            let event = BeatEvent {
                beat_index: self.beat_counter,
                scheduled_time: self.next_event_time,
                is_accent: self.beat_counter == 0,
            };

            if self.queue.push(event) {
                // A beat already a full window late is counted but not sounded
                // (host stalled, e.g. backgrounded)
                let stale = event.scheduled_time < now - self.look_ahead;
                if !self.muted && !stale {
                    clock.schedule_click(event.scheduled_time, ClickType::for_accent(event.is_accent));
                }
                if stale {
                    log::debug!("Beat {} at {:.3}s is stale, not sounded", event.beat_index, event.scheduled_time);
                } else if self.debug {
                    log::debug!(
                        "Beat {} at {:.3}s (now {:.3}s, muted: {})",
                        event.beat_index,
                        event.scheduled_time,
                        now,
                        self.muted
                    );
                } else {
                    log::trace!("Beat {} at {:.3}s", event.beat_index, event.scheduled_time);
                }
                dispatched += 1;
            }

            self.beat_counter = (self.beat_counter + 1) % self.beats_per_measure;
            self.next_event_time += self.tempo.beat_duration_secs();
        }

        dispatched
    }

    /// Cancel the session: drop pending beats, silence dispatched clicks and
    /// release the audio clock. Idempotent.
    pub fn stop(&mut self) {
        if let Some(mut clock) = self.clock.take() {
            clock.cancel_scheduled();
            log::debug!("Scheduler stopped at {:.3}s", clock.now());
        }
        self.queue.clear();
        self.beat_counter = 0;
        self.state = TransportState::Stopped;
    }

    /// Affects spacing of future beats only
    pub fn set_tempo(&mut self, tempo: Tempo) {
        self.tempo = tempo;
    }

    /// Affects sound of future dispatches only; timing and counting continue
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Beat that would sound next if the session were restarted now:
    /// the first dispatched beat still in the future, else the counter
    pub fn resume_beat(&self) -> usize {
        let Some(clock) = self.clock.as_ref() else {
            return 0;
        };
        self.queue
            .first_after(clock.now())
            .map(|e| e.beat_index)
            .unwrap_or(self.beat_counter)
    }

    /// Current audio clock time, while running
    pub fn clock_now(&self) -> Option<f64> {
        self.clock.as_ref().map(|c| c.now())
    }

    pub fn reader(&self) -> QueueReader {
        self.queue.reader()
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn beat_counter(&self) -> usize {
        self.beat_counter
    }

    pub fn beats_per_measure(&self) -> usize {
        self.beats_per_measure
    }

    pub fn next_event_time(&self) -> f64 {
        self.next_event_time
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    pub fn audio_status(&self) -> Option<AudioStatus> {
        self.clock.as_ref().map(|c| c.status())
    }
}
