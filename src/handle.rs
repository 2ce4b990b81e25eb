// Metronome handle - Public entry point for the surrounding application
// Supplies tempo and play/pause/mute intents, delivers the current beat

use crate::audio::clock::{AudioStatus, ClockProvider};
use crate::audio::cpal_clock::CpalClockProvider;
use crate::config::MetronomeConfig;
use crate::error::{MetronomeError, MetronomeResult};
use crate::host::{HostClock, SystemHostClock};
use crate::sequencer::tempo::Tempo;
use crate::sequencer::transport::{ControllerState, TransportController};
use std::rc::Rc;

/// Handle to one metronome session.
/// Dropping it has the same effect as `dispose()`.
pub struct MetronomeHandle {
    controller: Option<TransportController>,
    /// Last known tempo, kept readable after disposal
    tempo: Tempo,
}

impl MetronomeHandle {
    /// Create an idle metronome at `tempo` BPM (clamped to [40, 300])
    pub fn create(
        tempo: i64,
        provider: Box<dyn ClockProvider>,
        host_clock: Rc<dyn HostClock>,
        config: MetronomeConfig,
    ) -> Self {
        let tempo = Tempo::new(tempo);
        log::info!("Metronome created at {}", tempo);
        Self {
            controller: Some(TransportController::new(tempo, provider, host_clock, config)),
            tempo,
        }
    }

    /// Metronome on the configured (or default) audio output and the system clock
    pub fn with_default_audio(tempo: i64, config: MetronomeConfig) -> Self {
        let mut provider = CpalClockProvider::new(config.click.clone());
        if let Some(name) = &config.output_device {
            provider = provider.with_device(name.clone());
        }
        Self::create(tempo, Box::new(provider), Rc::new(SystemHostClock::new()), config)
    }

    /// Start clicking. A capability error leaves the metronome idle and may
    /// be retried; with silent fallback enabled it runs as `AudioStatus::Silent`.
    pub fn play(&mut self) -> MetronomeResult<AudioStatus> {
        self.controller_mut()?.play()
    }

    pub fn pause(&mut self) {
        if let Some(controller) = self.controller.as_mut() {
            controller.pause();
        }
    }

    pub fn toggle(&mut self) -> MetronomeResult<ControllerState> {
        self.controller_mut()?.toggle()
    }

    /// Local tempo change; clamped, never rejected
    pub fn set_tempo(&mut self, bpm: i64) {
        if let Some(controller) = self.controller.as_mut() {
            controller.set_tempo(bpm);
            self.tempo = controller.tempo();
        }
    }

    /// ±BPM nudge
    pub fn nudge_tempo(&mut self, delta: i64) {
        if let Some(controller) = self.controller.as_mut() {
            controller.nudge_tempo(delta);
            self.tempo = controller.tempo();
        }
    }

    /// Tempo pushed by another component (e.g. the inspiration generator).
    /// Returns false when ignored.
    pub fn set_external_tempo(&mut self, bpm: i64) -> bool {
        let Some(controller) = self.controller.as_mut() else {
            return false;
        };
        let applied = controller.set_external_tempo(bpm);
        self.tempo = controller.tempo();
        applied
    }

    pub fn set_muted(&mut self, muted: bool) {
        if let Some(controller) = self.controller.as_mut() {
            controller.set_muted(muted);
        }
    }

    /// Register a beat-indicator callback: `Some(index)` on every beat,
    /// `None` when the metronome stops
    pub fn on_beat<F>(&mut self, listener: F)
    where
        F: FnMut(Option<usize>) + 'static,
    {
        if let Some(controller) = self.controller.as_mut() {
            controller.add_listener(Box::new(listener));
        }
    }

    /// Run every timer due now. Call from the host loop.
    pub fn pump(&mut self) {
        if let Some(controller) = self.controller.as_mut() {
            controller.pump();
        }
    }

    /// Host time of the next timer, if any
    pub fn next_deadline(&mut self) -> Option<f64> {
        self.controller.as_mut().and_then(|c| c.next_deadline())
    }

    pub fn host_now(&self) -> Option<f64> {
        self.controller.as_ref().map(|c| c.host_now())
    }

    /// Stop, release the audio clock and drop all listeners without
    /// notifying them. Safe to call more than once.
    pub fn dispose(&mut self) {
        if let Some(mut controller) = self.controller.take() {
            controller.shutdown();
            log::info!("Metronome disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.controller.is_none()
    }

    pub fn state(&self) -> ControllerState {
        self.controller
            .as_ref()
            .map(|c| c.state())
            .unwrap_or(ControllerState::Idle)
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn is_muted(&self) -> bool {
        self.controller.as_ref().is_some_and(|c| c.is_muted())
    }

    pub fn current_beat(&self) -> Option<usize> {
        self.controller.as_ref().and_then(|c| c.current_beat())
    }

    pub fn audio_status(&self) -> Option<AudioStatus> {
        self.controller.as_ref().and_then(|c| c.audio_status())
    }

    /// Read access to the controller, e.g. for diagnostics
    pub fn controller(&self) -> Option<&TransportController> {
        self.controller.as_ref()
    }

    fn controller_mut(&mut self) -> MetronomeResult<&mut TransportController> {
        self.controller.as_mut().ok_or(MetronomeError::Disposed)
    }
}

impl Drop for MetronomeHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}
