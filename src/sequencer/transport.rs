// Transport - Play/pause/tempo control over the beat scheduler
//
// Serializes every start/stop so the scheduler never sees overlapping
// commands, and owns the host timers that drive the scheduler (look-ahead
// tick) and the UI bridge (frame poll).

use super::bridge::{BeatListener, UiBridge};
use super::scheduler::BeatScheduler;
use super::tempo::Tempo;
use crate::audio::clock::{AudioStatus, ClockProvider};
use crate::config::MetronomeConfig;
use crate::error::MetronomeResult;
use crate::host::{HostClock, TimerId, TimerQueue};
use std::rc::Rc;

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
    #[default]
    Idle,
    Running,
    /// Scheduler stopped for a tempo change; restart pending after debounce
    Restarting,
}

impl ControllerState {
    /// Running or about to run again
    pub fn is_active(&self) -> bool {
        matches!(self, ControllerState::Running | ControllerState::Restarting)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    LookAhead,
    FramePoll,
    Restart,
    ClearSuppression,
}

pub struct TransportController {
    state: ControllerState,
    scheduler: BeatScheduler,
    bridge: UiBridge,
    timers: TimerQueue<TimerKind>,
    host_clock: Rc<dyn HostClock>,
    config: MetronomeConfig,

    tempo: Tempo,
    audio_status: Option<AudioStatus>,
    resume_beat: usize,
    restarts: u64,

    look_ahead_timer: Option<TimerId>,
    frame_timer: Option<TimerId>,
    restart_timer: Option<TimerId>,
    /// Armed after a local tempo change; external updates are ignored meanwhile
    suppression_timer: Option<TimerId>,
}

impl TransportController {
    pub fn new(
        tempo: Tempo,
        provider: Box<dyn ClockProvider>,
        host_clock: Rc<dyn HostClock>,
        config: MetronomeConfig,
    ) -> Self {
        if let Err(e) = config.validate() {
            log::warn!("{}; adjusting", e);
        }
        let config = config.sanitized();
        let scheduler = BeatScheduler::new(provider, Rc::clone(&host_clock), tempo, &config);
        let bridge = UiBridge::new(scheduler.reader());

        Self {
            state: ControllerState::Idle,
            scheduler,
            bridge,
            timers: TimerQueue::new(),
            host_clock,
            config,
            tempo,
            audio_status: None,
            resume_beat: 0,
            restarts: 0,
            look_ahead_timer: None,
            frame_timer: None,
            restart_timer: None,
            suppression_timer: None,
        }
    }

    /// Idle → Running. Ignored while Running or Restarting.
    pub fn play(&mut self) -> MetronomeResult<AudioStatus> {
        if self.state.is_active() {
            log::debug!("play ignored while {:?}", self.state);
            return Ok(self.audio_status.unwrap_or(AudioStatus::Audible));
        }

        let status = self.start_scheduler(0)?;
        self.state = ControllerState::Running;
        self.bridge.activate();
        self.arm_look_ahead();
        self.arm_frame_poll();
        log::debug!("Idle -> Running at {}", self.tempo);
        Ok(status)
    }

    /// Running/Restarting → Idle. Ignored while Idle.
    pub fn pause(&mut self) {
        if !self.state.is_active() {
            return;
        }
        log::debug!("{:?} -> Idle", self.state);
        self.stop_session();
    }

    /// Play when Idle, pause otherwise. Returns the new state.
    pub fn toggle(&mut self) -> MetronomeResult<ControllerState> {
        if self.state.is_active() {
            self.pause();
        } else {
            self.play()?;
        }
        Ok(self.state)
    }

    /// Local tempo change (user input). Opens the external-suppression window.
    pub fn set_tempo(&mut self, bpm: i64) {
        let tempo = Tempo::new(bpm);
        self.cancel_timer(TimerKind::ClearSuppression);
        let deadline = self.host_clock.now() + self.config.external_suppression_secs;
        self.suppression_timer = Some(
            self.timers
                .schedule_once(deadline, TimerKind::ClearSuppression),
        );
        self.apply_tempo(tempo);
    }

    /// ±BPM nudge from the tempo buttons
    pub fn nudge_tempo(&mut self, delta: i64) {
        let target = self.tempo.nudge(delta);
        self.set_tempo(target.bpm() as i64);
    }

    /// Tempo pushed by another part of the application.
    /// Returns false when ignored because a local change happened recently.
    pub fn set_external_tempo(&mut self, bpm: i64) -> bool {
        if self.suppression_timer.is_some() {
            log::debug!("External tempo {} suppressed after local change", bpm);
            return false;
        }
        self.apply_tempo(Tempo::new(bpm));
        true
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.scheduler.set_muted(muted);
    }

    pub fn add_listener(&mut self, listener: BeatListener) {
        self.bridge.add_listener(listener);
    }

    /// Fire every host timer due now
    pub fn pump(&mut self) {
        let now = self.host_clock.now();
        while let Some((id, kind)) = self.timers.pop_due(now) {
            match kind {
                TimerKind::LookAhead => {
                    self.scheduler.tick();
                }
                TimerKind::FramePoll => self.poll_bridge(),
                TimerKind::Restart => {
                    if self.restart_timer == Some(id) {
                        self.restart_timer = None;
                        self.finish_restart();
                    }
                }
                TimerKind::ClearSuppression => {
                    if self.suppression_timer == Some(id) {
                        self.suppression_timer = None;
                    }
                }
            }
        }
    }

    /// Earliest pending host timer
    pub fn next_deadline(&mut self) -> Option<f64> {
        self.timers.peek_deadline()
    }

    /// Stop everything and drop listeners without notifying them
    pub fn shutdown(&mut self) {
        self.bridge.clear_listeners();
        self.stop_session();
        self.cancel_timer(TimerKind::ClearSuppression);
        self.timers.clear();
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn is_muted(&self) -> bool {
        self.scheduler.is_muted()
    }

    pub fn is_suppressing_external(&self) -> bool {
        self.suppression_timer.is_some()
    }

    pub fn current_beat(&self) -> Option<usize> {
        self.bridge.current_beat()
    }

    pub fn audio_status(&self) -> Option<AudioStatus> {
        self.audio_status
    }

    /// Completed tempo restarts since creation
    pub fn restart_count(&self) -> u64 {
        self.restarts
    }

    pub fn host_now(&self) -> f64 {
        self.host_clock.now()
    }

    pub fn scheduler(&self) -> &BeatScheduler {
        &self.scheduler
    }

    fn apply_tempo(&mut self, tempo: Tempo) {
        if tempo == self.tempo {
            return;
        }
        log::debug!("Tempo {} -> {}", self.tempo, tempo);
        self.tempo = tempo;
        self.scheduler.set_tempo(tempo);

        match self.state {
            ControllerState::Idle => {}
            ControllerState::Running => {
                self.resume_beat = if self.config.preserve_measure_on_restart {
                    self.scheduler.resume_beat()
                } else {
                    0
                };
                self.cancel_timer(TimerKind::LookAhead);
                self.scheduler.stop();
                self.state = ControllerState::Restarting;
                self.arm_restart();
                log::debug!("Running -> Restarting");
            }
            // Debounce: a newer change pushes the pending restart back
            ControllerState::Restarting => self.arm_restart(),
        }
    }

    fn finish_restart(&mut self) {
        if self.state != ControllerState::Restarting {
            return;
        }
        match self.start_scheduler(self.resume_beat) {
            Ok(_) => {
                self.state = ControllerState::Running;
                self.restarts += 1;
                self.arm_look_ahead();
                self.poll_bridge();
                log::debug!("Restarting -> Running at {}", self.tempo);
            }
            Err(e) => {
                log::warn!("Restart failed, stopping: {}", e);
                self.stop_session();
            }
        }
    }

    fn start_scheduler(&mut self, beat: usize) -> MetronomeResult<AudioStatus> {
        let status = match self.scheduler.start_from(beat) {
            Ok(status) => status,
            Err(e) if self.config.silent_fallback && e.is_retryable() => {
                log::warn!("{}; running without sound", e);
                self.scheduler.start_silent_from(beat)
            }
            Err(e) => {
                log::warn!("Cannot start metronome: {}", e);
                return Err(e);
            }
        };
        self.audio_status = Some(status);
        Ok(status)
    }

    fn stop_session(&mut self) {
        self.cancel_timer(TimerKind::LookAhead);
        self.cancel_timer(TimerKind::FramePoll);
        self.cancel_timer(TimerKind::Restart);
        self.scheduler.stop();
        self.bridge.deactivate();
        self.state = ControllerState::Idle;
    }

    // First tick runs now so the downbeat is dispatched without waiting a period
    fn arm_look_ahead(&mut self) {
        self.cancel_timer(TimerKind::LookAhead);
        self.scheduler.tick();
        let period = self.config.tick_interval_secs;
        let first = self.host_clock.now() + period;
        self.look_ahead_timer = Some(
            self.timers
                .schedule_repeating(first, period, TimerKind::LookAhead),
        );
    }

    fn arm_frame_poll(&mut self) {
        self.cancel_timer(TimerKind::FramePoll);
        self.poll_bridge();
        let period = self.config.frame_interval_secs;
        let first = self.host_clock.now() + period;
        self.frame_timer = Some(
            self.timers
                .schedule_repeating(first, period, TimerKind::FramePoll),
        );
    }

    fn arm_restart(&mut self) {
        self.cancel_timer(TimerKind::Restart);
        let deadline = self.host_clock.now() + self.config.restart_debounce_secs;
        self.restart_timer = Some(self.timers.schedule_once(deadline, TimerKind::Restart));
    }

    fn cancel_timer(&mut self, kind: TimerKind) {
        let slot = match kind {
            TimerKind::LookAhead => &mut self.look_ahead_timer,
            TimerKind::FramePoll => &mut self.frame_timer,
            TimerKind::Restart => &mut self.restart_timer,
            TimerKind::ClearSuppression => &mut self.suppression_timer,
        };
        if let Some(id) = slot.take() {
            self.timers.cancel(id);
        }
    }

    fn poll_bridge(&mut self) {
        if let Some(now) = self.scheduler.clock_now() {
            self.bridge.poll(now);
        }
    }
}

impl Drop for TransportController {
    fn drop(&mut self) {
        if self.state.is_active() {
            self.shutdown();
        }
    }
}
