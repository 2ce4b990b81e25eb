// Configuration - Scheduling cadences, transport timings and click voicing
// Loaded from RON (same format as project files). Out-of-range values are
// sanitized rather than rejected.

use crate::error::{MetronomeError, MetronomeResult};
use crate::sequencer::tempo::Tempo;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Longest accepted click attack (seconds)
pub const MAX_ATTACK_SECS: f32 = 0.010;
/// Longest accepted click, attack plus decay (seconds)
pub const MAX_CLICK_SECS: f32 = 0.150;
/// Shortest accepted timer period (seconds)
pub const MIN_INTERVAL_SECS: f64 = 0.001;

/// Oscillator shape used for clicks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClickWaveform {
    Sine,
    Square,
}

/// Click voicing. Configuration only: scheduling never depends on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickConfig {
    pub accent_frequency: f32,
    pub regular_frequency: f32,
    pub waveform: ClickWaveform,
    pub attack_secs: f32,
    pub decay_secs: f32,
    /// Output level in dBFS
    pub gain_db: f32,
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            accent_frequency: 880.0,
            regular_frequency: 440.0,
            waveform: ClickWaveform::Sine,
            attack_secs: 0.005,
            decay_secs: 0.060,
            gain_db: -12.0,
        }
    }
}

impl ClickConfig {
    /// Linear amplitude for `gain_db`
    pub fn linear_gain(&self) -> f32 {
        10f32.powf(self.gain_db / 20.0)
    }

    /// Total click length in seconds
    pub fn duration_secs(&self) -> f32 {
        self.attack_secs + self.decay_secs
    }

    fn sanitize(&mut self) {
        if !self.accent_frequency.is_finite() || self.accent_frequency <= 0.0 {
            self.accent_frequency = ClickConfig::default().accent_frequency;
        }
        if !self.regular_frequency.is_finite() || self.regular_frequency <= 0.0 {
            self.regular_frequency = ClickConfig::default().regular_frequency;
        }
        if !self.gain_db.is_finite() {
            self.gain_db = ClickConfig::default().gain_db;
        }
        self.gain_db = self.gain_db.min(0.0);

        let attack = if self.attack_secs.is_finite() { self.attack_secs } else { 0.0 };
        self.attack_secs = attack.clamp(0.0, MAX_ATTACK_SECS);
        let decay = if self.decay_secs.is_finite() { self.decay_secs } else { 0.0 };
        self.decay_secs = decay.clamp(0.001, MAX_CLICK_SECS - self.attack_secs);
    }
}

/// Metronome configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetronomeConfig {
    /// Tempo used when the stored value cannot be parsed
    pub default_tempo: u32,
    pub beats_per_measure: usize,
    /// Horizon within which beats are pre-dispatched to the audio clock
    pub look_ahead_secs: f64,
    /// Period of the coarse look-ahead timer
    pub tick_interval_secs: f64,
    /// Period of the beat-indicator poll (display refresh)
    pub frame_interval_secs: f64,
    /// Quiet period merging a burst of tempo changes into one restart
    pub restart_debounce_secs: f64,
    /// Window after a local tempo change during which external updates are ignored
    pub external_suppression_secs: f64,
    /// Keep the beat counter across tempo restarts instead of resetting to 0
    pub preserve_measure_on_restart: bool,
    /// Keep running without sound when no audio clock can be acquired
    pub silent_fallback: bool,
    pub click: ClickConfig,
    /// Output device name; the host default when `None`
    pub output_device: Option<String>,
    /// Log every dispatched beat at debug level
    pub debug: bool,
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            default_tempo: Tempo::DEFAULT_BPM,
            beats_per_measure: 4,
            look_ahead_secs: 0.100,
            tick_interval_secs: 0.025,
            frame_interval_secs: 1.0 / 60.0,
            restart_debounce_secs: 0.050,
            external_suppression_secs: 0.500,
            preserve_measure_on_restart: false,
            silent_fallback: true,
            click: ClickConfig::default(),
            output_device: None,
            debug: false,
        }
    }
}

impl MetronomeConfig {
    /// Parse a RON document. Missing fields take their defaults.
    pub fn from_ron_str(text: &str) -> MetronomeResult<Self> {
        let config: MetronomeConfig = ron::from_str(text)?;
        if let Err(e) = config.validate() {
            log::warn!("{}; adjusting", e);
        }
        Ok(config.sanitized())
    }

    /// Load a RON configuration file
    pub fn load(path: &Path) -> MetronomeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        log::info!("Loading metronome config from {}", path.display());
        Self::from_ron_str(&text)
    }

    /// Write the configuration as pretty RON
    pub fn save(&self, path: &Path) -> MetronomeResult<()> {
        let text = self.to_ron_string()?;
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn to_ron_string(&self) -> MetronomeResult<String> {
        Ok(ron::ser::to_string_pretty(self, PrettyConfig::default())?)
    }

    /// Check the relationship between the two cadences. A tick period longer
    /// than the look-ahead window leaves gaps no scheduling can cover.
    pub fn validate(&self) -> MetronomeResult<()> {
        if self.tick_interval_secs >= self.look_ahead_secs {
            return Err(MetronomeError::Config(format!(
                "tick interval ({}s) must be shorter than look-ahead window ({}s)",
                self.tick_interval_secs, self.look_ahead_secs
            )));
        }
        Ok(())
    }

    /// Replace non-finite or non-positive values with defaults, keep timer
    /// periods above `MIN_INTERVAL_SECS`, fit the tick period inside the
    /// look-ahead window and clamp the click envelope into its allowed range
    pub fn sanitized(mut self) -> Self {
        let defaults = MetronomeConfig::default();
        let interval = |value: f64, fallback: f64| {
            if value.is_finite() && value > 0.0 {
                value.max(MIN_INTERVAL_SECS)
            } else {
                fallback
            }
        };
        let non_negative = |value: f64, fallback: f64| {
            if value.is_finite() && value >= 0.0 { value } else { fallback }
        };

        self.default_tempo = Tempo::new(self.default_tempo as i64).bpm();
        self.beats_per_measure = self.beats_per_measure.max(1);
        self.look_ahead_secs = interval(self.look_ahead_secs, defaults.look_ahead_secs)
            .max(2.0 * MIN_INTERVAL_SECS);
        // Two ticks per window: every beat is dispatched before it is due
        self.tick_interval_secs = interval(self.tick_interval_secs, defaults.tick_interval_secs)
            .min(self.look_ahead_secs / 2.0);
        self.frame_interval_secs = interval(self.frame_interval_secs, defaults.frame_interval_secs);
        self.restart_debounce_secs =
            non_negative(self.restart_debounce_secs, defaults.restart_debounce_secs);
        self.external_suppression_secs =
            non_negative(self.external_suppression_secs, defaults.external_suppression_secs);
        self.click.sanitize();
        self
    }
}
