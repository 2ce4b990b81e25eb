// Tempo - Integer BPM clamped to the playable range
// Out-of-range requests are silently corrected, never rejected

use rand::Rng;
use std::fmt;

/// Tempo in BPM (Beats Per Minute)
/// Always within [MIN_BPM, MAX_BPM]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tempo {
    bpm: u32,
}

impl Tempo {
    pub const MIN_BPM: u32 = 40;
    pub const MAX_BPM: u32 = 300;
    pub const DEFAULT_BPM: u32 = 100;

    /// Range drawn from by the inspiration generator
    pub const INSPIRATION_MIN_BPM: u32 = 75;
    pub const INSPIRATION_MAX_BPM: u32 = 140;

    /// Creates a tempo, clamping into [40, 300]
    pub fn new(bpm: i64) -> Self {
        let clamped = bpm.clamp(Self::MIN_BPM as i64, Self::MAX_BPM as i64);
        Self { bpm: clamped as u32 }
    }

    /// Parse the textual form the application stores ("100").
    /// Fractional values are rounded; anything unparseable yields `fallback`.
    pub fn parse(text: &str, fallback: Tempo) -> Self {
        let trimmed = text.trim();
        if let Ok(value) = trimmed.parse::<i64>() {
            return Self::new(value);
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Self::new(value.round() as i64),
            _ => fallback,
        }
    }

    /// Random tempo as produced by the inspiration generator
    pub fn random_inspiration<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(rng.gen_range(Self::INSPIRATION_MIN_BPM..=Self::INSPIRATION_MAX_BPM) as i64)
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    /// Duration of one beat in seconds
    pub fn beat_duration_secs(&self) -> f64 {
        60.0 / self.bpm as f64
    }

    /// Tempo shifted by `delta` BPM (±1 nudge buttons), clamped
    pub fn nudge(&self, delta: i64) -> Self {
        Self::new(self.bpm as i64 + delta)
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self { bpm: Self::DEFAULT_BPM }
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BPM", self.bpm)
    }
}
