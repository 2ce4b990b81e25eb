// Audio timing - Frame counter shared between the audio callback and the clock
// Converts between clock seconds and absolute output frames

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared frame position of an output stream
#[derive(Clone, Debug)]
pub struct AudioTiming {
    /// Frames rendered so far (incremented by audio callback)
    frame_position: Arc<AtomicU64>,
    sample_rate: f64,
}

impl AudioTiming {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            frame_position: Arc::new(AtomicU64::new(0)),
            sample_rate: sample_rate as f64,
        }
    }

    /// Frames rendered so far (called from the control side)
    pub fn current_frame(&self) -> u64 {
        self.frame_position.load(Ordering::Acquire)
    }

    /// Advance frame position (called from audio callback)
    pub fn advance(&self, frames: usize) {
        self.frame_position
            .fetch_add(frames as u64, Ordering::Release);
    }

    /// Clock time in seconds derived from rendered frames
    pub fn now_secs(&self) -> f64 {
        self.frames_to_secs(self.current_frame())
    }

    pub fn frames_to_secs(&self, frames: u64) -> f64 {
        frames as f64 / self.sample_rate
    }

    /// Absolute frame at which clock time `secs` falls (rounded to nearest)
    pub fn secs_to_frame(&self, secs: f64) -> u64 {
        if secs <= 0.0 {
            return 0;
        }
        (secs * self.sample_rate).round() as u64
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_creation() {
        let timing = AudioTiming::new(48000.0);
        assert_eq!(timing.current_frame(), 0);
        assert_eq!(timing.now_secs(), 0.0);
        assert_eq!(timing.sample_rate(), 48000.0);
    }

    #[test]
    fn test_advance_is_shared_between_clones() {
        let timing = AudioTiming::new(48000.0);
        let callback_side = timing.clone();
        callback_side.advance(24000);
        assert_eq!(timing.current_frame(), 24000);
        assert_eq!(timing.now_secs(), 0.5);
    }

    #[test]
    fn test_secs_to_frame() {
        let timing = AudioTiming::new(44100.0);
        assert_eq!(timing.secs_to_frame(1.0), 44100);
        assert_eq!(timing.secs_to_frame(0.5), 22050);
        assert_eq!(timing.secs_to_frame(-0.1), 0);
        // 10ms = 441 frames @ 44.1kHz
        assert_eq!(timing.secs_to_frame(0.010), 441);
    }
}
