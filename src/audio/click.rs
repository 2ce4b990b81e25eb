// Click - Pre-rendered metronome clicks and a frame-accurate click renderer
// Runs inside the audio callback: no allocation once constructed

use super::clock::ClickType;
use crate::config::{ClickConfig, ClickWaveform};
use std::f32::consts::PI;

/// Decay reaches -60 dB at the end of the click
const DECAY_RATE: f32 = 6.9;

/// Maximum clicks waiting for their start frame
pub const MAX_PENDING_CLICKS: usize = 32;
/// Maximum clicks sounding at once
pub const MAX_ACTIVE_CLICKS: usize = 4;

/// Metronome click sound generator
/// Pre-generates short click samples for low CPU overhead
#[derive(Debug, Clone)]
pub struct ClickSound {
    accent_samples: Vec<f32>,
    regular_samples: Vec<f32>,
}

impl ClickSound {
    pub fn new(sample_rate: f32, config: &ClickConfig) -> Self {
        Self {
            accent_samples: Self::generate_click(sample_rate, config, config.accent_frequency),
            regular_samples: Self::generate_click(sample_rate, config, config.regular_frequency),
        }
    }

    /// Oscillator shaped by a linear attack and an exponential decay that
    /// lands on silence, so neither edge pops
    fn generate_click(sample_rate: f32, config: &ClickConfig, frequency: f32) -> Vec<f32> {
        let attack_samples = (config.attack_secs * sample_rate).round() as usize;
        let decay_samples = ((config.decay_secs * sample_rate).round() as usize).max(1);
        let num_samples = attack_samples + decay_samples;
        let gain = config.linear_gain();
        let phase_increment = 2.0 * PI * frequency / sample_rate;

        let mut samples = Vec::with_capacity(num_samples);
        for i in 0..num_samples {
            let envelope = if i < attack_samples {
                i as f32 / attack_samples as f32
            } else {
                let t = (i - attack_samples) as f32 / decay_samples as f32;
                // Fade the exponential tail to exactly zero at the last sample
                (-t * DECAY_RATE).exp() * (1.0 - t)
            };

            let phase = i as f32 * phase_increment;
            let oscillator = match config.waveform {
                ClickWaveform::Sine => phase.sin(),
                ClickWaveform::Square => {
                    if phase.sin() >= 0.0 {
                        1.0
                    } else {
                        -1.0
                    }
                }
            };

            samples.push(oscillator * envelope * gain);
        }

        samples
    }

    pub fn get_click(&self, click_type: ClickType) -> &[f32] {
        match click_type {
            ClickType::Accent => &self.accent_samples,
            ClickType::Regular => &self.regular_samples,
        }
    }

    /// Duration of click in samples
    pub fn click_duration(&self) -> usize {
        self.accent_samples.len()
    }
}

/// Click waiting for its start frame
#[derive(Debug, Clone, Copy)]
struct PendingClick {
    start_frame: u64,
    click_type: ClickType,
}

/// Active click playback state
#[derive(Debug, Clone, Copy)]
struct ClickPlayback {
    click_type: ClickType,
    position: usize,
}

/// Mixes scheduled clicks into output buffers, starting each one at its
/// exact frame regardless of buffer boundaries
#[derive(Debug, Clone)]
pub struct ClickRenderer {
    sound: ClickSound,
    pending: Vec<PendingClick>,
    active: Vec<ClickPlayback>,
}

impl ClickRenderer {
    pub fn new(sound: ClickSound) -> Self {
        Self {
            sound,
            pending: Vec::with_capacity(MAX_PENDING_CLICKS),
            active: Vec::with_capacity(MAX_ACTIVE_CLICKS),
        }
    }

    /// Queue a click. Returns false (click dropped) when the pending list is full.
    pub fn schedule(&mut self, start_frame: u64, click_type: ClickType) -> bool {
        if self.pending.len() >= MAX_PENDING_CLICKS {
            return false;
        }
        self.pending.push(PendingClick {
            start_frame,
            click_type,
        });
        true
    }

    /// Drop pending clicks and silence the ones sounding
    pub fn cancel_all(&mut self) {
        self.pending.clear();
        self.active.clear();
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Render mono output for frames `[start_frame, start_frame + output.len())`.
    /// Clicks whose start frame already passed begin immediately.
    pub fn render(&mut self, start_frame: u64, output: &mut [f32]) {
        for (offset, sample) in output.iter_mut().enumerate() {
            let frame = start_frame + offset as u64;

            let mut i = 0;
            while i < self.pending.len() {
                if self.pending[i].start_frame <= frame {
                    let click = self.pending.swap_remove(i);
                    if self.active.len() < MAX_ACTIVE_CLICKS {
                        self.active.push(ClickPlayback {
                            click_type: click.click_type,
                            position: 0,
                        });
                    }
                } else {
                    i += 1;
                }
            }

            let mut mixed = 0.0;
            for playback in self.active.iter_mut() {
                let samples = self.sound.get_click(playback.click_type);
                if let Some(value) = samples.get(playback.position) {
                    mixed += *value;
                }
                playback.position += 1;
            }
            let sound = &self.sound;
            self.active
                .retain(|p| p.position < sound.get_click(p.click_type).len());

            *sample = mixed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MAX_ATTACK_SECS, MAX_CLICK_SECS};

    fn sound() -> ClickSound {
        ClickSound::new(48000.0, &ClickConfig::default())
    }

    fn peak(samples: &[f32]) -> f32 {
        samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max)
    }

    #[test]
    fn test_click_sound_generation() {
        let sound = sound();
        let accent = sound.get_click(ClickType::Accent);
        let regular = sound.get_click(ClickType::Regular);

        assert!(!accent.is_empty());
        assert_eq!(accent.len(), regular.len());
        // 5ms attack + 60ms decay at 48kHz
        assert_eq!(sound.click_duration(), 240 + 2880);
        assert!(sound.click_duration() as f32 <= MAX_CLICK_SECS * 48000.0);
    }

    #[test]
    fn test_click_edges_are_quiet() {
        let sound = sound();
        let accent = sound.get_click(ClickType::Accent);
        let gain = ClickConfig::default().linear_gain();

        assert_eq!(accent[0], 0.0);
        assert!(accent.last().unwrap().abs() < 1e-3);
        assert!(peak(accent) <= gain + 1e-6);
        assert!(peak(accent) > gain * 0.5);
    }

    #[test]
    fn test_attack_reaches_peak_within_limit() {
        let sound = sound();
        let accent = sound.get_click(ClickType::Accent);
        let gain = ClickConfig::default().linear_gain();
        let attack_limit = (MAX_ATTACK_SECS * 48000.0).round() as usize;
        assert!(peak(&accent[..attack_limit]) > gain * 0.8);
    }

    #[test]
    fn test_accent_is_higher_pitched() {
        // Count zero crossings: 880Hz vs 440Hz
        let sound = sound();
        let crossings = |s: &[f32]| s.windows(2).filter(|w| w[0] <= 0.0 && w[1] > 0.0).count();
        let accent = crossings(sound.get_click(ClickType::Accent));
        let regular = crossings(sound.get_click(ClickType::Regular));
        assert!(accent > regular * 3 / 2);
    }

    #[test]
    fn test_square_waveform() {
        let config = ClickConfig {
            waveform: ClickWaveform::Square,
            gain_db: 0.0,
            ..ClickConfig::default()
        };
        let sound = ClickSound::new(48000.0, &config);
        let accent = sound.get_click(ClickType::Accent);
        // Mid-attack sample magnitude equals the envelope value exactly
        assert!((accent[120].abs() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_renderer_starts_click_at_exact_frame() {
        let mut renderer = ClickRenderer::new(sound());
        assert!(renderer.schedule(1000, ClickType::Accent));

        let mut buffer = vec![0.0f32; 512];
        renderer.render(512, &mut buffer);
        // Frames 512..1000 silent, click begins at 1000 (offset 488)
        assert!(buffer[..488].iter().all(|s| *s == 0.0));
        assert_eq!(renderer.active_count(), 1);

        let expected = sound().get_click(ClickType::Accent)[1..24].to_vec();
        assert_eq!(&buffer[489..512], expected.as_slice());
    }

    #[test]
    fn test_renderer_click_spans_buffers_and_ends() {
        let sound = sound();
        let duration = sound.click_duration();
        let mut renderer = ClickRenderer::new(sound);
        renderer.schedule(0, ClickType::Regular);

        let mut buffer = vec![0.0f32; 256];
        let mut frame = 0u64;
        while (frame as usize) < duration {
            renderer.render(frame, &mut buffer);
            frame += 256;
        }
        assert_eq!(renderer.active_count(), 0);
        renderer.render(frame, &mut buffer);
        assert!(buffer.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_renderer_cancel_all_silences() {
        let mut renderer = ClickRenderer::new(sound());
        renderer.schedule(0, ClickType::Accent);
        renderer.schedule(24000, ClickType::Regular);

        let mut buffer = vec![0.0f32; 256];
        renderer.render(0, &mut buffer);
        assert_eq!(renderer.active_count(), 1);
        assert_eq!(renderer.pending_count(), 1);

        renderer.cancel_all();
        renderer.render(256, &mut buffer);
        assert!(buffer.iter().all(|s| *s == 0.0));
        assert_eq!(renderer.pending_count(), 0);
    }

    #[test]
    fn test_renderer_late_click_starts_immediately() {
        let mut renderer = ClickRenderer::new(sound());
        renderer.schedule(10, ClickType::Accent);
        let mut buffer = vec![0.0f32; 64];
        renderer.render(500, &mut buffer);
        assert_eq!(renderer.active_count(), 1);
        assert_eq!(renderer.pending_count(), 0);
    }

    #[test]
    fn test_pending_capacity_is_bounded() {
        let mut renderer = ClickRenderer::new(sound());
        for i in 0..MAX_PENDING_CLICKS {
            assert!(renderer.schedule(i as u64 * 1000, ClickType::Regular));
        }
        assert!(!renderer.schedule(1, ClickType::Regular));
    }
}
