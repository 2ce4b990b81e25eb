// CPAL clock - Audio clock backed by an output stream
//
// Time is the number of frames the callback has rendered, so a click
// scheduled for time `t` starts on exactly frame `t * sample_rate`.
// Click requests reach the callback over a lock-free ring buffer; the
// callback itself never allocates or blocks.
//
// Note: on macOS (CoreAudio) the Stream is not Send, so a clock stays on the
// thread that acquired it, like the rest of the metronome.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use ringbuf::traits::{Consumer, Producer};

use super::click::{ClickRenderer, ClickSound};
use super::clock::{AudioClock, ClickType, ClockProvider};
use super::timing::AudioTiming;
use crate::config::ClickConfig;
use crate::error::{MetronomeError, MetronomeResult};
use crate::messaging::{ClickCommand, ClickConsumer, ClickProducer, create_click_channel};

/// Frames rendered per scratch pass inside the callback
const RENDER_CHUNK: usize = 256;
const COMMAND_CAPACITY: usize = 64;

/// Opens a new output stream for every running session
#[derive(Debug, Clone, Default)]
pub struct CpalClockProvider {
    click: ClickConfig,
    device_name: Option<String>,
}

impl CpalClockProvider {
    pub fn new(click: ClickConfig) -> Self {
        Self {
            click,
            device_name: None,
        }
    }

    /// Use a specific output device instead of the host default
    pub fn with_device(mut self, device_name: impl Into<String>) -> Self {
        self.device_name = Some(device_name.into());
        self
    }

    /// Names of the available output devices
    pub fn list_output_devices() -> Vec<String> {
        let host = cpal::default_host();
        match host.output_devices() {
            Ok(devices) => devices.filter_map(|d| d.name().ok()).collect(),
            Err(e) => {
                log::warn!("Cannot enumerate output devices: {}", e);
                Vec::new()
            }
        }
    }

    fn find_device(&self) -> MetronomeResult<Device> {
        let host = cpal::default_host();
        let device = match &self.device_name {
            Some(wanted) => host
                .output_devices()
                .map_err(|e| MetronomeError::Capability(format!("Cannot list devices: {}", e)))?
                .find(|d| d.name().map(|n| &n == wanted).unwrap_or(false)),
            None => host.default_output_device(),
        };
        device.ok_or_else(|| MetronomeError::Capability("No audio device found".to_string()))
    }
}

impl ClockProvider for CpalClockProvider {
    fn acquire(&mut self) -> MetronomeResult<Box<dyn AudioClock>> {
        let device = self.find_device()?;
        let clock = CpalClock::open(&device, &self.click)?;
        Ok(Box::new(clock))
    }
}

/// Audio clock driven by a running CPAL output stream.
/// Dropping it stops the stream and releases the device.
pub struct CpalClock {
    _stream: Stream,
    timing: AudioTiming,
    command_tx: ClickProducer,
}

impl CpalClock {
    fn open(device: &Device, click: &ClickConfig) -> MetronomeResult<Self> {
        log::info!(
            "Audio device: {}",
            device.name().unwrap_or("Unknown".to_string())
        );

        let supported_config = device
            .default_output_config()
            .map_err(|e| MetronomeError::Capability(format!("Configuration error: {}", e)))?;
        let sample_format = supported_config.sample_format();
        log::debug!("Audio config: {:?}", supported_config);

        let sample_rate = supported_config.sample_rate().0 as f32;
        let channels = supported_config.channels() as usize;
        let config: StreamConfig = supported_config.into();

        let timing = AudioTiming::new(sample_rate);
        let renderer = ClickRenderer::new(ClickSound::new(sample_rate, click));
        let (command_tx, command_rx) = create_click_channel(COMMAND_CAPACITY);

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(
                device,
                &config,
                channels,
                renderer,
                command_rx,
                timing.clone(),
            ),
            SampleFormat::I16 => Self::build_stream::<i16>(
                device,
                &config,
                channels,
                renderer,
                command_rx,
                timing.clone(),
            ),
            SampleFormat::U16 => Self::build_stream::<u16>(
                device,
                &config,
                channels,
                renderer,
                command_rx,
                timing.clone(),
            ),
            other => {
                return Err(MetronomeError::Capability(format!(
                    "Unsupported sample format: {:?}. Supported formats: F32, I16, U16",
                    other
                )));
            }
        }?;

        stream
            .play()
            .map_err(|e| MetronomeError::Capability(format!("Cannot start stream: {}", e)))?;
        log::info!("Audio clock acquired ({} Hz, {} channels)", sample_rate, channels);

        Ok(Self {
            _stream: stream,
            timing,
            command_tx,
        })
    }

    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        channels: usize,
        mut renderer: ClickRenderer,
        mut command_rx: ClickConsumer,
        timing: AudioTiming,
    ) -> MetronomeResult<Stream>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        let channels = channels.max(1);
        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    // No allocations, no I/O, no blocking locks past this point
                    while let Some(cmd) = command_rx.try_pop() {
                        match cmd {
                            ClickCommand::Schedule { frame, click } => {
                                renderer.schedule(frame, click);
                            }
                            ClickCommand::CancelAll => renderer.cancel_all(),
                        }
                    }

                    let start_frame = timing.current_frame();
                    let mut scratch = [0.0f32; RENDER_CHUNK];
                    for (chunk_index, chunk) in data.chunks_mut(channels * RENDER_CHUNK).enumerate()
                    {
                        let frames = chunk.len() / channels;
                        let chunk_start = start_frame + (chunk_index * RENDER_CHUNK) as u64;
                        renderer.render(chunk_start, &mut scratch[..frames]);

                        for (frame, value) in chunk.chunks_mut(channels).zip(scratch.iter()) {
                            let converted: T = T::from_sample(*value);
                            for out in frame.iter_mut() {
                                *out = converted;
                            }
                        }
                    }

                    timing.advance(data.len() / channels);
                },
                move |err| {
                    log::warn!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| MetronomeError::Capability(format!("Error in stream creation: {}", e)))
    }
}

impl AudioClock for CpalClock {
    fn now(&self) -> f64 {
        self.timing.now_secs()
    }

    fn schedule_click(&mut self, at: f64, click: ClickType) {
        let frame = self.timing.secs_to_frame(at);
        if self
            .command_tx
            .try_push(ClickCommand::Schedule { frame, click })
            .is_err()
        {
            log::warn!("Click command queue full, dropping click at {:.3}s", at);
        }
    }

    fn cancel_scheduled(&mut self) {
        if self.command_tx.try_push(ClickCommand::CancelAll).is_err() {
            log::warn!("Click command queue full, cancel not delivered");
        }
    }
}

impl Drop for CpalClock {
    fn drop(&mut self) {
        log::info!("Audio clock released at {:.3}s", self.timing.now_secs());
    }
}
