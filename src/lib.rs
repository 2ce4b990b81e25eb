// Tiles Metronome - Library exports for the application, tests and benchmarks

pub mod audio;
pub mod config;
pub mod error;
pub mod handle;
pub mod host;
pub mod messaging;
pub mod sequencer;
pub mod sim;

// Re-export commonly used types for convenience
pub use audio::clock::{AudioClock, AudioStatus, ClickType, ClockProvider, SilentClock};
pub use audio::cpal_clock::CpalClockProvider;
pub use audio::timing::AudioTiming;
pub use config::{ClickConfig, ClickWaveform, MetronomeConfig};
pub use error::{MetronomeError, MetronomeResult};
pub use handle::MetronomeHandle;
pub use host::{HostClock, SimulatedHostClock, SystemHostClock};
pub use sequencer::{
    BeatEvent, BeatScheduler, ControllerState, Tempo, TransportController, TransportState,
    UiBridge,
};
pub use sim::{Simulation, SimulatedClockProvider};
