// Sequencer module - Tempo, look-ahead scheduling and transport control

pub mod bridge;
pub mod queue;
pub mod scheduler;
pub mod tempo;
pub mod transport;

pub use bridge::{BeatListener, UiBridge};
pub use queue::{BeatEvent, EventQueue, QueueReader};
pub use scheduler::{BeatScheduler, TransportState};
pub use tempo::Tempo;
pub use transport::{ControllerState, TransportController};
