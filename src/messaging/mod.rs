// Messaging - Lock-free command path from the scheduler to the audio callback

pub mod channels;
pub mod command;

pub use channels::{ClickConsumer, ClickProducer, create_click_channel};
pub use command::ClickCommand;
