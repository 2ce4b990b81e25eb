// Click commands - Control side → audio callback

use crate::audio::clock::ClickType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickCommand {
    /// Start a click at an absolute output frame
    Schedule { frame: u64, click: ClickType },
    /// Drop pending clicks and silence sounding ones
    CancelAll,
}
