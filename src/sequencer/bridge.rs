// UI bridge - Turns dispatched beats into "current beat" updates
//
// Polled on the display cadence, independently of the look-ahead tick. It
// only drains the scheduler's queue; it never touches scheduler state, and
// the audio path never touches it.

use super::queue::QueueReader;

/// Receives the current beat index, or `None` when no beat is active
pub type BeatListener = Box<dyn FnMut(Option<usize>)>;

pub struct UiBridge {
    reader: QueueReader,
    listeners: Vec<BeatListener>,
    current: Option<usize>,
    active: bool,
}

impl UiBridge {
    pub fn new(reader: QueueReader) -> Self {
        Self {
            reader,
            listeners: Vec::new(),
            current: None,
            active: false,
        }
    }

    pub fn add_listener(&mut self, listener: BeatListener) {
        self.listeners.push(listener);
    }

    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Begin forwarding beats
    pub fn activate(&mut self) {
        self.active = true;
    }

    /// Emit every beat whose time has passed, oldest first.
    /// Several beats may be due at once after a long gap between polls.
    pub fn poll(&mut self, clock_now: f64) -> usize {
        if !self.active {
            return 0;
        }
        let mut emitted = 0;
        while let Some(event) = self.reader.pop_due(clock_now) {
            self.current = Some(event.beat_index);
            self.emit(self.current);
            emitted += 1;
        }
        emitted
    }

    /// Stop forwarding and clear the indicator with a final `None`
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.current = None;
        self.emit(None);
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn current_beat(&self) -> Option<usize> {
        self.current
    }

    fn emit(&mut self, beat: Option<usize>) {
        for listener in self.listeners.iter_mut() {
            listener(beat);
        }
    }
}
