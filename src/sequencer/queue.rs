// Event queue - Beats dispatched to the audio clock but not yet shown
//
// Single writer (the scheduler) appends in strictly increasing time order;
// single reader (the UI bridge) drains from the front once a beat's time
// has passed. Both live in the same execution context.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// A beat dispatched to the audio clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatEvent {
    /// Position within the measure, in [0, beats_per_measure)
    pub beat_index: usize,
    /// Audio clock time at which the beat sounds
    pub scheduled_time: f64,
    pub is_accent: bool,
}

/// Writer side, owned by the scheduler
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Rc<RefCell<VecDeque<BeatEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event. Events at or before the last queued time are refused,
    /// which keeps at most one event per scheduled time.
    pub fn push(&self, event: BeatEvent) -> bool {
        let mut events = self.events.borrow_mut();
        if let Some(last) = events.back()
            && event.scheduled_time <= last.scheduled_time
        {
            return false;
        }
        events.push_back(event);
        true
    }

    /// Discard all pending events
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// First queued event whose time is after `now`
    pub fn first_after(&self, now: f64) -> Option<BeatEvent> {
        self.events
            .borrow()
            .iter()
            .find(|e| e.scheduled_time > now)
            .copied()
    }

    /// Read/drain handle for the UI side
    pub fn reader(&self) -> QueueReader {
        QueueReader {
            events: Rc::clone(&self.events),
        }
    }
}

/// Reader side: can inspect and drain due events, never append
#[derive(Debug, Clone)]
pub struct QueueReader {
    events: Rc<RefCell<VecDeque<BeatEvent>>>,
}

impl QueueReader {
    /// Pop the front event if its time has come
    pub fn pop_due(&self, now: f64) -> Option<BeatEvent> {
        let mut events = self.events.borrow_mut();
        match events.front() {
            Some(front) if front.scheduled_time <= now => events.pop_front(),
            _ => None,
        }
    }

    pub fn peek(&self) -> Option<BeatEvent> {
        self.events.borrow().front().copied()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}
