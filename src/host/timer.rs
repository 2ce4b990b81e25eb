// Timer queue - Coarse one-shot and repeating timers for the host event loop
//
// Min-heap ordered by (deadline, insertion sequence) with lazy deletion:
// the `live` map is the source of truth, heap entries whose timer was
// cancelled or rescheduled are discarded when they reach the top.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// Shortest repeating period; keeps `now + period > now` for any realistic `now`
pub const MIN_PERIOD_SECS: f64 = 1e-6;

/// Identifies a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Key {
    deadline: f64,
    seq: u64,
    id: u64,
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// BinaryHeap is a max-heap: reverse for earliest-deadline-first
impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline
            .total_cmp(&other.deadline)
            .then(self.seq.cmp(&other.seq))
            .then(self.id.cmp(&other.id))
            .reverse()
    }
}

#[derive(Debug)]
struct Slot<K> {
    kind: K,
    /// Sequence of the heap entry currently representing this timer
    seq: u64,
    /// Some(period) for repeating timers
    period: Option<f64>,
    /// Repeating timers fire at origin + count * period
    origin: f64,
    count: u64,
}

/// Queue of pending host timers tagged with a caller-defined kind
#[derive(Debug)]
pub struct TimerQueue<K> {
    heap: BinaryHeap<Key>,
    live: HashMap<u64, Slot<K>>,
    next_id: u64,
    next_seq: u64,
}

impl<K: Copy> Default for TimerQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy> TimerQueue<K> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            live: HashMap::new(),
            next_id: 0,
            next_seq: 0,
        }
    }

    /// Fire once at `deadline`
    pub fn schedule_once(&mut self, deadline: f64, kind: K) -> TimerId {
        self.insert(deadline, None, kind)
    }

    /// Fire at `first`, then every `period` seconds until cancelled.
    /// Firings are computed from `first`, so late pumps do not accumulate drift.
    pub fn schedule_repeating(&mut self, first: f64, period: f64, kind: K) -> TimerId {
        let period = if period.is_finite() {
            period.max(MIN_PERIOD_SECS)
        } else {
            MIN_PERIOD_SECS
        };
        self.insert(first, Some(period), kind)
    }

    /// Cancel a timer. Returns false when it already fired (one-shot) or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.live.remove(&id.0).is_some()
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.live.contains_key(&id.0)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Drop every pending timer
    pub fn clear(&mut self) {
        self.live.clear();
        self.heap.clear();
    }

    /// Earliest pending deadline
    pub fn peek_deadline(&mut self) -> Option<f64> {
        self.clean_top();
        self.heap.peek().map(|k| k.deadline)
    }

    /// Pop the earliest timer due at `now`.
    /// Repeating timers are re-armed at their next nominal deadline after `now`,
    /// skipping periods that were missed entirely.
    pub fn pop_due(&mut self, now: f64) -> Option<(TimerId, K)> {
        self.clean_top();
        let top = self.heap.peek()?;
        if top.deadline > now {
            return None;
        }
        let key = self.heap.pop()?;
        let id = key.id;

        let slot = self.live.get_mut(&id)?;
        let kind = slot.kind;
        match slot.period {
            None => {
                self.live.remove(&id);
            }
            Some(period) => {
                slot.count = slot.count.saturating_add(1);
                let mut next = slot.origin + slot.count as f64 * period;
                if next <= now {
                    let missed = ((now - slot.origin) / period).floor();
                    slot.count = if missed < u64::MAX as f64 {
                        (missed as u64).saturating_add(1).max(slot.count)
                    } else {
                        u64::MAX
                    };
                    next = slot.origin + slot.count as f64 * period;
                    if next <= now {
                        // Grid lost to rounding: restart it from now
                        slot.origin = now;
                        slot.count = 1;
                        next = now + period;
                    }
                }
                slot.seq = self.next_seq;
                self.next_seq += 1;
                self.heap.push(Key {
                    deadline: next,
                    seq: slot.seq,
                    id,
                });
            }
        }
        Some((TimerId(id), kind))
    }

    fn insert(&mut self, deadline: f64, period: Option<f64>, kind: K) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.live.insert(
            id,
            Slot {
                kind,
                seq,
                period,
                origin: deadline,
                count: 0,
            },
        );
        self.heap.push(Key { deadline, seq, id });
        TimerId(id)
    }

    // Discard heap entries for cancelled timers or superseded deadlines
    fn clean_top(&mut self) {
        while let Some(top) = self.heap.peek() {
            match self.live.get(&top.id) {
                Some(slot) if slot.seq == top.seq => break,
                _ => {
                    self.heap.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Kind {
        A,
        B,
    }

    #[test]
    fn test_fires_in_deadline_order() {
        let mut timers = TimerQueue::new();
        timers.schedule_once(0.3, Kind::B);
        timers.schedule_once(0.1, Kind::A);

        assert_eq!(timers.peek_deadline(), Some(0.1));
        assert!(timers.pop_due(0.05).is_none());
        assert_eq!(timers.pop_due(1.0).map(|(_, k)| k), Some(Kind::A));
        assert_eq!(timers.pop_due(1.0).map(|(_, k)| k), Some(Kind::B));
        assert!(timers.pop_due(1.0).is_none());
        assert!(timers.is_empty());
    }

    #[test]
    fn test_same_deadline_keeps_insertion_order() {
        let mut timers = TimerQueue::new();
        timers.schedule_once(0.5, Kind::B);
        timers.schedule_once(0.5, Kind::A);
        assert_eq!(timers.pop_due(0.5).map(|(_, k)| k), Some(Kind::B));
        assert_eq!(timers.pop_due(0.5).map(|(_, k)| k), Some(Kind::A));
    }

    #[test]
    fn test_cancel() {
        let mut timers = TimerQueue::new();
        let id = timers.schedule_once(0.1, Kind::A);
        assert!(timers.is_scheduled(id));
        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));
        assert!(timers.pop_due(1.0).is_none());
        assert_eq!(timers.peek_deadline(), None);
    }

    #[test]
    fn test_repeating_timer_has_no_cumulative_drift() {
        let mut timers = TimerQueue::new();
        timers.schedule_repeating(0.0, 0.025, Kind::A);

        let mut fired = 0;
        let mut now = 0.0;
        // Pump late every time; deadlines stay on the nominal grid
        while fired < 400 {
            let deadline = timers.peek_deadline().unwrap();
            let expected = fired as f64 * 0.025;
            assert!((deadline - expected).abs() < 1e-9);
            now = deadline + 0.003;
            assert!(timers.pop_due(now).is_some());
            fired += 1;
        }
        assert!(now > 9.9);
    }

    #[test]
    fn test_repeating_timer_skips_missed_periods() {
        let mut timers = TimerQueue::new();
        timers.schedule_repeating(0.0, 0.025, Kind::A);
        assert!(timers.pop_due(0.0).is_some());

        // Stalled for a second: one firing, not forty
        assert!(timers.pop_due(1.01).is_some());
        assert!(timers.pop_due(1.01).is_none());
        let next = timers.peek_deadline().unwrap();
        assert!(next > 1.01 && next <= 1.01 + 0.025 + 1e-9);
    }

    #[test]
    fn test_tiny_period_catches_up_in_one_firing() {
        let mut timers = TimerQueue::new();
        timers.schedule_repeating(1e-18, 1e-18, Kind::A);

        assert!(timers.pop_due(100.0).is_some());
        assert!(timers.pop_due(100.0).is_none());
        let next = timers.peek_deadline().unwrap();
        assert!(next > 100.0 && next <= 100.0 + 2.0 * MIN_PERIOD_SECS);
    }

    #[test]
    fn test_cancel_repeating() {
        let mut timers = TimerQueue::new();
        let id = timers.schedule_repeating(0.0, 0.1, Kind::A);
        timers.schedule_once(0.05, Kind::B);
        assert!(timers.pop_due(0.0).is_some());
        assert!(timers.cancel(id));
        assert_eq!(timers.pop_due(1.0).map(|(_, k)| k), Some(Kind::B));
        assert!(timers.pop_due(10.0).is_none());
    }
}
