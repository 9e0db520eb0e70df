//! Fixed-capacity event buffer shared by the reader and the resync engine.

use crate::event::InputEvent;

/// Smallest capacity a bound device's queue is ever sized to.
pub(crate) const MIN_QUEUE_SIZE: usize = 256;

/// A FIFO of [`InputEvent`]s with a fixed capacity.
///
/// The first [`pending_sync`](Self::pending_sync) entries form a synthesized sync frame. Every
/// operation that removes entries from the front also consumes them from the frame, so the
/// count never exceeds [`num_queued`](Self::num_queued).
pub struct EventQueue {
    events: Box<[InputEvent]>,
    len: usize,
    pending_sync: usize,
}

impl EventQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: vec![InputEvent::zeroed(); capacity].into_boxed_slice(),
            len: 0,
            pending_sync: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn num_queued(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn num_free(&self) -> usize {
        self.capacity() - self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn pending_sync(&self) -> usize {
        self.pending_sync
    }

    /// Marks the first `count` queued events as a sync frame. `count` is capped at the fill level.
    pub fn set_pending_sync(&mut self, count: usize) {
        self.pending_sync = count.min(self.len);
    }

    /// Appends an event. Returns `false` if the queue is full.
    pub fn push(&mut self, event: InputEvent) -> bool {
        match self.events.get_mut(self.len) {
            Some(slot) => {
                *slot = event;
                self.len += 1;
                true
            }
            None => false,
        }
    }

    /// Removes and returns the most recently pushed event.
    pub fn pop_last(&mut self) -> Option<InputEvent> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        self.pending_sync = self.pending_sync.min(self.len);
        Some(self.events[self.len])
    }

    /// Removes and returns the oldest event.
    pub fn shift_first(&mut self) -> Option<InputEvent> {
        if self.len == 0 {
            return None;
        }
        let first = self.events[0];
        self.discard_many(1);
        Some(first)
    }

    /// Removes up to `count` events from the front and returns them in order.
    pub fn shift_many(&mut self, count: usize) -> Vec<InputEvent> {
        let count = count.min(self.len);
        let out = self.events[..count].to_vec();
        self.discard_many(count);
        out
    }

    /// Drops up to `count` events from the front. Returns how many were dropped.
    pub fn discard_many(&mut self, count: usize) -> usize {
        let count = count.min(self.len);
        self.events.copy_within(count..self.len, 0);
        self.len -= count;
        self.pending_sync = self.pending_sync.saturating_sub(count);
        count
    }

    /// Returns the event at `index`, counting from the oldest.
    pub fn peek_at(&self, index: usize) -> Option<InputEvent> {
        self.events[..self.len].get(index).copied()
    }

    pub fn clear(&mut self) {
        self.len = 0;
        self.pending_sync = 0;
    }

    /// Returns the unused tail of the buffer, to be filled by a read.
    ///
    /// Commit filled entries with [`set_fill_length`](Self::set_fill_length).
    pub fn spare_mut(&mut self) -> &mut [InputEvent] {
        &mut self.events[self.len..]
    }

    /// Sets the number of valid events. Returns `false` (and does nothing) if `len` exceeds the
    /// capacity.
    pub fn set_fill_length(&mut self, len: usize) -> bool {
        if len > self.capacity() {
            return false;
        }
        self.len = len;
        self.pending_sync = self.pending_sync.min(len);
        true
    }

    /// Changes the capacity, preserving queued events. Never shrinks below the fill level.
    pub fn resize(&mut self, capacity: usize) {
        let capacity = capacity.max(self.len);
        if capacity == self.capacity() {
            return;
        }
        let mut events = vec![InputEvent::zeroed(); capacity].into_boxed_slice();
        events[..self.len].copy_from_slice(&self.events[..self.len]);
        self.events = events;
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl std::fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventQueue")
            .field("capacity", &self.capacity())
            .field("events", &&self.events[..self.len])
            .field("pending_sync", &self.pending_sync)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::event::{Abs, Key, Syn};

    use super::*;

    fn ev(code: Key, value: i32) -> InputEvent {
        InputEvent::from_code(code, value)
    }

    #[test]
    fn fifo() {
        let mut q = EventQueue::with_capacity(3);
        assert!(q.push(ev(Key::KEY_A, 1)));
        assert!(q.push(ev(Key::KEY_B, 1)));
        assert!(q.push(Syn::REPORT.into()));
        assert!(!q.push(ev(Key::KEY_C, 1)));
        assert_eq!(q.num_free(), 0);

        assert_eq!(q.peek_at(1), Some(ev(Key::KEY_B, 1)));
        assert_eq!(q.peek_at(3), None);
        assert_eq!(q.shift_first(), Some(ev(Key::KEY_A, 1)));
        assert_eq!(q.pop_last(), Some(Syn::REPORT.into()));
        assert_eq!(q.shift_first(), Some(ev(Key::KEY_B, 1)));
        assert_eq!(q.shift_first(), None);
        assert_eq!(q.pop_last(), None);
    }

    #[test]
    fn bulk() {
        fn filled() -> EventQueue {
            let mut q = EventQueue::with_capacity(8);
            for i in 0..5 {
                q.push(InputEvent::from_code(Abs::X, i));
            }
            q.set_pending_sync(3);
            q
        }

        // Bulk removal behaves exactly like repeated single removals, including past the end.
        for n in 0..=6 {
            let mut bulk = filled();
            let mut single = filled();
            let shifted = bulk.shift_many(n);
            let expected: Vec<_> = (0..n).filter_map(|_| single.shift_first()).collect();
            assert_eq!(shifted, expected, "n={n}");
            assert_eq!(bulk.num_queued(), single.num_queued(), "n={n}");
            assert_eq!(bulk.pending_sync(), single.pending_sync(), "n={n}");
            for i in 0..bulk.capacity() {
                assert_eq!(bulk.peek_at(i), single.peek_at(i), "n={n} i={i}");
            }
        }

        let mut q = filled();
        assert_eq!(q.shift_many(2)[1], InputEvent::from_code(Abs::X, 1));
        assert_eq!(q.pending_sync(), 1);
        assert_eq!(q.discard_many(10), 3);
        assert_eq!(q.pending_sync(), 0);
        assert!(q.is_empty());
    }

    #[test]
    fn pending_sync_tracks_front() {
        let mut q = EventQueue::with_capacity(8);
        for _ in 0..4 {
            q.push(Syn::REPORT.into());
        }
        q.set_pending_sync(10);
        assert_eq!(q.pending_sync(), 4);
        q.shift_first();
        assert_eq!(q.pending_sync(), 3);
        q.pop_last();
        q.pop_last();
        assert_eq!(q.pending_sync(), 1);
        q.clear();
        assert_eq!(q.pending_sync(), 0);
    }

    #[test]
    fn fill_and_resize() {
        let mut q = EventQueue::with_capacity(4);
        q.push(ev(Key::KEY_A, 1));
        let spare = q.spare_mut();
        assert_eq!(spare.len(), 3);
        spare[0] = ev(Key::KEY_B, 1);
        assert!(q.set_fill_length(2));
        assert!(!q.set_fill_length(5));
        assert_eq!(q.num_queued(), 2);

        q.resize(1);
        assert_eq!(q.capacity(), 2);
        q.resize(16);
        assert_eq!(q.capacity(), 16);
        assert_eq!(q.shift_many(2), [ev(Key::KEY_A, 1), ev(Key::KEY_B, 1)]);
    }
}
