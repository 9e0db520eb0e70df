//! Per-slot multitouch state.

use std::{io, iter::zip};

use crate::{
    Slot,
    bits::BitSet,
    event::Abs,
    handle::DeviceHandle,
    logging::LogContext,
};

/// Upper bound on the number of slots tracked per device.
pub(crate) const MAX_SLOTS: usize = 256;

const FIRST_AXIS: u16 = Abs::MT_SLOT.0 + 1;
const AXIS_COUNT: usize = (Abs::MAX.0 - Abs::MT_SLOT.0) as usize;

/// Tracking ID of a slot that has no contact.
pub(crate) const NO_TOUCH: i32 = -1;

/// How a slot's contact changed between two snapshots, judged by its tracking ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TouchState {
    /// Empty before and after.
    #[default]
    Unchanged,
    /// A contact appeared in an empty slot.
    Started,
    /// The contact left the slot.
    Stopped,
    /// The same contact is still present.
    Ongoing,
    /// The contact was replaced by a different one.
    Changed,
}

impl TouchState {
    pub fn classify(before: i32, after: i32) -> Self {
        match (before == NO_TOUCH, after == NO_TOUCH) {
            (true, true) => Self::Unchanged,
            (true, false) => Self::Started,
            (false, true) => Self::Stopped,
            (false, false) if before == after => Self::Ongoing,
            (false, false) => Self::Changed,
        }
    }
}

/// Result of comparing one cached slot against the kernel.
#[derive(Debug, Clone, Default)]
pub struct SlotChange {
    pub state: TouchState,
    /// Axes whose value differs from the cached one.
    pub axes: BitSet<Abs>,
}

/// Cached values of every multitouch axis in every slot, plus the active slot.
#[derive(Debug, Clone)]
pub struct SlotTable {
    slots: Vec<[i32; AXIS_COUNT]>,
    current: usize,
}

fn column(axis: Abs) -> Option<usize> {
    axis.is_mt_axis().then(|| usize::from(axis.0 - FIRST_AXIS))
}

impl SlotTable {
    /// Creates a table with `count` slots, all axes zero and every slot empty.
    ///
    /// Counts above the supported maximum are clamped.
    pub fn new(count: usize, log: &LogContext) -> Self {
        let count = if count > MAX_SLOTS {
            dev_log!(
                log,
                Info,
                "device announces {count} slots, only the first {MAX_SLOTS} will be tracked"
            );
            MAX_SLOTS
        } else {
            count
        };

        let mut this = Self {
            slots: vec![[0; AXIS_COUNT]; count],
            current: 0,
        };
        this.reset_tracking_ids();
        this
    }

    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn valid_slots(&self) -> impl Iterator<Item = Slot> + use<> {
        (0..self.slots.len() as u16).map(Slot::from)
    }

    #[inline]
    pub fn current(&self) -> usize {
        self.current
    }

    /// Makes `slot` the active one. Out-of-range indices are ignored.
    pub fn set_current(&mut self, slot: usize) -> bool {
        if slot < self.slots.len() {
            self.current = slot;
            true
        } else {
            false
        }
    }

    pub fn get(&self, slot: usize, axis: Abs) -> Option<i32> {
        Some(self.slots.get(slot)?[column(axis)?])
    }

    /// Stores `value` if `slot` and `axis` are valid. Returns whether it was stored.
    pub fn set(&mut self, slot: usize, axis: Abs, value: i32) -> bool {
        match (self.slots.get_mut(slot), column(axis)) {
            (Some(row), Some(col)) => {
                row[col] = value;
                true
            }
            _ => false,
        }
    }

    /// Resolves `slot` and `axis` to a cell, substituting slot 0 and the first multitouch axis
    /// for invalid ones (and logging that as a bug).
    ///
    /// Returns [`None`] only if the table has no slots at all.
    fn locate(&self, slot: usize, axis: Abs, log: &LogContext) -> Option<(usize, usize)> {
        let row = if slot < self.slots.len() {
            slot
        } else {
            log_bug!(
                log,
                "slot {slot} out of range (device has {} slots)",
                self.slots.len()
            );
            0
        };
        let col = column(axis).unwrap_or_else(|| {
            log_bug!(log, "{axis:?} is not a multitouch axis");
            0
        });
        (row < self.slots.len()).then_some((row, col))
    }

    /// Like [`get`](Self::get), but falls back to slot 0 and the first multitouch axis.
    pub fn value_at(&self, slot: usize, axis: Abs, log: &LogContext) -> i32 {
        self.locate(slot, axis, log)
            .map_or(0, |(row, col)| self.slots[row][col])
    }

    /// Like [`set`](Self::set), but falls back to slot 0 and the first multitouch axis.
    pub fn set_value_at(&mut self, slot: usize, axis: Abs, value: i32, log: &LogContext) {
        if let Some((row, col)) = self.locate(slot, axis, log) {
            self.slots[row][col] = value;
        }
    }

    /// Marks every slot as empty.
    pub fn reset_tracking_ids(&mut self) {
        let col = usize::from(Abs::MT_TRACKING_ID.0 - FIRST_AXIS);
        for row in &mut self.slots {
            row[col] = NO_TOUCH;
        }
    }

    /// Queries the kernel for every multitouch axis in `axes` and stores the results.
    ///
    /// Returns, per slot, how the contact changed and which axes differ from the previously
    /// cached values.
    pub fn diff_against_kernel(
        &mut self,
        handle: &dyn DeviceHandle,
        axes: &BitSet<Abs>,
    ) -> io::Result<Vec<SlotChange>> {
        let mut changes = vec![SlotChange::default(); self.slots.len()];
        let mut kernel = vec![0; self.slots.len()];

        for axis in axes.iter().filter(|axis| axis.is_mt_axis()) {
            let Some(col) = column(axis) else { continue };
            handle.mt_slot_values(axis, &mut kernel)?;

            for ((row, &new), change) in zip(zip(&mut self.slots, &kernel), &mut changes) {
                let old = row[col];
                if axis == Abs::MT_TRACKING_ID {
                    change.state = TouchState::classify(old, new);
                }
                if old != new {
                    change.axes.insert(axis);
                    row[col] = new;
                }
            }
        }

        Ok(changes)
    }
}
