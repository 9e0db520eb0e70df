//! Reading events with state tracking and `SYN_DROPPED` recovery.
//!
//! [`Device::next_event`] is the primitive: it hands out one event at a time, updates the cached
//! device state, and reports when events were lost. After a [`ReadStatus::Dropped`] (or a
//! [`ReadStatus::ResyncRequired`]) the caller picks one of two ways to continue:
//!
//! - Call [`Device::next_event`] with [`ReadFlags::SYNC`] until it returns [`ReadStatus::Empty`].
//!   Each call yields one event of a synthesized frame that describes the difference between the
//!   last delivered state and the kernel's current state.
//! - Keep calling with [`ReadFlags::NORMAL`]. The queued events are then applied to the cached
//!   state without being returned, and normal delivery resumes.
//!
//! [`Device::events`] wraps this in an [`Iterator`] that follows the first route automatically.

use std::{cell::Cell, fmt, io, ops};

use crate::{
    Device,
    error::{invalid_input, is_fatal, not_bound},
    event::{Abs, EventCode, InputEvent, Syn},
    slots::NO_TOUCH,
    sync::SyncState,
    util::on_drop_elapsed,
};

/// Flags controlling a [`Device::next_event`] call.
///
/// At least one of [`NORMAL`](Self::NORMAL), [`SYNC`](Self::SYNC) or
/// [`FORCE_SYNC`](Self::FORCE_SYNC) must be set.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReadFlags(u32);

impl ReadFlags {
    /// Deliver events from the synthesized sync frame.
    pub const SYNC: Self = Self(1);
    /// Deliver regular events.
    pub const NORMAL: Self = Self(2);
    /// Discard pending events and request a resync.
    pub const FORCE_SYNC: Self = Self(4);
    /// Read from the handle even if it has no data ready, which blocks on blocking handles.
    pub const BLOCKING: Self = Self(8);

    const ALL: u32 = 0xf;
    const MODES: u32 = Self::SYNC.0 | Self::NORMAL.0 | Self::FORCE_SYNC.0;

    /// Creates flags from raw bits, keeping unknown ones.
    ///
    /// [`Device::next_event`] rejects unknown bits.
    #[inline]
    pub const fn from_bits_retain(bits: u32) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    fn is_valid(self) -> bool {
        self.0 & !Self::ALL == 0 && self.0 & Self::MODES != 0
    }
}

impl ops::BitOr for ReadFlags {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl ops::BitOrAssign for ReadFlags {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for ReadFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(ReadFlags, &str); 4] = [
            (ReadFlags::SYNC, "SYNC"),
            (ReadFlags::NORMAL, "NORMAL"),
            (ReadFlags::FORCE_SYNC, "FORCE_SYNC"),
            (ReadFlags::BLOCKING, "BLOCKING"),
        ];
        let mut first = true;
        for (flag, name) in NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        let unknown = self.0 & !Self::ALL;
        if unknown != 0 || first {
            if !first {
                f.write_str(" | ")?;
            }
            write!(f, "{unknown:#x}")?;
        }
        Ok(())
    }
}

/// Outcome of a successful [`Device::next_event`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// A regular event.
    Success(InputEvent),
    /// An event of the synthesized sync frame.
    Sync(InputEvent),
    /// The `SYN_DROPPED` event: events were lost and a resync is needed.
    Dropped(InputEvent),
    /// A resync was requested with [`ReadFlags::FORCE_SYNC`].
    ResyncRequired,
    /// No event is available right now.
    Empty,
}

/// Result of checking an incoming event against the device state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Filter {
    Keep(InputEvent),
    Modified(InputEvent),
    Discard,
}

impl Filter {
    pub(crate) fn is_unchanged(&self) -> bool {
        matches!(self, Self::Keep(_))
    }
}

impl Device {
    /// Fetches the next event.
    ///
    /// # Errors
    ///
    /// - [`io::ErrorKind::NotConnected`] if no handle is attached.
    /// - [`io::ErrorKind::InvalidInput`] if `flags` is invalid.
    /// - Any error reported by the handle, except [`io::ErrorKind::WouldBlock`], which results in
    ///   [`ReadStatus::Empty`].
    ///
    /// If a kernel query fails while building a sync frame, the error is returned, but the frame
    /// (minus the failed part) is still delivered by subsequent [`ReadFlags::SYNC`] calls.
    /// Errors for which [`error::is_fatal`][crate::error::is_fatal] returns `true` leave the
    /// device unusable.
    pub fn next_event(&mut self, flags: ReadFlags) -> io::Result<ReadStatus> {
        self.handle_or_err()?;
        if !flags.is_valid() {
            log_bug!(self.log_context(), "invalid read flags {flags:?}");
            return Err(invalid_input(format!("invalid read flags {flags:?}")));
        }

        if flags.contains(ReadFlags::SYNC) {
            if self.sync_state == SyncState::Needed {
                match self.resync() {
                    Err(e) if is_fatal(&e) => return Err(e),
                    res => {
                        self.sync_state = SyncState::InProgress;
                        res?;
                    }
                }
            }
            if self.queue.pending_sync() == 0 {
                self.sync_state = SyncState::None;
                return Ok(ReadStatus::Empty);
            }
        } else if self.sync_state != SyncState::None {
            // The caller skipped the sync frame (or the stale events after a `SYN_DROPPED`):
            // apply it to the cached state without handing it out.
            while let Some(event) = self.queue.shift_first() {
                if let Filter::Keep(ev) | Filter::Modified(ev) = self.sanitize(event, self.sync_state)
                {
                    self.apply_state(ev);
                }
            }
            self.sync_state = SyncState::None;
        }

        let (event, in_frame) = loop {
            if self.queue.is_empty() {
                self.read_more(flags.contains(ReadFlags::BLOCKING))?;
            }

            if flags.contains(ReadFlags::FORCE_SYNC) {
                self.sync_state = SyncState::Needed;
                return Ok(ReadStatus::ResyncRequired);
            }

            let in_frame = self.queue.pending_sync() > 0;
            let Some(event) = self.queue.shift_first() else {
                return Ok(ReadStatus::Empty);
            };

            match self.sanitize(event, self.sync_state) {
                Filter::Discard => continue,
                Filter::Keep(ev) | Filter::Modified(ev) => {
                    self.apply_state(ev);
                    break (ev, in_frame);
                }
            }
        };

        if event.is_code(Syn::DROPPED) {
            dev_log!(self.log_context(), Debug, "SYN_DROPPED: events were lost");
            self.sync_state = SyncState::Needed;
            return Ok(ReadStatus::Dropped(event));
        }

        if flags.contains(ReadFlags::SYNC) && in_frame {
            if self.queue.pending_sync() == 0 {
                self.sync_state = SyncState::None;
            }
            return Ok(ReadStatus::Sync(event));
        }

        Ok(ReadStatus::Success(event))
    }

    /// Returns whether [`Device::next_event`] has something to return without blocking.
    pub fn has_pending_event(&self) -> io::Result<bool> {
        let handle = self.handle_or_err()?;
        if !self.queue.is_empty() {
            return Ok(true);
        }
        handle.is_readable()
    }

    /// Reads as many events as fit into the free part of the queue.
    fn read_more(&mut self, blocking: bool) -> io::Result<()> {
        let Some(handle) = self.handle.as_deref() else {
            return Err(not_bound());
        };
        if !blocking && !handle.is_readable()? {
            return Ok(());
        }

        let len = self.queue.num_queued();
        let spare = self.queue.spare_mut();
        if spare.is_empty() {
            return Ok(());
        }
        match handle.read_events(spare) {
            Ok(n) => {
                self.queue.set_fill_length(len + n);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Checks `event` against the device's capabilities and multitouch state.
    pub(crate) fn sanitize(&self, event: InputEvent, state: SyncState) -> Filter {
        let Some(code) = event.code() else {
            return Filter::Discard;
        };
        if !self.caps.has_code(code) {
            return Filter::Discard;
        }

        let (EventCode::Abs(abs), Some(slots)) = (code, &self.slots) else {
            return Filter::Keep(event);
        };
        let value = event.raw_value();

        if abs == Abs::MT_SLOT && !usize::try_from(value).is_ok_and(|s| s < slots.slot_count()) {
            let max = slots.slot_count().saturating_sub(1);
            dev_log!(
                self.log_context(),
                Info,
                "device \"{}\" received an invalid slot index {value}, capping to announced max slot number {max}",
                self.name()
            );
            return Filter::Modified(event.with_value(max as i32));
        }

        if abs == Abs::MT_TRACKING_ID && state == SyncState::None {
            let current = slots.current();
            let cached = slots.get(current, Abs::MT_TRACKING_ID).unwrap_or(NO_TOUCH);
            if (value == NO_TOUCH) == (cached == NO_TOUCH) {
                log_bug!(
                    self.log_context(),
                    "device \"{}\" received a double tracking ID {value} in slot {current}",
                    self.name()
                );
                return Filter::Discard;
            }
        }

        Filter::Keep(event)
    }

    /// Applies a validated event to the cached state.
    pub(crate) fn apply_state(&mut self, event: InputEvent) {
        let value = event.raw_value();
        match event.code() {
            Some(EventCode::Key(key)) => self.values.keys.set(key, value != 0),
            Some(EventCode::Led(led)) => self.values.leds.set(led, value != 0),
            Some(EventCode::Switch(sw)) => self.values.switches.set(sw, value != 0),
            Some(EventCode::Sound(snd)) => self.values.sounds.set(snd, value != 0),
            Some(EventCode::Repeat(rep)) => self.values.rep.set(rep, value as u32),
            Some(EventCode::Abs(abs)) => self.apply_abs(abs, value),
            _ => {}
        }
        self.last_event_time = event.timeval();
    }

    fn apply_abs(&mut self, abs: Abs, value: i32) {
        if let Some(slots) = &mut self.slots {
            if abs == Abs::MT_SLOT {
                if let Ok(slot) = usize::try_from(value) {
                    slots.set_current(slot);
                }
                // Make the per-axis values reflect the newly selected slot.
                let current = slots.current();
                for axis in self.caps.abs.iter().filter(|a| a.is_mt_axis()) {
                    if let (Some(v), Some(info)) =
                        (slots.get(current, axis), self.values.abs_mut(axis))
                    {
                        info.set_value(v);
                    }
                }
            } else if abs.is_mt_axis() {
                let current = slots.current();
                slots.set(current, abs, value);
            }
        }
        if let Some(info) = self.values.abs_mut(abs) {
            info.set_value(value);
        }
    }

    /// Returns an iterator over incoming events that resynchronizes automatically.
    ///
    /// `SYN_DROPPED` is not yielded; instead the sync frame follows directly. The iterator ends
    /// when no more events are available. On blocking handles it waits for the next event instead.
    pub fn events(&mut self) -> Events<'_> {
        Events {
            device: self,
            syncing: false,
        }
    }

    /// Processes all available events without blocking, keeping only their effect on the cached
    /// state.
    pub fn update(&mut self) -> io::Result<()> {
        let log = self.log_context();
        let count = Cell::new(0);
        let _d = on_drop_elapsed(|dur| {
            dev_log!(log, Debug, "update processed {} events in {dur:?}", count.get());
        });

        let mut syncing = false;
        loop {
            let flags = if syncing {
                ReadFlags::SYNC
            } else {
                ReadFlags::NORMAL
            };
            match self.next_event(flags)? {
                ReadStatus::Success(_) | ReadStatus::Sync(_) => count.set(count.get() + 1),
                ReadStatus::Dropped(_) | ReadStatus::ResyncRequired => syncing = true,
                ReadStatus::Empty if syncing => syncing = false,
                ReadStatus::Empty => return Ok(()),
            }
        }
    }
}

/// An [`Iterator`] over the events of a [`Device`].
///
/// Returned by [`Device::events`].
#[derive(Debug)]
pub struct Events<'a> {
    device: &'a mut Device,
    syncing: bool,
}

impl Iterator for Events<'_> {
    type Item = io::Result<InputEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let flags = if self.syncing {
                ReadFlags::SYNC
            } else {
                ReadFlags::NORMAL | ReadFlags::BLOCKING
            };
            match self.device.next_event(flags) {
                Ok(ReadStatus::Success(ev) | ReadStatus::Sync(ev)) => return Some(Ok(ev)),
                Ok(ReadStatus::Dropped(_) | ReadStatus::ResyncRequired) => self.syncing = true,
                Ok(ReadStatus::Empty) if self.syncing => self.syncing = false,
                Ok(ReadStatus::Empty) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl<'a> IntoIterator for &'a mut Device {
    type Item = io::Result<InputEvent>;
    type IntoIter = Events<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.events()
    }
}
