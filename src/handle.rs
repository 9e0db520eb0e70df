use std::{ffi::c_int, fmt, io};

use crate::{
    AbsInfo, InputId, KeyRepeat, Version,
    bits::{BitSet, BitValue, Word},
    event::{Abs, EventType, InputEvent},
};

/// Selects which bit mask [`DeviceHandle::fetch_bits`] retrieves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitQuery {
    /// Supported event types (`EVIOCGBIT(0, ..)`).
    Types,
    /// Supported codes of one event type (`EVIOCGBIT(ty, ..)`).
    Codes(EventType),
    /// Device properties (`EVIOCGPROP`).
    Props,
    /// Pressed keys (`EVIOCGKEY`).
    KeyState,
    /// Lit LEDs (`EVIOCGLED`).
    LedState,
    /// Active switches (`EVIOCGSW`).
    SwitchState,
    /// Playing sounds (`EVIOCGSND`).
    SoundState,
}

/// The kernel-facing side of a [`Device`][crate::Device].
///
/// [`Evdev`][crate::Evdev] implements this for real `/dev/input/event*` nodes. Other
/// implementations can stand in for the kernel, for example to replay recorded devices.
///
/// Errors are reported as [`io::Error`]s carrying the OS error code, the way the `evdev` ioctls
/// report them. Reads that would block must fail with [`io::ErrorKind::WouldBlock`].
pub trait DeviceHandle: fmt::Debug + Send + Sync {
    /// Fills `dest` with the requested bit mask.
    ///
    /// Bits beyond what the implementation knows about must be cleared.
    fn fetch_bits(&self, query: BitQuery, dest: &mut [Word]) -> io::Result<()>;

    fn abs_info(&self, abs: Abs) -> io::Result<AbsInfo>;

    fn set_abs_info(&self, abs: Abs, info: AbsInfo) -> io::Result<()>;

    /// Fills `dest[i]` with the value of `axis` in slot `i`, for every index in `dest`.
    fn mt_slot_values(&self, axis: Abs, dest: &mut [i32]) -> io::Result<()>;

    fn name(&self) -> io::Result<String>;

    /// Returns the physical location, or [`None`] if the device has none.
    fn phys(&self) -> io::Result<Option<String>>;

    /// Returns the unique identifier, or [`None`] if the device has none.
    fn unique_id(&self) -> io::Result<Option<String>>;

    fn input_id(&self) -> io::Result<InputId>;

    fn driver_version(&self) -> io::Result<Version>;

    fn key_repeat(&self) -> io::Result<KeyRepeat>;

    /// Reads events into `dest`, returning how many were read.
    fn read_events(&self, dest: &mut [InputEvent]) -> io::Result<usize>;

    /// Returns whether [`read_events`](Self::read_events) would return data without blocking.
    fn is_readable(&self) -> io::Result<bool>;

    fn grab(&self, grab: bool) -> io::Result<()>;

    fn set_clock_id(&self, clock: c_int) -> io::Result<()>;

    /// Writes events to the device, e.g. to toggle LEDs.
    fn write_events(&self, events: &[InputEvent]) -> io::Result<()>;
}

/// Fetches a bit mask into a fresh [`BitSet`].
pub(crate) fn fetch_set<V: BitValue>(
    handle: &dyn DeviceHandle,
    query: BitQuery,
) -> io::Result<BitSet<V>> {
    let mut set = BitSet::<V>::new();
    handle.fetch_bits(query, set.words_mut())?;
    Ok(set)
}
