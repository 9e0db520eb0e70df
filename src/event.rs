//! Input event types and enumerations.
//!
//! Devices deliver [`InputEvent`]s, fixed-size records made of:
//!
//! - **Timestamp** ([`InputEvent::time`]): The time at which the kernel queued the event.
//!   Synthetic events generated while resynchronizing a [`Device`] carry the timestamp of the last
//!   event the device delivered.
//! - **Event Type** ([`InputEvent::event_type`]): The capability group the event belongs to.
//! - **Event Code** ([`InputEvent::raw_code`]): Identifies the key, axis, LED or other object
//!   affected by the event. [`InputEvent::code`] returns it as a typed [`EventCode`].
//! - **Event Value** ([`InputEvent::raw_value`]): The new state of that object.
//!
//! [`InputEvent::kind`] returns an [`EventKind`], which wraps the event in a type-specific wrapper
//! like [`KeyEvent`] or [`AbsEvent`] that can be conveniently `match`ed on.
//!
//! # Serde support
//!
//! If the `serde` feature is enabled, [`Abs`], [`Key`], [`Rel`], [`Misc`], [`Led`], [`Switch`]
//! and [`Sound`] implement `Serialize` and `Deserialize`.
//! Human-readable formats use the evdev constant name if the code has one (eg. `KEY_F1`) and the
//! raw [`u16`] otherwise. Other formats always use the raw code.
//!
//! [`Device`]: crate::Device

pub(crate) mod codes;

#[cfg(any(test, feature = "serde"))]
mod serde;

use std::fmt;
use std::ops::Deref;
use std::time::{Duration, SystemTime};

use libc::timeval;

use crate::raw::input::input_event;

pub use codes::{Abs, EventType, FfFeature, Key, Led, Misc, Rel, Repeat, Sound, Switch, Syn};

/// An input event received from or sent to a device.
///
/// Use [`InputEvent::kind`] to convert it to a `match`able enum.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct InputEvent(input_event);

impl InputEvent {
    /// Creates an [`InputEvent`] from raw values.
    ///
    /// The timestamp of the event will be set to 0.
    #[inline]
    pub const fn new(ty: EventType, raw_code: u16, raw_value: i32) -> Self {
        Self(input_event {
            time: timeval {
                tv_sec: 0,
                tv_usec: 0,
            },
            type_: ty.0,
            code: raw_code,
            value: raw_value,
        })
    }

    /// Creates an [`InputEvent`] with all fields zeroed out.
    ///
    /// This results in a [`Syn::REPORT`] event.
    #[inline]
    pub const fn zeroed() -> Self {
        Self::new(EventType::SYN, 0, 0)
    }

    /// Creates an [`InputEvent`] from a typed [`EventCode`] and a value.
    #[inline]
    pub fn from_code(code: impl Into<EventCode>, value: i32) -> Self {
        let code = code.into();
        Self::new(code.event_type(), code.raw_code(), value)
    }

    /// Changes the timestamp of `self` to the given [`SystemTime`].
    ///
    /// The timestamp has microsecond resolution; sub-microsecond precision is truncated.
    /// Times that do not fit in a `timeval` saturate.
    pub fn with_time(mut self, time: SystemTime) -> Self {
        let (dur, sign) = match time.duration_since(SystemTime::UNIX_EPOCH) {
            Ok(dur) => (dur, 1),
            Err(e) => (e.duration(), -1),
        };
        self.0.time.tv_sec = dur
            .as_secs()
            .try_into()
            .unwrap_or(libc::time_t::MAX)
            .saturating_mul(sign);
        self.0.time.tv_usec = dur.subsec_micros() as libc::suseconds_t;
        self
    }

    /// Returns the timestamp stored in the event.
    pub fn time(&self) -> SystemTime {
        match self.try_time() {
            Some(time) => time,
            None => {
                log::warn!(
                    "`input_event` timestamp out of range of `SystemTime`: tv_sec={} tv_usec={}",
                    self.0.time.tv_sec,
                    self.0.time.tv_usec,
                );
                SystemTime::UNIX_EPOCH
            }
        }
    }
    fn try_time(&self) -> Option<SystemTime> {
        let sec = self.0.time.tv_sec;
        let usec = self.0.time.tv_usec.clamp(0, 999_999);

        let dur = Duration::new(sec.unsigned_abs() as u64, (usec * 1000) as u32);

        if sec >= 0 {
            SystemTime::UNIX_EPOCH.checked_add(dur)
        } else {
            SystemTime::UNIX_EPOCH.checked_sub(dur)
        }
    }

    /// Returns the raw `timeval` timestamp.
    #[inline]
    pub(crate) fn timeval(&self) -> timeval {
        self.0.time
    }

    /// Returns a copy of `self` with the raw `timeval` timestamp replaced.
    #[inline]
    pub(crate) fn with_timeval(mut self, time: timeval) -> Self {
        self.0.time = time;
        self
    }

    /// Returns the [`EventKind`] this [`InputEvent`] encodes.
    ///
    /// [`EventKind`] is `#[non_exhaustive]`, so matching on it requires a wildcard arm.
    #[inline]
    pub fn kind(&self) -> EventKind {
        match self.event_type() {
            EventType::SYN => SynEvent(*self).into(),
            EventType::KEY => KeyEvent(*self).into(),
            EventType::REL => RelEvent(*self).into(),
            EventType::ABS => AbsEvent(*self).into(),
            EventType::SW => SwitchEvent(*self).into(),
            EventType::MSC => MiscEvent(*self).into(),
            EventType::LED => LedEvent(*self).into(),
            EventType::REP => RepeatEvent(*self).into(),
            EventType::SND => SoundEvent(*self).into(),
            EventType::FF => ForceFeedbackEvent(*self).into(),
            _ => EventKind::Other(*self),
        }
    }

    /// Returns the typed [`EventCode`] of this event.
    ///
    /// Returns [`None`] if the event type is not one of the capability groups managed by this
    /// library.
    #[inline]
    pub fn code(&self) -> Option<EventCode> {
        EventCode::from_raw(self.event_type(), self.raw_code())
    }

    /// Returns the [`EventType`] of this event.
    #[inline]
    pub fn event_type(&self) -> EventType {
        EventType(self.0.type_)
    }

    /// Returns the raw *event code* field.
    #[inline]
    pub fn raw_code(&self) -> u16 {
        self.0.code
    }

    /// Returns the raw *event value* field.
    #[inline]
    pub fn raw_value(&self) -> i32 {
        self.0.value
    }

    /// Returns whether this event is of the given type and code.
    #[inline]
    pub fn is_code(&self, code: impl Into<EventCode>) -> bool {
        let code = code.into();
        self.event_type() == code.event_type() && self.raw_code() == code.raw_code()
    }

    #[inline]
    pub(crate) fn with_value(mut self, value: i32) -> Self {
        self.0.value = value;
        self
    }
}

impl fmt::Debug for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            EventKind::Other(_) => f
                .debug_struct("InputEvent")
                .field("time", &self.time())
                .field("type", &self.event_type())
                .field("code", &self.raw_code())
                .field("value", &self.raw_value())
                .finish(),
            kind => kind.fmt(f),
        }
    }
}

/// A typed event code, one variant per capability group.
///
/// The raw `(type, code)` pair of an [`InputEvent`] can be turned into an [`EventCode`] with
/// [`EventCode::from_raw`] or [`InputEvent::code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCode {
    Syn(Syn),
    Key(Key),
    Rel(Rel),
    Abs(Abs),
    Misc(Misc),
    Switch(Switch),
    Led(Led),
    Sound(Sound),
    Repeat(Repeat),
    ForceFeedback(FfFeature),
}

impl EventCode {
    /// Creates an [`EventCode`] from a raw event type and code.
    ///
    /// Returns [`None`] if `ty` is not one of the supported capability groups. The code is not
    /// range-checked.
    pub fn from_raw(ty: EventType, code: u16) -> Option<Self> {
        Some(match ty {
            EventType::SYN => Self::Syn(Syn(code)),
            EventType::KEY => Self::Key(Key(code)),
            EventType::REL => Self::Rel(Rel(code)),
            EventType::ABS => Self::Abs(Abs(code)),
            EventType::MSC => Self::Misc(Misc(code)),
            EventType::SW => Self::Switch(Switch(code)),
            EventType::LED => Self::Led(Led(code)),
            EventType::SND => Self::Sound(Sound(code)),
            EventType::REP => Self::Repeat(Repeat(code)),
            EventType::FF => Self::ForceFeedback(FfFeature(code)),
            _ => return None,
        })
    }

    /// Returns the [`EventType`] (capability group) this code belongs to.
    pub fn event_type(self) -> EventType {
        match self {
            Self::Syn(_) => EventType::SYN,
            Self::Key(_) => EventType::KEY,
            Self::Rel(_) => EventType::REL,
            Self::Abs(_) => EventType::ABS,
            Self::Misc(_) => EventType::MSC,
            Self::Switch(_) => EventType::SW,
            Self::Led(_) => EventType::LED,
            Self::Sound(_) => EventType::SND,
            Self::Repeat(_) => EventType::REP,
            Self::ForceFeedback(_) => EventType::FF,
        }
    }

    /// Returns the raw `u16` code.
    pub fn raw_code(self) -> u16 {
        match self {
            Self::Syn(c) => c.0,
            Self::Key(c) => c.0,
            Self::Rel(c) => c.0,
            Self::Abs(c) => c.0,
            Self::Misc(c) => c.0,
            Self::Switch(c) => c.0,
            Self::Led(c) => c.0,
            Self::Sound(c) => c.0,
            Self::Repeat(c) => c.0,
            Self::ForceFeedback(c) => c.0,
        }
    }

    /// Returns whether the code is within the valid range of its group.
    pub fn in_range(self) -> bool {
        self.event_type()
            .max_code()
            .is_some_and(|max| self.raw_code() <= max)
    }
}

macro_rules! event_code_from {
    ( $( $variant:ident($ty:ty) ),* ) => {
        $(
            impl From<$ty> for EventCode {
                #[inline]
                fn from(code: $ty) -> Self {
                    Self::$variant(code)
                }
            }
        )*
    };
}

event_code_from!(
    Syn(Syn),
    Key(Key),
    Rel(Rel),
    Abs(Abs),
    Misc(Misc),
    Switch(Switch),
    Led(Led),
    Sound(Sound),
    Repeat(Repeat),
    ForceFeedback(FfFeature)
);

macro_rules! event_wrappers {
    ( $(
        $(#[$attr:meta])*
        pub struct $name:ident in $variant:ident;
    )* ) => {
        $(
            $( #[$attr] )*
            #[derive(Clone, Copy, PartialEq, Eq)]
            pub struct $name(InputEvent);

            impl From<$name> for EventKind {
                #[inline]
                fn from(value: $name) -> Self {
                    Self::$variant(value)
                }
            }

            impl From<$name> for InputEvent {
                #[inline]
                fn from(value: $name) -> Self {
                    value.0
                }
            }

            impl Deref for $name {
                type Target = InputEvent;

                #[inline]
                fn deref(&self) -> &InputEvent {
                    &self.0
                }
            }
        )*

        /// Enumeration of event types.
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[non_exhaustive]
        pub enum EventKind {
            $(
                $( #[$attr] )*
                $variant($name),
            )*

            /// Fallback variant for events of unknown type.
            #[non_exhaustive]
            Other(InputEvent),
        }

        impl From<EventKind> for InputEvent {
            #[inline]
            fn from(kind: EventKind) -> InputEvent {
                match kind {
                    $(
                        EventKind::$variant(it) => *it,
                    )*
                    EventKind::Other(ev) => ev,
                }
            }
        }
    };
}

event_wrappers! {
    /// A synchronization event.
    pub struct SynEvent in Syn;
    /// A key press/release/repeat event.
    pub struct KeyEvent in Key;
    /// A relative axis change.
    pub struct RelEvent in Rel;
    /// An absolute axis change.
    pub struct AbsEvent in Abs;
    /// A switch state change.
    pub struct SwitchEvent in Switch;
    /// Miscellaneous management events.
    pub struct MiscEvent in Misc;
    /// Reports or changes the state of device LEDs.
    pub struct LedEvent in Led;
    /// The key repeat settings have been changed.
    pub struct RepeatEvent in Repeat;
    /// Plays simple sounds on the device.
    pub struct SoundEvent in Sound;
    /// Starts or stops force-feedback effects, or changes a force-feedback setting.
    pub struct ForceFeedbackEvent in ForceFeedback;
}

impl SynEvent {
    #[inline]
    pub fn new(syn: Syn) -> Self {
        Self(InputEvent::new(EventType::SYN, syn.0, 0))
    }

    #[inline]
    pub fn syn(&self) -> Syn {
        Syn(self.raw_code())
    }
}
impl fmt::Debug for SynEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynEvent")
            .field("time", &self.time())
            .field("syn", &self.syn())
            .field("value", &self.raw_value())
            .finish()
    }
}
impl From<Syn> for InputEvent {
    #[inline]
    fn from(value: Syn) -> Self {
        SynEvent::new(value).into()
    }
}

impl KeyEvent {
    #[inline]
    pub fn new(key: Key, state: KeyState) -> Self {
        Self(InputEvent::new(EventType::KEY, key.0, state.0))
    }

    #[inline]
    pub fn key(&self) -> Key {
        Key(self.raw_code())
    }

    #[inline]
    pub fn state(&self) -> KeyState {
        KeyState(self.raw_value())
    }
}
impl fmt::Debug for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyEvent")
            .field("time", &self.time())
            .field("key", &self.key())
            .field("state", &self.state())
            .finish()
    }
}

ffi_enum! {
    /// State of a [`Key`], stored as the value of a [`KeyEvent`].
    pub enum KeyState: i32 {
        RELEASED = 0,
        PRESSED = 1,
        /// The key has been held down long enough to generate a repeat event.
        REPEAT = 2,
    }
}
impl fmt::Debug for KeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.variant_name() {
            Some(name) => f.write_str(name),
            None => write!(f, "KeyState({:#?})", self.0),
        }
    }
}

impl RelEvent {
    #[inline]
    pub fn new(rel: Rel, value: i32) -> Self {
        Self(InputEvent::new(EventType::REL, rel.0, value))
    }

    #[inline]
    pub fn rel(&self) -> Rel {
        Rel(self.raw_code())
    }

    #[inline]
    pub fn value(&self) -> i32 {
        self.raw_value()
    }
}
impl fmt::Debug for RelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelEvent")
            .field("time", &self.time())
            .field("rel", &self.rel())
            .field("value", &self.value())
            .finish()
    }
}

impl AbsEvent {
    #[inline]
    pub fn new(abs: Abs, value: i32) -> Self {
        Self(InputEvent::new(EventType::ABS, abs.0, value))
    }

    #[inline]
    pub fn abs(&self) -> Abs {
        Abs(self.raw_code())
    }

    #[inline]
    pub fn value(&self) -> i32 {
        self.raw_value()
    }
}
impl fmt::Debug for AbsEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbsEvent")
            .field("time", &self.time())
            .field("abs", &self.abs())
            .field("value", &self.value())
            .finish()
    }
}

impl SwitchEvent {
    #[inline]
    pub fn new(switch: Switch, on: bool) -> Self {
        Self(InputEvent::new(EventType::SW, switch.0, on as i32))
    }

    #[inline]
    pub fn switch(&self) -> Switch {
        Switch(self.raw_code())
    }

    #[inline]
    pub fn is_pressed(&self) -> bool {
        self.raw_value() != 0
    }
}
impl fmt::Debug for SwitchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwitchEvent")
            .field("time", &self.time())
            .field("switch", &self.switch())
            .field("pressed", &self.is_pressed())
            .finish()
    }
}

impl MiscEvent {
    #[inline]
    pub fn new(misc: Misc, value: i32) -> Self {
        Self(InputEvent::new(EventType::MSC, misc.0, value))
    }

    #[inline]
    pub fn misc(&self) -> Misc {
        Misc(self.raw_code())
    }
}
impl fmt::Debug for MiscEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiscEvent")
            .field("time", &self.time())
            .field("misc", &self.misc())
            .field("value", &self.raw_value())
            .finish()
    }
}

impl LedEvent {
    #[inline]
    pub fn new(led: Led, on: bool) -> Self {
        Self(InputEvent::new(EventType::LED, led.0, on as i32))
    }

    #[inline]
    pub fn led(&self) -> Led {
        Led(self.raw_code())
    }

    #[inline]
    pub fn is_on(&self) -> bool {
        self.raw_value() != 0
    }
}
impl fmt::Debug for LedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedEvent")
            .field("time", &self.time())
            .field("led", &self.led())
            .field("state", &self.is_on())
            .finish()
    }
}

impl RepeatEvent {
    #[inline]
    pub fn new(repeat: Repeat, value: u32) -> Self {
        Self(InputEvent::new(EventType::REP, repeat.0, value as i32))
    }

    #[inline]
    pub fn repeat(&self) -> Repeat {
        Repeat(self.raw_code())
    }

    #[inline]
    pub fn value(&self) -> u32 {
        self.raw_value() as u32
    }
}
impl fmt::Debug for RepeatEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepeatEvent")
            .field("time", &self.time())
            .field("repeat", &self.repeat())
            .field("value", &self.raw_value())
            .finish()
    }
}

impl SoundEvent {
    #[inline]
    pub fn new(sound: Sound, playing: bool) -> Self {
        Self(InputEvent::new(EventType::SND, sound.0, playing as i32))
    }

    #[inline]
    pub fn sound(&self) -> Sound {
        Sound(self.raw_code())
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.raw_value() != 0
    }
}
impl fmt::Debug for SoundEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoundEvent")
            .field("time", &self.time())
            .field("sound", &self.sound())
            .field("value", &self.raw_value())
            .finish()
    }
}

impl ForceFeedbackEvent {
    /// Returns the event code.
    ///
    /// Codes below [`FfFeature::GAIN`] are the IDs of uploaded effects rather than features.
    #[inline]
    pub fn code(&self) -> FfFeature {
        FfFeature(self.raw_code())
    }
}
impl fmt::Debug for ForceFeedbackEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForceFeedbackEvent")
            .field("time", &self.time())
            .field("code", &self.code())
            .field("value", &self.raw_value())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps() {
        const EV: InputEvent = InputEvent::zeroed();

        let epoch = EV.with_time(SystemTime::UNIX_EPOCH);
        assert_eq!(epoch.0.time.tv_sec, 0);
        assert_eq!(epoch.0.time.tv_usec, 0);

        let mut negative_micros = EV;
        negative_micros.0.time.tv_usec = -1;
        assert_eq!(negative_micros.time(), SystemTime::UNIX_EPOCH);

        let before = SystemTime::UNIX_EPOCH - Duration::from_secs(1);
        assert_eq!(EV.with_time(before).time(), before);

        let after = SystemTime::UNIX_EPOCH + Duration::from_micros(1_000_000_123_456);
        assert_eq!(EV.with_time(after).time(), after);
        assert_eq!(EV.with_time(after).timeval().tv_usec, 123_456);
    }

    #[test]
    fn event_code() {
        let ev = InputEvent::from_code(Abs::MT_SLOT, 3);
        assert_eq!(ev.event_type(), EventType::ABS);
        assert_eq!(ev.code(), Some(EventCode::Abs(Abs::MT_SLOT)));
        assert!(ev.is_code(Abs::MT_SLOT));
        assert!(!ev.is_code(Key::from_raw(Abs::MT_SLOT.raw())));

        assert_eq!(
            EventCode::from_raw(EventType::PWR, 0),
            None,
            "unmanaged event types have no `EventCode`"
        );
        assert!(EventCode::Repeat(Repeat::PERIOD).in_range());
        assert!(!EventCode::Repeat(Repeat::from_raw(2)).in_range());
        assert!(!EventCode::Abs(Abs::from_raw(0x40)).in_range());
    }

    #[test]
    fn kinds() {
        let ev: InputEvent = KeyEvent::new(Key::BTN_LEFT, KeyState::PRESSED).into();
        match ev.kind() {
            EventKind::Key(key) => {
                assert_eq!(key.key(), Key::BTN_LEFT);
                assert_eq!(key.state(), KeyState::PRESSED);
            }
            other => panic!("unexpected kind {other:?}"),
        }
        assert!(matches!(
            InputEvent::new(EventType::PWR, 0, 0).kind(),
            EventKind::Other(_)
        ));
    }
}
