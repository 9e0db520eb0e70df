//! Event types, codes, axis and button identifiers.
//!
//! Ported from `linux/input-event-codes.h`. Only a subset of the key names is provided; codes
//! without a name are still fully usable and are printed as raw numbers.

use std::{error::Error, fmt, io};

ffi_enum! {
    /// Input device properties.
    pub enum InputProp: u8 {
        /// Indicates that the input position on screen should be indicated via a pointer.
        POINTER = 0x00,
        /// Indicates that the device's [`Abs`] axes should be mapped to the screen directly.
        DIRECT = 0x01,
        /// The touchpad registers button clicks by pressing down on the surface.
        BUTTONPAD = 0x02,
        SEMI_MT = 0x03,
        TOPBUTTONPAD = 0x04,
        POINTING_STICK = 0x05,
        ACCELEROMETER = 0x06,
    }
}
impl InputProp {
    pub(crate) const MAX: Self = Self(0x1f);
}
bitvalue!(InputProp);

impl fmt::Debug for InputProp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.variant_name() {
            Some(name) => write!(f, "INPUT_PROP_{name}"),
            None => write!(f, "InputProp({:#x})", self.0),
        }
    }
}

ffi_enum! {
    /// Types of [`InputEvent`][crate::event::InputEvent]s, also called *capability groups*.
    pub enum EventType: u16 {
        /// Synchronization events. Always supported by every device.
        SYN = 0x00,
        KEY = 0x01,
        REL = 0x02,
        ABS = 0x03,
        MSC = 0x04,
        SW  = 0x05,
        LED = 0x11,
        SND = 0x12,
        /// Key repeat settings.
        REP = 0x14,
        FF  = 0x15,
        PWR = 0x16,
        FF_STATUS = 0x17,
    }
}
impl EventType {
    pub(crate) const MAX: Self = Self(0x1f);

    /// Returns the largest event code that is valid for this event type.
    ///
    /// Returns [`None`] for event types this library does not manage (`EV_PWR`, `EV_FF_STATUS`
    /// and unassigned types).
    pub fn max_code(self) -> Option<u16> {
        Some(match self {
            Self::SYN => Syn::MAX.0,
            Self::KEY => Key::MAX.0,
            Self::REL => Rel::MAX.0,
            Self::ABS => Abs::MAX.0,
            Self::MSC => Misc::MAX.0,
            Self::SW => Switch::MAX.0,
            Self::LED => Led::MAX.0,
            Self::SND => Sound::MAX.0,
            Self::REP => Repeat::MAX.0,
            Self::FF => FfFeature::MAX.0,
            _ => return None,
        })
    }
}
bitvalue!(EventType);

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.variant_name() {
            Some(name) => write!(f, "EV_{name}"),
            None => write!(f, "EventType({:#x})", self.0),
        }
    }
}

ffi_enum! {
    /// Synchronization event types.
    ///
    /// This is the event code of [`SynEvent`][super::SynEvent]s.
    pub enum Syn: u16 {
        /// Marks the end of a group of events.
        REPORT = 0,
        CONFIG = 1,
        MT_REPORT = 2,
        /// Indicates that one or more events were dropped due to overflow of the kernel buffer.
        ///
        /// Receiving this makes the [`Device`][crate::Device] resynchronize its state.
        DROPPED = 3,
    }
}
impl Syn {
    pub(crate) const MAX: Self = Self(0x0f);
}
bitvalue!(Syn);
code_names!(Syn, "SYN_");

/// Error returned by [`FromStr`][std::str::FromStr] implementations when no matching variant was
/// found.
#[derive(Debug, PartialEq, Eq)]
pub struct UnknownVariant {
    _p: (),
}

impl UnknownVariant {
    pub(crate) const fn new() -> Self {
        Self { _p: () }
    }
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown variant name")
    }
}
impl Error for UnknownVariant {}
impl From<UnknownVariant> for io::Error {
    fn from(value: UnknownVariant) -> Self {
        io::Error::new(io::ErrorKind::InvalidInput, value)
    }
}

ffi_enum! {
    /// An *evdev* key or button identifier.
    ///
    /// This is the event code of [`KeyEvent`][super::KeyEvent]s.
    ///
    /// Several constants are aliases of each other; formatting such a [`Key`] uses one of the names.
    pub enum Key: u16 {
        KEY_RESERVED     = 0,
        KEY_ESC          = 1,
        KEY_1            = 2,
        KEY_2            = 3,
        KEY_3            = 4,
        KEY_4            = 5,
        KEY_5            = 6,
        KEY_6            = 7,
        KEY_7            = 8,
        KEY_8            = 9,
        KEY_9            = 10,
        KEY_0            = 11,
        KEY_MINUS        = 12,
        KEY_EQUAL        = 13,
        KEY_BACKSPACE    = 14,
        KEY_TAB          = 15,
        KEY_Q            = 16,
        KEY_W            = 17,
        KEY_E            = 18,
        KEY_R            = 19,
        KEY_T            = 20,
        KEY_Y            = 21,
        KEY_U            = 22,
        KEY_I            = 23,
        KEY_O            = 24,
        KEY_P            = 25,
        KEY_LEFTBRACE    = 26,
        KEY_RIGHTBRACE   = 27,
        KEY_ENTER        = 28,
        KEY_LEFTCTRL     = 29,
        KEY_A            = 30,
        KEY_S            = 31,
        KEY_D            = 32,
        KEY_F            = 33,
        KEY_G            = 34,
        KEY_H            = 35,
        KEY_J            = 36,
        KEY_K            = 37,
        KEY_L            = 38,
        KEY_SEMICOLON    = 39,
        KEY_APOSTROPHE   = 40,
        KEY_GRAVE        = 41,
        KEY_LEFTSHIFT    = 42,
        KEY_BACKSLASH    = 43,
        KEY_Z            = 44,
        KEY_X            = 45,
        KEY_C            = 46,
        KEY_V            = 47,
        KEY_B            = 48,
        KEY_N            = 49,
        KEY_M            = 50,
        KEY_COMMA        = 51,
        KEY_DOT          = 52,
        KEY_SLASH        = 53,
        KEY_RIGHTSHIFT   = 54,
        KEY_KPASTERISK   = 55,
        KEY_LEFTALT      = 56,
        KEY_SPACE        = 57,
        KEY_CAPSLOCK     = 58,
        KEY_F1           = 59,
        KEY_F2           = 60,
        KEY_F3           = 61,
        KEY_F4           = 62,
        KEY_F5           = 63,
        KEY_F6           = 64,
        KEY_F7           = 65,
        KEY_F8           = 66,
        KEY_F9           = 67,
        KEY_F10          = 68,
        KEY_NUMLOCK      = 69,
        KEY_SCROLLLOCK   = 70,
        KEY_F11          = 87,
        KEY_F12          = 88,
        KEY_KPENTER      = 96,
        KEY_RIGHTCTRL    = 97,
        KEY_SYSRQ        = 99,
        KEY_RIGHTALT     = 100,
        KEY_HOME         = 102,
        KEY_UP           = 103,
        KEY_PAGEUP       = 104,
        KEY_LEFT         = 105,
        KEY_RIGHT        = 106,
        KEY_END          = 107,
        KEY_DOWN         = 108,
        KEY_PAGEDOWN     = 109,
        KEY_INSERT       = 110,
        KEY_DELETE       = 111,
        KEY_MUTE         = 113,
        KEY_VOLUMEDOWN   = 114,
        KEY_VOLUMEUP     = 115,
        KEY_POWER        = 116,
        KEY_PAUSE        = 119,
        KEY_LEFTMETA     = 125,
        KEY_RIGHTMETA    = 126,
        KEY_COMPOSE      = 127,

        BTN_0            = 0x100,
        BTN_MISC         = Self::BTN_0.0,
        BTN_1            = 0x101,
        BTN_2            = 0x102,
        BTN_3            = 0x103,
        BTN_4            = 0x104,

        BTN_LEFT         = 0x110,
        BTN_MOUSE        = Self::BTN_LEFT.0,
        BTN_RIGHT        = 0x111,
        BTN_MIDDLE       = 0x112,
        BTN_SIDE         = 0x113,
        BTN_EXTRA        = 0x114,
        BTN_FORWARD      = 0x115,
        BTN_BACK         = 0x116,
        BTN_TASK         = 0x117,

        BTN_TRIGGER      = 0x120,
        BTN_JOYSTICK     = Self::BTN_TRIGGER.0,
        BTN_THUMB        = 0x121,
        BTN_THUMB2       = 0x122,
        BTN_TOP          = 0x123,
        BTN_TOP2         = 0x124,
        BTN_PINKIE       = 0x125,

        BTN_SOUTH        = 0x130,
        BTN_GAMEPAD      = Self::BTN_SOUTH.0,
        BTN_EAST         = 0x131,
        BTN_C            = 0x132,
        BTN_NORTH        = 0x133,
        BTN_WEST         = 0x134,
        BTN_Z            = 0x135,
        BTN_TL           = 0x136,
        BTN_TR           = 0x137,
        BTN_TL2          = 0x138,
        BTN_TR2          = 0x139,
        BTN_SELECT       = 0x13a,
        BTN_START        = 0x13b,
        BTN_MODE         = 0x13c,
        BTN_THUMBL       = 0x13d,
        BTN_THUMBR       = 0x13e,

        BTN_TOOL_PEN     = 0x140,
        BTN_DIGI         = Self::BTN_TOOL_PEN.0,
        BTN_TOOL_RUBBER  = 0x141,
        BTN_TOOL_BRUSH   = 0x142,
        BTN_TOOL_PENCIL  = 0x143,
        BTN_TOOL_AIRBRUSH = 0x144,
        /// One finger is touching the surface.
        BTN_TOOL_FINGER  = 0x145,
        BTN_TOOL_MOUSE   = 0x146,
        BTN_TOOL_LENS    = 0x147,
        /// Five fingers are touching the surface.
        BTN_TOOL_QUINTTAP = 0x148,
        BTN_STYLUS3      = 0x149,
        BTN_TOUCH        = 0x14a,
        BTN_STYLUS       = 0x14b,
        BTN_STYLUS2      = 0x14c,
        /// Two fingers are touching the surface.
        BTN_TOOL_DOUBLETAP = 0x14d,
        /// Three fingers are touching the surface.
        BTN_TOOL_TRIPLETAP = 0x14e,
        /// Four fingers are touching the surface.
        BTN_TOOL_QUADTAP = 0x14f,

        BTN_GEAR_DOWN    = 0x150,
        BTN_WHEEL        = Self::BTN_GEAR_DOWN.0,
        BTN_GEAR_UP      = 0x151,
    }
}

impl Key {
    pub(crate) const MAX: Self = Self(0x2ff);

    /// The `BTN_TOOL_*` codes that signal how many fingers are on the surface, indexed by
    /// `finger count - 1`.
    pub(crate) const FINGER_COUNT_TOOLS: [Key; 5] = [
        Key::BTN_TOOL_FINGER,
        Key::BTN_TOOL_DOUBLETAP,
        Key::BTN_TOOL_TRIPLETAP,
        Key::BTN_TOOL_QUADTAP,
        Key::BTN_TOOL_QUINTTAP,
    ];
}
bitvalue!(Key);
// `KEY_*` and `BTN_*` names have no shared prefix.
code_names!(Key, "");

ffi_enum! {
    /// `REL_*`: A relative axis identifier.
    pub enum Rel: u16 {
        X             = 0x00,
        Y             = 0x01,
        Z             = 0x02,
        RX            = 0x03,
        RY            = 0x04,
        RZ            = 0x05,
        HWHEEL        = 0x06,
        DIAL          = 0x07,
        WHEEL         = 0x08,
        MISC          = 0x09,
        RESERVED      = 0x0a,
        WHEEL_HI_RES  = 0x0b,
        HWHEEL_HI_RES = 0x0c,
    }
}
impl Rel {
    pub(crate) const MAX: Self = Self(0x0f);
}
bitvalue!(Rel);
code_names!(Rel, "REL_");

ffi_enum! {
    /// `ABS_*`: An absolute axis identifier.
    ///
    /// All codes from [`Abs::MT_SLOT`] upwards belong to the multitouch protocol. Their values are
    /// stored per slot.
    pub enum Abs: u16 {
        X              = 0x00,
        Y              = 0x01,
        Z              = 0x02,
        RX             = 0x03,
        RY             = 0x04,
        RZ             = 0x05,
        THROTTLE       = 0x06,
        RUDDER         = 0x07,
        WHEEL          = 0x08,
        GAS            = 0x09,
        BRAKE          = 0x0a,
        HAT0X          = 0x10,
        HAT0Y          = 0x11,
        HAT1X          = 0x12,
        HAT1Y          = 0x13,
        HAT2X          = 0x14,
        HAT2Y          = 0x15,
        HAT3X          = 0x16,
        HAT3Y          = 0x17,
        PRESSURE       = 0x18,
        DISTANCE       = 0x19,
        TILT_X         = 0x1a,
        TILT_Y         = 0x1b,
        TOOL_WIDTH     = 0x1c,
        VOLUME         = 0x20,
        PROFILE        = 0x21,
        MISC           = 0x28,
        /// Set by devices that emulate multitouch axes without implementing the slot protocol.
        RESERVED       = 0x2e,
        /// Changes the active multitouch slot.
        MT_SLOT        = 0x2f,
        MT_TOUCH_MAJOR = 0x30,
        MT_TOUCH_MINOR = 0x31,
        MT_WIDTH_MAJOR = 0x32,
        MT_WIDTH_MINOR = 0x33,
        MT_ORIENTATION = 0x34,
        MT_POSITION_X  = 0x35,
        MT_POSITION_Y  = 0x36,
        MT_TOOL_TYPE   = 0x37,
        MT_BLOB_ID     = 0x38,
        /// Identifies the contact in the current slot; `-1` marks an empty slot.
        MT_TRACKING_ID = 0x39,
        MT_PRESSURE    = 0x3a,
        MT_DISTANCE    = 0x3b,
        MT_TOOL_X      = 0x3c,
        MT_TOOL_Y      = 0x3d,
    }
}
impl Abs {
    pub(crate) const MAX: Self = Self(0x3f);

    /// Returns whether `self` is one of the multitouch codes (including [`Abs::MT_SLOT`]).
    #[inline]
    pub fn is_mt(self) -> bool {
        self.0 >= Self::MT_SLOT.0 && self.0 <= Self::MAX.0
    }

    /// Returns whether `self` is a per-slot multitouch axis ([`Abs::is_mt`], but not
    /// [`Abs::MT_SLOT`]).
    #[inline]
    pub fn is_mt_axis(self) -> bool {
        self.0 > Self::MT_SLOT.0 && self.0 <= Self::MAX.0
    }
}
bitvalue!(Abs);
code_names!(Abs, "ABS_");

ffi_enum! {
    /// `SW_*`: A binary switch.
    pub enum Switch: u16 {
        LID                  = 0x00,
        TABLET_MODE          = 0x01,
        HEADPHONE_INSERT     = 0x02,
        RFKILL_ALL           = 0x03,
        MICROPHONE_INSERT    = 0x04,
        DOCK                 = 0x05,
        LINEOUT_INSERT       = 0x06,
        JACK_PHYSICAL_INSERT = 0x07,
        VIDEOOUT_INSERT      = 0x08,
        CAMERA_LENS_COVER    = 0x09,
        KEYPAD_SLIDE         = 0x0a,
        FRONT_PROXIMITY      = 0x0b,
        ROTATE_LOCK          = 0x0c,
        LINEIN_INSERT        = 0x0d,
        MUTE_DEVICE          = 0x0e,
        PEN_INSERTED         = 0x0f,
        MACHINE_COVER        = 0x10,
        USB_INSERT           = 0x11,
    }
}
impl Switch {
    pub(crate) const MAX: Self = Self(0x11);
}
bitvalue!(Switch);
code_names!(Switch, "SW_");

ffi_enum! {
    /// `MSC_*`: A miscellaneous event type, such as a timestamp or scancode.
    pub enum Misc: u16 {
        SERIAL    = 0x00,
        PULSELED  = 0x01,
        GESTURE   = 0x02,
        RAW       = 0x03,
        /// Scancode of the following [`KeyEvent`][super::KeyEvent].
        SCAN      = 0x04,
        /// Microseconds since the last device reset. Wraps around.
        TIMESTAMP = 0x05,
    }
}
impl Misc {
    pub(crate) const MAX: Self = Self(0x07);
}
bitvalue!(Misc);
code_names!(Misc, "MSC_");

ffi_enum! {
    /// `LED_*`: A device LED or other indicator.
    pub enum Led: u16 {
        NUML     = 0x00,
        CAPSL    = 0x01,
        SCROLLL  = 0x02,
        COMPOSE  = 0x03,
        KANA     = 0x04,
        SLEEP    = 0x05,
        SUSPEND  = 0x06,
        MUTE     = 0x07,
        MISC     = 0x08,
        MAIL     = 0x09,
        CHARGING = 0x0a,
    }
}
impl Led {
    pub(crate) const MAX: Self = Self(0x0f);
}
bitvalue!(Led);
code_names!(Led, "LED_");

ffi_enum! {
    /// `REP_*`: Autorepeat setting.
    pub enum Repeat: u16 {
        DELAY  = 0x00,
        PERIOD = 0x01,
    }
}
impl Repeat {
    pub(crate) const MAX: Self = Self(0x01);
}
// The kernel has no `EVIOCGBIT` query for these; devices with `EV_REP` support both.
bitvalue!(Repeat);
code_names!(Repeat, "REP_");

ffi_enum! {
    /// `SND_*`: A sound effect.
    pub enum Sound: u16 {
        CLICK = 0x00,
        BELL  = 0x01,
        TONE  = 0x02,
    }
}
impl Sound {
    pub(crate) const MAX: Self = Self(0x07);
}
bitvalue!(Sound);
code_names!(Sound, "SND_");

ffi_enum! {
    /// `FF_*`: A force-feedback effect type or device feature.
    pub enum FfFeature: u16 {
        RUMBLE     = 0x50,
        PERIODIC   = 0x51,
        CONSTANT   = 0x52,
        SPRING     = 0x53,
        FRICTION   = 0x54,
        DAMPER     = 0x55,
        INERTIA    = 0x56,
        RAMP       = 0x57,
        SQUARE     = 0x58,
        TRIANGLE   = 0x59,
        SINE       = 0x5a,
        SAW_UP     = 0x5b,
        SAW_DOWN   = 0x5c,
        CUSTOM     = 0x5d,
        GAIN       = 0x60,
        AUTOCENTER = 0x61,
    }
}
impl FfFeature {
    pub(crate) const MAX: Self = Self(0x7f);
}
bitvalue!(FfFeature);
code_names!(FfFeature, "FF_");

/// A [`Display`]able, human-readable name of an evdev constant.
///
/// [`Display`]: fmt::Display
pub(crate) struct VariantName {
    prefix: &'static str,
    variant: &'static str,
}

impl VariantName {
    pub(crate) fn new(prefix: &'static str, variant: &'static str) -> Self {
        Self { prefix, variant }
    }
}

impl fmt::Display for VariantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix)?;
        f.write_str(self.variant)
    }
}
