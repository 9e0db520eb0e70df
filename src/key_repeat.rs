use crate::event::Repeat;

/// Key repeat settings (`EV_REP`).
///
/// Both values are in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(C)]
pub struct KeyRepeat {
    pub(crate) delay: u32,
    pub(crate) period: u32,
}

impl KeyRepeat {
    pub const fn new(delay: u32, period: u32) -> Self {
        Self { delay, period }
    }

    /// Time a key has to be held down before it starts repeating.
    pub fn delay(&self) -> u32 {
        self.delay
    }

    /// Time between two repeat events.
    pub fn period(&self) -> u32 {
        self.period
    }

    /// Returns the setting selected by `code`, or [`None`] if `code` is out of range.
    pub(crate) fn get(&self, code: Repeat) -> Option<u32> {
        match code {
            Repeat::DELAY => Some(self.delay),
            Repeat::PERIOD => Some(self.period),
            _ => None,
        }
    }

    pub(crate) fn set(&mut self, code: Repeat, value: u32) {
        match code {
            Repeat::DELAY => self.delay = value,
            Repeat::PERIOD => self.period = value,
            _ => {}
        }
    }
}
