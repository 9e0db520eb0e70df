use std::num::TryFromIntError;

/// A multitouch slot index.
///
/// The slot index is sent as the value of `ABS_MT_SLOT` events, which have type `i32`.
/// [`Slot`] adds the invariant that the index is never negative.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Slot(u16);

impl Slot {
    #[inline]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0.into()
    }

    #[inline]
    pub(crate) fn raw(self) -> i32 {
        self.0.into()
    }
}

impl From<u16> for Slot {
    #[inline]
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<u8> for Slot {
    #[inline]
    fn from(value: u8) -> Self {
        Self(value.into())
    }
}

impl TryFrom<i32> for Slot {
    type Error = TryFromIntError;

    #[inline]
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        u16::try_from(value).map(Self)
    }
}

impl TryFrom<usize> for Slot {
    type Error = TryFromIntError;

    #[inline]
    fn try_from(value: usize) -> Result<Self, Self::Error> {
        u16::try_from(value).map(Self)
    }
}

impl PartialEq<i32> for Slot {
    fn eq(&self, other: &i32) -> bool {
        self.raw() == *other
    }
}
