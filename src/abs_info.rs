use std::fmt;

use crate::raw::input::input_absinfo;

/// Value and metadata of an absolute axis ([`Abs`][crate::event::Abs]).
///
/// Contains the axis' current value along with its range, noise filter (*fuzz*), deadzone
/// (*flat*) and resolution.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct AbsInfo(pub(crate) input_absinfo);

impl AbsInfo {
    /// Creates a new [`AbsInfo`] with a minimum and maximum value.
    ///
    /// All other fields start out as zero.
    #[inline]
    pub const fn new(minimum: i32, maximum: i32) -> Self {
        Self(input_absinfo {
            value: 0,
            minimum,
            maximum,
            fuzz: 0,
            flat: 0,
            resolution: 0,
        })
    }

    /// Returns a copy of `self` with the given axis value.
    ///
    /// The value is not clamped to the minimum/maximum.
    #[inline]
    pub const fn with_value(mut self, value: i32) -> Self {
        self.0.value = value;
        self
    }

    #[inline]
    pub const fn with_minimum(mut self, minimum: i32) -> Self {
        self.0.minimum = minimum;
        self
    }

    #[inline]
    pub const fn with_maximum(mut self, maximum: i32) -> Self {
        self.0.maximum = maximum;
        self
    }

    #[inline]
    pub const fn with_fuzz(mut self, fuzz: i32) -> Self {
        self.0.fuzz = fuzz;
        self
    }

    #[inline]
    pub const fn with_flat(mut self, flat: i32) -> Self {
        self.0.flat = flat;
        self
    }

    #[inline]
    pub const fn with_resolution(mut self, resolution: i32) -> Self {
        self.0.resolution = resolution;
        self
    }

    /// Returns the axis' current value.
    ///
    /// This is *typically* between [`AbsInfo::minimum`] and [`AbsInfo::maximum`], but this is not
    /// enforced by the kernel.
    #[inline]
    pub const fn value(&self) -> i32 {
        self.0.value
    }

    #[inline]
    pub const fn minimum(&self) -> i32 {
        self.0.minimum
    }

    #[inline]
    pub const fn maximum(&self) -> i32 {
        self.0.maximum
    }

    /// Returns the *fuzz* value the kernel uses to filter out noise.
    #[inline]
    pub const fn fuzz(&self) -> i32 {
        self.0.fuzz
    }

    /// Returns the *flat* value, the size of the axis deadzone.
    #[inline]
    pub const fn flat(&self) -> i32 {
        self.0.flat
    }

    /// Returns the resolution of this axis in units per millimeter (or per radian for rotational
    /// axes).
    #[inline]
    pub const fn resolution(&self) -> i32 {
        self.0.resolution
    }

    pub(crate) fn set_value(&mut self, value: i32) {
        self.0.value = value;
    }
    pub(crate) fn set_minimum(&mut self, minimum: i32) {
        self.0.minimum = minimum;
    }
    pub(crate) fn set_maximum(&mut self, maximum: i32) {
        self.0.maximum = maximum;
    }
    pub(crate) fn set_fuzz(&mut self, fuzz: i32) {
        self.0.fuzz = fuzz;
    }
    pub(crate) fn set_flat(&mut self, flat: i32) {
        self.0.flat = flat;
    }
    pub(crate) fn set_resolution(&mut self, resolution: i32) {
        self.0.resolution = resolution;
    }
}

impl fmt::Debug for AbsInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbsInfo")
            .field("value", &self.value())
            .field("minimum", &self.minimum())
            .field("maximum", &self.maximum())
            .field("fuzz", &self.fuzz())
            .field("flat", &self.flat())
            .field("resolution", &self.resolution())
            .finish()
    }
}
