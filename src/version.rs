use std::{ffi::c_int, fmt};

/// An `evdev` subsystem version, as reported by `EVIOCGVERSION`.
///
/// This is the version of the `evdev` input core, not of a device-specific driver.
///
/// Returned by [`Device::driver_version`][crate::Device::driver_version].
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Version(pub(crate) c_int);

impl Version {
    #[inline]
    pub const fn from_raw(raw: c_int) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> c_int {
        self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [_, major, minor, patch] = self.0.to_be_bytes();
        write!(f, "{major}.{minor}.{patch}")
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Version")
            .field(&format_args!("{:#x}", self.0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Version(0x010001).to_string(), "1.0.1");
        assert_eq!(format!("{:?}", Version(0x010001)), "Version(0x10001)");
    }
}
