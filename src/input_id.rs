use std::fmt::{self, LowerHex};

use crate::raw::input::input_id;

/// Input device ID.
///
/// `uinput` devices, devices exported by ALSA, and other devices often leave this structure empty
/// (all-zeroes), which is also the [`Default`] of an unbound [`Device`][crate::Device].
///
/// The copy cached by a [`Device`][crate::Device] is loaded when the device is bound and can be
/// overridden afterwards. Overrides never reach the kernel.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct InputId(pub(crate) input_id);

impl InputId {
    /// Creates an [`InputId`] from its components.
    #[inline]
    pub const fn new(bus: Bus, vendor: u16, product: u16, version: u16) -> Self {
        Self(input_id {
            bustype: bus.0,
            vendor,
            product,
            version,
        })
    }

    /// Returns the bus type this device is attached to the system with.
    ///
    /// This is often left as `0` for virtual devices.
    #[inline]
    pub fn bus(&self) -> Bus {
        Bus(self.0.bustype)
    }

    /// Returns the vendor ID.
    ///
    /// For USB and PCI devices, the vendor ID is typically taken from the device descriptor and may
    /// be looked up in the corresponding registry.
    #[inline]
    pub fn vendor(&self) -> u16 {
        self.0.vendor
    }

    /// Returns the product ID.
    ///
    /// For USB and PCI devices, the product ID is typically taken from the device descriptor and may
    /// be looked up in the corresponding registry.
    #[inline]
    pub fn product(&self) -> u16 {
        self.0.product
    }

    /// The device or transport version.
    ///
    /// For USB devices, this is typically an encoding of the implemented USB-HID version
    /// (`bcdHID`).
    #[inline]
    pub fn version(&self) -> u16 {
        self.0.version
    }

    pub(crate) fn set_bus(&mut self, bus: Bus) {
        self.0.bustype = bus.0;
    }

    pub(crate) fn set_vendor(&mut self, vendor: u16) {
        self.0.vendor = vendor;
    }

    pub(crate) fn set_product(&mut self, product: u16) {
        self.0.product = product;
    }

    pub(crate) fn set_version(&mut self, version: u16) {
        self.0.version = version;
    }
}

impl fmt::Debug for InputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct Hex<T: LowerHex>(T);
        impl<T: LowerHex> fmt::Debug for Hex<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:#06x}", self.0)
            }
        }

        f.debug_struct("InputId")
            .field("bustype", &self.bus())
            .field("vendor", &Hex(self.vendor()))
            .field("product", &Hex(self.product()))
            .field("version", &Hex(self.version()))
            .finish()
    }
}

ffi_enum! {
    /// Bus types that devices can be attached to the system with.
    pub enum Bus: u16 {
        PCI         = 0x01,
        ISAPNP      = 0x02,
        USB         = 0x03,
        HIL         = 0x04,
        BLUETOOTH   = 0x05,
        VIRTUAL     = 0x06,
        ISA         = 0x10,
        I8042       = 0x11,
        XTKBD       = 0x12,
        RS232       = 0x13,
        GAMEPORT    = 0x14,
        PARPORT     = 0x15,
        AMIGA       = 0x16,
        ADB         = 0x17,
        I2C         = 0x18,
        HOST        = 0x19,
        GSC         = 0x1A,
        ATARI       = 0x1B,
        SPI         = 0x1C,
        RMI         = 0x1D,
        CEC         = 0x1E,
        INTEL_ISHTP = 0x1F,
        AMD_SFH     = 0x20,
    }
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.variant_name() {
            Some(name) => write!(f, "BUS_{name}"),
            None => write!(f, "Bus({:#x})", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug() {
        assert_eq!(format!("{:?}", Bus::USB), "BUS_USB");
        assert_eq!(format!("{:?}", Bus(0xffff)), "Bus(0xffff)");
        assert_eq!(
            format!("{:?}", InputId::new(Bus::I2C, 0x06cb, 0xcd7d, 0x100)),
            "InputId { bustype: BUS_I2C, vendor: 0x06cb, product: 0xcd7d, version: 0x0100 }"
        );
        assert_eq!(
            format!("{:?}", InputId::default()),
            "InputId { bustype: Bus(0x0), vendor: 0x0000, product: 0x0000, version: 0x0000 }"
        );
    }

    #[test]
    fn overrides() {
        let mut id = InputId::new(Bus::USB, 0x046d, 0xc52b, 0x0111);
        id.set_bus(Bus::AMD_SFH);
        id.set_product(0x0001);
        assert_eq!(id.bus(), Bus::AMD_SFH);
        assert_eq!(id.vendor(), 0x046d);
        assert_eq!(id.product(), 0x0001);
        assert_eq!(id.version(), 0x0111);

        id.set_vendor(0);
        id.set_version(0);
        assert_eq!(id, InputId::new(Bus::AMD_SFH, 0, 0x0001, 0));
    }
}
