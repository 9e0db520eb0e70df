#![doc = include_str!("../README.md")]
#![warn(missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[macro_use]
mod macros;

#[cfg(test)]
mod test;

mod abs_info;
pub mod bits;
mod caps;
mod device;
pub mod error;
mod evdev;
pub mod event;
mod handle;
mod input_id;
mod key_repeat;
pub mod logging;
pub mod queue;
mod raw;
pub mod reader;
mod slot;
pub mod slots;
mod sync;
mod util;
mod version;

pub use abs_info::AbsInfo;
pub use caps::Capabilities;
pub use device::{CodeData, Device, GrabMode};
pub use evdev::*;
pub use event::codes::{InputProp, UnknownVariant};
pub use handle::{BitQuery, DeviceHandle};
pub use input_id::{Bus, InputId};
pub use key_repeat::KeyRepeat;
#[doc(inline)]
pub use reader::{ReadFlags, ReadStatus};
pub use slot::Slot;
pub use sync::SyncState;
pub use version::Version;

#[cfg(test)]
mod tests {
    use crate::{queue::EventQueue, reader::Events, slots::SlotTable, test::FakeKernel};

    use super::*;

    #[test]
    fn send_sync() {
        fn assert<T: Send + Sync>() {}

        assert::<Evdev>();
        assert::<Device>();
        assert::<EventQueue>();
        assert::<SlotTable>();
        assert::<FakeKernel>();
        assert::<Events<'static>>();
    }
}
