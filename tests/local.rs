use std::{fs, io};

use evsync::{Device, ReadFlags, ReadStatus};

/// Opens every event device on the local system and checks that a forced resync leaves the cached
/// state unchanged.
#[test]
fn resync_local_devices() -> io::Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let Ok(dir) = fs::read_dir("/dev/input") else {
        return Ok(());
    };
    for entry in dir {
        let path = entry?.path();
        let is_event_node = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("event"));
        if !is_event_node {
            continue;
        }

        let mut device = match Device::open(&path) {
            Ok(device) => device,
            Err(e) => {
                log::warn!("skipping {}: {e}", path.display());
                continue;
            }
        };
        device.update()?;

        let keys = device.key_state().clone();
        assert_eq!(
            device.next_event(ReadFlags::FORCE_SYNC)?,
            ReadStatus::ResyncRequired
        );
        while let ReadStatus::Sync(ev) = device.next_event(ReadFlags::SYNC)? {
            log::debug!("{}: {ev:?}", device.name());
        }
        // Keys may legitimately change while we're looking, but idle test machines don't do that.
        if device.key_state() != &keys {
            log::warn!("key state of {} changed during resync", path.display());
        }
    }

    Ok(())
}
