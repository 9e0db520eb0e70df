//! Resynchronization with the kernel after events were dropped.
//!
//! When the kernel's buffer overflows it discards events and reports `SYN_DROPPED`. From that
//! point on the cached device state can no longer be derived from the event stream. A resync
//! queries the kernel for the complete current state and queues a synthetic frame of events
//! that moves the caller from its last known state to the kernel's.

use std::io;

use libc::timeval;

use crate::{
    AbsInfo, Device,
    bits::{BitSet, BitValue},
    caps::{Capabilities, ValueCache},
    error::{fatal, not_bound},
    event::{Abs, EventCode, EventType, InputEvent, Key, Syn},
    handle::{BitQuery, DeviceHandle, fetch_set},
    logging::LogContext,
    queue::EventQueue,
    slots::{NO_TOUCH, SlotChange, SlotTable, TouchState},
    util::on_drop_elapsed,
};

/// Maximum number of reads performed when discarding stale events before a resync.
pub(crate) const DRAIN_READ_LIMIT: usize = 8;

/// Progress of a resynchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    /// The cached state follows the event stream.
    #[default]
    None,
    /// Events were dropped; the next sync-mode read performs the resync.
    Needed,
    /// The sync frame has been queued and is being delivered.
    InProgress,
}

/// Appends synthesized events to the queue, stamped with the last seen event time.
struct Frame<'a> {
    queue: &'a mut EventQueue,
    time: timeval,
}

impl Frame<'_> {
    fn push(&mut self, code: impl Into<EventCode>, value: i32) -> io::Result<()> {
        let event = InputEvent::from_code(code, value).with_timeval(self.time);
        if self.queue.push(event) {
            Ok(())
        } else {
            Err(fatal(format!(
                "event queue full while synthesizing sync frame (capacity {})",
                self.queue.capacity()
            )))
        }
    }

    fn report(&mut self) -> io::Result<()> {
        self.push(Syn::REPORT, 0)
    }
}

/// Records the first error and keeps going.
fn keep_first(first: &mut Option<io::Error>, result: io::Result<()>) {
    if let Err(e) = result {
        first.get_or_insert(e);
    }
}

impl Device {
    /// Discards queued events, fetches the kernel state and queues the sync frame.
    ///
    /// Kernel query failures skip the affected part of the frame and the first one is returned
    /// after the frame is complete. Running out of queue space is fatal.
    pub(crate) fn resync(&mut self) -> io::Result<()> {
        let log = self.log_context();
        let _guard = on_drop_elapsed(|dur| dev_log!(log, Debug, "resync took {dur:?}"));

        self.handle_or_err()?;
        let Device {
            handle,
            caps,
            values,
            slots,
            queue,
            last_event_time,
            ..
        } = self;
        let Some(handle) = handle.as_deref() else {
            return Err(not_bound());
        };

        drain(handle, queue, &log);

        let mut frame = Frame {
            queue,
            time: *last_event_time,
        };
        let mut first_error = None;

        // Slot the caller last saw an `ABS_MT_SLOT` for.
        let mut reported_slot = slots.as_ref().map(|s| s.current());
        let mut changes = None;

        if let Some(table) = slots.as_mut().filter(|_| caps.has_code(Abs::MT_SLOT)) {
            match table.diff_against_kernel(handle, &caps.abs) {
                Ok(c) => {
                    terminate_slots(&mut frame, caps, values, &c, &mut reported_slot)?;
                    changes = Some(c);
                }
                Err(e) => keep_first(&mut first_error, Err(e)),
            }
        }

        if caps.has_type(EventType::KEY) {
            let result = sync_bits(
                handle,
                &mut frame,
                BitQuery::KeyState,
                &caps.keys,
                &mut values.keys,
            );
            keep_first(&mut first_error, result);
        }
        if caps.has_type(EventType::LED) {
            let result = sync_bits(
                handle,
                &mut frame,
                BitQuery::LedState,
                &caps.leds,
                &mut values.leds,
            );
            keep_first(&mut first_error, result);
        }
        if caps.has_type(EventType::SW) {
            let result = sync_bits(
                handle,
                &mut frame,
                BitQuery::SwitchState,
                &caps.switches,
                &mut values.switches,
            );
            keep_first(&mut first_error, result);
        }
        if caps.has_type(EventType::ABS) {
            let result = sync_abs(handle, &mut frame, caps, &mut values.abs);
            keep_first(&mut first_error, result);
        }

        if let (Some(table), Some(changes)) = (slots.as_mut(), changes) {
            let result = push_slot_changes(
                handle,
                &mut frame,
                caps,
                table,
                &changes,
                &mut reported_slot,
                &log,
            );
            keep_first(&mut first_error, result);
        }

        if !frame.queue.is_empty() {
            frame.report()?;
        }
        let queued = frame.queue.num_queued();
        frame.queue.set_pending_sync(queued);
        dev_log!(log, Debug, "queued {queued} events to resync");

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Throws away everything the kernel has buffered, since it predates the state we're about to
/// fetch.
fn drain(handle: &dyn DeviceHandle, queue: &mut EventQueue, log: &LogContext) {
    queue.clear();

    let mut reads = 0;
    loop {
        match handle.is_readable() {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => {
                dev_log!(log, Error, "failed to drain events before sync: {e}");
                return;
            }
        }
        if reads == DRAIN_READ_LIMIT {
            dev_log!(
                log,
                Info,
                "unable to drain events, buffer size mismatch (stopped after {reads} reads)"
            );
            return;
        }
        reads += 1;

        match handle.read_events(queue.spare_mut()) {
            Ok(_) => queue.clear(),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
            Err(e) => {
                dev_log!(log, Error, "failed to drain events before sync: {e}");
                return;
            }
        }
    }
}

/// Ends every contact that stopped or was replaced, and adjusts the finger-count tool keys.
fn terminate_slots(
    frame: &mut Frame<'_>,
    caps: &Capabilities,
    values: &mut ValueCache,
    changes: &[SlotChange],
    reported_slot: &mut Option<usize>,
) -> io::Result<()> {
    let mut stopped = 0;
    let mut started = 0;
    let mut changed = 0;
    let mut ongoing = 0;

    for (slot, change) in changes.iter().enumerate() {
        match change.state {
            TouchState::Unchanged => continue,
            TouchState::Started => {
                started += 1;
                continue;
            }
            TouchState::Ongoing => {
                ongoing += 1;
                continue;
            }
            TouchState::Stopped => stopped += 1,
            TouchState::Changed => changed += 1,
        }
        frame.push(Abs::MT_SLOT, slot as i32)?;
        frame.push(Abs::MT_TRACKING_ID, NO_TOUCH)?;
        *reported_slot = Some(slot);
    }

    if stopped + changed == 0 {
        return Ok(());
    }

    // Replaced contacts count as lifted: they are re-announced after this frame.
    let before: usize = stopped + changed + ongoing;
    let after = ongoing + started;
    for (count, on) in [(before, 0), (after, 1)] {
        let Some(&key) = count.checked_sub(1).and_then(|i| Key::FINGER_COUNT_TOOLS.get(i)) else {
            continue;
        };
        if caps.has_code(key) {
            frame.push(key, on)?;
            values.keys.set(key, on != 0);
        }
    }

    frame.report()
}

/// Queues an event for every enabled code whose kernel state differs from the cache.
fn sync_bits<V>(
    handle: &dyn DeviceHandle,
    frame: &mut Frame<'_>,
    query: BitQuery,
    enabled: &BitSet<V>,
    cached: &mut BitSet<V>,
) -> io::Result<()>
where
    V: BitValue + Into<EventCode>,
{
    let kernel = fetch_set::<V>(handle, query)?;
    let changed: Vec<V> = cached
        .symmetric_difference(&kernel)
        .filter(|&code| enabled.contains(code))
        .collect();
    for code in changed {
        let on = kernel.contains(code);
        frame.push(code, on.into())?;
        cached.set(code, on);
    }
    Ok(())
}

/// Queues an event for every enabled non-multitouch axis whose value changed.
fn sync_abs(
    handle: &dyn DeviceHandle,
    frame: &mut Frame<'_>,
    caps: &Capabilities,
    cached: &mut [AbsInfo],
) -> io::Result<()> {
    for abs in caps.abs.iter().filter(|abs| !abs.is_mt()) {
        let value = handle.abs_info(abs)?.value();
        let Some(info) = cached.get_mut(usize::from(abs.0)) else {
            continue;
        };
        if info.value() != value {
            frame.push(abs, value)?;
            info.set_value(value);
        }
    }
    Ok(())
}

/// Re-announces every live slot that changed, then moves the caller to the kernel's slot.
fn push_slot_changes(
    handle: &dyn DeviceHandle,
    frame: &mut Frame<'_>,
    caps: &Capabilities,
    table: &mut SlotTable,
    changes: &[SlotChange],
    reported_slot: &mut Option<usize>,
    log: &LogContext,
) -> io::Result<()> {
    for (slot, change) in changes.iter().enumerate() {
        if change.state == TouchState::Stopped || change.axes.is_empty() {
            continue;
        }
        frame.push(Abs::MT_SLOT, slot as i32)?;
        *reported_slot = Some(slot);

        for axis in change.axes.iter().filter(|&axis| caps.has_code(axis)) {
            frame.push(axis, table.value_at(slot, axis, log))?;
        }
    }

    let current = handle.abs_info(Abs::MT_SLOT)?.value();
    let current = usize::try_from(current)
        .ok()
        .filter(|&slot| slot < table.slot_count())
        .unwrap_or(table.slot_count().saturating_sub(1));
    if *reported_slot != Some(current) {
        frame.push(Abs::MT_SLOT, current as i32)?;
        *reported_slot = Some(current);
    }
    table.set_current(current);
    Ok(())
}
