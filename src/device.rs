use std::{ffi::c_int, fmt, io, path::Path, time::Instant};

use libc::timeval;

use crate::{
    AbsInfo, Evdev, InputId, InputProp, KeyRepeat, Slot, Version,
    bits::BitSet,
    caps::{CODE_TYPES, Capabilities, ValueCache},
    error::{invalid_input, not_bound},
    event::{Abs, EventCode, EventType, InputEvent, Key, Led, Repeat, Syn},
    handle::{BitQuery, DeviceHandle, fetch_set},
    input_id::Bus,
    logging::{LogContext, default_log_context},
    queue::{EventQueue, MIN_QUEUE_SIZE},
    slots::SlotTable,
    sync::SyncState,
};

/// Extra data required when enabling certain event codes.
///
/// See [`Device::enable_event_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeData {
    /// Required for every [`Abs`] code.
    Abs(AbsInfo),
    /// Required for every [`Repeat`] code.
    Repeat(i32),
}

/// Whether a device is grabbed for exclusive access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrabMode {
    Grab,
    #[default]
    Ungrab,
}

/// An input device and its cached state.
///
/// A [`Device`] mirrors what the kernel knows about an input device: its identity,
/// capabilities, and the current value of every key, switch, LED and axis (including per-slot
/// multitouch state). Reading events with [`Device::next_event`] keeps that mirror up to date,
/// and resynchronizes it with the kernel after events were dropped.
///
/// A [`Device`] may also exist without a [`DeviceHandle`], in which case it can be configured
/// manually (e.g. as a template for a virtual device), but cannot read events.
pub struct Device {
    pub(crate) handle: Option<Box<dyn DeviceHandle>>,
    name: String,
    phys: Option<String>,
    uniq: Option<String>,
    id: InputId,
    driver_version: Version,
    pub(crate) caps: Capabilities,
    pub(crate) values: ValueCache,
    pub(crate) slots: Option<SlotTable>,
    pub(crate) queue: EventQueue,
    pub(crate) sync_state: SyncState,
    grab: GrabMode,
    pub(crate) last_event_time: timeval,
    log: Option<LogContext>,
}

impl Default for Device {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("handle", &self.handle)
            .field("name", &self.name)
            .field("phys", &self.phys)
            .field("uniq", &self.uniq)
            .field("id", &self.id)
            .field("driver_version", &self.driver_version)
            .field("caps", &self.caps)
            .field("slots", &self.slots)
            .field("queue", &self.queue)
            .field("sync_state", &self.sync_state)
            .field("grab", &self.grab)
            .finish_non_exhaustive()
    }
}

impl Device {
    /// Creates an empty [`Device`] with no handle and no capabilities.
    pub fn new() -> Self {
        Self {
            handle: None,
            name: String::new(),
            phys: None,
            uniq: None,
            id: InputId::default(),
            driver_version: Version::default(),
            caps: Capabilities::default(),
            values: ValueCache::default(),
            slots: None,
            queue: EventQueue::default(),
            sync_state: SyncState::None,
            grab: GrabMode::Ungrab,
            last_event_time: timeval {
                tv_sec: 0,
                tv_usec: 0,
            },
            log: None,
        }
    }

    /// Opens the `evdev` node at `path` and loads the device state from it.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Self::from_handle(Evdev::open(path)?)
    }

    /// Creates a [`Device`] bound to `handle`.
    pub fn from_handle(handle: impl DeviceHandle + 'static) -> io::Result<Self> {
        let mut this = Self::new();
        this.bind(handle)?;
        Ok(this)
    }

    /// Attaches a handle and loads the complete device state from it.
    ///
    /// Any configuration made before binding is replaced by what the handle reports. If loading
    /// fails, the device is reset and the error returned.
    ///
    /// # Errors
    ///
    /// Fails with [`io::ErrorKind::InvalidInput`] if a handle is already attached. Use
    /// [`Device::change_handle`] to replace it.
    pub fn bind(&mut self, handle: impl DeviceHandle + 'static) -> io::Result<()> {
        if self.handle.is_some() {
            log_bug!(self.log_context(), "device already initialized");
            return Err(invalid_input("device already has a handle"));
        }

        let now = Instant::now();
        self.reset();
        match self.load(&handle) {
            Ok(()) => {
                self.handle = Some(Box::new(handle));
                dev_log!(
                    self.log_context(),
                    Debug,
                    "loaded device \"{}\" in {:?}",
                    self.name,
                    now.elapsed()
                );
                Ok(())
            }
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    fn load(&mut self, handle: &dyn DeviceHandle) -> io::Result<()> {
        self.caps.types = fetch_set(handle, BitQuery::Types)?;
        self.name = handle.name()?;
        self.phys = handle.phys()?;
        self.uniq = handle.unique_id()?;
        self.id = handle.input_id()?;
        self.driver_version = handle.driver_version()?;

        match fetch_set(handle, BitQuery::Props) {
            Ok(props) => self.caps.props = props,
            // Kernels before 2.6.38 don't know about properties.
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => {}
            Err(e) => return Err(e),
        }

        for ty in CODE_TYPES {
            if ty == EventType::SYN || ty == EventType::REP {
                continue;
            }
            if let Some(words) = self.caps.code_words_mut(ty) {
                handle.fetch_bits(BitQuery::Codes(ty), words)?;
            }
        }

        self.values.keys = fetch_set(handle, BitQuery::KeyState)?;
        self.values.leds = fetch_set(handle, BitQuery::LedState)?;
        self.values.switches = fetch_set(handle, BitQuery::SwitchState)?;
        self.values.sounds = fetch_set(handle, BitQuery::SoundState)?;

        // There is no code query for `EV_REP`: both settings exist whenever the type does.
        if self.caps.types.contains(EventType::REP) {
            self.caps.rep.extend([Repeat::DELAY, Repeat::PERIOD]);
            self.values.rep = handle.key_repeat()?;
        }

        let log = self.log_context();
        for abs in self.caps.abs.iter() {
            let mut info = handle.abs_info(abs)?;
            if abs == Abs::MT_TRACKING_ID && info.minimum() == info.maximum() {
                log_bug!(
                    log,
                    "device \"{}\" has invalid ABS_MT_TRACKING_ID range",
                    self.name
                );
                info.set_minimum(-1);
                info.set_maximum(0xffff);
            }
            self.values.abs[usize::from(abs.0)] = info;
        }

        self.init_slots();
        if let Some(slots) = &mut self.slots {
            slots.diff_against_kernel(handle, &self.caps.abs)?;
        }
        self.queue = EventQueue::with_capacity(self.required_queue_capacity());
        Ok(())
    }

    /// Replaces the handle of a bound device without reloading any state.
    ///
    /// Use this when the underlying file was reopened, e.g. after a VT switch. The device is
    /// considered ungrabbed afterwards.
    pub fn change_handle(&mut self, handle: impl DeviceHandle + 'static) -> io::Result<()> {
        if self.handle.is_none() {
            log_bug!(self.log_context(), "device not initialized, call bind first");
            return Err(not_bound());
        }
        self.handle = Some(Box::new(handle));
        self.grab = GrabMode::Ungrab;
        Ok(())
    }

    /// Returns the attached handle, if any.
    pub fn handle(&self) -> Option<&dyn DeviceHandle> {
        self.handle.as_deref()
    }

    /// Detaches and returns the handle.
    ///
    /// Cached state is kept, but no further events can be read until a handle is attached again
    /// with [`Device::bind`], which reloads it.
    pub fn take_handle(&mut self) -> Option<Box<dyn DeviceHandle>> {
        self.handle.take()
    }

    /// Drops the handle and all state, keeping only the log configuration.
    pub fn reset(&mut self) {
        let log = self.log.take();
        *self = Self::new();
        self.log = log;
    }

    pub(crate) fn handle_or_err(&self) -> io::Result<&dyn DeviceHandle> {
        match self.handle.as_deref() {
            Some(handle) => Ok(handle),
            None => {
                log_bug!(self.log_context(), "device not initialized, call bind first");
                Err(not_bound())
            }
        }
    }

    /// Returns the [`LogContext`] this device logs through.
    pub fn log_context(&self) -> LogContext {
        self.log.clone().unwrap_or_else(default_log_context)
    }

    /// Overrides the process-wide default [`LogContext`] for this device.
    ///
    /// Passing [`None`] reverts to the default.
    pub fn set_log_context(&mut self, ctx: Option<LogContext>) {
        self.log = ctx;
    }

    /// Rebuilds the slot table from the `ABS_MT_SLOT` axis.
    ///
    /// Devices that also advertise `ABS_RESERVED` are not treated as multitouch: their
    /// multitouch-range codes are an artifact of drivers exposing too many axes.
    fn init_slots(&mut self) {
        self.slots = None;
        if self.caps.has_code(Abs::RESERVED) || !self.caps.has_code(Abs::MT_SLOT) {
            return;
        }

        let info = self.values.abs[usize::from(Abs::MT_SLOT.0)];
        let count = usize::try_from(info.maximum().saturating_add(1)).unwrap_or(0);
        let mut slots = SlotTable::new(count, &self.log_context());
        if let Ok(current) = usize::try_from(info.value()) {
            slots.set_current(current);
        }
        self.slots = Some(slots);
    }

    fn required_queue_capacity(&self) -> usize {
        let mut events = self.caps.enabled_code_count();
        if let Some(slots) = &self.slots {
            let mt_axes = self.caps.mt_codes().count();
            events += mt_axes * slots.slot_count().saturating_sub(1);
        }
        MIN_QUEUE_SIZE.max(events * 2)
    }

    /// Grows the queue after capabilities were added to a bound device.
    fn grow_queue(&mut self) {
        if self.handle.is_some() {
            let needed = self.required_queue_capacity();
            if needed > self.queue.capacity() {
                self.queue.resize(needed);
            }
        }
    }
}

/// Identity.
impl Device {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Returns the physical location, e.g. `usb-0000:02:00.0-5/input1`.
    pub fn phys(&self) -> Option<&str> {
        self.phys.as_deref()
    }

    pub fn set_phys(&mut self, phys: Option<String>) {
        self.phys = phys;
    }

    /// Returns the unique identifier, typically a serial number.
    pub fn unique_id(&self) -> Option<&str> {
        self.uniq.as_deref()
    }

    pub fn set_unique_id(&mut self, uniq: Option<String>) {
        self.uniq = uniq;
    }

    pub fn input_id(&self) -> InputId {
        self.id
    }

    pub fn set_bus(&mut self, bus: Bus) {
        self.id.set_bus(bus);
    }

    pub fn set_vendor(&mut self, vendor: u16) {
        self.id.set_vendor(vendor);
    }

    pub fn set_product(&mut self, product: u16) {
        self.id.set_product(product);
    }

    pub fn set_version(&mut self, version: u16) {
        self.id.set_version(version);
    }

    /// Returns the `evdev` subsystem version reported when the device was bound.
    pub fn driver_version(&self) -> Version {
        self.driver_version
    }
}

/// Capabilities.
impl Device {
    /// Returns the full capability set.
    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    pub fn has_property(&self, prop: InputProp) -> bool {
        self.caps.has_property(prop)
    }

    pub fn enable_property(&mut self, prop: InputProp) -> io::Result<()> {
        if prop > InputProp::MAX {
            return Err(invalid_input(format!("property {prop:?} out of range")));
        }
        self.caps.props.insert(prop);
        Ok(())
    }

    pub fn disable_property(&mut self, prop: InputProp) -> io::Result<()> {
        if prop > InputProp::MAX {
            return Err(invalid_input(format!("property {prop:?} out of range")));
        }
        self.caps.props.remove(prop);
        Ok(())
    }

    pub fn has_event_type(&self, ty: EventType) -> bool {
        self.caps.has_type(ty)
    }

    pub fn has_event_code(&self, code: impl Into<EventCode>) -> bool {
        self.caps.has_code(code)
    }

    /// Enables an event type.
    ///
    /// Enabling [`EventType::REP`] also enables both repeat settings with a value of 0.
    pub fn enable_event_type(&mut self, ty: EventType) -> io::Result<()> {
        if ty.max_code().is_none() {
            return Err(invalid_input(format!("unsupported event type {ty:?}")));
        }
        if ty != EventType::SYN {
            self.caps.types.insert(ty);
        }
        if ty == EventType::REP {
            for code in [Repeat::DELAY, Repeat::PERIOD] {
                self.caps.rep.insert(code);
                self.values.rep.set(code, 0);
            }
        }
        self.grow_queue();
        Ok(())
    }

    /// Disables an event type. [`EventType::SYN`] cannot be disabled.
    ///
    /// The codes of the type are retained and become visible again if the type is re-enabled.
    pub fn disable_event_type(&mut self, ty: EventType) -> io::Result<()> {
        if ty.max_code().is_none() {
            return Err(invalid_input(format!("unsupported event type {ty:?}")));
        }
        if ty == EventType::SYN {
            return Err(invalid_input("EV_SYN cannot be disabled"));
        }
        self.caps.types.remove(ty);
        Ok(())
    }

    /// Enables an event code, and its event type if necessary.
    ///
    /// [`Abs`] codes require [`CodeData::Abs`] and [`Repeat`] codes require
    /// [`CodeData::Repeat`]. All other codes must be enabled without data.
    ///
    /// Enabling [`Abs::MT_SLOT`] rebuilds the slot table from the given [`AbsInfo`], and enabling
    /// [`Abs::MT_TRACKING_ID`] marks every slot as empty.
    pub fn enable_event_code(
        &mut self,
        code: impl Into<EventCode>,
        data: Option<CodeData>,
    ) -> io::Result<()> {
        let code = code.into();
        if !code.in_range() {
            return Err(invalid_input(format!("event code {code:?} out of range")));
        }
        match (code, data) {
            (EventCode::Abs(_), Some(CodeData::Abs(_)))
            | (EventCode::Repeat(_), Some(CodeData::Repeat(_))) => {}
            (EventCode::Abs(_), _) => {
                return Err(invalid_input("ABS codes must be enabled with an AbsInfo"));
            }
            (EventCode::Repeat(_), _) => {
                return Err(invalid_input("REP codes must be enabled with a value"));
            }
            (_, Some(_)) => {
                return Err(invalid_input(format!(
                    "{code:?} does not take additional data"
                )));
            }
            (_, None) => {}
        }

        self.enable_event_type(code.event_type())?;
        if let EventCode::Syn(_) = code {
            return Ok(());
        }
        self.caps.set_code(code, true);

        match (code, data) {
            (EventCode::Abs(abs), Some(CodeData::Abs(info))) => {
                self.values.abs[usize::from(abs.0)] = info;
                if abs == Abs::MT_SLOT {
                    self.init_slots();
                } else if abs == Abs::MT_TRACKING_ID {
                    if let Some(slots) = &mut self.slots {
                        slots.reset_tracking_ids();
                    }
                }
            }
            (EventCode::Repeat(rep), Some(CodeData::Repeat(value))) => {
                self.values.rep.set(rep, value as u32);
            }
            _ => {}
        }

        self.grow_queue();
        Ok(())
    }

    /// Disables an event code. Codes of [`EventType::SYN`] cannot be disabled.
    pub fn disable_event_code(&mut self, code: impl Into<EventCode>) -> io::Result<()> {
        let code = code.into();
        if !code.in_range() {
            return Err(invalid_input(format!("event code {code:?} out of range")));
        }
        if let EventCode::Syn(_) = code {
            return Err(invalid_input("EV_SYN codes cannot be disabled"));
        }
        self.caps.set_code(code, false);

        if code == EventCode::Abs(Abs::MT_SLOT) {
            self.init_slots();
        } else if code == EventCode::Abs(Abs::MT_TRACKING_ID) {
            if let Some(slots) = &mut self.slots {
                slots.reset_tracking_ids();
            }
        }
        Ok(())
    }
}

/// Absolute axes.
impl Device {
    /// Returns the [`AbsInfo`] of `abs`, or [`None`] if the axis is not enabled.
    pub fn abs_info(&self, abs: Abs) -> Option<AbsInfo> {
        if !self.caps.has_code(abs) {
            return None;
        }
        self.values.abs(abs).copied()
    }

    fn abs_info_mut(&mut self, abs: Abs) -> Option<&mut AbsInfo> {
        if !self.caps.has_code(abs) {
            return None;
        }
        self.values.abs_mut(abs)
    }

    /// Replaces the cached [`AbsInfo`] of `abs`. Does nothing if the axis is not enabled.
    pub fn set_abs_info(&mut self, abs: Abs, info: AbsInfo) {
        if let Some(slot) = self.abs_info_mut(abs) {
            *slot = info;
        }
    }

    pub fn set_abs_minimum(&mut self, abs: Abs, minimum: i32) {
        if let Some(info) = self.abs_info_mut(abs) {
            info.set_minimum(minimum);
        }
    }

    pub fn set_abs_maximum(&mut self, abs: Abs, maximum: i32) {
        if let Some(info) = self.abs_info_mut(abs) {
            info.set_maximum(maximum);
        }
    }

    pub fn set_abs_fuzz(&mut self, abs: Abs, fuzz: i32) {
        if let Some(info) = self.abs_info_mut(abs) {
            info.set_fuzz(fuzz);
        }
    }

    pub fn set_abs_flat(&mut self, abs: Abs, flat: i32) {
        if let Some(info) = self.abs_info_mut(abs) {
            info.set_flat(flat);
        }
    }

    pub fn set_abs_resolution(&mut self, abs: Abs, resolution: i32) {
        if let Some(info) = self.abs_info_mut(abs) {
            info.set_resolution(resolution);
        }
    }

    /// Changes the [`AbsInfo`] of `abs` in the kernel, then in the local cache.
    ///
    /// This is a global device property that affects every program using the device.
    #[doc(alias = "EVIOCSABS")]
    pub fn kernel_set_abs_info(&mut self, abs: Abs, info: AbsInfo) -> io::Result<()> {
        if abs > Abs::MAX {
            return Err(invalid_input(format!("axis {abs:?} out of range")));
        }
        self.handle_or_err()?.set_abs_info(abs, info)?;
        self.set_abs_info(abs, info);
        Ok(())
    }
}

/// State values.
impl Device {
    /// Returns the current value of `code`, or [`None`] if it is not enabled.
    ///
    /// Codes without state ([`EventType::REL`], [`EventType::MSC`], ...) report 0.
    pub fn fetch_event_value(&self, code: impl Into<EventCode>) -> Option<i32> {
        let code = code.into();
        if !self.caps.has_code(code) {
            return None;
        }
        Some(match code {
            EventCode::Key(c) => self.values.keys.contains(c).into(),
            EventCode::Led(c) => self.values.leds.contains(c).into(),
            EventCode::Switch(c) => self.values.switches.contains(c).into(),
            EventCode::Sound(c) => self.values.sounds.contains(c).into(),
            EventCode::Abs(c) => self.values.abs(c).map_or(0, |info| info.value()),
            EventCode::Repeat(c) => self.values.rep.get(c).map_or(0, |v| v as i32),
            _ => 0,
        })
    }

    /// Returns the current value of `code`, or 0 if it is not enabled.
    pub fn event_value(&self, code: impl Into<EventCode>) -> i32 {
        self.fetch_event_value(code).unwrap_or(0)
    }

    /// Overrides the cached value of an enabled key, axis, LED or switch.
    ///
    /// The value is validated like an event coming from the kernel: an out-of-range slot index or
    /// a tracking ID that contradicts the slot state is rejected.
    pub fn set_event_value(&mut self, code: impl Into<EventCode>, value: i32) -> io::Result<()> {
        let code = code.into();
        if !self.caps.has_code(code) {
            return Err(invalid_input(format!("{code:?} is not enabled")));
        }
        if !matches!(
            code,
            EventCode::Key(_) | EventCode::Abs(_) | EventCode::Led(_) | EventCode::Switch(_)
        ) {
            return Err(invalid_input(format!("{code:?} has no settable state")));
        }
        let event = InputEvent::from_code(code, value);
        if !self.sanitize(event, SyncState::None).is_unchanged() {
            return Err(invalid_input(format!(
                "value {value} is not valid for {code:?}"
            )));
        }
        self.apply_state(event);
        Ok(())
    }

    /// Returns the key repeat settings, or [`None`] if [`EventType::REP`] is not enabled.
    pub fn key_repeat(&self) -> Option<KeyRepeat> {
        self.caps
            .has_type(EventType::REP)
            .then_some(self.values.rep)
    }

    /// Returns the set of keys currently held down.
    pub fn key_state(&self) -> &BitSet<Key> {
        &self.values.keys
    }

    /// Returns the set of LEDs currently lit.
    pub fn led_state(&self) -> &BitSet<Led> {
        &self.values.leds
    }
}

/// Multitouch slots.
impl Device {
    /// Returns the number of slots, or [`None`] if the device is not a multitouch device.
    pub fn num_slots(&self) -> Option<usize> {
        self.slots.as_ref().map(SlotTable::slot_count)
    }

    /// Returns the slot that `ABS_MT_*` events currently apply to.
    pub fn current_slot(&self) -> Option<Slot> {
        let slots = self.slots.as_ref()?;
        Slot::try_from(slots.current()).ok()
    }

    /// Returns the value of multitouch `axis` in `slot`, or [`None`] if either is invalid or the
    /// axis is not enabled.
    ///
    /// Querying [`Abs::MT_SLOT`] returns the current slot index.
    pub fn fetch_slot_value(&self, slot: impl Into<Slot>, axis: Abs) -> Option<i32> {
        let slot = slot.into();
        let slots = self.slots.as_ref()?;
        if !self.caps.has_code(axis) || slot.index() >= slots.slot_count() {
            return None;
        }
        if axis == Abs::MT_SLOT {
            return i32::try_from(slots.current()).ok();
        }
        slots.get(slot.index(), axis)
    }

    /// Like [`Device::fetch_slot_value`], but returns 0 for invalid arguments.
    pub fn slot_value(&self, slot: impl Into<Slot>, axis: Abs) -> i32 {
        self.fetch_slot_value(slot, axis).unwrap_or(0)
    }

    /// Overrides the cached value of `axis` in `slot`.
    ///
    /// Setting [`Abs::MT_SLOT`] changes the current slot instead.
    pub fn set_slot_value(&mut self, slot: impl Into<Slot>, axis: Abs, value: i32) -> io::Result<()> {
        let slot = slot.into();
        let log = self.log_context();
        if !self.caps.has_code(axis) || !axis.is_mt() {
            return Err(invalid_input(format!(
                "{axis:?} is not an enabled multitouch axis"
            )));
        }
        let Some(slots) = &mut self.slots else {
            return Err(invalid_input("device has no multitouch slots"));
        };
        if slot.index() >= slots.slot_count() {
            return Err(invalid_input(format!("slot {} out of range", slot.index())));
        }

        if axis == Abs::MT_SLOT {
            let ok = usize::try_from(value).is_ok_and(|v| slots.set_current(v));
            if !ok {
                return Err(invalid_input(format!("slot index {value} out of range")));
            }
        } else {
            slots.set_value_at(slot.index(), axis, value, &log);
        }
        Ok(())
    }
}

/// Kernel control.
impl Device {
    /// Grabs or ungrabs the device. Does nothing if it is already in the requested mode.
    ///
    /// While grabbed, no other program receives events from the device.
    #[doc(alias = "EVIOCGRAB")]
    pub fn grab(&mut self, mode: GrabMode) -> io::Result<()> {
        if mode == self.grab {
            return Ok(());
        }
        self.handle_or_err()?.grab(mode == GrabMode::Grab)?;
        self.grab = mode;
        Ok(())
    }

    pub fn grab_mode(&self) -> GrabMode {
        self.grab
    }

    /// Selects the clock used for event timestamps, e.g. [`libc::CLOCK_MONOTONIC`].
    #[doc(alias = "EVIOCSCLOCKID")]
    pub fn set_clock_id(&mut self, clock: c_int) -> io::Result<()> {
        self.handle_or_err()?.set_clock_id(clock)
    }

    /// Turns an LED on or off.
    pub fn kernel_set_led_value(&mut self, led: Led, on: bool) -> io::Result<()> {
        self.kernel_set_led_values(&[(led, on)])
    }

    /// Changes several LEDs in one frame.
    ///
    /// All LEDs must be enabled. On success the cached LED state is updated as well.
    pub fn kernel_set_led_values(&mut self, leds: &[(Led, bool)]) -> io::Result<()> {
        let handle = self.handle_or_err()?;
        if let Some((led, _)) = leds.iter().find(|(led, _)| !self.caps.has_code(*led)) {
            return Err(invalid_input(format!("{led:?} is not enabled")));
        }

        let mut events: Vec<InputEvent> = leds
            .iter()
            .map(|&(led, on)| InputEvent::from_code(led, on.into()))
            .collect();
        events.push(Syn::REPORT.into());
        handle.write_events(&events)?;

        for &(led, on) in leds {
            self.values.leds.set(led, on);
        }
        Ok(())
    }

    /// Returns the resynchronization state.
    pub fn sync_state(&self) -> SyncState {
        self.sync_state
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        event::{Rel, Switch},
        test::FakeKernel,
    };

    use super::*;

    fn touchpad() -> FakeKernel {
        let kernel = FakeKernel::new("touchpad");
        kernel.with(|k| {
            k.enable(Key::BTN_TOUCH);
            k.enable(Key::BTN_TOOL_FINGER);
            k.enable_abs(Abs::X, AbsInfo::new(0, 1000));
            k.enable_abs(Abs::MT_SLOT, AbsInfo::new(0, 2));
            k.enable_abs(Abs::MT_POSITION_X, AbsInfo::new(0, 1000));
            k.enable_abs(Abs::MT_TRACKING_ID, AbsInfo::new(0, 0xffff));
            k.set_slot(1, Abs::MT_TRACKING_ID, 7);
            k.set_slot(1, Abs::MT_POSITION_X, 300);
        });
        kernel
    }

    #[test]
    fn bind_loads_state() -> io::Result<()> {
        let kernel = touchpad();
        kernel.with(|k| {
            k.phys = Some("usb-1/input0".into());
            k.pressed.insert(Key::BTN_TOUCH);
        });
        let dev = Device::from_handle(kernel.clone())?;

        assert_eq!(dev.name(), "touchpad");
        assert_eq!(dev.phys(), Some("usb-1/input0"));
        assert_eq!(dev.unique_id(), None);
        assert!(dev.has_event_code(Abs::MT_POSITION_X));
        assert!(!dev.has_event_code(Abs::Y));
        assert_eq!(dev.event_value(Key::BTN_TOUCH), 1);
        assert_eq!(dev.num_slots(), Some(3));
        assert_eq!(dev.slot_value(1u8, Abs::MT_TRACKING_ID), 7);
        assert_eq!(dev.slot_value(1u8, Abs::MT_POSITION_X), 300);
        assert_eq!(dev.slot_value(0u8, Abs::MT_TRACKING_ID), -1);
        assert!(dev.queue.capacity() >= MIN_QUEUE_SIZE);
        Ok(())
    }

    #[test]
    fn bind_twice_fails() -> io::Result<()> {
        let mut dev = Device::from_handle(touchpad())?;
        let err = dev.bind(touchpad()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(dev.change_handle(touchpad()).is_ok());
        Ok(())
    }

    #[test]
    fn change_handle_requires_bind() {
        let mut dev = Device::new();
        assert_eq!(
            dev.change_handle(touchpad()).unwrap_err().kind(),
            io::ErrorKind::NotConnected
        );
    }

    #[test]
    fn failed_bind_resets() {
        let kernel = touchpad();
        kernel.with(|k| k.fail("EVIOCGNAME"));
        let mut dev = Device::new();
        dev.set_name("before");
        assert!(dev.bind(kernel).is_err());
        assert_eq!(dev.name(), "");
        assert!(dev.handle().is_none());
    }

    #[test]
    fn props_einval_tolerated() -> io::Result<()> {
        let kernel = touchpad();
        kernel.with(|k| k.fail_with("EVIOCGPROP", libc::EINVAL));
        let dev = Device::from_handle(kernel)?;
        assert!(!dev.has_property(InputProp::POINTER));
        Ok(())
    }

    #[test]
    fn tracking_id_range_fixup() -> io::Result<()> {
        let kernel = touchpad();
        kernel.with(|k| k.enable_abs(Abs::MT_TRACKING_ID, AbsInfo::new(0, 0)));
        let dev = Device::from_handle(kernel)?;
        let info = dev.abs_info(Abs::MT_TRACKING_ID).unwrap();
        assert_eq!((info.minimum(), info.maximum()), (-1, 0xffff));
        Ok(())
    }

    #[test]
    fn reserved_axis_disables_slots() -> io::Result<()> {
        let kernel = touchpad();
        kernel.with(|k| k.enable_abs(Abs::RESERVED, AbsInfo::new(0, 1)));
        let dev = Device::from_handle(kernel)?;
        assert_eq!(dev.num_slots(), None);
        assert_eq!(dev.current_slot(), None);
        Ok(())
    }

    #[test]
    fn enable_rules() {
        let mut dev = Device::new();
        assert!(dev.has_event_type(EventType::SYN));
        assert!(dev.disable_event_type(EventType::SYN).is_err());
        assert!(dev.disable_event_code(Syn::REPORT).is_err());

        assert!(dev.enable_event_code(Abs::X, None).is_err());
        assert!(
            dev.enable_event_code(Abs::X, Some(CodeData::Repeat(1)))
                .is_err()
        );
        assert!(
            dev.enable_event_code(Key::KEY_A, Some(CodeData::Repeat(1)))
                .is_err()
        );
        assert!(dev.enable_event_code(Key(0x300), None).is_err());
        assert!(!dev.has_event_type(EventType::KEY));

        dev.enable_event_code(Rel::X, None).unwrap();
        assert!(dev.has_event_type(EventType::REL));
        assert!(dev.has_event_code(Rel::X));

        dev.disable_event_type(EventType::REL).unwrap();
        assert!(!dev.has_event_code(Rel::X));
        dev.enable_event_type(EventType::REL).unwrap();
        assert!(dev.has_event_code(Rel::X));
    }

    #[test]
    fn enable_repeat_seeds_zero() {
        let mut dev = Device::new();
        assert_eq!(dev.key_repeat(), None);
        dev.enable_event_type(EventType::REP).unwrap();
        assert_eq!(dev.key_repeat(), Some(KeyRepeat::new(0, 0)));
        dev.enable_event_code(Repeat::DELAY, Some(CodeData::Repeat(250)))
            .unwrap();
        assert_eq!(dev.event_value(Repeat::DELAY), 250);
        assert_eq!(dev.event_value(Repeat::PERIOD), 0);
    }

    #[test]
    fn mt_slot_enable_builds_table() {
        let mut dev = Device::new();
        dev.enable_event_code(Abs::MT_SLOT, Some(CodeData::Abs(AbsInfo::new(0, 9).with_value(3))))
            .unwrap();
        assert_eq!(dev.num_slots(), Some(10));
        assert_eq!(dev.current_slot(), Some(Slot::new(3)));

        dev.enable_event_code(Abs::MT_TRACKING_ID, Some(CodeData::Abs(AbsInfo::new(-1, 100))))
            .unwrap();
        dev.set_slot_value(2u8, Abs::MT_TRACKING_ID, 5).unwrap();
        assert_eq!(dev.slot_value(2u8, Abs::MT_TRACKING_ID), 5);
        dev.enable_event_code(Abs::MT_TRACKING_ID, Some(CodeData::Abs(AbsInfo::new(-1, 100))))
            .unwrap();
        assert_eq!(dev.slot_value(2u8, Abs::MT_TRACKING_ID), -1);

        dev.disable_event_code(Abs::MT_SLOT).unwrap();
        assert_eq!(dev.num_slots(), None);
    }

    #[test]
    fn slot_values() {
        let mut dev = Device::new();
        dev.enable_event_code(Abs::MT_SLOT, Some(CodeData::Abs(AbsInfo::new(0, 1))))
            .unwrap();
        dev.enable_event_code(Abs::MT_POSITION_X, Some(CodeData::Abs(AbsInfo::new(0, 100))))
            .unwrap();

        assert_eq!(dev.fetch_slot_value(2u8, Abs::MT_POSITION_X), None);
        assert_eq!(dev.fetch_slot_value(0u8, Abs::MT_POSITION_Y), None);
        assert!(dev.set_slot_value(2u8, Abs::MT_POSITION_X, 1).is_err());
        assert!(dev.set_slot_value(0u8, Abs::X, 1).is_err());

        dev.set_slot_value(1u8, Abs::MT_POSITION_X, 42).unwrap();
        assert_eq!(dev.slot_value(1u8, Abs::MT_POSITION_X), 42);

        dev.set_slot_value(0u8, Abs::MT_SLOT, 1).unwrap();
        assert_eq!(dev.current_slot(), Some(Slot::new(1)));
        assert!(dev.set_slot_value(0u8, Abs::MT_SLOT, 2).is_err());
        assert_eq!(dev.slot_value(0u8, Abs::MT_SLOT), 1);
    }

    #[test]
    fn abs_setters_ignore_disabled_axes() {
        let mut dev = Device::new();
        dev.set_abs_maximum(Abs::X, 10);
        assert_eq!(dev.abs_info(Abs::X), None);

        dev.enable_event_code(Abs::X, Some(CodeData::Abs(AbsInfo::new(0, 5))))
            .unwrap();
        dev.set_abs_maximum(Abs::X, 10);
        dev.set_abs_minimum(Abs::X, -10);
        dev.set_abs_fuzz(Abs::X, 1);
        dev.set_abs_flat(Abs::X, 2);
        dev.set_abs_resolution(Abs::X, 3);
        assert_eq!(
            dev.abs_info(Abs::X),
            Some(
                AbsInfo::new(-10, 10)
                    .with_fuzz(1)
                    .with_flat(2)
                    .with_resolution(3)
            )
        );
    }

    #[test]
    fn set_event_value_validates() {
        let mut dev = Device::new();
        dev.enable_event_code(Key::KEY_A, None).unwrap();
        dev.enable_event_code(Switch::LID, None).unwrap();
        dev.enable_event_code(Rel::X, None).unwrap();

        dev.set_event_value(Key::KEY_A, 1).unwrap();
        assert_eq!(dev.event_value(Key::KEY_A), 1);
        dev.set_event_value(Switch::LID, 1).unwrap();
        assert_eq!(dev.fetch_event_value(Switch::LID), Some(1));

        assert!(dev.set_event_value(Key::KEY_B, 1).is_err());
        assert!(dev.set_event_value(Rel::X, 1).is_err());
        assert_eq!(dev.fetch_event_value(Rel::X), Some(0));
        assert_eq!(dev.fetch_event_value(Key::KEY_B), None);

        dev.enable_event_code(Abs::MT_SLOT, Some(CodeData::Abs(AbsInfo::new(0, 1))))
            .unwrap();
        assert!(dev.set_event_value(Abs::MT_SLOT, 5).is_err());
        dev.set_event_value(Abs::MT_SLOT, 1).unwrap();
        assert_eq!(dev.current_slot(), Some(Slot::new(1)));
    }

    #[test]
    fn grab_is_idempotent() -> io::Result<()> {
        let kernel = touchpad();
        let mut dev = Device::from_handle(kernel.clone())?;
        dev.grab(GrabMode::Grab)?;
        dev.grab(GrabMode::Grab)?;
        assert_eq!(kernel.with(|k| k.grab_calls), 1);
        assert!(kernel.with(|k| k.grabbed));

        dev.change_handle(kernel.clone())?;
        assert_eq!(dev.grab_mode(), GrabMode::Ungrab);
        dev.grab(GrabMode::Ungrab)?;
        assert_eq!(kernel.with(|k| k.grab_calls), 1);
        Ok(())
    }

    #[test]
    fn unbound_kernel_ops_fail() {
        let mut dev = Device::new();
        assert_eq!(
            dev.grab(GrabMode::Grab).unwrap_err().kind(),
            io::ErrorKind::NotConnected
        );
        assert!(dev.set_clock_id(libc::CLOCK_MONOTONIC).is_err());
        assert!(dev.kernel_set_abs_info(Abs::X, AbsInfo::new(0, 1)).is_err());
    }

    #[test]
    fn led_writes() -> io::Result<()> {
        let kernel = touchpad();
        kernel.with(|k| {
            k.enable(Led::CAPSL);
            k.enable(Led::NUML);
        });
        let mut dev = Device::from_handle(kernel.clone())?;

        assert!(dev.kernel_set_led_value(Led::SCROLLL, true).is_err());
        dev.kernel_set_led_values(&[(Led::CAPSL, true), (Led::NUML, false)])?;
        assert_eq!(
            kernel.with(|k| k.written.clone()),
            [
                InputEvent::from_code(Led::CAPSL, 1),
                InputEvent::from_code(Led::NUML, 0),
                Syn::REPORT.into(),
            ]
        );
        assert_eq!(dev.event_value(Led::CAPSL), 1);
        Ok(())
    }

    #[test]
    fn kernel_abs_info() -> io::Result<()> {
        let kernel = touchpad();
        let mut dev = Device::from_handle(kernel.clone())?;
        let info = AbsInfo::new(0, 2000).with_resolution(12);
        dev.kernel_set_abs_info(Abs::X, info)?;
        assert_eq!(dev.abs_info(Abs::X), Some(info));
        assert_eq!(kernel.with(|k| k.abs[usize::from(Abs::X.0)]), info);
        Ok(())
    }

    #[test]
    fn identity_overrides_stay_local() -> io::Result<()> {
        let kernel = touchpad();
        let mut dev = Device::from_handle(kernel.clone())?;
        assert_eq!(dev.input_id(), InputId::new(Bus::USB, 0x1234, 0x5678, 1));

        dev.set_bus(Bus::BLUETOOTH);
        dev.set_vendor(0x045e);
        dev.set_product(0x02e0);
        dev.set_version(0x0903);
        assert_eq!(
            dev.input_id(),
            InputId::new(Bus::BLUETOOTH, 0x045e, 0x02e0, 0x0903)
        );
        assert_eq!(kernel.with(|k| k.id.bus()), Bus::USB);

        dev.reset();
        assert_eq!(dev.input_id(), InputId::default());
        Ok(())
    }

    #[test]
    fn clock_id() -> io::Result<()> {
        let kernel = touchpad();
        let mut dev = Device::from_handle(kernel.clone())?;
        dev.set_clock_id(libc::CLOCK_MONOTONIC)?;
        assert_eq!(kernel.with(|k| k.clock), Some(libc::CLOCK_MONOTONIC));
        Ok(())
    }

    #[test]
    fn reset_keeps_log_context() -> io::Result<()> {
        let mut dev = Device::from_handle(touchpad())?;
        let mut ctx = LogContext::default();
        ctx.set_priority(crate::logging::LogPriority::Debug);
        dev.set_log_context(Some(ctx));
        dev.reset();
        assert!(dev.handle().is_none());
        assert_eq!(
            dev.log_context().priority(),
            crate::logging::LogPriority::Debug
        );
        Ok(())
    }
}
