//! An in-memory stand-in for the kernel side of an input device.

use std::{
    collections::{HashMap, VecDeque},
    ffi::c_int,
    io,
    iter::zip,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{
    AbsInfo, InputId, KeyRepeat, Version,
    bits::{BitSet, Word},
    caps::Capabilities,
    event::{Abs, EventCode, EventType, InputEvent, Key, Led, Sound, Switch},
    handle::{BitQuery, DeviceHandle},
    input_id::Bus,
    slots::NO_TOUCH,
};

/// Everything the fake kernel knows about its device.
#[derive(Debug)]
pub struct KernelState {
    pub name: String,
    pub phys: Option<String>,
    pub uniq: Option<String>,
    pub id: InputId,
    pub version: Version,
    pub caps: Capabilities,
    pub pressed: BitSet<Key>,
    pub leds: BitSet<Led>,
    pub switches: BitSet<Switch>,
    pub sounds: BitSet<Sound>,
    /// Indexed by axis code.
    pub abs: Vec<AbsInfo>,
    /// `(slot, axis) -> value`. Missing entries are untouched slots.
    pub mt: HashMap<(usize, Abs), i32>,
    pub rep: KeyRepeat,
    /// Events waiting to be read.
    pub pending: VecDeque<InputEvent>,
    /// Events written to the device.
    pub written: Vec<InputEvent>,
    pub grabbed: bool,
    pub grab_calls: usize,
    pub clock: Option<c_int>,
    /// Operations that fail, with the errno they fail with.
    pub failures: HashMap<&'static str, c_int>,
}

impl KernelState {
    pub fn enable(&mut self, code: impl Into<EventCode>) {
        let code = code.into();
        self.caps.types.insert(code.event_type());
        self.caps.set_code(code, true);
    }

    pub fn enable_abs(&mut self, abs: Abs, info: AbsInfo) {
        self.enable(abs);
        self.abs[usize::from(abs.0)] = info;
    }

    pub fn set_slot(&mut self, slot: usize, axis: Abs, value: i32) {
        self.mt.insert((slot, axis), value);
    }

    /// Selects the slot the kernel reports as current.
    pub fn set_current_slot(&mut self, slot: i32) {
        self.abs[usize::from(Abs::MT_SLOT.0)].set_value(slot);
    }

    pub fn set_abs_value(&mut self, abs: Abs, value: i32) {
        self.abs[usize::from(abs.0)].set_value(value);
    }

    pub fn push_events(&mut self, events: impl IntoIterator<Item = InputEvent>) {
        self.pending.extend(events);
    }

    /// Makes the operation `name` fail with `EIO`.
    pub fn fail(&mut self, name: &'static str) {
        self.fail_with(name, libc::EIO);
    }

    pub fn fail_with(&mut self, name: &'static str, errno: c_int) {
        self.failures.insert(name, errno);
    }

    pub fn recover(&mut self, name: &'static str) {
        self.failures.remove(name);
    }

    fn check(&self, name: &'static str) -> io::Result<()> {
        match self.failures.get(name) {
            Some(&errno) => Err(io::Error::from_raw_os_error(errno)),
            None => Ok(()),
        }
    }

    fn mt_value(&self, slot: usize, axis: Abs) -> i32 {
        match self.mt.get(&(slot, axis)) {
            Some(&v) => v,
            None if axis == Abs::MT_TRACKING_ID => NO_TOUCH,
            None => 0,
        }
    }
}

/// A [`DeviceHandle`] backed by a [`KernelState`].
///
/// Clones share the same state, so a test can keep one clone to inspect and modify the kernel
/// while a [`Device`][crate::Device] owns the other.
#[derive(Debug, Clone)]
pub struct FakeKernel {
    state: Arc<Mutex<KernelState>>,
}

impl FakeKernel {
    pub fn new(name: &str) -> Self {
        init_logger();
        Self {
            state: Arc::new(Mutex::new(KernelState {
                name: name.into(),
                phys: None,
                uniq: None,
                id: InputId::new(Bus::USB, 0x1234, 0x5678, 1),
                version: Version::from_raw(0x010001),
                caps: Capabilities::default(),
                pressed: BitSet::new(),
                leds: BitSet::new(),
                switches: BitSet::new(),
                sounds: BitSet::new(),
                abs: vec![AbsInfo::default(); usize::from(Abs::MAX.0) + 1],
                mt: HashMap::new(),
                rep: KeyRepeat::default(),
                pending: VecDeque::new(),
                written: Vec::new(),
                grabbed: false,
                grab_calls: 0,
                clock: None,
                failures: HashMap::new(),
            })),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut KernelState) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, KernelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn copy_words(src: &[Word], dest: &mut [Word]) {
    dest.fill(0);
    for (d, s) in zip(dest, src) {
        *d = *s;
    }
}

impl DeviceHandle for FakeKernel {
    fn fetch_bits(&self, query: BitQuery, dest: &mut [Word]) -> io::Result<()> {
        let k = self.lock();
        let src = match query {
            BitQuery::Types => {
                k.check("EVIOCGBIT")?;
                k.caps.types.words()
            }
            BitQuery::Codes(ty) => {
                k.check("EVIOCGBIT")?;
                if ty == EventType::SYN {
                    k.caps.types.words()
                } else {
                    k.caps.code_words(ty).unwrap_or(&[])
                }
            }
            BitQuery::Props => {
                k.check("EVIOCGPROP")?;
                k.caps.props.words()
            }
            BitQuery::KeyState => {
                k.check("EVIOCGKEY")?;
                k.pressed.words()
            }
            BitQuery::LedState => {
                k.check("EVIOCGLED")?;
                k.leds.words()
            }
            BitQuery::SwitchState => {
                k.check("EVIOCGSW")?;
                k.switches.words()
            }
            BitQuery::SoundState => {
                k.check("EVIOCGSND")?;
                k.sounds.words()
            }
        };
        copy_words(src, dest);
        Ok(())
    }

    fn abs_info(&self, abs: Abs) -> io::Result<AbsInfo> {
        let k = self.lock();
        k.check("EVIOCGABS")?;
        k.abs
            .get(usize::from(abs.0))
            .copied()
            .ok_or_else(|| io::Error::from_raw_os_error(libc::EINVAL))
    }

    fn set_abs_info(&self, abs: Abs, info: AbsInfo) -> io::Result<()> {
        let mut k = self.lock();
        k.check("EVIOCSABS")?;
        match k.abs.get_mut(usize::from(abs.0)) {
            Some(slot) => {
                *slot = info;
                Ok(())
            }
            None => Err(io::Error::from_raw_os_error(libc::EINVAL)),
        }
    }

    fn mt_slot_values(&self, axis: Abs, dest: &mut [i32]) -> io::Result<()> {
        let k = self.lock();
        k.check("EVIOCGMTSLOTS")?;
        for (slot, value) in dest.iter_mut().enumerate() {
            *value = k.mt_value(slot, axis);
        }
        Ok(())
    }

    fn name(&self) -> io::Result<String> {
        let k = self.lock();
        k.check("EVIOCGNAME")?;
        Ok(k.name.clone())
    }

    fn phys(&self) -> io::Result<Option<String>> {
        let k = self.lock();
        k.check("EVIOCGPHYS")?;
        Ok(k.phys.clone())
    }

    fn unique_id(&self) -> io::Result<Option<String>> {
        let k = self.lock();
        k.check("EVIOCGUNIQ")?;
        Ok(k.uniq.clone())
    }

    fn input_id(&self) -> io::Result<InputId> {
        let k = self.lock();
        k.check("EVIOCGID")?;
        Ok(k.id)
    }

    fn driver_version(&self) -> io::Result<Version> {
        let k = self.lock();
        k.check("EVIOCGVERSION")?;
        Ok(k.version)
    }

    fn key_repeat(&self) -> io::Result<KeyRepeat> {
        let k = self.lock();
        k.check("EVIOCGREP")?;
        Ok(k.rep)
    }

    fn read_events(&self, dest: &mut [InputEvent]) -> io::Result<usize> {
        let mut k = self.lock();
        k.check("read")?;
        if k.pending.is_empty() {
            return Err(io::ErrorKind::WouldBlock.into());
        }
        let n = dest.len().min(k.pending.len());
        for (d, ev) in zip(dest, k.pending.drain(..n)) {
            *d = ev;
        }
        Ok(n)
    }

    fn is_readable(&self) -> io::Result<bool> {
        let k = self.lock();
        k.check("poll")?;
        Ok(!k.pending.is_empty())
    }

    fn grab(&self, grab: bool) -> io::Result<()> {
        let mut k = self.lock();
        k.check("EVIOCGRAB")?;
        k.grabbed = grab;
        k.grab_calls += 1;
        Ok(())
    }

    fn set_clock_id(&self, clock: c_int) -> io::Result<()> {
        let mut k = self.lock();
        k.check("EVIOCSCLOCKID")?;
        k.clock = Some(clock);
        Ok(())
    }

    fn write_events(&self, events: &[InputEvent]) -> io::Result<()> {
        let mut k = self.lock();
        k.check("write")?;
        for ev in events {
            if let Some(EventCode::Led(led)) = ev.code() {
                k.leds.set(led, ev.raw_value() != 0);
            }
        }
        k.written.extend_from_slice(events);
        Ok(())
    }
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn events_eq(recv: InputEvent, expected: InputEvent) -> bool {
    if recv.event_type() != expected.event_type() || recv.raw_code() != expected.raw_code() {
        return false;
    }

    // Value is ignored for SYN events
    if recv.event_type() != EventType::SYN && recv.raw_value() != expected.raw_value() {
        return false;
    }
    true
}

#[track_caller]
pub fn check_events(
    actual: impl IntoIterator<Item = InputEvent>,
    expected: impl IntoIterator<Item = InputEvent>,
) {
    let actual: Vec<_> = actual.into_iter().collect();
    let expected: Vec<_> = expected.into_iter().collect();
    assert_eq!(
        actual.len(),
        expected.len(),
        "expected {} events, got {actual:?}",
        expected.len()
    );
    if !zip(actual.iter().copied(), expected.iter().copied()).all(|(a, b)| events_eq(a, b)) {
        panic!("expected {expected:?}, got {actual:?}");
    }
}
