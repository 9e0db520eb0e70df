use std::{
    error::Error,
    ffi::{c_char, c_int, c_void},
    fmt,
    fs::File,
    io::{self, Read as _, Write as _},
    mem::MaybeUninit,
    os::fd::{AsFd, AsRawFd, BorrowedFd, IntoRawFd, OwnedFd, RawFd},
    path::{Path, PathBuf},
    slice,
    time::Instant,
};

use uoctl::Ioctl;

use crate::{
    AbsInfo, KeyRepeat, Version,
    bits::Word,
    event::{Abs, InputEvent},
    handle::{BitQuery, DeviceHandle},
    input_id::InputId,
    raw::input::{
        EVIOCGABS, EVIOCGBIT, EVIOCGID, EVIOCGKEY, EVIOCGLED, EVIOCGMTSLOTS, EVIOCGNAME,
        EVIOCGPHYS, EVIOCGPROP, EVIOCGRAB, EVIOCGREP, EVIOCGSND, EVIOCGSW, EVIOCGUNIQ,
        EVIOCGVERSION, EVIOCSABS, EVIOCSCLOCKID,
    },
    util::{is_readable, set_nonblocking},
};

/// An open `/dev/input/event*` node.
///
/// This is the [`DeviceHandle`] used by [`Device::open`][crate::Device::open]. It performs no
/// buffering or state tracking of its own.
///
/// Like [`File`], none of the methods require a mutable reference.
#[derive(Debug)]
pub struct Evdev {
    file: File,
    path: Option<PathBuf>,
}

impl AsFd for Evdev {
    #[inline]
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl AsRawFd for Evdev {
    #[inline]
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

impl IntoRawFd for Evdev {
    #[inline]
    fn into_raw_fd(self) -> RawFd {
        self.file.into_raw_fd()
    }
}

/// Wraps an already opened file descriptor, for example one passed in by a compositor.
///
/// The descriptor is not checked; ioctls on non-evdev descriptors will simply fail.
impl From<OwnedFd> for Evdev {
    fn from(fd: OwnedFd) -> Self {
        Self {
            file: File::from(fd),
            path: None,
        }
    }
}

impl Evdev {
    /// Opens a filesystem path referring to an `evdev` node.
    ///
    /// The path must resolve to `/dev/input/event*`.
    ///
    /// # Permissions
    ///
    /// The node is opened read-write if possible, falling back to read-only and then to
    /// write-only mode when permission is denied.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Self::open_impl(path.as_ref())
    }

    fn open_impl(path: &Path) -> io::Result<Self> {
        let path = path.canonicalize()?;
        if !path
            .as_os_str()
            .as_encoded_bytes()
            .starts_with(b"/dev/input/event")
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "evdev device path '{}' must match '/dev/input/event*'",
                    path.display()
                ),
            ));
        }

        let now = Instant::now();
        let file = Self::try_open(&path).map_err(|e| {
            io::Error::new(e.kind(), format!("failed to open '{}': {e}", path.display()))
        })?;
        let this = Self {
            file,
            path: Some(path),
        };
        let version = this.driver_version()?;
        log::debug!(
            "opened '{}' in {:?}; driver version {version}",
            this.display(),
            now.elapsed(),
        );
        Ok(this)
    }

    fn try_open(path: &Path) -> io::Result<File> {
        match File::options().read(true).write(true).open(path) {
            Ok(file) => return Ok(file),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                log::warn!(
                    "no permission to open '{}' in read-write mode, retrying in read-only",
                    path.display()
                );
            }
            Err(e) => return Err(e),
        }

        match File::options().read(true).open(path) {
            Ok(file) => return Ok(file),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                log::warn!(
                    "no permission to open '{}' in read-only mode, retrying in write-only",
                    path.display()
                );
            }
            Err(e) => return Err(e),
        }

        File::options().write(true).open(path)
    }

    /// Returns the canonicalized path this [`Evdev`] was opened from.
    ///
    /// Handles created from a raw file descriptor have no path.
    #[inline]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn display(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => format!("<fd {}>", self.as_raw_fd()),
        }
    }

    /// Moves this handle into or out of non-blocking mode.
    ///
    /// Returns whether the [`Evdev`] was previously in non-blocking mode.
    ///
    /// In non-blocking mode, reads fail with [`io::ErrorKind::WouldBlock`] instead of waiting.
    /// [`Device::next_event`][crate::Device::next_event] treats that as "no event available".
    pub fn set_nonblocking(&self, nonblocking: bool) -> io::Result<bool> {
        set_nonblocking(self.as_raw_fd(), nonblocking)
    }

    /// Creates a new [`Evdev`] that refers to the same underlying file handle.
    #[doc(alias = "dup")]
    pub fn try_clone(&self) -> io::Result<Self> {
        Ok(Self {
            file: self.file.try_clone()?,
            path: self.path.clone(),
        })
    }

    /// Executes `ioctl` and adds context to the error.
    unsafe fn ioctl<T>(&self, name: &'static str, ioctl: Ioctl<T>, arg: T) -> io::Result<c_int> {
        match unsafe { ioctl.ioctl(self, arg) } {
            Ok(ok) => Ok(ok),
            Err(e) => {
                #[derive(Debug)]
                struct IoctlError {
                    cause: io::Error,
                    msg: String,
                }

                impl fmt::Display for IoctlError {
                    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                        f.write_str(&self.msg)
                    }
                }
                impl Error for IoctlError {
                    fn source(&self) -> Option<&(dyn Error + 'static)> {
                        Some(&self.cause)
                    }
                }

                let msg = format!(
                    "ioctl {name} failed for device {} ({:?})",
                    self.display(),
                    e.kind()
                );
                Err(io::Error::new(e.kind(), IoctlError { cause: e, msg }))
            }
        }
    }

    unsafe fn fetch_string(
        &self,
        ioctl_name: &'static str,
        ioctl: fn(usize) -> Ioctl<*mut c_char>,
    ) -> io::Result<String> {
        // The ioctl returns the number of bytes copied, which is at most the buffer length. If it
        // fills the buffer, the string may have been truncated, so retry with a bigger one.
        const INITIAL_LEN: usize = 64;
        let mut buf = vec![0_u8; INITIAL_LEN];
        let len = loop {
            let len = unsafe {
                self.ioctl(
                    ioctl_name,
                    ioctl(buf.len()),
                    buf.as_mut_ptr() as *mut c_char,
                )?
            };
            if len as usize == buf.len() {
                buf.resize(buf.len() * 2, 0);
            } else {
                break len;
            }
        };

        // `len` includes the trailing 0 byte
        buf.truncate(len.saturating_sub(1) as usize);

        String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Like [`fetch_string`](Self::fetch_string), but maps `ENOENT` to [`None`].
    unsafe fn fetch_optional_string(
        &self,
        ioctl_name: &'static str,
        ioctl: fn(usize) -> Ioctl<*mut c_char>,
    ) -> io::Result<Option<String>> {
        match unsafe { self.fetch_string(ioctl_name, ioctl) } {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn check_abs(abs: Abs) -> io::Result<()> {
        if abs.0 > Abs::MAX.0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("absolute axis {abs:?} exceeds maximum axis value"),
            ));
        }
        Ok(())
    }
}

impl DeviceHandle for Evdev {
    fn fetch_bits(&self, query: BitQuery, dest: &mut [Word]) -> io::Result<()> {
        let len = size_of_val(dest);
        let (name, ioctl) = match query {
            BitQuery::Types => ("EVIOCGBIT", EVIOCGBIT(0, len)),
            BitQuery::Codes(ty) => ("EVIOCGBIT", EVIOCGBIT(ty.0 as u8, len)),
            BitQuery::Props => ("EVIOCGPROP", EVIOCGPROP(len)),
            BitQuery::KeyState => ("EVIOCGKEY", EVIOCGKEY(len)),
            BitQuery::LedState => ("EVIOCGLED", EVIOCGLED(len)),
            BitQuery::SwitchState => ("EVIOCGSW", EVIOCGSW(len)),
            BitQuery::SoundState => ("EVIOCGSND", EVIOCGSND(len)),
        };
        dest.fill(0);
        unsafe {
            self.ioctl(name, ioctl, dest.as_mut_ptr().cast::<c_void>())?;
        }
        Ok(())
    }

    #[doc(alias = "EVIOCGABS")]
    fn abs_info(&self, abs: Abs) -> io::Result<AbsInfo> {
        Self::check_abs(abs)?;
        unsafe {
            let mut out = MaybeUninit::uninit();
            self.ioctl("EVIOCGABS", EVIOCGABS(abs.0 as u8), out.as_mut_ptr())?;
            Ok(AbsInfo(out.assume_init()))
        }
    }

    #[doc(alias = "EVIOCSABS")]
    fn set_abs_info(&self, abs: Abs, info: AbsInfo) -> io::Result<()> {
        Self::check_abs(abs)?;
        unsafe {
            self.ioctl("EVIOCSABS", EVIOCSABS(abs.0 as u8), &info.0)?;
        }
        Ok(())
    }

    #[doc(alias = "EVIOCGMTSLOTS")]
    fn mt_slot_values(&self, axis: Abs, dest: &mut [i32]) -> io::Result<()> {
        // Layout: the axis code, followed by one value per slot.
        let mut buf = vec![0_i32; dest.len() + 1];
        buf[0] = axis.0.into();
        unsafe {
            self.ioctl(
                "EVIOCGMTSLOTS",
                EVIOCGMTSLOTS(size_of_val(&buf[..])),
                buf.as_mut_ptr().cast::<c_void>(),
            )?;
        }
        dest.copy_from_slice(&buf[1..]);
        Ok(())
    }

    #[doc(alias = "EVIOCGNAME")]
    fn name(&self) -> io::Result<String> {
        unsafe { self.fetch_string("EVIOCGNAME", EVIOCGNAME) }
    }

    #[doc(alias = "EVIOCGPHYS")]
    fn phys(&self) -> io::Result<Option<String>> {
        unsafe { self.fetch_optional_string("EVIOCGPHYS", EVIOCGPHYS) }
    }

    #[doc(alias = "EVIOCGUNIQ")]
    fn unique_id(&self) -> io::Result<Option<String>> {
        unsafe { self.fetch_optional_string("EVIOCGUNIQ", EVIOCGUNIQ) }
    }

    #[doc(alias = "EVIOCGID")]
    fn input_id(&self) -> io::Result<InputId> {
        let mut out = MaybeUninit::uninit();
        unsafe {
            self.ioctl("EVIOCGID", EVIOCGID, out.as_mut_ptr())?;
            Ok(InputId(out.assume_init()))
        }
    }

    #[doc(alias = "EVIOCGVERSION")]
    fn driver_version(&self) -> io::Result<Version> {
        let mut version = 0;
        unsafe {
            self.ioctl("EVIOCGVERSION", EVIOCGVERSION, &mut version)?;
        }
        Ok(Version(version))
    }

    #[doc(alias = "EVIOCGREP")]
    fn key_repeat(&self) -> io::Result<KeyRepeat> {
        let mut rep = [0; 2];
        unsafe {
            self.ioctl("EVIOCGREP", EVIOCGREP, &mut rep)?;
        }
        Ok(KeyRepeat::new(rep[0], rep[1]))
    }

    fn read_events(&self, dest: &mut [InputEvent]) -> io::Result<usize> {
        let bptr = dest.as_mut_ptr().cast::<u8>();
        // Safety: `InputEvent` contains no padding, which is tested where `input_event` is defined.
        let byte_buf = unsafe { slice::from_raw_parts_mut(bptr, size_of_val(dest)) };
        let bytes = (&self.file).read(byte_buf)?;
        debug_assert_eq!(bytes % size_of::<InputEvent>(), 0);
        Ok(bytes / size_of::<InputEvent>())
    }

    fn is_readable(&self) -> io::Result<bool> {
        is_readable(self.as_raw_fd())
    }

    #[doc(alias = "EVIOCGRAB")]
    fn grab(&self, grab: bool) -> io::Result<()> {
        unsafe {
            self.ioctl("EVIOCGRAB", EVIOCGRAB, c_int::from(grab))?;
        }
        Ok(())
    }

    #[doc(alias = "EVIOCSCLOCKID")]
    fn set_clock_id(&self, clock: c_int) -> io::Result<()> {
        unsafe {
            self.ioctl("EVIOCSCLOCKID", EVIOCSCLOCKID, &clock)?;
        }
        Ok(())
    }

    fn write_events(&self, events: &[InputEvent]) -> io::Result<()> {
        let bytes = unsafe { slice::from_raw_parts(events.as_ptr().cast::<u8>(), size_of_val(events)) };
        (&self.file).write_all(bytes)
    }
}
