//! Error helpers.
//!
//! All fallible operations return [`io::Error`]. Kernel failures are passed through unchanged,
//! while misuse of the API results in [`io::ErrorKind::InvalidInput`] (or
//! [`io::ErrorKind::NotConnected`] when no device handle is attached).
//!
//! A [`FatalError`] indicates that the device state could no longer be kept consistent. Use
//! [`is_fatal`] to detect it; the affected [`Device`][crate::Device] should be discarded.

use std::{error::Error, fmt, io};

/// An unrecoverable internal failure.
#[derive(Debug)]
pub struct FatalError {
    msg: String,
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.msg)
    }
}

impl Error for FatalError {}

/// Returns whether `err` wraps a [`FatalError`].
pub fn is_fatal(err: &io::Error) -> bool {
    err.get_ref().is_some_and(|e| e.is::<FatalError>())
}

pub(crate) fn fatal(msg: impl Into<String>) -> io::Error {
    io::Error::other(FatalError { msg: msg.into() })
}

pub(crate) fn invalid_input(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg.into())
}

pub(crate) fn not_bound() -> io::Error {
    io::Error::new(
        io::ErrorKind::NotConnected,
        "device is not attached to a handle",
    )
}
