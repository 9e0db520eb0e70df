use std::{
    io,
    os::fd::RawFd,
    time::{Duration, Instant},
};

/// Uses `poll(2)` to determine whether reading from `fd` is possible without blocking.
pub fn is_readable(fd: RawFd) -> io::Result<bool> {
    let mut poll = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let ret = unsafe { libc::poll(&mut poll, 1, 0) };
    if ret == -1 {
        return Err(io::Error::last_os_error());
    }

    Ok(poll.revents & libc::POLLIN != 0)
}

/// Sets or clears `O_NONBLOCK` on `fd`. Returns whether it was set before.
pub fn set_nonblocking(fd: RawFd, nonblocking: bool) -> io::Result<bool> {
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags == -1 {
        return Err(io::Error::last_os_error());
    }

    let was_nonblocking = flags & libc::O_NONBLOCK != 0;
    let new_flags = if nonblocking {
        flags | libc::O_NONBLOCK
    } else {
        flags & !libc::O_NONBLOCK
    };

    if new_flags != flags {
        let ret = unsafe { libc::fcntl(fd, libc::F_SETFL, new_flags) };
        if ret == -1 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(was_nonblocking)
}

/// Returns a guard that calls `f` with the time elapsed since its creation when dropped.
pub fn on_drop_elapsed(f: impl FnOnce(Duration)) -> impl Drop {
    struct Guard<F: FnOnce(Duration)> {
        start: Instant,
        f: Option<F>,
    }
    impl<F: FnOnce(Duration)> Drop for Guard<F> {
        fn drop(&mut self) {
            if let Some(f) = self.f.take() {
                f(self.start.elapsed());
            }
        }
    }
    Guard {
        start: Instant::now(),
        f: Some(f),
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::Cell,
        fs::File,
        io::Write,
        os::fd::{AsRawFd, FromRawFd},
    };

    use super::*;

    #[test]
    fn elapsed_guard_runs_once() {
        let calls = Cell::new(0);
        {
            let _g = on_drop_elapsed(|_| calls.set(calls.get() + 1));
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn pipe_readability() -> io::Result<()> {
        let mut fds = [0; 2];
        if unsafe { libc::pipe(fds.as_mut_ptr()) } == -1 {
            return Err(io::Error::last_os_error());
        }
        let rd = unsafe { File::from_raw_fd(fds[0]) };
        let mut wr = unsafe { File::from_raw_fd(fds[1]) };

        assert!(!is_readable(rd.as_raw_fd())?);
        wr.write_all(b"x")?;
        assert!(is_readable(rd.as_raw_fd())?);

        assert!(!set_nonblocking(rd.as_raw_fd(), true)?);
        assert!(set_nonblocking(rd.as_raw_fd(), false)?);
        Ok(())
    }
}
