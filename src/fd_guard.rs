use std::{
    io,
    ops::Deref,
    os::unix::io::{
        AsRawFd,
        RawFd,
    },
    sync::atomic::{
        AtomicBool,
        Ordering,
    },
};

use libc::{
    F_GETFL,
    F_SETFL,
    O_NONBLOCK,
    fcntl,
};


/// A RAII guard around a `RawFd` that closes it automatically on drop.
#[derive(Debug)]
pub struct FdGuard {
    pub(crate) fd: RawFd,
    pub(crate) close_on_drop: AtomicBool,
}

impl FdGuard {
    pub(crate) fn new(fd: RawFd) -> Self {
        FdGuard {
            fd,
            close_on_drop: AtomicBool::new(true),
        }
    }

    /// Indicate that the file descriptor has already been closed explicitly
    pub(crate) fn should_not_close(&self) {
        self.close_on_drop.store(false, Ordering::Release);
    }

    /// Closes the descriptor now, instead of on drop
    pub(crate) fn close(&self) -> io::Result<()> {
        self.should_not_close();

        match unsafe { libc::close(self.fd) } {
            0 => Ok(()),
            _ => Err(io::Error::last_os_error()),
        }
    }

    /// Switches `O_NONBLOCK` on or off
    pub(crate) fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()> {
        let flags = unsafe { fcntl(self.fd, F_GETFL) };
        if flags == -1 {
            return Err(io::Error::last_os_error());
        }

        let flags = if nonblocking {
            flags | O_NONBLOCK
        }
        else {
            flags & !O_NONBLOCK
        };

        match unsafe { fcntl(self.fd, F_SETFL, flags) } {
            -1 => Err(io::Error::last_os_error()),
            _  => Ok(()),
        }
    }

    /// Performs one `read(2)` into `buffer`
    pub(crate) fn read_into_buffer(&self, buffer: &mut [u8]) -> io::Result<usize> {
        let len = unsafe {
            libc::read(
                self.fd,
                buffer.as_mut_ptr() as *mut libc::c_void,
                buffer.len() as libc::size_t,
            )
        };

        match len {
            -1 => Err(io::Error::last_os_error()),
            _  => Ok(len as usize),
        }
    }
}

impl Deref for FdGuard {
    type Target = RawFd;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.fd
    }
}

impl Drop for FdGuard {
    fn drop(&mut self) {
        if self.close_on_drop.load(Ordering::Acquire) {
            unsafe {
                libc::close(self.fd);
            }
        }
    }
}

impl AsRawFd for FdGuard {
    #[inline]
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl PartialEq for FdGuard {
    fn eq(&self, other: &FdGuard) -> bool {
        self.fd == other.fd
    }
}
