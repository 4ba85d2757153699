use std::{
    ffi::CString,
    fmt,
    io,
    os::{
        raw::c_int,
        unix::{
            ffi::OsStrExt,
            io::{
                AsRawFd,
                RawFd,
            },
        },
    },
    path::Path,
    sync::Arc,
};

use inotify_sys as ffi;

use crate::error::{
    InitError,
    ReadError,
    WatchError,
};
use crate::events::{
    self,
    Event,
    HEADER_SIZE,
};
use crate::fd_guard::FdGuard;
use crate::mask::{
    InitFlags,
    Mask,
};
use crate::watches::{
    Registrations,
    WatchDescriptor,
};


/// Longest file name the kernel can report in an event
const NAME_MAX: usize = 255;

/// Smallest read buffer that is guaranteed to fit one event
///
/// A smaller buffer makes `read(2)` fail with `EINVAL` as soon as an event
/// with a long name is queued.
pub const MIN_BUFFER_SIZE: usize = HEADER_SIZE + NAME_MAX + 1;

/// Read buffer size used by [`Watcher::init`]
pub const DEFAULT_BUFFER_SIZE: usize = HEADER_SIZE + 4096;


/// A single inotify session and the watches registered with it
///
/// `Watcher` owns one inotify file descriptor and remembers, for every watch
/// added through it, the path it was added for. Events read from the
/// descriptor are decoded and carry the full path of the file they concern.
///
/// # Examples
///
/// ```
/// use inotify_watcher::{
///     InitFlags,
///     Mask,
///     Watcher,
/// };
///
/// let mut watcher = Watcher::init(InitFlags::CLOEXEC)
///     .expect("Error while initializing inotify instance");
///
/// // Watch for modify and close events.
/// watcher
///     .add_watch("/tmp", Mask::MODIFY | Mask::CLOSE)
///     .expect("Failed to add watch");
///
/// // `read_events` blocks until something happens in /tmp:
/// //
/// // for event in watcher.read_events().expect("Error while reading events") {
/// //     println!("{}", event);
/// // }
///
/// watcher.close().expect("Failed to close inotify instance");
/// ```
pub struct Watcher {
    pub(crate) fd: Arc<FdGuard>,
    registrations: Registrations,
    buffer: Vec<u8>,
}

impl Watcher {
    /// Creates a `Watcher`
    ///
    /// Initializes an inotify instance by calling [`inotify_init1`] with
    /// `flags`. [`InitFlags::NONBLOCK`] makes [`Watcher::read_events`] return
    /// an error instead of waiting when no events are queued;
    /// [`InitFlags::CLOEXEC`] keeps the descriptor from leaking into child
    /// processes. Any other bits are passed to the kernel unchanged.
    ///
    /// # Errors
    ///
    /// Returns the error from the call to [`inotify_init1`], wrapped in
    /// [`InitError`].
    ///
    /// [`inotify_init1`]: inotify_sys::inotify_init1
    pub fn init(flags: InitFlags) -> Result<Watcher, InitError> {
        Self::init_with_buffer_size(flags, DEFAULT_BUFFER_SIZE)
    }

    /// Creates a `Watcher` that reads into a buffer of `buffer_size` bytes
    ///
    /// Sizes below [`MIN_BUFFER_SIZE`] are raised to it. A larger buffer lets
    /// a single [`Watcher::read_events`] call return more events.
    pub fn init_with_buffer_size(flags: InitFlags, buffer_size: usize)
        -> Result<Watcher, InitError>
    {
        let fd = unsafe { ffi::inotify_init1(flags.bits()) };

        if fd == -1 {
            return Err(InitError(io::Error::last_os_error()));
        }

        let buffer_size = buffer_size.max(MIN_BUFFER_SIZE);
        tracing::debug!(fd, flags = flags.bits(), buffer_size, "inotify instance created");

        Ok(Watcher {
            fd: Arc::new(FdGuard::new(fd)),
            registrations: Registrations::default(),
            buffer: vec![0; buffer_size],
        })
    }

    /// Adds or updates a watch for the given path
    ///
    /// Calls [`inotify_add_watch`] and records `path` for the returned watch
    /// descriptor, so events from this watch can be resolved to full paths.
    ///
    /// If the inode behind `path` is already watched, the kernel updates the
    /// existing watch and returns its descriptor again. The recorded path is
    /// replaced with `path` either way.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::InvalidPath`], if `path` contains a NUL byte, or
    /// [`WatchError::Add`] with the error from [`inotify_add_watch`]. The
    /// registrations are left untouched in both cases.
    ///
    /// [`inotify_add_watch`]: inotify_sys::inotify_add_watch
    pub fn add_watch<P>(&mut self, path: P, mask: Mask)
        -> Result<WatchDescriptor, WatchError>
        where P: AsRef<Path>
    {
        let path = path.as_ref();
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(WatchError::InvalidPath)?;

        let wd = unsafe {
            ffi::inotify_add_watch(
                **self.fd,
                c_path.as_ptr() as *const _,
                mask.bits(),
            )
        };

        if wd == -1 {
            return Err(WatchError::Add {
                path  : path.to_path_buf(),
                source: io::Error::last_os_error(),
            });
        }

        tracing::debug!(wd, path = %path.display(), mask = %mask, "watch added");
        self.registrations.insert(wd, path.to_path_buf());

        Ok(WatchDescriptor { id: wd, fd: Arc::downgrade(&self.fd) })
    }

    /// Stops watching a file
    ///
    /// Calls [`inotify_rm_watch`]. The path recorded for the watch is kept
    /// until the kernel confirms the removal with an [`Mask::IGNORED`] event,
    /// which [`Watcher::read_events`] returns like any other event. Events
    /// queued before that confirmation still resolve to the right path.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::ForeignDescriptor`], if `wd` was not issued by
    /// this `Watcher`, or [`WatchError::Remove`] with the error from
    /// [`inotify_rm_watch`] (`EINVAL` for a watch that no longer exists).
    ///
    /// [`inotify_rm_watch`]: inotify_sys::inotify_rm_watch
    pub fn remove_watch(&mut self, wd: WatchDescriptor) -> Result<(), WatchError> {
        if wd.fd.upgrade().as_ref() != Some(&self.fd) {
            return Err(WatchError::ForeignDescriptor { wd: wd.id });
        }

        let result = unsafe { ffi::inotify_rm_watch(**self.fd, wd.id) };
        match result {
            0  => {
                tracing::debug!(wd = wd.id, "watch removal requested");
                Ok(())
            }
            _  => Err(WatchError::Remove {
                wd    : wd.id,
                source: io::Error::last_os_error(),
            }),
        }
    }

    /// Returns the path the watch was added for
    ///
    /// `None` for descriptors of other watchers and for watches whose removal
    /// was already confirmed.
    pub fn watched_path(&self, wd: &WatchDescriptor) -> Option<&Path> {
        if wd.fd.upgrade().as_ref() != Some(&self.fd) {
            return None;
        }

        self.registrations.get(wd.id)
    }

    /// Iterates over all live watches and their paths, in no particular order
    pub fn watches(&self) -> impl Iterator<Item = (WatchDescriptor, &Path)> + '_ {
        let fd = Arc::downgrade(&self.fd);

        self.registrations
            .iter()
            .map(move |(id, path)| (WatchDescriptor { id, fd: fd.clone() }, path))
    }

    /// Waits until events are available, then returns them
    ///
    /// Performs exactly one `read(2)` and decodes every event it returned,
    /// in order. Blocks the current thread until at least one event is
    /// queued, unless the `Watcher` was created with [`InitFlags::NONBLOCK`].
    ///
    /// # Errors
    ///
    /// - [`ReadError::Io`], if `read(2)` fails. For a non-blocking `Watcher`
    ///   with no events queued, [`ReadError::is_would_block`] is `true`.
    /// - [`ReadError::ShortRead`] or [`ReadError::Truncated`], if the data
    ///   doesn't consist of whole events.
    /// - [`ReadError::UnknownWatch`], if an event names a watch this
    ///   `Watcher` doesn't know.
    ///
    /// No events are returned if any of them fails to decode.
    pub fn read_events(&mut self) -> Result<Vec<Event>, ReadError> {
        let len = self.fill_buffer().map_err(ReadError::Io)?;
        self.decode_buffer(len)
    }

    /// Closes the inotify instance
    ///
    /// Closes the file descriptor referring to the inotify instance. Dropping
    /// the `Watcher` does the same, but discards the error. Any
    /// [`WatchDescriptor`] issued by this `Watcher` is invalid afterwards.
    ///
    /// # Errors
    ///
    /// Directly returns the error from the call to `close(2)`.
    pub fn close(self) -> io::Result<()> {
        tracing::debug!(fd = **self.fd, watches = self.registrations.len(), "closing inotify instance");
        self.fd.close()
    }

    pub(crate) fn fill_buffer(&mut self) -> io::Result<usize> {
        self.fd.read_into_buffer(&mut self.buffer)
    }

    pub(crate) fn decode_buffer(&mut self, len: usize) -> Result<Vec<Event>, ReadError> {
        events::decode(
            &self.buffer[..len],
            &mut self.registrations,
            &Arc::downgrade(&self.fd),
        )
    }

    #[cfg(test)]
    fn decode(&mut self, bytes: &[u8]) -> Result<Vec<Event>, ReadError> {
        self.buffer[..bytes.len()].copy_from_slice(bytes);
        self.decode_buffer(bytes.len())
    }
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("fd", &self.fd.fd)
            .field("registrations", &self.registrations)
            .field("buffer_size", &self.buffer.len())
            .finish()
    }
}

impl AsRawFd for Watcher {
    #[inline]
    fn as_raw_fd(&self) -> RawFd {
        self.fd.fd
    }
}
