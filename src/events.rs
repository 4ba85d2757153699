use std::{
    ffi::OsStr,
    fmt,
    mem,
    os::{
        raw::c_int,
        unix::ffi::OsStrExt,
    },
    path::PathBuf,
    sync::Weak,
};

use inotify_sys as ffi;

use crate::error::ReadError;
use crate::fd_guard::FdGuard;
use crate::mask::Mask;
use crate::watches::{
    Registrations,
    WatchDescriptor,
};


/// Size of the fixed part of an event record, without the name
pub const HEADER_SIZE: usize = mem::size_of::<ffi::inotify_event>();

/// Watch descriptor the kernel uses for events without a watch
///
/// Only [`Mask::Q_OVERFLOW`] is reported this way.
const NO_WATCH: c_int = -1;


/// An inotify event
///
/// A file system event that describes a change that the user previously
/// registered interest in. To watch for events, call
/// [`Watcher::add_watch`]. To retrieve events, call
/// [`Watcher::read_events`].
///
/// [`Watcher::add_watch`]: crate::Watcher::add_watch
/// [`Watcher::read_events`]: crate::Watcher::read_events
#[derive(Clone, Debug)]
pub struct Event {
    /// Identifies the watch this event originates from
    ///
    /// Equal to the [`WatchDescriptor`] that [`Watcher::add_watch`] returned
    /// when the watch was registered.
    ///
    /// [`Watcher::add_watch`]: crate::Watcher::add_watch
    pub wd: WatchDescriptor,

    /// Indicates what kind of event this is
    ///
    /// Taken bit for bit from the kernel, including bits this crate has no
    /// name for.
    pub mask: Mask,

    /// Connects related events to each other
    ///
    /// When a file is renamed, this results in two events: [`MOVED_FROM`] and
    /// [`MOVED_TO`]. The `cookie` field will be the same for both of them,
    /// thereby making it possible to connect the event pair. `0` for all
    /// other events.
    ///
    /// [`MOVED_FROM`]: Mask::MOVED_FROM
    /// [`MOVED_TO`]: Mask::MOVED_TO
    pub cookie: u32,

    /// Path of the file the event is about
    ///
    /// For events about an entry in a watched directory, this is the watched
    /// path joined with the entry's name. For events about the watched path
    /// itself ([`DELETE_SELF`], [`MOVE_SELF`], ...) it is the watched path
    /// alone. Empty for [`Q_OVERFLOW`], which belongs to no watch.
    ///
    /// [`DELETE_SELF`]: Mask::DELETE_SELF
    /// [`MOVE_SELF`]: Mask::MOVE_SELF
    /// [`Q_OVERFLOW`]: Mask::Q_OVERFLOW
    pub name: PathBuf,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name.display(), self.mask)?;

        if self.cookie != 0 {
            write!(f, " {}", self.cookie)?;
        }

        Ok(())
    }
}


/// One raw record, as laid out by the kernel
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Record<'a> {
    pub wd: c_int,
    pub mask: Mask,
    pub cookie: u32,
    pub name: Option<&'a OsStr>,
}

impl<'a> Record<'a> {
    /// Decodes the record at the beginning of `buffer`
    ///
    /// `offset` is the position of `buffer` within the read, for error
    /// reporting only. Returns the number of bytes the record occupies,
    /// including name padding, and the record.
    fn from_buffer(buffer: &'a [u8], offset: usize)
        -> Result<(usize, Self), ReadError>
    {
        if buffer.len() < HEADER_SIZE {
            return Err(ReadError::Truncated {
                offset,
                needed: HEADER_SIZE,
                available: buffer.len(),
            });
        }

        // The byte buffer has alignment 1 and `inotify_event` has a higher
        // one, so the header must be read with `read_unaligned`. The length
        // check above keeps the read within `buffer`.
        let ffi_event = unsafe {
            (buffer.as_ptr() as *const ffi::inotify_event).read_unaligned()
        };

        let bytes_consumed = HEADER_SIZE + ffi_event.len as usize;
        if buffer.len() < bytes_consumed {
            return Err(ReadError::Truncated {
                offset,
                needed: bytes_consumed,
                available: buffer.len(),
            });
        }

        // The name is padded with '\0' up to the alignment boundary. Keep
        // everything before the first '\0'.
        let name = &buffer[HEADER_SIZE..bytes_consumed];
        let name = match name.iter().position(|b| *b == 0) {
            Some(end) => &name[..end],
            None      => name,
        };
        let name = if name.is_empty() { None } else { Some(OsStr::from_bytes(name)) };

        let record = Record {
            wd: ffi_event.wd,
            mask: Mask::from_bits_retain(ffi_event.mask),
            cookie: ffi_event.cookie,
            name,
        };

        Ok((bytes_consumed, record))
    }
}


/// Iterator over the raw records in a buffer filled by `read(2)`
///
/// Stops after the first error.
#[derive(Debug)]
pub(crate) struct Records<'a> {
    buffer: &'a [u8],
    pos: usize,
}

impl<'a> Records<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Records {
            buffer,
            pos: 0,
        }
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<Record<'a>, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.buffer.len() {
            return None;
        }

        match Record::from_buffer(&self.buffer[self.pos..], self.pos) {
            Ok((step, record)) => {
                self.pos += step;
                Some(Ok(record))
            }
            Err(error) => {
                self.pos = self.buffer.len();
                Some(Err(error))
            }
        }
    }
}


/// Decodes every record in `buffer` and resolves its name
///
/// `buffer` must hold exactly the bytes returned by one `read(2)`. Watches
/// confirmed as removed (`IN_IGNORED`) are dropped from `registrations`, but
/// only if the whole buffer decoded successfully.
pub(crate) fn decode(
    buffer       : &[u8],
    registrations: &mut Registrations,
    fd           : &Weak<FdGuard>,
)
    -> Result<Vec<Event>, ReadError>
{
    if buffer.len() < HEADER_SIZE {
        return Err(ReadError::ShortRead { len: buffer.len() });
    }

    let mut events = Vec::new();

    for record in Records::new(buffer) {
        let record = record?;

        tracing::trace!(
            wd = record.wd,
            mask = %record.mask,
            cookie = record.cookie,
            name = ?record.name,
            "decoded inotify record"
        );

        let name = if record.wd == NO_WATCH {
            if record.mask.contains(Mask::Q_OVERFLOW) {
                tracing::warn!("inotify event queue overflowed, events were lost");
            }
            PathBuf::new()
        }
        else {
            let base = registrations
                .get(record.wd)
                .ok_or(ReadError::UnknownWatch { wd: record.wd })?;

            match record.name {
                Some(name) => base.join(name),
                None       => base.to_path_buf(),
            }
        };

        events.push(Event {
            wd: WatchDescriptor { id: record.wd, fd: fd.clone() },
            mask: record.mask,
            cookie: record.cookie,
            name,
        });
    }

    for event in &events {
        if event.mask.contains(Mask::IGNORED) && registrations.remove(event.wd.id).is_some() {
            tracing::debug!(wd = event.wd.id, path = %event.name.display(), "watch removed");
        }
    }

    Ok(events)
}
