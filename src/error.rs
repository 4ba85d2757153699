//! Error types
//!
//! Each operation of [`Watcher`] has its own error type, so callers can tell
//! a failed registration (local to that call) apart from a broken read loop.
//! Underlying system errors are kept as the `source` of each error.
//!
//! [`Watcher`]: crate::Watcher

use std::{
    ffi::NulError,
    io,
    os::raw::c_int,
    path::PathBuf,
};

use thiserror::Error;


/// The kernel refused to create an inotify instance
///
/// Returned by [`Watcher::init`]. Typical causes are the per-user instance
/// limit (`EMFILE`) or invalid flags (`EINVAL`).
///
/// [`Watcher::init`]: crate::Watcher::init
#[derive(Debug, Error)]
#[error("failed to initialize inotify instance")]
pub struct InitError(#[source] pub(crate) io::Error);

impl InitError {
    /// The error returned by the system call
    pub fn io_error(&self) -> &io::Error {
        &self.0
    }
}


/// Adding or removing a single watch failed
///
/// The [`Watcher`] and its other watches stay usable.
///
/// [`Watcher`]: crate::Watcher
#[derive(Debug, Error)]
pub enum WatchError {
    /// The path contains an interior NUL byte and can't be passed to the kernel
    #[error("path contains a NUL byte")]
    InvalidPath(#[source] NulError),

    /// `inotify_add_watch` failed
    #[error("failed to add watch for {}", .path.display())]
    Add {
        /// The path that was passed to [`Watcher::add_watch`]
        ///
        /// [`Watcher::add_watch`]: crate::Watcher::add_watch
        path: PathBuf,
        /// The error returned by the system call
        #[source]
        source: io::Error,
    },

    /// `inotify_rm_watch` failed
    #[error("failed to remove watch {wd}")]
    Remove {
        /// The id of the watch
        wd: c_int,
        /// The error returned by the system call
        #[source]
        source: io::Error,
    },

    /// The watch descriptor was issued by another (or a closed) watcher
    #[error("watch descriptor {wd} does not belong to this watcher")]
    ForeignDescriptor {
        /// The id of the watch
        wd: c_int,
    },
}


/// Reading or decoding events failed
#[derive(Debug, Error)]
pub enum ReadError {
    /// `read(2)` failed
    ///
    /// This includes the case of a non-blocking watcher with no events
    /// queued; see [`ReadError::is_would_block`].
    #[error("failed to read from inotify instance")]
    Io(#[source] io::Error),

    /// `read(2)` returned less than one event header
    #[error("read returned {len} bytes, less than one event")]
    ShortRead {
        /// Number of bytes returned
        len: usize,
    },

    /// An event record runs past the end of the data that was read
    #[error("event at offset {offset} needs {needed} bytes, but only {available} are left")]
    Truncated {
        /// Offset of the record within the buffer
        offset: usize,
        /// Bytes required for header and name
        needed: usize,
        /// Bytes left in the buffer from `offset`
        available: usize,
    },

    /// An event refers to a watch that is not registered with this watcher
    #[error("event for unknown watch {wd}")]
    UnknownWatch {
        /// The id found in the event
        wd: c_int,
    },
}

impl ReadError {
    /// Returns `true` if a non-blocking read found no events
    pub fn is_would_block(&self) -> bool {
        match self {
            ReadError::Io(error) => error.kind() == io::ErrorKind::WouldBlock,
            _ => false,
        }
    }
}


/// Any error returned by this crate
#[derive(Debug, Error)]
pub enum Error {
    /// See [`InitError`]
    #[error(transparent)]
    Init(#[from] InitError),

    /// See [`WatchError`]
    #[error(transparent)]
    Watch(#[from] WatchError),

    /// See [`ReadError`]
    #[error(transparent)]
    Read(#[from] ReadError),
}


#[cfg(test)]
mod tests {
    use std::io;

    use super::{Error, ReadError};

    #[test]
    fn would_block_is_detected() {
        let error = ReadError::Io(io::Error::from(io::ErrorKind::WouldBlock));
        assert!(error.is_would_block());

        let error = ReadError::Io(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(!error.is_would_block());

        assert!(!ReadError::ShortRead { len: 3 }.is_would_block());
    }

    #[test]
    fn umbrella_error_keeps_message() {
        let error: Error = ReadError::UnknownWatch { wd: 7 }.into();
        assert_eq!(error.to_string(), "event for unknown watch 7");
    }
}
