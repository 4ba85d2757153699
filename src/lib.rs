#![warn(missing_docs)]

//! Decoded inotify events with full paths
//!
//! [Inotify][wiki] is a linux kernel mechanism for monitoring
//! changes to filesystems' contents.
//!
//! > The inotify API provides a mechanism for monitoring filesystem
//! > events. Inotify can be used to monitor individual files, or to
//! > monitor directories. When a directory is monitored, inotify will
//! > return events for the directory itself, and for files inside the
//! > directory.
//!
//! This crate wraps one inotify instance in a [`Watcher`]. The watcher
//! remembers the path of every watch, reads the kernel's event buffer, and
//! hands out [`Event`]s that carry the full path of the affected file, the
//! event [`Mask`] and the rename cookie. Nothing is filtered, merged or
//! debounced; what the kernel reports is what the caller gets.
//!
//! ```no_run
//! use inotify_watcher::{
//!     InitFlags,
//!     Mask,
//!     Watcher,
//! };
//!
//! let mut watcher = Watcher::init(InitFlags::CLOEXEC)
//!     .expect("Failed to initialize inotify");
//!
//! watcher
//!     .add_watch("/tmp", Mask::ALL_EVENTS)
//!     .expect("Failed to add watch");
//!
//! loop {
//!     for event in watcher.read_events().expect("Failed to read events") {
//!         // Prints e.g. "/tmp/file IN_MODIFY"
//!         println!("{}", event);
//!     }
//! }
//! ```
//!
//! With the `stream` feature (enabled by default), a watcher can be turned
//! into a `futures_core::Stream` driven by tokio, see
//! [`Watcher::into_event_stream`].
//!
//! See the [man page][inotify7] for the semantics of the individual events.
//!
//! [wiki]: https://en.wikipedia.org/wiki/Inotify
//! [inotify7]: http://man7.org/linux/man-pages/man7/inotify.7.html


#[macro_use]
extern crate bitflags;

mod error;
mod events;
mod fd_guard;
mod mask;
mod watcher;
mod watches;

#[cfg(feature = "stream")]
mod stream;


pub use crate::error::{
    Error,
    InitError,
    ReadError,
    WatchError,
};
pub use crate::events::{
    Event,
    HEADER_SIZE,
};
pub use crate::mask::{
    InitFlags,
    Mask,
};
pub use crate::watcher::{
    Watcher,
    DEFAULT_BUFFER_SIZE,
    MIN_BUFFER_SIZE,
};
pub use crate::watches::WatchDescriptor;

#[cfg(feature = "stream")]
pub use crate::stream::EventStream;
