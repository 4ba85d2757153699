use std::{
    fmt,
    os::raw::c_int,
};

use inotify_sys as ffi;


/// `IN_MASK_CREATE` from `linux/inotify.h` (since Linux 4.18)
///
/// Not every release of `inotify-sys` exports this one, so the kernel value is
/// spelled out here.
const IN_MASK_CREATE: u32 = 0x1000_0000;

bitflags! {
    /// Set of inotify event and watch flags
    ///
    /// The same type describes what to watch for (passed to
    /// [`Watcher::add_watch`]) and what happened (the `mask` field of
    /// [`Event`]). The values are the ones from `linux/inotify.h` and must
    /// never be renumbered.
    ///
    /// Flags are independent bits. A single event can carry more than one of
    /// them, for example [`Mask::CREATE`] together with [`Mask::ISDIR`].
    ///
    /// # Examples
    ///
    /// ```
    /// use inotify_watcher::Mask;
    ///
    /// let mask = Mask::combine([Mask::CREATE, Mask::DELETE]);
    ///
    /// assert!(mask.test(Mask::CREATE));
    /// assert!(!mask.test(Mask::MODIFY));
    /// assert_eq!(mask.to_string(), "IN_CREATE|IN_DELETE");
    /// ```
    ///
    /// [`Watcher::add_watch`]: crate::Watcher::add_watch
    /// [`Event`]: crate::Event
    #[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
    pub struct Mask: u32 {
        /// File was accessed
        ///
        /// When watching a directory, this event is only triggered for objects
        /// inside the directory, not the directory itself.
        const ACCESS = ffi::IN_ACCESS;

        /// File was modified
        ///
        /// When watching a directory, this event is only triggered for objects
        /// inside the directory, not the directory itself.
        const MODIFY = ffi::IN_MODIFY;

        /// Metadata (permissions, timestamps, ...) changed
        const ATTRIB = ffi::IN_ATTRIB;

        /// File opened for writing was closed
        const CLOSE_WRITE = ffi::IN_CLOSE_WRITE;

        /// File or directory not opened for writing was closed
        const CLOSE_NOWRITE = ffi::IN_CLOSE_NOWRITE;

        /// File or directory was opened
        const OPEN = ffi::IN_OPEN;

        /// File was renamed/moved; watched directory contained old name
        const MOVED_FROM = ffi::IN_MOVED_FROM;

        /// File was renamed/moved; watched directory contains new name
        const MOVED_TO = ffi::IN_MOVED_TO;

        /// File/directory created in watched directory
        const CREATE = ffi::IN_CREATE;

        /// File/directory deleted from watched directory
        const DELETE = ffi::IN_DELETE;

        /// Watched file/directory was itself deleted
        const DELETE_SELF = ffi::IN_DELETE_SELF;

        /// Watched file/directory was itself moved
        const MOVE_SELF = ffi::IN_MOVE_SELF;

        /// File system containing the watched object was unmounted
        ///
        /// An event with [`Mask::IGNORED`] follows for the same watch.
        const UNMOUNT = ffi::IN_UNMOUNT;

        /// Event queue overflowed
        ///
        /// Events have been lost. The record carrying this flag has a watch
        /// descriptor of `-1`.
        const Q_OVERFLOW = ffi::IN_Q_OVERFLOW;

        /// Watch was removed
        ///
        /// Generated when the watch was removed explicitly (via
        /// [`Watcher::remove_watch`]) or automatically (file deleted, file
        /// system unmounted, `ONESHOT` watch fired).
        ///
        /// [`Watcher::remove_watch`]: crate::Watcher::remove_watch
        const IGNORED = ffi::IN_IGNORED;

        /// Only watch the path if it is a directory
        const ONLYDIR = ffi::IN_ONLYDIR;

        /// Don't dereference the path if it is a symbolic link
        const DONT_FOLLOW = ffi::IN_DONT_FOLLOW;

        /// Filter events for directory entries that have been unlinked
        const EXCL_UNLINK = ffi::IN_EXCL_UNLINK;

        /// Only create a new watch, fail if one exists for the inode
        const MASK_CREATE = IN_MASK_CREATE;

        /// If a watch for the inode exists, amend it instead of replacing it
        const MASK_ADD = ffi::IN_MASK_ADD;

        /// Subject of the event is a directory
        const ISDIR = ffi::IN_ISDIR;

        /// Only receive one event, then remove the watch
        const ONESHOT = ffi::IN_ONESHOT;

        /// Both close events: [`CLOSE_WRITE`](Self::CLOSE_WRITE) and
        /// [`CLOSE_NOWRITE`](Self::CLOSE_NOWRITE)
        const CLOSE = ffi::IN_CLOSE;

        /// Both move events: [`MOVED_FROM`](Self::MOVED_FROM) and
        /// [`MOVED_TO`](Self::MOVED_TO)
        const MOVE = ffi::IN_MOVE;

        /// All twelve event flags that can be requested for a watch
        const ALL_EVENTS = ffi::IN_ALL_EVENTS;
    }
}

impl Mask {
    /// Individual flags and their symbolic names, in rendering order
    ///
    /// Groupings (`CLOSE`, `MOVE`, `ALL_EVENTS`) are left out on purpose, so
    /// every bit is named exactly once.
    const NAMES: &'static [(Mask, &'static str)] = &[
        (Mask::ACCESS, "IN_ACCESS"),
        (Mask::MODIFY, "IN_MODIFY"),
        (Mask::ATTRIB, "IN_ATTRIB"),
        (Mask::CLOSE_WRITE, "IN_CLOSE_WRITE"),
        (Mask::CLOSE_NOWRITE, "IN_CLOSE_NOWRITE"),
        (Mask::OPEN, "IN_OPEN"),
        (Mask::MOVED_FROM, "IN_MOVED_FROM"),
        (Mask::MOVED_TO, "IN_MOVED_TO"),
        (Mask::CREATE, "IN_CREATE"),
        (Mask::DELETE, "IN_DELETE"),
        (Mask::DELETE_SELF, "IN_DELETE_SELF"),
        (Mask::MOVE_SELF, "IN_MOVE_SELF"),
        (Mask::UNMOUNT, "IN_UNMOUNT"),
        (Mask::Q_OVERFLOW, "IN_Q_OVERFLOW"),
        (Mask::IGNORED, "IN_IGNORED"),
        (Mask::ONLYDIR, "IN_ONLYDIR"),
        (Mask::DONT_FOLLOW, "IN_DONT_FOLLOW"),
        (Mask::EXCL_UNLINK, "IN_EXCL_UNLINK"),
        (Mask::MASK_CREATE, "IN_MASK_CREATE"),
        (Mask::MASK_ADD, "IN_MASK_ADD"),
        (Mask::ISDIR, "IN_ISDIR"),
        (Mask::ONESHOT, "IN_ONESHOT"),
    ];

    /// Returns `true` if every bit of `flag` is set in this mask
    pub fn test(self, flag: Mask) -> bool {
        self.contains(flag)
    }

    /// Combines any number of masks into one
    pub fn combine<I>(flags: I) -> Mask
        where I: IntoIterator<Item = Mask>
    {
        flags.into_iter().fold(Mask::empty(), |acc, flag| acc | flag)
    }

    /// Iterates over the symbolic names of the individual flags that are set
    ///
    /// Yields names in a fixed order, independent of how the mask was built.
    /// Bits without a name are skipped.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMES
            .iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.names().peekable();

        if names.peek().is_none() {
            return write!(f, "{}", self.bits());
        }

        for (i, name) in names.enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            f.write_str(name)?;
        }

        Ok(())
    }
}


bitflags! {
    /// Options for creating an inotify instance
    ///
    /// Passed to [`Watcher::init`]. Bits not known here are retained and
    /// handed to `inotify_init1` unchanged; the kernel decides whether they
    /// are valid.
    ///
    /// [`Watcher::init`]: crate::Watcher::init
    #[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, Default)]
    pub struct InitFlags: c_int {
        /// Open the descriptor with `O_NONBLOCK`
        ///
        /// [`Watcher::read_events`] then fails with a "would block" error
        /// instead of waiting, if no events are queued.
        ///
        /// [`Watcher::read_events`]: crate::Watcher::read_events
        const NONBLOCK = ffi::IN_NONBLOCK;

        /// Set close-on-exec on the descriptor
        const CLOEXEC = ffi::IN_CLOEXEC;

        // <https://docs.rs/bitflags/*/bitflags/#externally-defined-flags>
        const _ = !0;
    }
}


#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{InitFlags, Mask};

    fn individual_flags() -> Vec<Mask> {
        Mask::NAMES.iter().map(|(flag, _)| *flag).collect()
    }

    #[test]
    fn flag_values_match_kernel_abi() {
        assert_eq!(Mask::ACCESS.bits(), 0x0000_0001);
        assert_eq!(Mask::MOVE_SELF.bits(), 0x0000_0800);
        assert_eq!(Mask::UNMOUNT.bits(), 0x0000_2000);
        assert_eq!(Mask::IGNORED.bits(), 0x0000_8000);
        assert_eq!(Mask::ONLYDIR.bits(), 0x0100_0000);
        assert_eq!(Mask::MASK_CREATE.bits(), 0x1000_0000);
        assert_eq!(Mask::ISDIR.bits(), 0x4000_0000);
        assert_eq!(Mask::ONESHOT.bits(), 0x8000_0000);
        assert_eq!(Mask::ALL_EVENTS.bits(), 0x0000_0fff);
    }

    #[test]
    fn groupings_are_unions_of_their_parts() {
        assert_eq!(Mask::CLOSE, Mask::CLOSE_WRITE | Mask::CLOSE_NOWRITE);
        assert_eq!(Mask::MOVE, Mask::MOVED_FROM | Mask::MOVED_TO);
        assert_eq!(Mask::ALL_EVENTS, Mask::combine(individual_flags()[..12].iter().copied()));
    }

    #[test]
    fn combined_flags_test_true_and_others_false() {
        let flags = individual_flags();

        for (i, a) in flags.iter().enumerate() {
            for b in &flags[i..] {
                let mask = Mask::combine([*a, *b]);

                for flag in &flags {
                    assert_eq!(mask.test(*flag), flag == a || flag == b, "{:?} in {:?}", flag, mask);
                }
            }
        }
    }

    #[test]
    fn names_match_set_flags() {
        let masks = [
            Mask::MODIFY,
            Mask::CREATE | Mask::ISDIR,
            Mask::ALL_EVENTS,
            Mask::IGNORED | Mask::UNMOUNT | Mask::Q_OVERFLOW,
            Mask::all(),
        ];

        for mask in masks {
            let rendered = mask.to_string();
            assert_eq!(rendered, mask.to_string());

            let names: BTreeSet<_> = rendered.split('|').collect();
            let expected: BTreeSet<_> = Mask::NAMES
                .iter()
                .filter(|(flag, _)| mask.test(*flag))
                .map(|(_, name)| *name)
                .collect();
            assert_eq!(names, expected);
        }
    }

    #[test]
    fn render_uses_fixed_order() {
        let mask = Mask::ISDIR | Mask::MOVED_FROM | Mask::MOVE_SELF;
        assert_eq!(mask.to_string(), "IN_MOVED_FROM|IN_MOVE_SELF|IN_ISDIR");
    }

    #[test]
    fn render_falls_back_to_raw_value() {
        assert_eq!(Mask::empty().to_string(), "0");
        assert_eq!(Mask::from_bits_retain(0x1000).to_string(), "4096");
    }

    #[test]
    fn render_skips_unknown_bits_next_to_known_ones() {
        let mask = Mask::from_bits_retain(0x1000) | Mask::OPEN;
        assert_eq!(mask.to_string(), "IN_OPEN");
    }

    #[test]
    fn init_flags_retain_unknown_bits() {
        let flags = InitFlags::from_bits_retain(0x1) | InitFlags::CLOEXEC;
        assert_eq!(flags.bits(), 0x1 | libc::O_CLOEXEC);
        assert!(flags.contains(InitFlags::CLOEXEC));
        assert!(!flags.contains(InitFlags::NONBLOCK));
    }
}
