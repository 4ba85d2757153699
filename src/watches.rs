use std::{
    cmp::Ordering,
    collections::HashMap,
    hash::{
        Hash,
        Hasher,
    },
    os::raw::c_int,
    path::{
        Path,
        PathBuf,
    },
    sync::Weak,
};

use crate::fd_guard::FdGuard;


/// Represents a watch on an inode
///
/// Returned by [`Watcher::add_watch`] and carried by every [`Event`]. Pass it
/// to [`Watcher::remove_watch`] to stop watching.
///
/// A `WatchDescriptor` remembers the watcher that issued it. Descriptors from
/// different watchers never compare equal, and a descriptor outlives neither
/// the removal of its watch nor the watcher itself in any meaningful way.
///
/// [`Watcher::add_watch`]: crate::Watcher::add_watch
/// [`Watcher::remove_watch`]: crate::Watcher::remove_watch
/// [`Event`]: crate::Event
#[derive(Clone, Debug)]
pub struct WatchDescriptor {
    pub(crate) id: c_int,
    pub(crate) fd: Weak<FdGuard>,
}

impl WatchDescriptor {
    /// The id the kernel assigned to this watch
    pub fn id(&self) -> c_int {
        self.id
    }
}

impl Eq for WatchDescriptor {}

impl PartialEq for WatchDescriptor {
    fn eq(&self, other: &Self) -> bool {
        let self_fd  = self.fd.upgrade();
        let other_fd = other.fd.upgrade();

        self.id == other.id && self_fd.is_some() && self_fd == other_fd
    }
}

impl Ord for WatchDescriptor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl PartialOrd for WatchDescriptor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for WatchDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Only the id. `fd` may be gone, and the hash must not change when
        // that happens.
        self.id.hash(state);
    }
}


/// Maps watch ids to the paths they were registered for
///
/// The kernel reports only the id and, for events inside a watched
/// directory, the bare file name. This table turns that back into a full
/// path. Entries are inserted on every successful registration and removed
/// once the kernel confirms the removal of a watch with `IN_IGNORED`.
#[derive(Debug, Default)]
pub(crate) struct Registrations {
    paths: HashMap<c_int, PathBuf>,
}

impl Registrations {
    /// Records `path` for `id`, replacing whatever was stored for it before
    pub fn insert(&mut self, id: c_int, path: PathBuf) {
        if let Some(previous) = self.paths.insert(id, path) {
            tracing::debug!(wd = id, previous = %previous.display(), "watch id re-registered");
        }
    }

    pub fn remove(&mut self, id: c_int) -> Option<PathBuf> {
        self.paths.remove(&id)
    }

    pub fn get(&self, id: c_int) -> Option<&Path> {
        self.paths.get(&id).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (c_int, &Path)> {
        self.paths.iter().map(|(id, path)| (*id, path.as_path()))
    }
}
