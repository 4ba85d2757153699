// These tests talk to the kernel, so they only run on Linux. Decoding of
// hand-made buffers is covered by the unit tests in `src/`.

use std::{
    fs::{
        self,
        File,
    },
    io::Write,
    path::PathBuf,
};

use inotify_watcher::{
    Event,
    InitFlags,
    Mask,
    WatchError,
    Watcher,
};
use tempdir::TempDir;


#[test]
fn it_should_watch_a_file() {
    let mut testdir = TestDir::new();
    let (path, mut file) = testdir.new_file();

    let mut watcher = Watcher::init(InitFlags::CLOEXEC).unwrap();
    let watch = watcher.add_watch(&path, Mask::MODIFY).unwrap();

    write_to(&mut file);

    let events = watcher.read_events().unwrap();

    assert!(!events.is_empty());
    for event in events {
        assert_eq!(watch, event.wd);
        assert!(event.mask.test(Mask::MODIFY));
        assert_eq!(path, event.name);
    }
}

#[test]
fn it_should_fail_instead_of_blocking_if_nonblocking() {
    let mut watcher = Watcher::init(InitFlags::NONBLOCK).unwrap();

    let error = watcher.read_events().unwrap_err();
    assert!(error.is_would_block());
}

#[test]
fn it_should_not_return_duplicate_events() {
    let mut testdir = TestDir::new();
    let (path, mut file) = testdir.new_file();

    let mut watcher = Watcher::init(InitFlags::NONBLOCK).unwrap();
    watcher.add_watch(&path, Mask::MODIFY).unwrap();

    write_to(&mut file);
    watcher.read_events().unwrap();

    assert!(watcher.read_events().unwrap_err().is_would_block());
}

#[test]
fn it_should_handle_file_names_correctly() {
    let mut testdir = TestDir::new();
    let (path, mut file) = testdir.new_file();
    let dir = path.parent().unwrap().to_path_buf();

    let mut watcher = Watcher::init(InitFlags::empty()).unwrap();
    watcher.add_watch(&dir, Mask::MODIFY).unwrap();

    write_to(&mut file);

    let events = watcher.read_events().unwrap();

    assert!(!events.is_empty());
    for event in events {
        assert_eq!(path, event.name);
        assert_eq!(format!("{} IN_MODIFY", path.display()), event.to_string());
    }
}

#[test]
fn it_should_pair_rename_events_by_cookie() {
    let mut testdir = TestDir::new();
    let (from, _) = testdir.new_file();
    let to = from.with_file_name("renamed");

    let mut watcher = Watcher::init(InitFlags::empty()).unwrap();
    watcher.add_watch(testdir.dir.path(), Mask::MOVE).unwrap();

    fs::rename(&from, &to).unwrap();

    let events = read_at_least(&mut watcher, 2);
    assert_eq!(events.len(), 2);

    assert_eq!(events[0].mask, Mask::MOVED_FROM);
    assert_eq!(events[0].name, from);
    assert_eq!(events[1].mask, Mask::MOVED_TO);
    assert_eq!(events[1].name, to);

    assert_ne!(events[0].cookie, 0);
    assert_eq!(events[0].cookie, events[1].cookie);
}

#[test]
fn it_should_forget_watches_once_removal_is_confirmed() {
    let testdir = TestDir::new();
    let path = testdir.dir.path().to_path_buf();

    let mut watcher = Watcher::init(InitFlags::empty()).unwrap();
    let watch = watcher.add_watch(&path, Mask::CREATE).unwrap();

    watcher.remove_watch(watch.clone()).unwrap();
    assert_eq!(Some(path.as_path()), watcher.watched_path(&watch));

    let events = watcher.read_events().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].mask, Mask::IGNORED);
    assert_eq!(events[0].name, path);

    assert_eq!(None, watcher.watched_path(&watch));

    match watcher.remove_watch(watch) {
        Err(WatchError::Remove { .. }) => (),
        result => panic!("unexpected result: {:?}", result),
    }
}

#[test]
fn it_should_reject_watch_descriptors_of_other_watchers() {
    let testdir = TestDir::new();

    let mut a = Watcher::init(InitFlags::empty()).unwrap();
    let mut b = Watcher::init(InitFlags::empty()).unwrap();

    let watch_a = a.add_watch(testdir.dir.path(), Mask::CREATE).unwrap();
    let watch_b = b.add_watch(testdir.dir.path(), Mask::CREATE).unwrap();

    match a.remove_watch(watch_b) {
        Err(WatchError::ForeignDescriptor { .. }) => (),
        result => panic!("unexpected result: {:?}", result),
    }

    a.close().unwrap();

    // The descriptor outlived its watcher.
    match b.remove_watch(watch_a) {
        Err(WatchError::ForeignDescriptor { .. }) => (),
        result => panic!("unexpected result: {:?}", result),
    }
}

#[test]
fn it_should_report_missing_paths() {
    let testdir = TestDir::new();
    let missing = testdir.dir.path().join("missing");

    let mut watcher = Watcher::init(InitFlags::empty()).unwrap();

    match watcher.add_watch(&missing, Mask::ALL_EVENTS) {
        Err(WatchError::Add { path, source }) => {
            assert_eq!(missing, path);
            assert_eq!(std::io::ErrorKind::NotFound, source.kind());
        }
        result => panic!("unexpected result: {:?}", result),
    }
}

#[cfg(feature = "stream")]
#[tokio::test]
async fn it_should_stream_events() {
    use futures_util::StreamExt;

    let mut testdir = TestDir::new();

    let mut watcher = Watcher::init(InitFlags::CLOEXEC).unwrap();
    watcher.add_watch(testdir.dir.path(), Mask::CREATE).unwrap();

    let mut stream = watcher.into_event_stream().unwrap();

    let (path, _) = testdir.new_file();

    let event = stream.next().await.unwrap().unwrap();
    assert_eq!(Mask::CREATE, event.mask);
    assert_eq!(path, event.name);
}


struct TestDir {
    dir: TempDir,
    counter: u32,
}

impl TestDir {
    fn new() -> TestDir {
        TestDir {
            dir: TempDir::new("inotify-watcher-test").unwrap(),
            counter: 0,
        }
    }

    fn new_file(&mut self) -> (PathBuf, File) {
        let id = self.counter;
        self.counter += 1;

        let path = self.dir.path().join("file-".to_string() + &id.to_string());
        let file = File::create(&path)
            .unwrap_or_else(|error| panic!("Failed to create temporary file: {}", error));

        (path, file)
    }
}

fn write_to(file: &mut File) {
    file
        .write(b"This should trigger an inotify event.")
        .unwrap_or_else(|error|
            panic!("Failed to write to file: {}", error)
        );
}

fn read_at_least(watcher: &mut Watcher, n: usize) -> Vec<Event> {
    let mut events = Vec::new();

    while events.len() < n {
        events.extend(watcher.read_events().unwrap());
    }

    events
}
