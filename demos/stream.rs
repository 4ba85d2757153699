use std::{
    fs::File,
    thread,
    time::Duration,
};

use futures_util::StreamExt;
use inotify_watcher::{
    Error,
    InitFlags,
    Mask,
    Watcher,
};
use tempdir::TempDir;


#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let mut watcher = Watcher::init(InitFlags::CLOEXEC)?;

    let dir = TempDir::new("inotify-watcher-stream")
        .expect("Failed to create temporary directory");

    watcher.add_watch(dir.path(), Mask::CREATE | Mask::MODIFY)?;

    let path = dir.path().to_path_buf();
    thread::spawn(move || {
        for i in 0.. {
            File::create(path.join(format!("file-{}", i)))
                .expect("Failed to create file");
            thread::sleep(Duration::from_millis(500));
        }
    });

    let mut stream = watcher.into_event_stream()?;

    while let Some(event) = stream.next().await {
        println!("event: {}", event?);
    }

    Ok(())
}
