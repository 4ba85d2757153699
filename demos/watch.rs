use std::{
    env,
    process,
};

use inotify_watcher::{
    InitFlags,
    Mask,
    Watcher,
};
use tracing_subscriber::EnvFilter;


fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut watcher = Watcher::init(InitFlags::CLOEXEC)
        .unwrap_or_else(|error| fail("initialize inotify", &error));

    let paths: Vec<String> = env::args().skip(1).collect();
    if paths.is_empty() {
        println!("Usage: watch paths...");
        return;
    }

    for path in &paths {
        println!("Start watching {}", path);

        watcher
            .add_watch(path, Mask::ALL_EVENTS)
            .unwrap_or_else(|error| fail(&format!("watch {}", path), &error));
    }

    loop {
        let events = watcher
            .read_events()
            .unwrap_or_else(|error| fail("read events", &error));

        for event in events {
            println!("{}", event);
        }
    }
}

fn fail(what: &str, error: &dyn std::error::Error) -> ! {
    match error.source() {
        Some(source) => eprintln!("Failed to {}: {}: {}", what, error, source),
        None         => eprintln!("Failed to {}: {}", what, error),
    }
    process::exit(1);
}
