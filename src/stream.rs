use std::{
    collections::VecDeque,
    pin::Pin,
    sync::Arc,
    task::{
        ready,
        Context,
        Poll,
    },
};

use futures_core::Stream;
use tokio::io::unix::AsyncFd;

use crate::error::{
    InitError,
    ReadError,
};
use crate::events::Event;
use crate::fd_guard::FdGuard;
use crate::watcher::Watcher;


/// Stream of inotify events
///
/// Created by [`Watcher::into_event_stream`]. Each time the descriptor
/// becomes readable, one batch is read and decoded; the events of that batch
/// are then yielded one by one.
#[derive(Debug)]
pub struct EventStream {
    fd: AsyncFd<Arc<FdGuard>>,
    watcher: Watcher,
    pending: VecDeque<Event>,
}

impl EventStream {
    /// Returns the watcher, to add or remove watches while streaming
    pub fn watcher(&mut self) -> &mut Watcher {
        &mut self.watcher
    }
}

impl Watcher {
    /// Turns this watcher into an asynchronous [`Stream`] of events
    ///
    /// Switches the descriptor to non-blocking mode and registers it with the
    /// tokio reactor of the current runtime.
    ///
    /// # Errors
    ///
    /// Returns [`InitError`], if switching to non-blocking mode fails, or if
    /// there is no tokio runtime with IO enabled.
    pub fn into_event_stream(self) -> Result<EventStream, InitError> {
        self.fd.set_nonblocking(true).map_err(InitError)?;
        let fd = AsyncFd::new(self.fd.clone()).map_err(InitError)?;

        Ok(EventStream {
            fd,
            watcher: self,
            pending: VecDeque::new(),
        })
    }
}

impl Stream for EventStream {
    type Item = Result<Event, ReadError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>)
        -> Poll<Option<Self::Item>>
    {
        let this = self.get_mut();

        loop {
            if let Some(event) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }

            let mut guard = ready!(this.fd.poll_read_ready(cx)).map_err(ReadError::Io)?;

            match guard.try_io(|_| this.watcher.fill_buffer()) {
                Ok(Ok(len)) => {
                    let events = this.watcher.decode_buffer(len)?;
                    this.pending.extend(events);
                }
                Ok(Err(error)) => return Poll::Ready(Some(Err(ReadError::Io(error)))),
                // Spurious wakeup. Readiness was cleared, poll again.
                Err(_would_block) => continue,
            }
        }
    }
}
