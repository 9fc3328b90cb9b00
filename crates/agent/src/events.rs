//! Async reader for the IIO event fd.
//!
//! The fd is switched to non-blocking and registered with the tokio
//! reactor, so waiting for the next event is the monitor's only
//! suspension point.

use std::fs::File;
use std::io::{self, Read};
use std::os::fd::{AsRawFd, OwnedFd};

use tokio::io::unix::AsyncFd;

use volmon_core::event::{IioEvent, EVENT_RECORD_SIZE};

use crate::error::AgentError;

pub struct EventStream {
    inner: AsyncFd<File>,
}

impl EventStream {
    /// Take ownership of an event fd. Must be called within a tokio
    /// runtime.
    pub fn new(fd: OwnedFd) -> io::Result<Self> {
        set_nonblocking(&fd)?;
        Ok(Self {
            inner: AsyncFd::new(File::from(fd))?,
        })
    }

    /// Wait for and decode the next event record.
    ///
    /// A spurious wakeup with nothing to read is retried. A read that
    /// does not return exactly one record (including end of file) is an
    /// [`AgentError::EventSize`].
    pub async fn next_event(&mut self) -> Result<IioEvent, AgentError> {
        let mut buf = [0u8; EVENT_RECORD_SIZE];

        loop {
            let mut guard = self.inner.readable().await.map_err(AgentError::EventRead)?;

            match guard.try_io(|inner| inner.get_ref().read(&mut buf)) {
                Ok(Ok(n)) => {
                    return IioEvent::from_bytes(&buf[..n]).ok_or(AgentError::EventSize(n));
                }
                Ok(Err(e)) if e.kind() == io::ErrorKind::Interrupted => continue,
                Ok(Err(e)) => return Err(AgentError::EventRead(e)),
                Err(_would_block) => {
                    tracing::debug!("nothing available");
                    continue;
                }
            }
        }
    }
}

fn set_nonblocking(fd: &OwnedFd) -> io::Result<()> {
    let raw = fd.as_raw_fd();
    // SAFETY: `raw` is a valid descriptor owned by `fd` for the duration
    // of both calls.
    let flags = unsafe { libc::fcntl(raw, libc::F_GETFL) };
    if flags == -1 {
        return Err(io::Error::last_os_error());
    }
    if flags & libc::O_NONBLOCK != 0 {
        return Ok(());
    }
    // SAFETY: as above.
    if unsafe { libc::fcntl(raw, libc::F_SETFL, flags | libc::O_NONBLOCK) } == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
