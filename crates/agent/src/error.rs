use std::io;
use std::path::PathBuf;

use volmon_core::error::CoreError;

/// Errors that stop the monitor.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] CoreError),

    #[error("Could not find IIO device with name {0}")]
    DeviceNotFound(String),

    #[error("Failed to open {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("{0} does not support events")]
    EventsUnsupported(PathBuf),

    #[error("Failed to retrieve event fd from {path}: {source}")]
    EventFd { path: PathBuf, source: io::Error },

    #[error("Failed to read event from device: {0}")]
    EventRead(#[source] io::Error),

    #[error("Reading event failed: got {0} bytes")]
    EventSize(usize),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl AgentError {
    /// Positive errno describing this error, used as the process exit
    /// status.
    pub fn errno(&self) -> i32 {
        match self {
            AgentError::Config(_) => libc::EINVAL,
            AgentError::DeviceNotFound(_) | AgentError::EventsUnsupported(_) => libc::ENODEV,
            AgentError::Open { source, .. }
            | AgentError::EventFd { source, .. }
            | AgentError::EventRead(source)
            | AgentError::Io(source) => source.raw_os_error().unwrap_or(libc::EIO),
            AgentError::EventSize(_) => libc::EIO,
        }
    }
}
