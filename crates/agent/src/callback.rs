//! Callback invocation.
//!
//! Every accepted sample is handed to an external program. The program
//! runs detached: the monitor neither waits for it nor collects its exit
//! status, so a callback that exits stays a zombie until the monitor
//! itself exits.

use std::ffi::OsString;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use volmon_core::limits::ThresholdLimits;

#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },
}

/// Something that reacts to a new sample value.
pub trait CallbackInvoker {
    /// Hand `value` to the callback. Returns the pid of the spawned
    /// process.
    fn invoke(&mut self, value: i32) -> Result<u32, CallbackError>;
}

/// Runs an executable as a fire-and-forget child process.
///
/// The child sees its own base name as `argv[0]`, the sample as
/// `argv[1]` and, when limits are attached, `min` and `max` after it.
#[derive(Debug, Clone)]
pub struct DetachedProcess {
    program: PathBuf,
    limits: Option<ThresholdLimits>,
}

impl DetachedProcess {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            limits: None,
        }
    }

    /// Also pass `min` and `max` to the program.
    pub fn with_limits(mut self, limits: ThresholdLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn arg0(&self) -> OsString {
        self.program
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| self.program.clone().into_os_string())
    }

    fn arguments(&self, value: i32) -> Vec<String> {
        let mut args = vec![value.to_string()];
        if let Some(limits) = &self.limits {
            args.push(limits.min().to_string());
            args.push(limits.max().to_string());
        }
        args
    }
}

impl CallbackInvoker for DetachedProcess {
    fn invoke(&mut self, value: i32) -> Result<u32, CallbackError> {
        let child = Command::new(&self.program)
            .arg0(self.arg0())
            .args(self.arguments(value))
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| {
                tracing::error!(
                    program = %self.program.display(),
                    error = %source,
                    "child process exec failed",
                );
                CallbackError::Spawn {
                    program: self.program.clone(),
                    source,
                }
            })?;

        // Dropping a std `Child` neither kills nor waits for it.
        let pid = child.id();
        tracing::debug!(value, pid, "Callback spawned");
        Ok(pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_value_only_by_default() {
        let cb = DetachedProcess::new("/usr/local/bin/volume-changed");
        assert_eq!(cb.arguments(1234), vec!["1234"]);
        assert_eq!(cb.arg0(), OsString::from("volume-changed"));
    }

    #[test]
    fn passes_limits_when_attached() {
        let limits = ThresholdLimits::new(0, 0x7FF, 25).unwrap();
        let cb = DetachedProcess::new("amixer-hook").with_limits(limits);
        assert_eq!(cb.arguments(42), vec!["42", "0", "2047"]);
        assert_eq!(cb.arg0(), OsString::from("amixer-hook"));
    }
}
