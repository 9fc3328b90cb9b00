//! IIO device discovery and the sysfs-backed Sample Source.
//!
//! An IIO device `N` shows up twice: as `/sys/bus/iio/devices/iio:deviceN`
//! (attributes, including the per-channel threshold event controls under
//! `events/`) and as the character device `/dev/iio:deviceN`, whose only
//! use here is handing out the event fd.

use std::fs::File;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::path::{Path, PathBuf};

use volmon_core::source::{SampleSource, SourceError};

use crate::error::AgentError;
use crate::sysfs::{self, SysfsError};

/// Where the kernel lists IIO devices.
pub const IIO_SYSFS_DIR: &str = "/sys/bus/iio/devices";

/// Where the IIO character devices live.
pub const DEV_DIR: &str = "/dev";

/// `_IOR('i', 0x90, int)` from `linux/iio/events.h`.
const IIO_GET_EVENT_FD_IOCTL: u32 = 0x8004_6990;

const DEVICE_PREFIX: &str = "iio:device";

/// Find the number of the IIO device whose `name` attribute equals
/// `name`. The lowest matching device number wins.
pub fn find_device_by_name(sysfs_dir: &Path, name: &str) -> io::Result<Option<u32>> {
    let mut matches = Vec::new();

    for entry in std::fs::read_dir(sysfs_dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(number) = file_name
            .to_str()
            .and_then(|n| n.strip_prefix(DEVICE_PREFIX))
            .and_then(|n| n.parse::<u32>().ok())
        else {
            continue;
        };

        match std::fs::read_to_string(entry.path().join("name")) {
            Ok(device_name) if device_name.trim() == name => matches.push(number),
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(device = number, error = %e, "Skipping IIO device without name");
            }
        }
    }

    Ok(matches.into_iter().min())
}

/// A located IIO device.
#[derive(Debug, Clone)]
pub struct IioDevice {
    number: u32,
    sysfs_dir: PathBuf,
    chrdev: PathBuf,
}

impl IioDevice {
    /// Look the device up by name under the given sysfs and `/dev`
    /// directories.
    pub fn find(sysfs_base: &Path, dev_base: &Path, name: &str) -> Result<Self, AgentError> {
        let number = find_device_by_name(sysfs_base, name)?
            .ok_or_else(|| AgentError::DeviceNotFound(name.to_string()))?;

        tracing::info!(device = name, number, "Found IIO device");

        Ok(Self::at(sysfs_base, dev_base, number))
    }

    /// Device `number` without checking that it exists.
    pub fn at(sysfs_base: &Path, dev_base: &Path, number: u32) -> Self {
        let dir_name = format!("{DEVICE_PREFIX}{number}");
        Self {
            number,
            sysfs_dir: sysfs_base.join(&dir_name),
            chrdev: dev_base.join(&dir_name),
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn sysfs_dir(&self) -> &Path {
        &self.sysfs_dir
    }

    /// Sample Source for voltage channel `channel` of this device.
    pub fn channel(&self, channel: u32) -> IioChannel {
        IioChannel::new(&self.sysfs_dir, channel)
    }

    /// Obtain the device's event fd via `IIO_GET_EVENT_FD_IOCTL`.
    ///
    /// The character device is closed again before returning; the event
    /// fd stays valid on its own.
    pub fn open_event_fd(&self) -> Result<OwnedFd, AgentError> {
        let chrdev = File::open(&self.chrdev).map_err(|source| AgentError::Open {
            path: self.chrdev.clone(),
            source,
        })?;

        let mut event_fd: libc::c_int = -1;
        // SAFETY: the ioctl writes a single int through the pointer, which
        // refers to a live local.
        let ret = unsafe {
            libc::ioctl(
                chrdev.as_raw_fd(),
                IIO_GET_EVENT_FD_IOCTL as _,
                &mut event_fd as *mut libc::c_int,
            )
        };

        if ret == -1 {
            let source = io::Error::last_os_error();
            if source.raw_os_error() == Some(libc::ENODEV) {
                return Err(AgentError::EventsUnsupported(self.chrdev.clone()));
            }
            return Err(AgentError::EventFd {
                path: self.chrdev.clone(),
                source,
            });
        }
        if event_fd < 0 {
            return Err(AgentError::EventFd {
                path: self.chrdev.clone(),
                source: io::Error::other("ioctl returned no descriptor"),
            });
        }

        // SAFETY: on success the kernel installed a new descriptor that
        // nothing else owns.
        Ok(unsafe { OwnedFd::from_raw_fd(event_fd) })
    }
}

/// Attribute paths of one voltage channel.
#[derive(Debug, Clone)]
struct ChannelAttributes {
    input: PathBuf,
    upper_enable: PathBuf,
    upper_value: PathBuf,
    lower_enable: PathBuf,
    lower_value: PathBuf,
}

impl ChannelAttributes {
    fn new(dir: &Path, channel: u32) -> Self {
        let events = dir.join("events");
        Self {
            input: dir.join(format!("in_voltage{channel}_input")),
            upper_enable: events.join(format!("in_voltage{channel}_thresh_rising_en")),
            upper_value: events.join(format!("in_voltage{channel}_thresh_rising_value")),
            lower_enable: events.join(format!("in_voltage{channel}_thresh_falling_en")),
            lower_value: events.join(format!("in_voltage{channel}_thresh_falling_value")),
        }
    }
}

/// Sample Source backed by the sysfs attributes of one IIO voltage
/// channel.
#[derive(Debug, Clone)]
pub struct IioChannel {
    channel: u32,
    attrs: ChannelAttributes,
}

impl IioChannel {
    /// Channel `channel` of the device whose sysfs directory is `dir`.
    pub fn new(dir: &Path, channel: u32) -> Self {
        Self {
            channel,
            attrs: ChannelAttributes::new(dir, channel),
        }
    }

    pub fn channel(&self) -> u32 {
        self.channel
    }

    // The palmas GPADC driver rejects value updates while the event is
    // enabled.
    fn enable_threshold(enable: &Path, value_path: &Path, value: i32) -> Result<(), SysfsError> {
        sysfs::write_int_and_verify(enable, 0)?;
        sysfs::write_int_and_verify(value_path, value)?;
        sysfs::write_int_and_verify(enable, 1)
    }
}

impl SampleSource for IioChannel {
    fn read_value(&mut self) -> Result<i32, SourceError> {
        sysfs::read_posint(&self.attrs.input).map_err(|e| SourceError::new("read value", e))
    }

    fn enable_upper(&mut self, threshold: i32) -> Result<(), SourceError> {
        Self::enable_threshold(&self.attrs.upper_enable, &self.attrs.upper_value, threshold)
            .map_err(|e| SourceError::new("enable upper threshold", e))
    }

    fn disable_upper(&mut self) -> Result<(), SourceError> {
        sysfs::write_int_and_verify(&self.attrs.upper_enable, 0)
            .map_err(|e| SourceError::new("disable upper threshold", e))
    }

    fn enable_lower(&mut self, threshold: i32) -> Result<(), SourceError> {
        Self::enable_threshold(&self.attrs.lower_enable, &self.attrs.lower_value, threshold)
            .map_err(|e| SourceError::new("enable lower threshold", e))
    }

    fn disable_lower(&mut self) -> Result<(), SourceError> {
        sysfs::write_int_and_verify(&self.attrs.lower_enable, 0)
            .map_err(|e| SourceError::new("disable lower threshold", e))
    }
}
