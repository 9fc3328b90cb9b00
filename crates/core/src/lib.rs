//! `volmon-core` -- pure logic for the IIO volume monitor.
//!
//! Nothing in this crate touches the filesystem or the kernel. The
//! Linux side (sysfs, event fd, child processes) lives in
//! `volmon-agent` and plugs in through [`source::SampleSource`].

pub mod error;
pub mod event;
pub mod limits;
pub mod source;
pub mod thresholds;
pub mod tracker;
