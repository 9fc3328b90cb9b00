//! `volmon-agent` library crate.
//!
//! Linux side of the volume monitor: sysfs and event fd plumbing, the
//! callback spawner and the monitor loop. The binary entrypoint lives
//! in `main.rs`; the modules are public for integration testing.

pub mod callback;
pub mod config;
pub mod error;
pub mod events;
pub mod iio;
pub mod monitor;
pub mod sysfs;
