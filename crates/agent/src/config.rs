use std::path::PathBuf;

use clap::Parser;

use volmon_core::error::CoreError;
use volmon_core::limits::{self, ThresholdLimits};

/// ADC channel the Pyra volume wheel is wired to.
pub const DEFAULT_CHANNEL: u32 = 2;

/// IIO name of the TWL6037/palmas general purpose ADC.
pub const DEFAULT_DEVICE: &str = "palmas-gpadc";

/// Command line of `pyra-vol-mon`.
///
/// Every option can also be given through a `VOLMON_*` environment
/// variable (a `.env` file is honoured).
#[derive(Debug, Parser)]
#[command(name = "pyra-vol-mon", version)]
#[command(
    about = "Monitor an IIO ADC channel and run EXECUTABLE when the input changes.",
    after_help = "EXECUTABLE is called as `EXECUTABLE <adc value>`, or as \
                  `EXECUTABLE <adc value> <min> <max>` with --pass-limits."
)]
pub struct Cli {
    /// ADC channel to monitor. The Pyra volume wheel is on channel 2.
    #[arg(short, long, env = "VOLMON_CHANNEL", default_value_t = DEFAULT_CHANNEL, value_parser = parse_channel)]
    pub channel: u32,

    /// Lower limit. Values below it trigger EXECUTABLE only once, until
    /// the input rises above the limit again.
    #[arg(short = 'l', long, env = "VOLMON_MIN", default_value_t = limits::DEFAULT_MIN, value_parser = limits::parse_number)]
    pub min: i32,

    /// Upper limit. Values above it trigger EXECUTABLE only once, until
    /// the input drops below the limit again.
    #[arg(short = 'u', long, env = "VOLMON_MAX", default_value_t = limits::DEFAULT_MAX, value_parser = limits::parse_number)]
    pub max: i32,

    /// How far the input may move before EXECUTABLE is called again.
    #[arg(short, long, env = "VOLMON_STEP", default_value_t = limits::DEFAULT_STEP, value_parser = limits::parse_number)]
    pub step: i32,

    /// IIO device name to look up under /sys/bus/iio/devices.
    #[arg(short, long = "device", env = "VOLMON_DEVICE", default_value = DEFAULT_DEVICE)]
    pub device_name: String,

    /// Also pass the lower and upper limit to EXECUTABLE.
    #[arg(long)]
    pub pass_limits: bool,

    /// Be a bit more verbose.
    #[arg(short, long)]
    pub verbose: bool,

    /// Program to run on every change.
    #[arg(value_name = "EXECUTABLE")]
    pub executable: PathBuf,
}

fn parse_channel(input: &str) -> Result<u32, CoreError> {
    limits::parse_number(input).map(|n| n as u32)
}

/// Validated monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub channel: u32,
    pub limits: ThresholdLimits,
    pub device_name: String,
    pub executable: PathBuf,
    pub pass_limits: bool,
    pub verbose: bool,
}

impl TryFrom<Cli> for MonitorConfig {
    type Error = CoreError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        Ok(Self {
            channel: cli.channel,
            limits: ThresholdLimits::new(cli.min, cli.max, cli.step)?,
            device_name: cli.device_name,
            executable: cli.executable,
            pass_limits: cli.pass_limits,
            verbose: cli.verbose,
        })
    }
}

pub const QUIET_LOG_FILTER: &str = "volmon_agent=info,volmon_core=info";
pub const VERBOSE_LOG_FILTER: &str = "volmon_agent=debug,volmon_core=debug";

impl MonitorConfig {
    /// Default `tracing` filter, used when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            VERBOSE_LOG_FILTER
        } else {
            QUIET_LOG_FILTER
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("pyra-vol-mon").chain(args.iter().copied()))
    }

    #[test]
    fn defaults() {
        let config = MonitorConfig::try_from(parse(&["/bin/true"]).unwrap()).unwrap();
        assert_eq!(config.channel, 2);
        assert_eq!(config.limits, ThresholdLimits::default());
        assert_eq!(config.device_name, "palmas-gpadc");
        assert_eq!(config.executable, PathBuf::from("/bin/true"));
        assert!(!config.pass_limits);
    }

    #[test]
    fn short_options_accept_hex() {
        let cli = parse(&["-c", "3", "-l", "0x10", "-u", "0x400", "-s", "8", "-v", "hook"]).unwrap();
        let config = MonitorConfig::try_from(cli).unwrap();
        assert_eq!(config.channel, 3);
        assert_eq!(config.limits, ThresholdLimits::new(16, 1024, 8).unwrap());
        assert!(config.verbose);
        assert_eq!(config.log_filter(), VERBOSE_LOG_FILTER);
    }

    #[test]
    fn quiet_by_default() {
        let config = MonitorConfig::try_from(parse(&["hook"]).unwrap()).unwrap();
        assert!(!config.verbose);
        assert_eq!(config.log_filter(), QUIET_LOG_FILTER);
    }

    #[test]
    fn executable_is_required() {
        assert!(parse(&["-c", "2"]).is_err());
    }

    #[test]
    fn negative_numbers_are_rejected() {
        assert!(parse(&["--step", "-3", "hook"]).is_err());
    }

    #[test]
    fn inverted_limits_fail_validation() {
        let cli = parse(&["--min", "100", "--max", "10", "hook"]).unwrap();
        assert!(matches!(
            MonitorConfig::try_from(cli),
            Err(CoreError::Validation(_))
        ));
    }
}
