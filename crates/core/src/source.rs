//! The Sample Source capability.
//!
//! A [`SampleSource`] is whatever sits behind the ADC channel: the sysfs
//! attributes of an IIO device in production, an in-memory fake in
//! tests. The tracker owns its source and is the only caller.

/// Boxed error returned by any [`SampleSource`] operation.
#[derive(Debug, thiserror::Error)]
#[error("{operation} failed: {source}")]
pub struct SourceError {
    pub operation: &'static str,
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl SourceError {
    pub fn new(
        operation: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            operation,
            source: source.into(),
        }
    }
}

/// Read access to a sensor channel plus control of its two alert
/// thresholds.
///
/// Enabling a threshold must leave it armed at exactly the given value.
/// Implementations that cannot change an armed threshold in place are
/// expected to disable it, write the value and re-enable it.
pub trait SampleSource {
    /// Read the current sample.
    fn read_value(&mut self) -> Result<i32, SourceError>;

    /// Arm the rising threshold at `threshold`.
    fn enable_upper(&mut self, threshold: i32) -> Result<(), SourceError>;

    fn disable_upper(&mut self) -> Result<(), SourceError>;

    /// Arm the falling threshold at `threshold`.
    fn enable_lower(&mut self, threshold: i32) -> Result<(), SourceError>;

    fn disable_lower(&mut self) -> Result<(), SourceError>;
}
