//! Numeric limits that bound the armed thresholds.
//!
//! [`ThresholdLimits`] is validated once at construction, so the
//! tracker never has to re-check `min <= max` or a zero step.

use crate::error::CoreError;

/// Default lower limit.
pub const DEFAULT_MIN: i32 = 0;

/// Default upper limit (full scale of the 11-bit palmas GPADC).
pub const DEFAULT_MAX: i32 = 0x7FF;

/// Default hysteresis half-width.
pub const DEFAULT_STEP: i32 = 25;

/// The `[min, max]` window and step used to place thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdLimits {
    min: i32,
    max: i32,
    step: i32,
}

impl Default for ThresholdLimits {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN,
            max: DEFAULT_MAX,
            step: DEFAULT_STEP,
        }
    }
}

impl ThresholdLimits {
    /// Build a validated set of limits.
    ///
    /// All values must be non-negative, `min <= max` and `step > 0`.
    pub fn new(min: i32, max: i32, step: i32) -> Result<Self, CoreError> {
        if min < 0 || max < 0 {
            return Err(CoreError::Validation(format!(
                "limits must be non-negative, got min {min} max {max}"
            )));
        }
        if min > max {
            return Err(CoreError::Validation(format!(
                "min ({min}) must not exceed max ({max})"
            )));
        }
        if step <= 0 {
            return Err(CoreError::Validation(format!(
                "step must be positive, got {step}"
            )));
        }
        Ok(Self { min, max, step })
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn step(&self) -> i32 {
        self.step
    }

    /// Pull `value` into `[min, max]`.
    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.min, self.max)
    }
}

/// Parse a non-negative integer option value.
///
/// Accepts decimal, `0x`/`0X` hexadecimal and leading-zero octal, the
/// same forms `strtol` understands with base 0. Negative values,
/// anything above `i32::MAX` and trailing characters are rejected.
pub fn parse_number(input: &str) -> Result<i32, CoreError> {
    let invalid = |reason: &'static str| CoreError::InvalidNumber {
        input: input.to_string(),
        reason,
    };

    let trimmed = input.trim();
    if trimmed.starts_with('-') {
        return Err(invalid("not a valid (positive) number"));
    }
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);

    let (radix, body) = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (16, hex)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };

    if body.is_empty() {
        return Err(invalid("not a number"));
    }

    let value = u64::from_str_radix(body, radix).map_err(|_| invalid("not a number"))?;
    i32::try_from(value).map_err(|_| invalid("out of range"))
}
