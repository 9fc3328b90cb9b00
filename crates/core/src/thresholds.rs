//! Threshold placement around a sample.
//!
//! Pure arithmetic -- the caller applies the resulting plan to a
//! [`SampleSource`](crate::source::SampleSource).

use crate::limits::ThresholdLimits;

/// What to do with one threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdAction {
    /// Nothing meaningful to watch for in this direction.
    Disable,
    /// Enable the threshold at the given value.
    Arm(i32),
}

/// The pair of actions computed for a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdPlan {
    pub upper: ThresholdAction,
    pub lower: ThresholdAction,
}

impl ThresholdPlan {
    /// Place the rising and falling thresholds `step` away from `value`,
    /// clamped to the configured window.
    ///
    /// A `value` outside `[min, max]` is treated as the nearest limit.
    pub fn for_value(value: i32, limits: &ThresholdLimits) -> Self {
        let value = limits.clamp(value);
        Self {
            upper: upper_action(value, limits),
            lower: lower_action(value, limits),
        }
    }
}

fn upper_action(value: i32, limits: &ThresholdLimits) -> ThresholdAction {
    let candidate = value.saturating_add(limits.step()).min(limits.max());
    if value >= candidate {
        ThresholdAction::Disable
    } else {
        ThresholdAction::Arm(candidate)
    }
}

fn lower_action(value: i32, limits: &ThresholdLimits) -> ThresholdAction {
    if value == 0 || value <= limits.min() {
        return ThresholdAction::Disable;
    }

    let candidate = value.saturating_sub(limits.step()).max(limits.min());
    // A falling threshold at 0 can never be crossed.
    ThresholdAction::Arm(candidate.max(1))
}
