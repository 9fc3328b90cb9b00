//! The Threshold Tracker.
//!
//! [`ThresholdTracker`] owns a [`SampleSource`] and keeps its rising and
//! falling thresholds bracketed around the last observed sample, so the
//! driver only raises an event once the input has moved by at least
//! `step`.
//!
//! Threshold writes are best effort. A failed write is logged, recorded
//! in the returned [`RearmOutcome`] and leaves that threshold
//! [`ThresholdState::Indeterminate`]; the sample itself is still
//! reported. Only a failed sample read is an error.

use std::fmt;

use crate::limits::ThresholdLimits;
use crate::source::{SampleSource, SourceError};
use crate::thresholds::{ThresholdAction, ThresholdPlan};

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// The sample could not be read. Nothing was written; try again on
    /// the next event.
    #[error("Error reading current value: {0}")]
    SampleRead(#[source] SourceError),
}

/// Which of the two thresholds an operation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threshold {
    Upper,
    Lower,
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::Upper => f.write_str("upper"),
            Threshold::Lower => f.write_str("lower"),
        }
    }
}

/// Last known state of one threshold as written by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdState {
    Disabled,
    Armed(i32),
    /// Never written yet, or the last write failed part way.
    Indeterminate,
}

/// Coarse tracker phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerPhase {
    /// No threshold is known to be armed (including before the first read).
    Unarmed,
    /// At least one threshold is armed around the last value.
    Armed,
}

/// Mutable tracker state, mirrored from what was written to the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerState {
    pub last_value: Option<i32>,
    pub upper: ThresholdState,
    pub lower: ThresholdState,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self {
            last_value: None,
            upper: ThresholdState::Indeterminate,
            lower: ThresholdState::Indeterminate,
        }
    }
}

impl TrackerState {
    pub fn phase(&self) -> TrackerPhase {
        let armed = |s: ThresholdState| matches!(s, ThresholdState::Armed(_));
        if self.last_value.is_some() && (armed(self.upper) || armed(self.lower)) {
            TrackerPhase::Armed
        } else {
            TrackerPhase::Unarmed
        }
    }
}

/// A threshold write that failed during a rearm.
#[derive(Debug)]
pub struct ThresholdFailure {
    pub threshold: Threshold,
    pub action: ThresholdAction,
    pub error: SourceError,
}

/// Result of a successful [`ThresholdTracker::read_and_rearm`].
#[derive(Debug)]
pub struct RearmOutcome {
    /// The sample that was read, clamped to `[min, max]`.
    pub value: i32,
    /// The plan that was applied.
    pub plan: ThresholdPlan,
    /// Non-fatal threshold write failures, if any.
    pub failures: Vec<ThresholdFailure>,
}

impl RearmOutcome {
    /// `true` when every threshold write succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct ThresholdTracker<S> {
    source: S,
    limits: ThresholdLimits,
    state: TrackerState,
}

impl<S: SampleSource> ThresholdTracker<S> {
    pub fn new(source: S, limits: ThresholdLimits) -> Self {
        Self {
            source,
            limits,
            state: TrackerState::default(),
        }
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn limits(&self) -> &ThresholdLimits {
        &self.limits
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Read the current sample and re-arm both thresholds around it.
    ///
    /// A sample outside `[min, max]` is clamped to the nearest limit
    /// before the thresholds are placed; the clamped value is what the
    /// outcome reports. On a read failure no threshold is touched and the
    /// state is left as it was.
    pub fn read_and_rearm(&mut self) -> Result<RearmOutcome, TrackerError> {
        let raw = self.source.read_value().map_err(TrackerError::SampleRead)?;
        let value = self.limits.clamp(raw);
        if value != raw {
            tracing::debug!(raw, value, "Sample outside limits, clamped");
        }

        let plan = ThresholdPlan::for_value(value, &self.limits);
        tracing::debug!(
            value,
            min = self.limits.min(),
            max = self.limits.max(),
            step = self.limits.step(),
            ?plan,
            "Re-arming thresholds",
        );

        let mut failures = Vec::new();

        let upper = self.apply(Threshold::Upper, plan.upper);
        self.state.upper = record(Threshold::Upper, plan.upper, upper, &mut failures);

        let lower = self.apply(Threshold::Lower, plan.lower);
        self.state.lower = record(Threshold::Lower, plan.lower, lower, &mut failures);

        self.state.last_value = Some(value);

        Ok(RearmOutcome {
            value,
            plan,
            failures,
        })
    }

    fn apply(&mut self, threshold: Threshold, action: ThresholdAction) -> Result<(), SourceError> {
        match (threshold, action) {
            (Threshold::Upper, ThresholdAction::Arm(v)) => self.source.enable_upper(v),
            (Threshold::Upper, ThresholdAction::Disable) => self.source.disable_upper(),
            (Threshold::Lower, ThresholdAction::Arm(v)) => self.source.enable_lower(v),
            (Threshold::Lower, ThresholdAction::Disable) => self.source.disable_lower(),
        }
    }
}

fn record(
    threshold: Threshold,
    action: ThresholdAction,
    result: Result<(), SourceError>,
    failures: &mut Vec<ThresholdFailure>,
) -> ThresholdState {
    match result {
        Ok(()) => match action {
            ThresholdAction::Arm(v) => ThresholdState::Armed(v),
            ThresholdAction::Disable => ThresholdState::Disabled,
        },
        Err(error) => {
            match action {
                ThresholdAction::Arm(v) => tracing::warn!(
                    %threshold,
                    threshold_value = v,
                    error = %error,
                    "Failed to enable threshold",
                ),
                ThresholdAction::Disable => tracing::warn!(
                    %threshold,
                    error = %error,
                    "Failed to disable threshold",
                ),
            }
            failures.push(ThresholdFailure {
                threshold,
                action,
                error,
            });
            ThresholdState::Indeterminate
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    /// Source whose read and write results are scripted per test.
    #[derive(Default)]
    struct Scripted {
        value: Option<i32>,
        fail_upper: bool,
        writes: usize,
    }

    impl SampleSource for Scripted {
        fn read_value(&mut self) -> Result<i32, SourceError> {
            self.value
                .ok_or_else(|| SourceError::new("read_value", "no sample"))
        }

        fn enable_upper(&mut self, _threshold: i32) -> Result<(), SourceError> {
            self.writes += 1;
            if self.fail_upper {
                return Err(SourceError::new("enable_upper", "EBUSY"));
            }
            Ok(())
        }

        fn disable_upper(&mut self) -> Result<(), SourceError> {
            self.writes += 1;
            Ok(())
        }

        fn enable_lower(&mut self, _threshold: i32) -> Result<(), SourceError> {
            self.writes += 1;
            Ok(())
        }

        fn disable_lower(&mut self) -> Result<(), SourceError> {
            self.writes += 1;
            Ok(())
        }
    }

    #[test]
    fn starts_unarmed() {
        let tracker = ThresholdTracker::new(Scripted::default(), ThresholdLimits::default());
        assert_eq!(tracker.state().phase(), TrackerPhase::Unarmed);
        assert_eq!(tracker.state().last_value, None);
    }

    #[test]
    fn read_failure_leaves_state_untouched() {
        let mut tracker = ThresholdTracker::new(Scripted::default(), ThresholdLimits::default());
        assert_matches!(tracker.read_and_rearm(), Err(TrackerError::SampleRead(_)));
        assert_eq!(tracker.source().writes, 0);
        assert_eq!(tracker.state(), &TrackerState::default());
    }

    #[test]
    fn write_failure_is_not_fatal() {
        let source = Scripted {
            value: Some(100),
            fail_upper: true,
            writes: 0,
        };
        let limits = ThresholdLimits::new(0, 0x7FF, 10).unwrap();
        let mut tracker = ThresholdTracker::new(source, limits);

        let outcome = tracker.read_and_rearm().unwrap();
        assert_eq!(outcome.value, 100);
        assert!(!outcome.is_clean());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].threshold, Threshold::Upper);
        assert_eq!(outcome.failures[0].action, ThresholdAction::Arm(110));

        assert_eq!(tracker.state().upper, ThresholdState::Indeterminate);
        assert_eq!(tracker.state().lower, ThresholdState::Armed(90));
        assert_eq!(tracker.state().phase(), TrackerPhase::Armed);
    }

    #[test]
    fn unarmed_when_both_thresholds_disabled() {
        let source = Scripted {
            value: Some(7),
            ..Default::default()
        };
        let limits = ThresholdLimits::new(7, 7, 1).unwrap();
        let mut tracker = ThresholdTracker::new(source, limits);

        let outcome = tracker.read_and_rearm().unwrap();
        assert!(outcome.is_clean());
        assert_eq!(tracker.state().upper, ThresholdState::Disabled);
        assert_eq!(tracker.state().lower, ThresholdState::Disabled);
        assert_eq!(tracker.state().phase(), TrackerPhase::Unarmed);
    }
}
