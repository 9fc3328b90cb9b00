//! The monitor loop.
//!
//! Arms the thresholds once at start-up, then waits for threshold
//! events on the configured channel. Every matching event triggers a
//! read-and-rearm, and every successfully read sample is passed to the
//! callback.

use std::future::Future;

use volmon_core::source::SampleSource;
use volmon_core::tracker::ThresholdTracker;

use crate::callback::CallbackInvoker;
use crate::error::AgentError;
use crate::events::EventStream;

pub struct Monitor<S, C> {
    tracker: ThresholdTracker<S>,
    invoker: C,
    channel: u32,
}

impl<S: SampleSource, C: CallbackInvoker> Monitor<S, C> {
    pub fn new(tracker: ThresholdTracker<S>, invoker: C, channel: u32) -> Self {
        Self {
            tracker,
            invoker,
            channel,
        }
    }

    pub fn tracker(&self) -> &ThresholdTracker<S> {
        &self.tracker
    }

    pub fn invoker(&self) -> &C {
        &self.invoker
    }

    /// Run until `shutdown` resolves or the event stream fails.
    ///
    /// Returns `Ok(())` on shutdown. Read errors on the sample and
    /// callback failures are logged and do not stop the loop.
    pub async fn run<F>(&mut self, events: &mut EventStream, shutdown: F) -> Result<(), AgentError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        self.rearm_and_notify();

        loop {
            let event = tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("Monitor stopping");
                    return Ok(());
                }
                event = events.next_event() => event?,
            };

            if !event.code.is_threshold_crossing(self.channel) {
                tracing::trace!(id = event.code.raw(), "Ignoring foreign event");
                continue;
            }

            tracing::debug!(
                direction = ?event.code.direction(),
                timestamp = event.timestamp,
                "Threshold crossed",
            );

            self.rearm_and_notify();
        }
    }

    /// One read-and-rearm followed by the callback on success.
    pub fn rearm_and_notify(&mut self) {
        let outcome = match self.tracker.read_and_rearm() {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "Skipping callback");
                return;
            }
        };

        tracing::info!(value = outcome.value, "Input changed");

        if let Err(e) = self.invoker.invoke(outcome.value) {
            tracing::warn!(value = outcome.value, error = %e, "Callback failed");
        }
    }
}
