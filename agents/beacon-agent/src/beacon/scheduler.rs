//! Beacon Scheduler
//!
//! Owns the phone-home loop: wait, probe, pick the next delay from the
//! outcome, repeat until cancelled.

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use crate::beacon::sink::LogSink;
use crate::beacon::state::BeaconStateManager;
use crate::cli::duration::format_duration;
use crate::error::StartupError;
use crate::probe::executor::{HttpProbe, Probe, ProbeOutcome};

/// The duration triple, fixed for the process lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeaconTimings {
    /// Per-request HTTP timeout
    pub timeout: Duration,
    /// Wait after a failed probe
    pub retry: Duration,
    /// Wait after a successful probe
    pub interval: Duration,
}

impl BeaconTimings {
    /// Delay to wait after a probe with the given outcome
    pub fn next_delay(&self, outcome: &ProbeOutcome) -> Duration {
        match outcome {
            ProbeOutcome::Success => self.interval,
            ProbeOutcome::Failure(_) => self.retry,
        }
    }
}

/// Parse the collector URL before the loop starts
pub fn parse_target_url(input: &str) -> Result<Url, StartupError> {
    Url::parse(input).map_err(|source| StartupError::InvalidUrl {
        input: input.to_string(),
        source,
    })
}

/// The phone-home loop
///
/// Holds the single target URL for its whole life and lends it to one probe
/// at a time.
pub struct Scheduler<P: Probe, S: LogSink> {
    target: Url,
    timings: BeaconTimings,
    probe: P,
    sink: S,
    state: BeaconStateManager,
}

impl<P: Probe, S: LogSink> Scheduler<P, S> {
    /// Create a new scheduler
    pub fn new(target: Url, timings: BeaconTimings, probe: P, sink: S) -> Self {
        Self {
            target,
            timings,
            probe,
            sink,
            state: BeaconStateManager::new(),
        }
    }

    /// Track state in an externally held manager
    pub fn with_state(mut self, state: BeaconStateManager) -> Self {
        self.state = state;
        self
    }

    /// The target URL as last stamped
    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn state(&self) -> &BeaconStateManager {
        &self.state
    }

    /// Run until `cancel` is signaled
    ///
    /// Cancellation is only observed while waiting; a probe in flight runs
    /// to completion first.
    pub async fn run(&mut self, cancel: &CancellationToken) {
        let mut delay = Duration::ZERO;
        self.state.set_waiting(delay);

        info!(
            url = %self.target,
            timeout = %format_duration(self.timings.timeout),
            retry = %format_duration(self.timings.retry),
            interval = %format_duration(self.timings.interval),
            "Beacon started"
        );

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    self.state.set_terminated();
                    info!(
                        probes = self.state.probes_attempted(),
                        consecutive_failures = self.state.consecutive_failures(),
                        last_success = ?self.state.last_success(),
                        last_error = ?self.state.last_error(),
                        "Beacon stopped"
                    );
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            self.state.set_probing();
            let outcome = ProbeOutcome::from(self.probe.probe(&mut self.target).await);
            self.state.record_outcome(&outcome);

            match &outcome {
                ProbeOutcome::Success => self.sink.append("Success: phoned home"),
                ProbeOutcome::Failure(reason) => self.sink.append(&format!("Error: {}", reason)),
            }

            delay = self.timings.next_delay(&outcome);
            self.sink
                .append(&format!("Sleeping for: {}", format_duration(delay)));

            debug!(
                consecutive_failures = self.state.consecutive_failures(),
                "Probe cycle complete"
            );
            self.state.set_waiting(delay);
        }
    }
}

/// Phone home with the production probe until cancelled
///
/// Builds one HTTP client bounded by `timings.timeout` and reuses it for
/// every probe.
pub async fn phone_forever<S: LogSink>(
    target: Url,
    timings: BeaconTimings,
    lookup_addr: &str,
    sink: S,
    cancel: &CancellationToken,
) -> Result<(), StartupError> {
    let probe = HttpProbe::with_timeout(timings.timeout, lookup_addr)?;
    Scheduler::new(target, timings, probe, sink).run(cancel).await;
    Ok(())
}
