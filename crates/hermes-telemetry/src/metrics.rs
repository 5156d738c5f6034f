//! Request metrics.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Counter of finished requests.
pub const REQUESTS_TOTAL: &str = "hermes_requests_total";

/// Histogram of request durations in seconds.
pub const REQUEST_DURATION_SECONDS: &str = "hermes_request_duration_seconds";

/// How a request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The handler produced a response.
    Success,
    /// Extraction, a hook or the handler failed.
    Failure,
}

impl RequestOutcome {
    /// Returns the label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// Registers descriptions for the standard metrics with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(REQUESTS_TOTAL, "Total number of dispatched requests");
    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "Dispatch duration in seconds"
    );
}

/// Records one finished request.
pub fn record_request(handler: &str, outcome: RequestOutcome, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "handler" => handler.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);

    histogram!(REQUEST_DURATION_SECONDS, "handler" => handler.to_string())
        .record(duration.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(RequestOutcome::Success.as_str(), "success");
        assert_eq!(RequestOutcome::Failure.as_str(), "failure");
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        describe_metrics();
        record_request("Users.list", RequestOutcome::Success, Duration::from_millis(3));
    }
}
