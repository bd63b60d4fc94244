//! Pipeline metrics
//!
//! Counters through the `metrics` facade:
//!
//! - `api_requests_total` (counter): labels `method`, `status`
//! - `session_refreshes_total` (counter): label `outcome`
//! - `session_terminations_total` (counter)
//!
//! Installing a recorder is the embedding application's concern; without one
//! every call here is a no-op.

/// Record a completed request attempt with method and status labels.
///
/// Both the initial attempt and a refresh-driven retry are recorded, so a
/// 401-then-200 sequence shows up as two data points.
pub fn record_request(method: &str, status: u16) {
    metrics::counter!(
        "api_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a settled refresh with its outcome label
/// (`success`, `failure`, or `stale` for a result discarded after logout).
pub fn record_refresh(outcome: &'static str) {
    metrics::counter!("session_refreshes_total", "outcome" => outcome).increment(1);
}

/// Record a session termination.
pub fn record_termination() {
    metrics::counter!("session_terminations_total").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        // Without an installed recorder, metrics calls are no-ops
        record_request("GET", 200);
        record_refresh("success");
        record_termination();
    }

    /// Isolated recorder/handle pair. build_recorder() avoids the global
    /// recorder singleton constraint: only one global recorder can exist
    /// per process.
    fn isolated_recorder() -> (PrometheusRecorder, PrometheusHandle) {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        (recorder, handle)
    }

    #[test]
    fn request_counter_carries_method_and_status_labels() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_request("GET", 200);
        record_request("POST", 401);

        let output = handle.render();
        assert!(output.contains("api_requests_total"));
        assert!(output.contains("method=\"GET\""));
        assert!(output.contains("status=\"200\""));
        assert!(output.contains("method=\"POST\""));
        assert!(output.contains("status=\"401\""));
    }

    #[test]
    fn refresh_counter_carries_outcome_label() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_refresh("success");
        record_refresh("failure");

        let output = handle.render();
        assert!(output.contains("session_refreshes_total"));
        assert!(output.contains("outcome=\"success\""));
        assert!(output.contains("outcome=\"failure\""));
    }

    #[test]
    fn termination_counter_renders() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_termination();

        let output = handle.render();
        assert!(output.contains("session_terminations_total"));
    }
}
