//! Metrics emitted through the `metrics` facade
//!
//! No recorder is installed here; hosts that want these numbers install
//! their own exporter.

use std::time::Duration;

use metrics::{counter, histogram};

use crate::domain::Scope;

/// Record a completed scope switch
pub fn record_scope_switch(to: Scope) {
    counter!("scope_switches_total", "scope" => to.as_str()).increment(1);
}

/// Record a failed restore, `fallback` marks the second attempt
pub fn record_restore_failure(scope: Scope, fallback: bool) {
    let stage = if fallback { "fallback" } else { "restore" };
    counter!("scope_restore_failures_total", "scope" => scope.as_str(), "stage" => stage)
        .increment(1);
}

/// Record one scoped callback execution
pub fn record_scoped_call(scope: Scope, depth: usize, duration: Duration, success: bool) {
    let labels = [
        ("scope", scope.as_str().to_string()),
        ("depth", depth.to_string()),
        ("status", if success { "success" } else { "error" }.to_string()),
    ];

    histogram!("scoped_call_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Parameters for intercepted request metrics
pub struct InterceptedRequestMetricParams<'a> {
    pub entry_point: &'a str,
    /// `None` for requests that carried their own override
    pub scope: Option<Scope>,
    pub custom: bool,
    pub duration: Duration,
    pub success: bool,
}

/// Record an intercepted generation request
pub fn record_intercepted_request(params: InterceptedRequestMetricParams) {
    let labels = [
        ("entry_point", params.entry_point.to_string()),
        ("scope", params.scope.map_or("explicit", |s| s.as_str()).to_string()),
        ("backend", if params.custom { "custom" } else { "default" }.to_string()),
    ];

    counter!("intercepted_requests_total", &labels).increment(1);
    histogram!("intercepted_request_duration_seconds", &labels)
        .record(params.duration.as_secs_f64());

    if !params.success {
        counter!("intercepted_request_errors_total", &labels).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_scope_switch(Scope::InnerWorld);
        record_restore_failure(Scope::Sanctuary, true);
        record_scoped_call(Scope::RealWorld, 1, Duration::from_millis(5), false);
        record_intercepted_request(InterceptedRequestMetricParams {
            entry_point: "issue_request",
            scope: Some(Scope::RealWorld),
            custom: false,
            duration: Duration::from_millis(12),
            success: true,
        });
    }
}
