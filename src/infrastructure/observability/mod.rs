//! Observability infrastructure - Metrics

mod metrics;

pub use metrics::{
    record_intercepted_request, record_restore_failure, record_scope_switch, record_scoped_call,
    InterceptedRequestMetricParams,
};
