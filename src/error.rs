use std::panic::Location;

use tracing::error;

/// Logs an error that is about to be surfaced to a caller as `Internal`,
/// keeping the call site and the span trace with the record.
#[inline]
#[track_caller]
pub fn log_internal(source: &dyn std::error::Error) {
    let location = Location::caller();
    let span_trace = tracing_error::SpanTrace::capture();

    error!(
        target: "stowage",
        %location,
        error = %source,
        "span trace:\n{span_trace}"
    );
}
