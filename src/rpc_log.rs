use std::any::Any;

use bytes::Bytes;
use http_body_util::Full;
use tower_http::catch_panic::ResponseForPanic;
use tracing::Span;

use crate::request_id::REQUEST_ID_HEADER;

/// Span for one inbound RPC, carrying the method path and the request id
/// propagated by the caller. Plug into
/// `TraceLayer::new_for_grpc().make_span_with(rpc_log::make_span)`.
pub fn make_span<B>(request: &http::Request<B>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    tracing::info_span!(
        "rpc",
        method = %request.uri().path(),
        request_id = %request_id,
    )
}

/// Recovery layer handler: a panic in an RPC handler becomes a trailers-only
/// `Internal` response, with the panic message and captured backtrace kept in
/// the log record.
#[derive(Debug, Clone, Copy)]
pub struct PanicToStatus;

impl ResponseForPanic for PanicToStatus {
    type ResponseBody = Full<Bytes>;

    fn response_for_panic(
        &mut self,
        err: Box<dyn Any + Send + 'static>,
    ) -> http::Response<Self::ResponseBody> {
        let detail = panic_message(err.as_ref());
        let backtrace = std::backtrace::Backtrace::force_capture();
        tracing::error!(target: "stowage", panic = %detail, "rpc handler panicked\n{backtrace}");

        let mut response = http::Response::new(Full::new(Bytes::new()));
        let headers = response.headers_mut();
        headers.insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/grpc"),
        );
        // tonic::Code::Internal
        headers.insert("grpc-status", http::HeaderValue::from_static("13"));

        let message: String = detail
            .chars()
            .filter(|c| c.is_ascii_graphic() || *c == ' ')
            .collect();
        if let Ok(value) = http::HeaderValue::from_str(&message) {
            headers.insert("grpc-message", value);
        }

        response
    }
}

fn panic_message(err: &(dyn Any + Send)) -> String {
    if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_owned()
    } else {
        "panic".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_becomes_a_grpc_internal_response() {
        let response =
            PanicToStatus.response_for_panic(Box::new("intentional test panic".to_owned()));

        assert_eq!(response.status(), http::StatusCode::OK);
        assert_eq!(
            response.headers().get("grpc-status").unwrap(),
            "13",
            "panics must surface as Internal"
        );
        assert_eq!(
            response.headers().get("grpc-message").unwrap(),
            "intentional test panic"
        );
        assert_eq!(
            response.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "application/grpc"
        );
    }

    #[test]
    fn unprintable_panic_payloads_still_produce_a_status() {
        let response = PanicToStatus.response_for_panic(Box::new(42_u32));
        assert_eq!(response.headers().get("grpc-status").unwrap(), "13");
        assert_eq!(response.headers().get("grpc-message").unwrap(), "panic");
    }
}
