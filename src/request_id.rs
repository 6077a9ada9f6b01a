use std::sync::LazyLock;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use http::HeaderValue;
use regex::Regex;
use tonic::metadata::AsciiMetadataValue;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

static SAFE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]{1,128}$").unwrap());

/// The id correlating one client request across the gateway, the metadata
/// service, and the storage node. Stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Accepts a well-formed inbound `X-Request-ID` or mints a fresh ULID, then
/// carries the id on the request extensions, the inbound headers (so
/// downstream layers see it), and the response headers.
pub async fn propagate(mut request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| SAFE_ID.is_match(v))
        .map(ToOwned::to_owned)
        .unwrap_or_else(crate::id::new_id);

    // The accepted charset is header-safe by construction.
    let header_value =
        HeaderValue::from_str(&id).expect("request id is a valid header value");

    request.extensions_mut().insert(RequestId(id.clone()));
    request
        .headers_mut()
        .insert(REQUEST_ID_HEADER, header_value.clone());

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(REQUEST_ID_HEADER, header_value);
    response
}

/// Appends `x-request-id` to outbound RPC call metadata, for unary and
/// streaming calls alike.
#[derive(Clone)]
pub struct RequestIdInterceptor(Option<AsciiMetadataValue>);

impl RequestIdInterceptor {
    pub fn new(id: &str) -> Self {
        Self(AsciiMetadataValue::try_from(id).ok())
    }
}

impl tonic::service::Interceptor for RequestIdInterceptor {
    fn call(
        &mut self,
        mut request: tonic::Request<()>,
    ) -> Result<tonic::Request<()>, tonic::Status> {
        if let Some(id) = self.0.as_ref() {
            request.metadata_mut().insert(REQUEST_ID_HEADER, id.clone());
        }
        Ok(request)
    }
}
