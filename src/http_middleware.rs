use axum::body::Body;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::{StatusCode, Uri};
use tower::{Layer, Service};

/// Largest error body the canonicalizing middleware will buffer. Error
/// responses here are short code tokens; anything bigger passes through
/// untouched semantics-wise but fails safe.
const MAX_BUFFERED_ERROR_BODY: usize = 64 * 1024;

/// Rewrites `/bucket/` to `/bucket` so both spellings address the bucket,
/// while deeper paths keep their trailing slash: `folder/` and `folder` are
/// distinct object keys.
///
/// Must wrap the router from the outside — middleware added with
/// `Router::layer` runs after routing, too late to affect the match.
#[derive(Debug, Clone, Copy, Default)]
pub struct StripBucketSlashLayer;

impl<S> Layer<S> for StripBucketSlashLayer {
    type Service = StripBucketSlash<S>;

    fn layer(&self, inner: S) -> Self::Service {
        StripBucketSlash { inner }
    }
}

#[derive(Debug, Clone)]
pub struct StripBucketSlash<S> {
    inner: S,
}

impl<S, B> Service<http::Request<B>> for StripBucketSlash<S>
where
    S: Service<http::Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: http::Request<B>) -> Self::Future {
        if let Some(stripped) = strip_bucket_slash(req.uri().path()) {
            set_request_path(&mut req, &stripped);
        }
        self.inner.call(req)
    }
}

/// Returns the rewritten path for bucket-only paths with a trailing slash,
/// `None` when the path must stay as-is.
fn strip_bucket_slash(path: &str) -> Option<String> {
    if path == "/" {
        return None;
    }

    // Exactly two slashes, leading and trailing, means a bucket-only path
    // like `/photos/`.
    let slash_count = path.matches('/').count();
    if slash_count == 2 && path.starts_with('/') && path.ends_with('/') {
        return Some(path[..path.len() - 1].to_owned());
    }

    None
}

fn set_request_path<B>(req: &mut http::Request<B>, new_path: &str) {
    let mut parts = req.uri().clone().into_parts();

    let path_and_query = match req.uri().query() {
        Some(query) => format!("{new_path}?{query}"),
        None => new_path.to_owned(),
    };

    if let Ok(path_and_query) = path_and_query.parse() {
        parts.path_and_query = Some(path_and_query);
        if let Ok(uri) = Uri::from_parts(parts) {
            *req.uri_mut() = uri;
        }
    }
}

/// Buffers 404 and 405 responses from the router. A response that carries a
/// body (a handler spoke) flushes through unchanged; a bare 405 or 404 is
/// rewritten to a canonical 404, because an S3 surface has no
/// method-not-allowed concept.
pub async fn canonical_errors(request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    let status = response.status();
    if status != StatusCode::NOT_FOUND && status != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_BUFFERED_ERROR_BODY).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "InternalError").into_response();
        }
    };

    if !bytes.is_empty() {
        return Response::from_parts(parts, Body::from(bytes));
    }

    (StatusCode::NOT_FOUND, "page not found").into_response()
}
