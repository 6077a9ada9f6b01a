use std::pin::Pin;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, Request, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Extension, Json, Router};
use bytes::Bytes;
use futures::TryStreamExt;
use http::{header, StatusCode};
use http_body_util::Full;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;
use tonic::Code;
use tower_http::catch_panic::{CatchPanicLayer, ResponseForPanic};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::http_middleware;
use crate::metadata_client::MetadataApi;
use crate::request_id::{self, RequestId};
use crate::storage_client::StorageApi;
use crate::validation::{validate_bucket_name, validate_key, MAX_OBJECT_SIZE};

/// Shared state for the gateway handlers: the two RPC client seams.
pub struct AppState {
    pub metadata: Arc<dyn MetadataApi>,
    pub storage: Arc<dyn StorageApi>,
}

/// An S3-style error. The status code is the contract; the body carries a
/// short code token for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str) -> Self {
        Self { status, code }
    }

    fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "InternalError")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.code).into_response()
    }
}

/// Builds the gateway router with its middleware stack. The caller must wrap
/// the result in [`http_middleware::StripBucketSlashLayer`] before serving;
/// path rewriting has to happen before routing, which inner layers cannot do.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(list_buckets))
        .route("/{bucket}", put(create_bucket))
        .route("/{bucket}/{*key}", put(put_object))
        .with_state(state)
        .layer(axum::middleware::from_fn(http_middleware::canonical_errors))
        .layer(CatchPanicLayer::custom(PanicToInternalError))
        .layer(TraceLayer::new_for_http().make_span_with(make_http_span))
        .layer(axum::middleware::from_fn(request_id::propagate))
}

/// Recovery middleware: a panicking handler surfaces as a plain
/// `500 InternalError`, with the panic message and backtrace kept in the log
/// record.
#[derive(Debug, Clone, Copy)]
struct PanicToInternalError;

impl ResponseForPanic for PanicToInternalError {
    type ResponseBody = Full<Bytes>;

    fn response_for_panic(
        &mut self,
        err: Box<dyn std::any::Any + Send + 'static>,
    ) -> http::Response<Self::ResponseBody> {
        let detail = if let Some(s) = err.downcast_ref::<String>() {
            s.clone()
        } else if let Some(s) = err.downcast_ref::<&str>() {
            (*s).to_owned()
        } else {
            "panic".to_owned()
        };
        let backtrace = std::backtrace::Backtrace::force_capture();
        tracing::error!(target: "stowage", panic = %detail, "http handler panicked\n{backtrace}");

        let mut response =
            http::Response::new(Full::new(Bytes::from_static(b"InternalError")));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
    }
}

fn make_http_span(request: &http::Request<Body>) -> tracing::Span {
    let request_id = request
        .headers()
        .get(request_id::REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    tracing::info_span!(
        "http",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
    )
}

/// `PUT /{bucket}/{key...}` — admit the request, obtain a write plan, stream
/// the body to the planned storage node, and re-check the size contract on
/// both ends.
async fn put_object(
    State(state): State<Arc<AppState>>,
    Path((bucket, key)): Path<(String, String)>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    request: Request,
) -> Result<Response, ApiError> {
    // Chunked uploads are refused outright: the declared size is contractual.
    if request.headers().contains_key(header::TRANSFER_ENCODING) {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "InvalidRequest"));
    }

    let content_length = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok());
    let Some(content_length) = content_length else {
        return Err(ApiError::new(
            StatusCode::LENGTH_REQUIRED,
            "MissingContentLength",
        ));
    };
    if content_length <= 0 {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "InvalidArgument"));
    }
    if content_length > MAX_OBJECT_SIZE {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "EntityTooLarge"));
    }

    if validate_bucket_name(&bucket).is_err() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "InvalidBucketName"));
    }
    if validate_key(&key).is_err() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "InvalidKeyName"));
    }

    let plan = state
        .metadata
        .plan_write(&request_id, &bucket, &key, content_length)
        .await
        .map_err(map_plan_error)?;

    let body = request
        .into_body()
        .into_data_stream()
        .map_err(std::io::Error::other);
    let reader: Pin<Box<dyn AsyncRead + Send>> = Box::pin(StreamReader::new(body));

    let receipt = state
        .storage
        .write_object(
            &request_id,
            &plan.storage_address,
            &plan.object_id,
            &bucket,
            content_length,
            reader,
        )
        .await
        .map_err(|e| {
            crate::error::log_internal(&e);
            ApiError::internal()
        })?;

    if receipt.bytes_written != content_length {
        tracing::error!(
            bytes_written = receipt.bytes_written,
            content_length,
            object_id = %plan.object_id,
            "storage node reported a different byte count than declared"
        );
        return Err(ApiError::internal());
    }

    info!(
        bucket = %bucket,
        key = %key,
        object_id = %plan.object_id,
        bytes = receipt.bytes_written,
        "object stored"
    );

    Ok(StatusCode::OK.into_response())
}

fn map_plan_error(status: tonic::Status) -> ApiError {
    match status.code() {
        Code::NotFound => ApiError::new(StatusCode::NOT_FOUND, "NoSuchBucket"),
        Code::PermissionDenied => ApiError::new(StatusCode::FORBIDDEN, "AccessDenied"),
        Code::FailedPrecondition => {
            ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "ServiceUnavailable")
        }
        _ => {
            crate::error::log_internal(&status);
            ApiError::internal()
        }
    }
}

/// `PUT /{bucket}` — create a bucket.
async fn create_bucket(
    State(state): State<Arc<AppState>>,
    Path(bucket): Path<String>,
    Extension(RequestId(request_id)): Extension<RequestId>,
) -> Result<Response, ApiError> {
    if validate_bucket_name(&bucket).is_err() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "InvalidBucketName"));
    }

    let created = state
        .metadata
        .create_bucket(&request_id, &bucket)
        .await
        .map_err(|status| match status.code() {
            // Both ownership flavors collapse to one conflict until there is
            // an auth model to tell them apart.
            Code::AlreadyExists => ApiError::new(StatusCode::CONFLICT, "BucketAlreadyExists"),
            Code::InvalidArgument => ApiError::new(StatusCode::BAD_REQUEST, "InvalidBucketName"),
            _ => {
                crate::error::log_internal(&status);
                ApiError::internal()
            }
        })?;

    info!(bucket = %created.name, bucket_id = %created.id, "bucket created");

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/{}", created.name))],
    )
        .into_response())
}

#[derive(Debug, Serialize)]
struct BucketListing {
    buckets: Vec<BucketEntry>,
}

#[derive(Debug, Serialize)]
struct BucketEntry {
    name: String,
    created_at: String,
}

/// `GET /` — list buckets as JSON.
async fn list_buckets(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
) -> Result<Json<BucketListing>, ApiError> {
    let buckets = state
        .metadata
        .list_buckets(&request_id)
        .await
        .map_err(|status| {
            crate::error::log_internal(&status);
            ApiError::internal()
        })?;

    let buckets = buckets
        .into_iter()
        .map(|b| BucketEntry {
            created_at: format_micros(b.created_at_us),
            name: b.name,
        })
        .collect();

    Ok(Json(BucketListing { buckets }))
}

fn format_micros(us: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(us) * 1_000)
        .ok()
        .and_then(|t| t.format(&Rfc3339).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tokio::io::AsyncReadExt;
    use tonic::Status;
    use tower::ServiceExt;

    use super::*;
    use crate::metadata_client::WritePlan;
    use crate::proto::metadata::v1 as pb;
    use crate::storage_client::{WriteObjectError, WriteReceipt};

    #[derive(Default)]
    struct MetadataStub {
        plan_error: Option<Status>,
        plan_calls: Mutex<Vec<(String, String, i64)>>,
        create_error: Option<Status>,
        create_calls: Mutex<Vec<String>>,
        listing: Vec<pb::Bucket>,
    }

    #[async_trait::async_trait]
    impl MetadataApi for MetadataStub {
        async fn plan_write(
            &self,
            _request_id: &str,
            bucket: &str,
            key: &str,
            size: i64,
        ) -> Result<WritePlan, Status> {
            self.plan_calls
                .lock()
                .unwrap()
                .push((bucket.to_owned(), key.to_owned(), size));
            if let Some(status) = &self.plan_error {
                return Err(status.clone());
            }
            Ok(WritePlan {
                object_id: "01ARZ3NDEKTSV4RRFFQ69G5FAV".to_owned(),
                storage_address: "localhost:9444".to_owned(),
            })
        }

        async fn create_bucket(&self, _request_id: &str, name: &str) -> Result<pb::Bucket, Status> {
            self.create_calls.lock().unwrap().push(name.to_owned());
            if let Some(status) = &self.create_error {
                return Err(status.clone());
            }
            Ok(pb::Bucket {
                id: "01BUCKETID".to_owned(),
                name: name.to_owned(),
                created_at_us: 1_700_000_000_000_000,
                updated_at_us: 1_700_000_000_000_000,
            })
        }

        async fn list_buckets(&self, _request_id: &str) -> Result<Vec<pb::Bucket>, Status> {
            Ok(self.listing.clone())
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct StorageCall {
        address: String,
        object_id: String,
        bucket: String,
        size: i64,
        body: Vec<u8>,
    }

    #[derive(Default)]
    struct StorageStub {
        bytes_written_override: Option<i64>,
        fail_rpc: bool,
        calls: Mutex<Vec<StorageCall>>,
    }

    #[async_trait::async_trait]
    impl StorageApi for StorageStub {
        async fn write_object(
            &self,
            _request_id: &str,
            address: &str,
            object_id: &str,
            bucket: &str,
            size: i64,
            mut body: Pin<Box<dyn AsyncRead + Send>>,
        ) -> Result<WriteReceipt, WriteObjectError> {
            let mut bytes = Vec::new();
            body.read_to_end(&mut bytes)
                .await
                .map_err(WriteObjectError::Body)?;

            self.calls.lock().unwrap().push(StorageCall {
                address: address.to_owned(),
                object_id: object_id.to_owned(),
                bucket: bucket.to_owned(),
                size,
                body: bytes.clone(),
            });

            if self.fail_rpc {
                return Err(WriteObjectError::Rpc(Status::unavailable(
                    "storage node unreachable",
                )));
            }

            Ok(WriteReceipt {
                bytes_written: self.bytes_written_override.unwrap_or(bytes.len() as i64),
                committed_at_ms: 1_700_000_000_000,
            })
        }
    }

    fn app(metadata: Arc<MetadataStub>, storage: Arc<StorageStub>) -> Router {
        router(Arc::new(AppState { metadata, storage }))
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn put_request(uri: &str, content_length: Option<&str>, body: &'static str) -> Request {
        let mut builder = http::Request::builder().method("PUT").uri(uri);
        if let Some(cl) = content_length {
            builder = builder.header(header::CONTENT_LENGTH, cl);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn put_object_streams_the_body_and_replies_200() {
        let metadata = Arc::new(MetadataStub::default());
        let storage = Arc::new(StorageStub::default());
        let app = app(metadata.clone(), storage.clone());

        let response = app
            .oneshot(put_request(
                "/photos/vacation.jpg",
                Some("17"),
                "test file content",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .get(request_id::REQUEST_ID_HEADER)
                .is_some(),
            "response must carry the request id"
        );
        assert_eq!(body_string(response).await, "");

        assert_eq!(
            metadata.plan_calls.lock().unwrap().as_slice(),
            &[("photos".to_owned(), "vacation.jpg".to_owned(), 17)]
        );

        let calls = storage.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let call = &calls[0];
        assert_eq!(call.address, "localhost:9444");
        assert_eq!(call.object_id, "01ARZ3NDEKTSV4RRFFQ69G5FAV");
        assert_eq!(call.bucket, "photos");
        assert_eq!(call.size, 17);
        assert_eq!(call.body, b"test file content");
    }

    #[tokio::test]
    async fn put_object_admission_failures() {
        struct Case {
            name: &'static str,
            uri: &'static str,
            content_length: Option<&'static str>,
            transfer_encoding: bool,
            want_status: StatusCode,
            want_token: &'static str,
        }

        let cases = [
            Case {
                name: "missing content-length",
                uri: "/my-bucket/my-key",
                content_length: None,
                transfer_encoding: false,
                want_status: StatusCode::LENGTH_REQUIRED,
                want_token: "MissingContentLength",
            },
            Case {
                name: "zero content-length",
                uri: "/my-bucket/my-key",
                content_length: Some("0"),
                transfer_encoding: false,
                want_status: StatusCode::BAD_REQUEST,
                want_token: "InvalidArgument",
            },
            Case {
                name: "oversized content-length",
                uri: "/my-bucket/my-key",
                content_length: Some("5368709121"),
                transfer_encoding: false,
                want_status: StatusCode::BAD_REQUEST,
                want_token: "EntityTooLarge",
            },
            Case {
                name: "chunked transfer encoding",
                uri: "/my-bucket/my-key",
                content_length: Some("1024"),
                transfer_encoding: true,
                want_status: StatusCode::BAD_REQUEST,
                want_token: "InvalidRequest",
            },
            Case {
                name: "invalid bucket name",
                uri: "/INVALID-BUCKET/my-key",
                content_length: Some("1024"),
                transfer_encoding: false,
                want_status: StatusCode::BAD_REQUEST,
                want_token: "InvalidBucketName",
            },
            Case {
                name: "invalid key (null byte)",
                uri: "/my-bucket/file%00name",
                content_length: Some("1024"),
                transfer_encoding: false,
                want_status: StatusCode::BAD_REQUEST,
                want_token: "InvalidKeyName",
            },
        ];

        for case in cases {
            let metadata = Arc::new(MetadataStub::default());
            let storage = Arc::new(StorageStub::default());
            let app = app(metadata.clone(), storage.clone());

            let mut builder = http::Request::builder().method("PUT").uri(case.uri);
            if let Some(cl) = case.content_length {
                builder = builder.header(header::CONTENT_LENGTH, cl);
            }
            if case.transfer_encoding {
                builder = builder.header(header::TRANSFER_ENCODING, "chunked");
            }

            let response = app
                .oneshot(builder.body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), case.want_status, "case {}", case.name);
            let body = body_string(response).await;
            assert!(
                body.contains(case.want_token),
                "case {}: body {body:?} missing token {}",
                case.name,
                case.want_token
            );
            assert!(
                metadata.plan_calls.lock().unwrap().is_empty(),
                "case {}: planner must not be called",
                case.name
            );
            assert!(
                storage.calls.lock().unwrap().is_empty(),
                "case {}: storage must not be called",
                case.name
            );
        }
    }

    #[tokio::test]
    async fn put_object_maps_planner_statuses() {
        let cases = [
            (
                Status::not_found("bucket not found"),
                StatusCode::NOT_FOUND,
                "NoSuchBucket",
            ),
            (
                Status::permission_denied("access denied"),
                StatusCode::FORBIDDEN,
                "AccessDenied",
            ),
            (
                Status::failed_precondition("no storage nodes available"),
                StatusCode::SERVICE_UNAVAILABLE,
                "ServiceUnavailable",
            ),
            (
                Status::internal("catalog unavailable"),
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalError",
            ),
        ];

        for (status, want_status, want_token) in cases {
            let metadata = Arc::new(MetadataStub {
                plan_error: Some(status),
                ..Default::default()
            });
            let storage = Arc::new(StorageStub::default());
            let app = app(metadata, storage.clone());

            let response = app
                .oneshot(put_request("/my-bucket/my-key", Some("4"), "body"))
                .await
                .unwrap();

            assert_eq!(response.status(), want_status, "token {want_token}");
            assert!(body_string(response).await.contains(want_token));
            assert!(
                storage.calls.lock().unwrap().is_empty(),
                "storage must not be called when planning fails"
            );
        }
    }

    #[tokio::test]
    async fn put_object_rejects_a_wrong_byte_count_from_storage() {
        let metadata = Arc::new(MetadataStub::default());
        let storage = Arc::new(StorageStub {
            bytes_written_override: Some(10),
            ..Default::default()
        });
        let app = app(metadata, storage);

        let response = app
            .oneshot(put_request(
                "/photos/vacation.jpg",
                Some("17"),
                "test file content",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_string(response).await.contains("InternalError"));
    }

    #[tokio::test]
    async fn put_object_surfaces_storage_transport_failures() {
        let metadata = Arc::new(MetadataStub::default());
        let storage = Arc::new(StorageStub {
            fail_rpc: true,
            ..Default::default()
        });
        let app = app(metadata, storage);

        let response = app
            .oneshot(put_request("/photos/vacation.jpg", Some("4"), "body"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_string(response).await.contains("InternalError"));
    }

    #[tokio::test]
    async fn create_bucket_replies_201_with_location() {
        let metadata = Arc::new(MetadataStub::default());
        let app = app(metadata.clone(), Arc::new(StorageStub::default()));

        let response = app
            .oneshot(
                http::Request::builder()
                    .method("PUT")
                    .uri("/photos")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/photos"
        );
        assert_eq!(
            metadata.create_calls.lock().unwrap().as_slice(),
            &["photos".to_owned()]
        );
    }

    #[tokio::test]
    async fn create_bucket_conflict_is_409() {
        let metadata = Arc::new(MetadataStub {
            create_error: Some(Status::already_exists("BucketAlreadyExists")),
            ..Default::default()
        });
        let app = app(metadata, Arc::new(StorageStub::default()));

        let response = app
            .oneshot(
                http::Request::builder()
                    .method("PUT")
                    .uri("/photos")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(body_string(response).await.contains("BucketAlreadyExists"));
    }

    #[tokio::test]
    async fn create_bucket_validates_the_name_locally() {
        let metadata = Arc::new(MetadataStub::default());
        let app = app(metadata.clone(), Arc::new(StorageStub::default()));

        let response = app
            .oneshot(
                http::Request::builder()
                    .method("PUT")
                    .uri("/UPPER")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.contains("InvalidBucketName"));
        assert!(metadata.create_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_buckets_returns_json() {
        let metadata = Arc::new(MetadataStub {
            listing: vec![pb::Bucket {
                id: "01A".to_owned(),
                name: "photos".to_owned(),
                created_at_us: 1_700_000_000_000_000,
                updated_at_us: 1_700_000_000_000_000,
            }],
            ..Default::default()
        });
        let app = app(metadata, Arc::new(StorageStub::default()));

        let response = app
            .oneshot(
                http::Request::builder()
                    .uri("/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value =
            serde_json::from_str(&body_string(response).await).expect("json body");
        assert_eq!(body["buckets"][0]["name"], "photos");
        assert_eq!(body["buckets"][0]["created_at"], "2023-11-14T22:13:20Z");
    }

    #[test]
    fn handler_panics_surface_as_internal_error() {
        let response = PanicToInternalError.response_for_panic(Box::new("boom".to_owned()));

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn unknown_routes_get_the_canonical_not_found() {
        let app = app(
            Arc::new(MetadataStub::default()),
            Arc::new(StorageStub::default()),
        );

        let response = app
            .oneshot(
                http::Request::builder()
                    .method("DELETE")
                    .uri("/photos/vacation.jpg")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_string(response).await, "page not found");
    }
}
