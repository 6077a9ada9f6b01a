use prost::Message as _;
use time::OffsetDateTime;
use tonic::{Code, Request, Response, Status};
use tracing::info;

use crate::id;
use crate::meta_store::{Bucket, MetaStoreError, Store};
use crate::proto::metadata::v1::plan_write_error::Reason;
use crate::proto::metadata::v1::{
    self as pb, metadata_service_server::MetadataService, PlanWriteError,
};
use crate::validation::{validate_bucket_name, validate_key, MAX_OBJECT_SIZE};

const PLAN_WRITE_ERROR_TYPE_URL: &str =
    "type.googleapis.com/stowage.metadata.v1.PlanWriteError";

/// The metadata RPC service: catalog reads/writes plus the write planner.
#[derive(Debug)]
pub struct Metadata {
    store: Store,
}

impl Metadata {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

#[tonic::async_trait]
impl MetadataService for Metadata {
    #[tracing::instrument(level = "debug", skip_all)]
    async fn create_bucket(
        &self,
        request: Request<pb::CreateBucketRequest>,
    ) -> Result<Response<pb::CreateBucketResponse>, Status> {
        let name = request.into_inner().name;

        if validate_bucket_name(&name).is_err() {
            return Err(Status::invalid_argument("InvalidBucketName"));
        }

        let bucket_id = id::new_id();
        let now = OffsetDateTime::now_utc();

        let bucket = match self.store.buckets().create(&bucket_id, &name, now).await {
            Ok(bucket) => bucket,
            Err(MetaStoreError::BucketAlreadyExists) => {
                return Err(Status::already_exists("BucketAlreadyExists"));
            }
            Err(e) => {
                crate::error::log_internal(&e);
                return Err(Status::internal(e.to_string()));
            }
        };

        info!(bucket = %bucket.name, bucket_id = %bucket.id, "bucket created");

        Ok(Response::new(pb::CreateBucketResponse {
            bucket: Some(bucket_to_proto(&bucket)),
        }))
    }

    #[tracing::instrument(level = "debug", skip_all)]
    async fn list_buckets(
        &self,
        _request: Request<pb::ListBucketsRequest>,
    ) -> Result<Response<pb::ListBucketsResponse>, Status> {
        let buckets = match self.store.buckets().list().await {
            Ok(buckets) => buckets,
            Err(e) => {
                crate::error::log_internal(&e);
                return Err(Status::internal(e.to_string()));
            }
        };

        Ok(Response::new(pb::ListBucketsResponse {
            buckets: buckets.iter().map(bucket_to_proto).collect(),
        }))
    }

    #[tracing::instrument(level = "debug", skip_all)]
    async fn plan_write(
        &self,
        request: Request<pb::PlanWriteRequest>,
    ) -> Result<Response<pb::PlanWriteResponse>, Status> {
        let pb::PlanWriteRequest { bucket, key, size } = request.into_inner();

        if size <= 0 {
            return Err(Status::invalid_argument("InvalidArgument"));
        }
        if size > MAX_OBJECT_SIZE {
            return Err(Status::invalid_argument("EntityTooLarge"));
        }
        if validate_bucket_name(&bucket).is_err() {
            return Err(Status::invalid_argument("InvalidBucketName"));
        }
        if validate_key(&key).is_err() {
            return Err(Status::invalid_argument("InvalidKeyName"));
        }

        let bucket_rec = match self.store.buckets().get_by_name(&bucket).await {
            Ok(rec) => rec,
            Err(e @ MetaStoreError::BucketNotFound) => {
                return Err(plan_write_status(
                    Code::NotFound,
                    &e.to_string(),
                    Reason::BucketNotFound,
                    &bucket,
                ));
            }
            Err(e) => {
                crate::error::log_internal(&e);
                return Err(Status::internal(e.to_string()));
            }
        };

        let node = match self.store.storage_nodes().select_for_upload().await {
            Ok(node) => node,
            Err(e @ MetaStoreError::NoStorageNodesAvailable) => {
                return Err(plan_write_status(
                    Code::FailedPrecondition,
                    &e.to_string(),
                    Reason::NoStorageNodes,
                    &bucket,
                ));
            }
            Err(e) => {
                crate::error::log_internal(&e);
                return Err(Status::internal(e.to_string()));
            }
        };

        let object_id = id::new_id();
        let now = OffsetDateTime::now_utc();

        if let Err(e) = self
            .store
            .objects()
            .create_pending(&object_id, &bucket_rec.id, &key, size, &node.id, now)
            .await
        {
            crate::error::log_internal(&e);
            return Err(Status::internal(e.to_string()));
        }

        info!(
            bucket = %bucket,
            key = %key,
            size,
            object_id = %object_id,
            storage_address = %node.address,
            "write planned"
        );

        Ok(Response::new(pb::PlanWriteResponse {
            write_plan: Some(pb::WritePlan {
                object_id,
                storage_address: node.address,
            }),
        }))
    }
}

fn bucket_to_proto(bucket: &Bucket) -> pb::Bucket {
    pb::Bucket {
        id: bucket.id.clone(),
        name: bucket.name.clone(),
        created_at_us: (bucket.created_at.unix_timestamp_nanos() / 1_000) as i64,
        updated_at_us: (bucket.updated_at.unix_timestamp_nanos() / 1_000) as i64,
    }
}

/// Builds a status carrying a `PlanWriteError` detail the way a
/// `google.rpc.Status` peer would: the encoded Status proto, with the detail
/// packed in an `Any`, rides in the `grpc-status-details-bin` trailer.
fn plan_write_status(code: Code, message: &str, reason: Reason, bucket: &str) -> Status {
    let detail = PlanWriteError {
        reason: reason as i32,
        bucket: bucket.to_owned(),
    };
    let status_proto = crate::proto::rpc::Status {
        code: code as i32,
        message: message.to_owned(),
        details: vec![prost_types::Any {
            type_url: PLAN_WRITE_ERROR_TYPE_URL.to_owned(),
            value: detail.encode_to_vec(),
        }],
    };

    Status::with_details(code, message, status_proto.encode_to_vec().into())
}

/// Extracts the `PlanWriteError` detail from a failed `PlanWrite` status,
/// if one is attached.
pub fn plan_write_error_from_status(status: &Status) -> Option<PlanWriteError> {
    let decoded = crate::proto::rpc::Status::decode(status.details()).ok()?;
    decoded
        .details
        .into_iter()
        .filter(|any| any.type_url == PLAN_WRITE_ERROR_TYPE_URL)
        .find_map(|any| PlanWriteError::decode(any.value.as_slice()).ok())
}
