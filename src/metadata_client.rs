use std::sync::Arc;

use tonic::service::interceptor::InterceptedService;
use tonic::transport::Channel;
use tonic::Status;

use crate::proto::metadata::v1::{
    self as pb, metadata_service_client::MetadataServiceClient,
};
use crate::request_id::RequestIdInterceptor;
use crate::rpc_pool::Pool;

/// A bound write plan: the object id the catalog allocated and the storage
/// node that will accept the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritePlan {
    pub object_id: String,
    pub storage_address: String,
}

/// The gateway's view of the metadata service. Handlers depend on this trait
/// so tests can stand in a stub.
#[async_trait::async_trait]
pub trait MetadataApi: Send + Sync {
    async fn plan_write(
        &self,
        request_id: &str,
        bucket: &str,
        key: &str,
        size: i64,
    ) -> Result<WritePlan, Status>;

    async fn create_bucket(&self, request_id: &str, name: &str) -> Result<pb::Bucket, Status>;

    async fn list_buckets(&self, request_id: &str) -> Result<Vec<pb::Bucket>, Status>;
}

// The request-id interceptor is attached per call, so the pooled channel
// stays shareable across requests.
type SubClient = MetadataServiceClient<InterceptedService<Channel, RequestIdInterceptor>>;

/// Pool-backed client for the metadata service.
pub struct MetadataClient {
    pool: Arc<Pool>,
    address: String,
}

impl MetadataClient {
    pub fn new(pool: Arc<Pool>, address: String) -> Self {
        Self { pool, address }
    }

    async fn client(&self, request_id: &str) -> Result<SubClient, Status> {
        let channel = self
            .pool
            .get_conn(&self.address)
            .await
            .map_err(|e| Status::unavailable(e.to_string()))?;

        Ok(MetadataServiceClient::with_interceptor(
            channel,
            RequestIdInterceptor::new(request_id),
        ))
    }
}

#[async_trait::async_trait]
impl MetadataApi for MetadataClient {
    async fn plan_write(
        &self,
        request_id: &str,
        bucket: &str,
        key: &str,
        size: i64,
    ) -> Result<WritePlan, Status> {
        let mut client = self.client(request_id).await?;

        let resp = client
            .plan_write(pb::PlanWriteRequest {
                bucket: bucket.to_owned(),
                key: key.to_owned(),
                size,
            })
            .await?
            .into_inner();

        let Some(plan) = resp.write_plan else {
            return Err(Status::internal("plan_write response missing write_plan"));
        };

        Ok(WritePlan {
            object_id: plan.object_id,
            storage_address: plan.storage_address,
        })
    }

    async fn create_bucket(&self, request_id: &str, name: &str) -> Result<pb::Bucket, Status> {
        let mut client = self.client(request_id).await?;

        let resp = client
            .create_bucket(pb::CreateBucketRequest {
                name: name.to_owned(),
            })
            .await?
            .into_inner();

        resp.bucket
            .ok_or_else(|| Status::internal("create_bucket response missing bucket"))
    }

    async fn list_buckets(&self, request_id: &str) -> Result<Vec<pb::Bucket>, Status> {
        let mut client = self.client(request_id).await?;

        let resp = client.list_buckets(pb::ListBucketsRequest {}).await?.into_inner();
        Ok(resp.buckets)
    }
}
