use std::pin::Pin;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::Status;
use tracing::debug;

use crate::proto::storage::v1::{
    storage_service_client::StorageServiceClient, write_object_request::Payload,
    WriteObjectMetadata, WriteObjectRequest,
};
use crate::request_id::RequestIdInterceptor;
use crate::rpc_pool::Pool;

/// Default size of the chunks the gateway reads from the request body and
/// forwards to storage.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// What the storage node acknowledged after a durable commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteReceipt {
    pub bytes_written: i64,
    pub committed_at_ms: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum WriteObjectError {
    /// The body ended with a different byte count than the declared size.
    /// The in-flight stream is abandoned rather than half-closed, so the
    /// storage node aborts instead of committing a wrong-sized object.
    #[error("size mismatch: read {read} bytes, expected {declared}")]
    SizeMismatch { read: i64, declared: i64 },
    #[error("reading request body: {0}")]
    Body(#[from] std::io::Error),
    #[error(transparent)]
    Rpc(#[from] Status),
    #[error("write_object call task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// The gateway's view of a storage node. Handlers depend on this trait so
/// tests can stand in a stub.
#[async_trait::async_trait]
pub trait StorageApi: Send + Sync {
    /// Streams `size` bytes from `body` to the node at `address`: one
    /// metadata message, then chunks, then half-close and await the receipt.
    async fn write_object(
        &self,
        request_id: &str,
        address: &str,
        object_id: &str,
        bucket: &str,
        size: i64,
        body: Pin<Box<dyn AsyncRead + Send>>,
    ) -> Result<WriteReceipt, WriteObjectError>;
}

/// Pool-backed client for storage nodes.
pub struct StorageClient {
    pool: Arc<Pool>,
    chunk_size: usize,
}

impl StorageClient {
    pub fn new(pool: Arc<Pool>, chunk_size: usize) -> Self {
        Self { pool, chunk_size }
    }
}

#[async_trait::async_trait]
impl StorageApi for StorageClient {
    async fn write_object(
        &self,
        request_id: &str,
        address: &str,
        object_id: &str,
        bucket: &str,
        size: i64,
        mut body: Pin<Box<dyn AsyncRead + Send>>,
    ) -> Result<WriteReceipt, WriteObjectError> {
        let channel = self
            .pool
            .get_conn(address)
            .await
            .map_err(|e| Status::unavailable(e.to_string()))?;
        let mut client =
            StorageServiceClient::with_interceptor(channel, RequestIdInterceptor::new(request_id));

        let (tx, rx) = mpsc::channel::<WriteObjectRequest>(16);
        let call =
            tokio::spawn(async move { client.write_object(ReceiverStream::new(rx)).await });

        let metadata = WriteObjectRequest {
            payload: Some(Payload::Metadata(WriteObjectMetadata {
                object_id: object_id.to_owned(),
                bucket: bucket.to_owned(),
                size,
            })),
        };
        // A refused send means the server already tore the stream down; fall
        // through and surface its status.
        let mut stream_open = tx.send(metadata).await.is_ok();

        let mut buf = vec![0u8; self.chunk_size];
        let mut total: i64 = 0;

        while stream_open {
            let n = match body.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    call.abort();
                    return Err(e.into());
                }
            };

            total += n as i64;
            let chunk = WriteObjectRequest {
                payload: Some(Payload::Chunk(buf[..n].to_vec())),
            };
            if tx.send(chunk).await.is_err() {
                stream_open = false;
            }
        }

        if stream_open && total != size {
            call.abort();
            return Err(WriteObjectError::SizeMismatch {
                read: total,
                declared: size,
            });
        }

        // Half-close, then await the node's single response.
        drop(tx);
        let receipt = call.await??.into_inner();

        debug!(
            object_id,
            bucket,
            bytes_written = receipt.bytes_written,
            committed_at_ms = receipt.committed_at_ms,
            "storage node acknowledged write"
        );

        Ok(WriteReceipt {
            bytes_written: receipt.bytes_written,
            committed_at_ms: receipt.committed_at_ms,
        })
    }
}
