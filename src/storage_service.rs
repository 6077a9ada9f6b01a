use std::path::PathBuf;

use time::OffsetDateTime;
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, info, warn};

use crate::proto::storage::v1::{
    storage_service_server::StorageService, write_object_request::Payload, WriteObjectRequest,
    WriteObjectResponse,
};
use crate::writer::Writer;

/// The storage-node RPC service. Owns a local content root and commits
/// streamed object payloads under it.
#[derive(Debug)]
pub struct Storage {
    objects_root: PathBuf,
}

impl Storage {
    pub fn new(objects_root: PathBuf) -> Self {
        Self { objects_root }
    }
}

/// The server half of a client-streaming call, as the state machine consumes
/// it: `Ok(Some(..))` is a message, `Ok(None)` is the client's half-close,
/// `Err` is a transport failure.
#[async_trait::async_trait]
pub trait InboundStream: Send {
    async fn next_message(&mut self) -> Result<Option<WriteObjectRequest>, Status>;
}

#[async_trait::async_trait]
impl InboundStream for Streaming<WriteObjectRequest> {
    async fn next_message(&mut self) -> Result<Option<WriteObjectRequest>, Status> {
        self.message().await
    }
}

#[tonic::async_trait]
impl StorageService for Storage {
    #[tracing::instrument(level = "debug", skip_all)]
    async fn write_object(
        &self,
        request: Request<Streaming<WriteObjectRequest>>,
    ) -> Result<Response<WriteObjectResponse>, Status> {
        let mut stream = request.into_inner();
        self.handle_write_object(&mut stream).await.map(Response::new)
    }
}

impl Storage {
    /// Runs the WriteObject state machine: metadata first, then chunks until
    /// the client half-closes, then commit. Every failure after the writer
    /// opens aborts it, so no staging temp outlives the call.
    pub async fn handle_write_object(
        &self,
        stream: &mut (impl InboundStream + ?Sized),
    ) -> Result<WriteObjectResponse, Status> {
        let first = stream.next_message().await.map_err(internal)?;

        let meta = match first.and_then(|msg| msg.payload) {
            Some(Payload::Metadata(meta)) => meta,
            _ => return Err(Status::invalid_argument("metadata must be the first message")),
        };

        info!(
            bucket = %meta.bucket,
            object_id = %meta.object_id,
            size = meta.size,
            "write metadata received"
        );

        let mut writer = Writer::create(&self.objects_root, &meta.bucket, &meta.object_id)
            .await
            .map_err(|e| {
                crate::error::log_internal(&e);
                Status::internal(e.to_string())
            })?;

        let mut total: i64 = 0;

        loop {
            let msg = match stream.next_message().await {
                Ok(Some(msg)) => msg,
                Ok(None) => break,
                Err(status) => {
                    abort_writer(&mut writer).await;
                    return Err(internal(status));
                }
            };

            let chunk = match msg.payload {
                Some(Payload::Chunk(chunk)) => chunk,
                _ => {
                    abort_writer(&mut writer).await;
                    return Err(Status::invalid_argument("chunk payload missing"));
                }
            };

            if let Err(e) = writer.write(&chunk).await {
                crate::error::log_internal(&e);
                abort_writer(&mut writer).await;
                return Err(Status::internal(e.to_string()));
            }

            total += chunk.len() as i64;
            debug!(chunk_bytes = chunk.len(), accumulated_bytes = total, "write chunk received");
        }

        if let Err(e) = writer.commit().await {
            crate::error::log_internal(&e);
            abort_writer(&mut writer).await;
            return Err(Status::internal(e.to_string()));
        }

        let committed_at_ms = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;

        info!(
            bucket = %meta.bucket,
            object_id = %meta.object_id,
            bytes_written = total,
            "write stream committed"
        );

        Ok(WriteObjectResponse {
            bytes_written: total,
            committed_at_ms,
        })
    }
}

fn internal(status: Status) -> Status {
    Status::internal(status.message().to_owned())
}

async fn abort_writer(writer: &mut Writer) {
    if let Err(e) = writer.abort().await {
        warn!(error = %e, temp_path = %writer.temp_path().display(), "abort failed");
    }
}
