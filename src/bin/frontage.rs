use std::num::NonZeroUsize;
use std::sync::Arc;

use axum::extract::Request;
use axum::ServiceExt;
use clap::Parser;
use tower::Layer;
use tracing::info;

use stowage::config::{self, LogFormat, LogVerbosity};
use stowage::http_api::{self, AppState};
use stowage::http_middleware::StripBucketSlashLayer;
use stowage::metadata_client::MetadataClient;
use stowage::rpc_pool::Pool;
use stowage::storage_client::StorageClient;

#[derive(Debug, Parser)]
#[command(version, about = "Stowage frontage: the S3-compatible HTTP gateway")]
struct Opt {
    /// Port number to listen on.
    #[arg(long, env = "FRONTAGE_PORT", default_value = "9080")]
    port: u16,

    /// Address (host:port) of the metadata service.
    #[arg(long, env = "FRONTAGE_METADATA_ADDR", default_value = "localhost:9081")]
    metadata_addr: String,

    /// Size in bytes of the chunks object bodies are forwarded in.
    #[arg(long, env = "PUT_OBJECT_CHUNK_SIZE", default_value = "8192")]
    chunk_size: NonZeroUsize,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "pretty")]
    log_format: LogFormat,

    #[arg(long, env = "LOG_VERBOSITY", value_enum, default_value = "concise")]
    log_verbosity: LogVerbosity,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let opt = Opt::parse();
    config::setup_tracing(opt.log_format, opt.log_verbosity)?;

    let pool = Arc::new(Pool::new());
    let state = Arc::new(AppState {
        metadata: Arc::new(MetadataClient::new(pool.clone(), opt.metadata_addr.clone())),
        storage: Arc::new(StorageClient::new(pool.clone(), opt.chunk_size.get())),
    });

    // Bucket-only trailing slashes are stripped before routing, so the layer
    // wraps the router rather than living inside it.
    let app = StripBucketSlashLayer.layer(http_api::router(state));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", opt.port)).await?;
    info!(
        metadata_addr = %opt.metadata_addr,
        "frontage listening on http://{}",
        listener.local_addr()?
    );

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close();
    info!("frontage stopped");
    Ok(())
}

async fn shutdown_signal() {
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .expect("install SIGTERM handler");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}
