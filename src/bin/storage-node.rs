use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tonic::transport::Server;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use stowage::config::{self, LogFormat, LogVerbosity};
use stowage::proto::storage::v1::storage_service_server::StorageServiceServer;
use stowage::rpc_log;
use stowage::storage_service::Storage;

#[derive(Debug, Parser)]
#[command(version, about = "Stowage storage node: durable object writes")]
struct Opt {
    /// Port number to listen on.
    #[arg(long, env = "STORAGE_NODE_PORT", default_value = "9082")]
    port: u16,

    /// Root directory of stored objects.
    #[arg(long, env = "OBJECTS_ROOT", default_value = "./objects")]
    objects_root: PathBuf,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "pretty")]
    log_format: LogFormat,

    #[arg(long, env = "LOG_VERBOSITY", value_enum, default_value = "concise")]
    log_verbosity: LogVerbosity,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let opt = Opt::parse();
    config::setup_tracing(opt.log_format, opt.log_verbosity)?;

    let addr: SocketAddr = format!("0.0.0.0:{}", opt.port).parse()?;
    info!(%addr, objects_root = %opt.objects_root.display(), "storage node listening");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(
        Server::builder()
            .layer(
                tower::ServiceBuilder::new()
                    .layer(TraceLayer::new_for_grpc().make_span_with(rpc_log::make_span))
                    .layer(CatchPanicLayer::custom(rpc_log::PanicToStatus))
                    .into_inner(),
            )
            .add_service(StorageServiceServer::new(Storage::new(opt.objects_root)))
            .serve_with_shutdown(addr, async {
                let _ = shutdown_rx.await;
            }),
    );

    shutdown_signal().await;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(Duration::from_secs(3), server).await {
        Ok(joined) => joined??,
        Err(_) => warn!("graceful stop timed out; forcing"),
    }

    info!("storage node stopped");
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
