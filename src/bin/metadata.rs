use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use time::OffsetDateTime;
use tonic::transport::Server;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use stowage::config::{self, LogFormat, LogVerbosity};
use stowage::id;
use stowage::meta_store::Store;
use stowage::metadata_service::Metadata;
use stowage::proto::metadata::v1::metadata_service_server::MetadataServiceServer;
use stowage::rpc_log;
use stowage::sqlite_store;

#[derive(Debug, Parser)]
#[command(version, about = "Stowage metadata service: catalog and write planner")]
struct Opt {
    /// Port number to listen on.
    #[arg(long, env = "METADATA_PORT", default_value = "9081")]
    port: u16,

    /// Path of the catalog database file.
    #[arg(long, env = "METADATA_DB_PATH", default_value = "./metadata.db")]
    db_path: String,

    /// Storage node addresses (host:port) to register at startup.
    #[arg(long = "storage-node", env = "STORAGE_NODES", value_delimiter = ',')]
    storage_nodes: Vec<String>,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "pretty")]
    log_format: LogFormat,

    #[arg(long, env = "LOG_VERBOSITY", value_enum, default_value = "concise")]
    log_verbosity: LogVerbosity,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let opt = Opt::parse();
    config::setup_tracing(opt.log_format, opt.log_verbosity)?;

    let pool = sqlite_store::connect(&opt.db_path).await?;
    let store = sqlite_store::store(pool);

    bootstrap_storage_nodes(&store, &opt.storage_nodes).await?;

    let addr: SocketAddr = format!("0.0.0.0:{}", opt.port).parse()?;
    info!(%addr, "metadata service listening");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(
        Server::builder()
            .layer(
                tower::ServiceBuilder::new()
                    .layer(TraceLayer::new_for_grpc().make_span_with(rpc_log::make_span))
                    .layer(CatchPanicLayer::custom(rpc_log::PanicToStatus))
                    .into_inner(),
            )
            .add_service(MetadataServiceServer::new(Metadata::new(store)))
            .serve_with_shutdown(addr, async {
                let _ = shutdown_rx.await;
            }),
    );

    shutdown_signal().await;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(());

    // Drain in-flight calls briefly, then force the issue.
    match tokio::time::timeout(Duration::from_secs(3), server).await {
        Ok(joined) => joined??,
        Err(_) => warn!("graceful stop timed out; forcing"),
    }

    info!("metadata service stopped");
    Ok(())
}

/// Upserts every configured storage node, keyed on address: a known address
/// keeps its id and only advances `updated_at`.
async fn bootstrap_storage_nodes(store: &Store, addresses: &[String]) -> anyhow::Result<()> {
    let now = OffsetDateTime::now_utc();

    for address in addresses {
        let node = store
            .storage_nodes()
            .upsert(&id::new_id(), address, now)
            .await?;
        info!(node_id = %node.id, address = %node.address, "storage node registered");
    }

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
