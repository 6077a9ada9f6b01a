//! Stowage is the object-storage core of an S3-compatible blob service,
//! split across three cooperating processes:
//!
//! - `frontage` — HTTP/1.1 S3-compatible gateway. Admits requests, obtains a
//!   write plan from the metadata service, and streams request bodies to a
//!   storage node.
//! - `metadata` — RPC service owning the catalog of buckets, objects, and
//!   storage-node registrations; plans every write.
//! - `storage-node` — RPC service receiving streamed object payloads and
//!   committing them durably under a local content root.
//!
//! The library holds all service logic; the binaries under `src/bin/` only
//! parse options, set up logging, and serve.

pub mod config;
pub mod error;
pub mod http_api;
pub mod http_middleware;
pub mod id;
pub mod meta_store;
pub mod metadata_client;
pub mod metadata_service;
pub mod proto;
pub mod request_id;
pub mod rpc_log;
pub mod rpc_pool;
pub mod sqlite_store;
pub mod storage_client;
pub mod storage_service;
pub mod validation;
pub mod writer;
