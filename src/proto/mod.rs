//! Protobuf and tonic bindings for the metadata and storage services.
//!
//! The `.proto` sources live under `proto/` at the repository root and the
//! generated code is committed here; regenerate with `tonic-build` when the
//! protocol changes.

pub mod metadata {
    pub mod v1 {
        include!("stowage.metadata.v1.rs");
    }
}

pub mod storage {
    pub mod v1 {
        include!("stowage.storage.v1.rs");
    }
}

pub mod rpc {
    include!("google.rpc.rs");
}
