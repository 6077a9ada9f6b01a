use std::sync::Arc;

use time::OffsetDateTime;

/// A named container for objects. `name` is globally unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub id: String,
    pub name: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// A registered storage node. `address` is host:port dialable from the
/// gateway; `id` is immutable once created so foreign keys stay valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageNode {
    pub id: String,
    pub address: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectState {
    Pending,
    Committed,
    Aborted,
}

impl ObjectState {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectState::Pending => "PENDING",
            ObjectState::Committed => "COMMITTED",
            ObjectState::Aborted => "ABORTED",
        }
    }

}

/// An object row created by the write planner. Multiple PENDING rows may
/// share `(bucket_id, key)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingObject {
    pub id: String,
    pub bucket_id: String,
    pub key: String,
    pub state: ObjectState,
    pub size_expected: i64,
    pub storage_node_id: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, thiserror::Error)]
pub enum MetaStoreError {
    #[error("bucket not found")]
    BucketNotFound,
    #[error("bucket already exists")]
    BucketAlreadyExists,
    #[error("no storage nodes available")]
    NoStorageNodesAvailable,
    #[error("timestamp column out of range: {0}")]
    TimestampOutOfRange(i64),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[async_trait::async_trait]
pub trait BucketStore: Send + Sync {
    /// Inserts a bucket. Fails with `BucketAlreadyExists` when the name is
    /// taken.
    async fn create(
        &self,
        id: &str,
        name: &str,
        created_at: OffsetDateTime,
    ) -> Result<Bucket, MetaStoreError>;

    /// Single-row lookup on the unique `name`.
    async fn get_by_name(&self, name: &str) -> Result<Bucket, MetaStoreError>;

    /// All buckets, oldest first.
    async fn list(&self) -> Result<Vec<Bucket>, MetaStoreError>;
}

#[async_trait::async_trait]
pub trait StorageNodeStore: Send + Sync {
    /// Inserts a node registration, or refreshes `updated_at` when the
    /// address is already registered. The stored `id` is preserved on
    /// conflict; the caller's `id` is only used for a first registration.
    async fn upsert(
        &self,
        id: &str,
        address: &str,
        stamp: OffsetDateTime,
    ) -> Result<StorageNode, MetaStoreError>;

    /// Returns some currently-registered node, or `NoStorageNodesAvailable`
    /// when none exist. Callers must not depend on the selection policy.
    async fn select_for_upload(&self) -> Result<StorageNode, MetaStoreError>;
}

#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Inserts an object row in the PENDING state. The referenced bucket and
    /// storage node must exist.
    async fn create_pending(
        &self,
        id: &str,
        bucket_id: &str,
        key: &str,
        size_expected: i64,
        storage_node_id: &str,
        created_at: OffsetDateTime,
    ) -> Result<PendingObject, MetaStoreError>;
}

/// The polymorphic store boundary the planner depends on: three substores
/// composed by value.
#[derive(Clone)]
pub struct Store {
    buckets: Arc<dyn BucketStore>,
    storage_nodes: Arc<dyn StorageNodeStore>,
    objects: Arc<dyn ObjectStore>,
}

impl Store {
    pub fn new(
        buckets: Arc<dyn BucketStore>,
        storage_nodes: Arc<dyn StorageNodeStore>,
        objects: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            buckets,
            storage_nodes,
            objects,
        }
    }

    pub fn buckets(&self) -> &dyn BucketStore {
        self.buckets.as_ref()
    }

    pub fn storage_nodes(&self) -> &dyn StorageNodeStore {
        self.storage_nodes.as_ref()
    }

    pub fn objects(&self) -> &dyn ObjectStore {
        self.objects.as_ref()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish()
    }
}
