use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use time::OffsetDateTime;
use tracing::info;

use crate::meta_store::{
    Bucket, BucketStore, MetaStoreError, ObjectState, ObjectStore, PendingObject, StorageNode,
    StorageNodeStore, Store,
};

/// Opens the catalog database, creating the file if needed, and brings the
/// schema current.
pub async fn connect(path: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new().connect_with(options).await?;

    info!("starting database migration");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("finished database migration");

    Ok(pool)
}

/// Builds the composed [`Store`] over a connected pool.
pub fn store(pool: SqlitePool) -> Store {
    Store::new(
        Arc::new(SqliteBucketStore { pool: pool.clone() }),
        Arc::new(SqliteStorageNodeStore { pool: pool.clone() }),
        Arc::new(SqliteObjectStore { pool }),
    )
}

/// Timestamps persist as whole microseconds; sub-microsecond precision is
/// dropped at the store boundary.
fn to_micros(t: OffsetDateTime) -> i64 {
    (t.unix_timestamp_nanos() / 1_000) as i64
}

fn from_micros(us: i64) -> Result<OffsetDateTime, MetaStoreError> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(us) * 1_000)
        .map_err(|_| MetaStoreError::TimestampOutOfRange(us))
}

pub struct SqliteBucketStore {
    pool: SqlitePool,
}

fn bucket_from_row(row: &SqliteRow) -> Result<Bucket, MetaStoreError> {
    Ok(Bucket {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        created_at: from_micros(row.try_get("created_at")?)?,
        updated_at: from_micros(row.try_get("updated_at")?)?,
    })
}

#[async_trait::async_trait]
impl BucketStore for SqliteBucketStore {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn create(
        &self,
        id: &str,
        name: &str,
        created_at: OffsetDateTime,
    ) -> Result<Bucket, MetaStoreError> {
        let micros = to_micros(created_at);

        let res = sqlx::query("INSERT INTO buckets (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(micros)
            .bind(micros)
            .execute(&self.pool)
            .await;

        match res {
            Ok(_) => Ok(Bucket {
                id: id.to_owned(),
                name: name.to_owned(),
                created_at: from_micros(micros)?,
                updated_at: from_micros(micros)?,
            }),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(MetaStoreError::BucketAlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn get_by_name(&self, name: &str) -> Result<Bucket, MetaStoreError> {
        let row = sqlx::query("SELECT id, name, created_at, updated_at FROM buckets WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Err(MetaStoreError::BucketNotFound);
        };

        bucket_from_row(&row)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn list(&self) -> Result<Vec<Bucket>, MetaStoreError> {
        let rows =
            sqlx::query("SELECT id, name, created_at, updated_at FROM buckets ORDER BY created_at ASC")
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(bucket_from_row).collect()
    }
}

pub struct SqliteStorageNodeStore {
    pool: SqlitePool,
}

fn node_from_row(row: &SqliteRow) -> Result<StorageNode, MetaStoreError> {
    Ok(StorageNode {
        id: row.try_get("id")?,
        address: row.try_get("address")?,
        created_at: from_micros(row.try_get("created_at")?)?,
        updated_at: from_micros(row.try_get("updated_at")?)?,
    })
}

#[async_trait::async_trait]
impl StorageNodeStore for SqliteStorageNodeStore {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn upsert(
        &self,
        id: &str,
        address: &str,
        stamp: OffsetDateTime,
    ) -> Result<StorageNode, MetaStoreError> {
        let micros = to_micros(stamp);

        // The stored id survives re-registration so objects.storage_node_id
        // stays valid across restarts.
        let row = sqlx::query(
            "INSERT INTO storage_nodes (id, address, created_at, updated_at) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT (address) DO UPDATE SET updated_at = excluded.updated_at \
             RETURNING id, address, created_at, updated_at",
        )
        .bind(id)
        .bind(address)
        .bind(micros)
        .bind(micros)
        .fetch_one(&self.pool)
        .await?;

        node_from_row(&row)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn select_for_upload(&self) -> Result<StorageNode, MetaStoreError> {
        // Most recently re-registered node wins. Any row satisfies the
        // contract; callers must not depend on the policy.
        let row = sqlx::query(
            "SELECT id, address, created_at, updated_at FROM storage_nodes \
             ORDER BY updated_at DESC, id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Err(MetaStoreError::NoStorageNodesAvailable);
        };

        node_from_row(&row)
    }
}

pub struct SqliteObjectStore {
    pool: SqlitePool,
}

#[async_trait::async_trait]
impl ObjectStore for SqliteObjectStore {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn create_pending(
        &self,
        id: &str,
        bucket_id: &str,
        key: &str,
        size_expected: i64,
        storage_node_id: &str,
        created_at: OffsetDateTime,
    ) -> Result<PendingObject, MetaStoreError> {
        let micros = to_micros(created_at);
        let state = ObjectState::Pending;

        sqlx::query(
            "INSERT INTO objects \
             (object_id, bucket_id, key, state, size_expected, storage_node_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(bucket_id)
        .bind(key)
        .bind(state.as_str())
        .bind(size_expected)
        .bind(storage_node_id)
        .bind(micros)
        .bind(micros)
        .execute(&self.pool)
        .await?;

        Ok(PendingObject {
            id: id.to_owned(),
            bucket_id: bucket_id.to_owned(),
            key: key.to_owned(),
            state,
            size_expected,
            storage_node_id: storage_node_id.to_owned(),
            created_at: from_micros(micros)?,
            updated_at: from_micros(micros)?,
        })
    }
}
