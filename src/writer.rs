use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{DirBuilder, File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// A staged object write under the node's content root.
///
/// Bytes accumulate in a hidden temp file (`.{object_id}.part`) inside the
/// bucket directory; [`commit`](Writer::commit) publishes them atomically at
/// the final path. Within a bucket directory, a dot-prefixed name is always
/// an in-flight or abandoned staging file and a plain name is always a fully
/// committed object.
#[derive(Debug)]
pub struct Writer {
    file: Option<File>,
    temp_path: PathBuf,
    final_path: PathBuf,
}

impl Writer {
    /// Creates the bucket directory if needed (0755) and opens the staging
    /// temp file create-exclusive (0644). Fails if a temp for the same
    /// object id already exists, which bounds writers to one per
    /// (bucket, object_id).
    pub async fn create(objects_root: &Path, bucket: &str, object_id: &str) -> io::Result<Writer> {
        let bucket_dir = objects_root.join(bucket);
        DirBuilder::new()
            .recursive(true)
            .mode(0o755)
            .create(&bucket_dir)
            .await?;

        let temp_path = bucket_dir.join(format!(".{object_id}.part"));
        let final_path = bucket_dir.join(object_id);

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o644)
            .open(&temp_path)
            .await?;

        Ok(Writer {
            file: Some(file),
            temp_path,
            final_path,
        })
    }

    /// Appends to the staging file, returning the number of bytes written.
    pub async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "writer is closed"))?;

        file.write_all(buf).await?;
        Ok(buf.len())
    }

    /// Publishes the staged bytes: fsync the data file, close it, rename the
    /// temp to the final path, then fsync the parent directory so the rename
    /// itself is durable. Stops at the first failing step.
    pub async fn commit(&mut self) -> io::Result<()> {
        let file = self
            .file
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "writer is closed"))?;

        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&self.temp_path, &self.final_path).await?;

        let parent = self
            .final_path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "final path has no parent"))?;
        let dir = File::open(parent).await?;
        dir.sync_all().await?;

        Ok(())
    }

    /// Closes the staging file if still open and removes it; absence is not
    /// an error. Safe to call any number of times, including after a
    /// successful commit (where it is a no-op).
    pub async fn abort(&mut self) -> io::Result<()> {
        drop(self.file.take());

        match tokio::fs::remove_file(&self.temp_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    pub fn final_path(&self) -> &Path {
        &self.final_path
    }
}
