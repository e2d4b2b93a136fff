use crate::models::UploadedFile;
use crate::utils::keyed_mutex::KeyedMutex;
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::sync::OwnedMutexGuard;

/// Flat directory of uploaded files keyed by their generated name.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
    locks: KeyedMutex,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: KeyedMutex::new(),
        }
    }

    /// Creates the upload directory if it does not exist yet.
    pub async fn init(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }

    /// Advisory per-identifier lock, see [`KeyedMutex`].
    pub async fn lock(&self, id: &str) -> OwnedMutexGuard<()> {
        self.locks.lock(id).await
    }

    /// Streams `reader` to disk under `id`. A partial file is removed on error.
    pub async fn save_stream<R>(&self, id: &str, mut reader: R) -> io::Result<UploadedFile>
    where
        R: AsyncRead + Unpin,
    {
        let path = self.path_for(id);
        let mut file = tokio::fs::File::create(&path).await?;

        let copied = async {
            let size = tokio::io::copy(&mut reader, &mut file).await?;
            file.flush().await?;
            file.sync_all().await?;
            Ok::<u64, io::Error>(size)
        }
        .await;

        match copied {
            Ok(size) => {
                tracing::debug!("Stored {} ({} bytes)", id, size);
                self.stat(id).await
            }
            Err(e) => {
                drop(file);
                if let Err(rm) = tokio::fs::remove_file(&path).await {
                    tracing::warn!("Failed to remove partial upload {}: {}", id, rm);
                }
                Err(e)
            }
        }
    }

    #[cfg(test)]
    pub async fn save(&self, id: &str, data: &[u8]) -> io::Result<UploadedFile> {
        self.save_stream(id, data).await
    }

    pub async fn exists(&self, id: &str) -> io::Result<bool> {
        tokio::fs::try_exists(self.path_for(id)).await
    }

    /// Removes `id`. Returns false when there was nothing to remove.
    pub async fn delete(&self, id: &str) -> io::Result<bool> {
        match tokio::fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Every regular file currently in the upload directory.
    pub async fn list(&self) -> io::Result<Vec<UploadedFile>> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry {:?}: {}", entry.path(), e);
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }
            let Some(id) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            files.push(UploadedFile {
                id,
                path: entry.path(),
                modified_at: modified_at(&metadata),
            });
        }

        Ok(files)
    }

    /// Deletes every file last modified before `cutoff`.
    ///
    /// Each deletion holds the identifier's lock so it cannot interleave with
    /// a read of the same file. Per-entry failures are logged and skipped.
    pub async fn cleanup(&self, cutoff: SystemTime) -> io::Result<usize> {
        let cutoff: DateTime<Utc> = cutoff.into();
        let mut removed = 0;

        for file in self.list().await? {
            if file.modified_at >= cutoff {
                continue;
            }

            let _guard = self.lock(&file.id).await;
            match self.delete(&file.id).await {
                Ok(true) => {
                    tracing::info!("🧹 Removed expired upload {}", file.id);
                    removed += 1;
                }
                Ok(false) => {}
                Err(e) => tracing::error!("Failed to remove expired upload {}: {}", file.id, e),
            }
        }

        self.locks.prune();
        Ok(removed)
    }

    async fn stat(&self, id: &str) -> io::Result<UploadedFile> {
        let path = self.path_for(id);
        let metadata = tokio::fs::metadata(&path).await?;
        Ok(UploadedFile {
            id: id.to_string(),
            path,
            modified_at: modified_at(&metadata),
        })
    }
}

fn modified_at(metadata: &std::fs::Metadata) -> DateTime<Utc> {
    metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}
