use crate::services::storage::{ObjectEntry, StorageError, StorageService};
use crate::services::transfer::{
    BatchRunner, TransferFailure, TransferHandle, TransferPhase, TransferProgress,
};
use bytes::Bytes;
use std::io::Write;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("failed to list folder contents: {0}")]
    Listing(#[from] StorageError),

    #[error("{} of the folder's files could not be fetched", .0.len())]
    Fetch(Vec<TransferFailure>),

    #[error("failed to write archive: {0}")]
    Write(String),
}

pub struct FolderArchive {
    pub filename: String,
    pub data: Vec<u8>,
    pub file_count: usize,
    pub transfer_id: String,
}

pub enum ArchiveOutcome {
    /// Nothing stored under the prefix; no archive was built
    Empty,
    Ready(FolderArchive),
}

/// Rebuilds a stored folder as a single ZIP archive.
#[derive(Clone)]
pub struct FolderArchiver {
    storage: Arc<dyn StorageService>,
    runner: BatchRunner,
    page_size: i32,
}

impl FolderArchiver {
    pub fn new(storage: Arc<dyn StorageService>, runner: BatchRunner, page_size: i32) -> Self {
        Self {
            storage,
            runner,
            page_size,
        }
    }

    /// Every object under `prefix`, following continuation tokens until exhausted.
    pub async fn list_members(&self, prefix: &str) -> Result<Vec<ObjectEntry>, StorageError> {
        let mut members = Vec::new();
        let mut token = None;
        loop {
            let page = self
                .storage
                .list_objects(prefix, self.page_size, token)
                .await?;
            members.extend(page.entries);
            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        Ok(members)
    }

    /// Lists, fetches and zips every member of the folder at `prefix`,
    /// reporting phases and progress through `transfer`.
    ///
    /// Any member that cannot be fetched fails the whole archive; a partial
    /// archive is never returned.
    pub async fn build(
        &self,
        transfer: &TransferHandle,
        prefix: &str,
        name: &str,
    ) -> Result<ArchiveOutcome, ArchiveError> {
        tracing::info!("📂 Listing files under {}", prefix);
        let members = self.list_members(prefix).await?;
        if members.is_empty() {
            tracing::info!("📭 Folder {} is empty, nothing to download", prefix);
            return Ok(ArchiveOutcome::Empty);
        }

        transfer.set_phase(TransferPhase::CreatingArchive);
        let progress = TransferProgress::with_observer(members.len(), transfer.progress_observer());

        let storage = &self.storage;
        let fetched = self
            .runner
            .run(members, &progress, |entry: ObjectEntry| async move {
                match storage.get_object(&entry.key).await {
                    Ok(data) => Ok((entry.key, data)),
                    Err(e) => Err(TransferFailure::new(entry.key, e)),
                }
            })
            .await;

        if !fetched.is_complete() {
            return Err(ArchiveError::Fetch(fetched.failed));
        }

        let file_count = fetched.succeeded.len();
        let owned_prefix = prefix.to_string();
        let data = tokio::task::spawn_blocking(move || write_zip(&owned_prefix, fetched.succeeded))
            .await
            .map_err(|e| ArchiveError::Write(e.to_string()))??;

        transfer.set_phase(TransferPhase::DownloadStarting);
        tracing::info!(
            "🗜️  Archive for {} ready: {} files, {} bytes",
            prefix,
            file_count,
            data.len()
        );

        Ok(ArchiveOutcome::Ready(FolderArchive {
            filename: format!("{}.zip", name),
            data,
            file_count,
            transfer_id: transfer.id().to_string(),
        }))
    }
}

/// Writes members into a deflated ZIP, naming entries relative to `prefix`.
pub fn write_zip(prefix: &str, members: Vec<(String, Bytes)>) -> Result<Vec<u8>, ArchiveError> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::FileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for (key, data) in members {
        let name = key.strip_prefix(prefix).unwrap_or(&key);
        writer
            .start_file(name, options)
            .map_err(|e| ArchiveError::Write(e.to_string()))?;
        writer
            .write_all(&data)
            .map_err(|e| ArchiveError::Write(e.to_string()))?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| ArchiveError::Write(e.to_string()))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_write_zip_uses_relative_paths() {
        let members = vec![
            ("folders/abc/notes/a.md".to_string(), Bytes::from("alpha")),
            ("folders/abc/notes/sub/b.md".to_string(), Bytes::from("beta")),
        ];
        let data = write_zip("folders/abc/", members).unwrap();

        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(data)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut content = String::new();
        archive
            .by_name("notes/sub/b.md")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "beta");
        assert!(archive.by_name("folders/abc/notes/a.md").is_err());
    }
}
