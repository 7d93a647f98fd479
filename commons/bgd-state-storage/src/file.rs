use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::{error::StorageError, model::ActiveVersion, traits::*};

/// Stores the active version as a one-line text file (`blue` / `green`).
///
/// Writes go to a sibling temp file which is fsynced and then renamed over
/// the record, so readers never see a partially written file.
#[derive(Debug)]
pub struct FileVersionStore {
    path: PathBuf,
    seq: AtomicU64,
}

impl FileVersionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seq: AtomicU64::new(0),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let n = self.seq.fetch_add(1, Ordering::Relaxed);
        let file_name = self
            .path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "active_version".to_string());
        self.path.with_file_name(format!(
            ".{}.{}.{}.tmp",
            file_name,
            std::process::id(),
            n
        ))
    }
}

#[async_trait]
impl VersionStore for FileVersionStore {
    async fn load(&self) -> StorageResult<Option<ActiveVersion>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content
                .parse::<ActiveVersion>()
                .map(Some)
                .map_err(|e| StorageError::Corrupt(e.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn store(&self, version: ActiveVersion) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.temp_path();
        let written = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(format!("{}\n", version).as_bytes()).await?;
            file.sync_all().await?;
            tokio::fs::rename(&tmp, &self.path).await
        }
        .await;

        if let Err(e) = written {
            // best effort; the record itself is untouched
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StorageError::Io(e));
        }
        debug!(path = %self.path.display(), %version, "version record replaced");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
