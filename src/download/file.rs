use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::error::DownloadError;
use crate::http::HttpSession;
use crate::retry::{self, RetryAction, RetryConfig};

/// Result of a single asset fetch. Failures are values, never panics or
/// propagated errors, so one bad image can't take down its siblings.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The destination already existed; no request was made.
    AlreadyPresent,
    Downloaded { bytes: u64 },
    Failed(DownloadError),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, FetchOutcome::Failed(_))
    }
}

/// Idempotent single-file downloader.
#[derive(Clone)]
pub struct AssetFetcher {
    session: Arc<dyn HttpSession>,
    retry: RetryConfig,
}

/// Sibling `.part` path; only a completed transfer is renamed into place, so
/// an interrupted one never looks already present.
fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

impl AssetFetcher {
    pub fn new(session: Arc<dyn HttpSession>, retry: RetryConfig) -> Self {
        Self { session, retry }
    }

    /// Download `url` to `dest` unless `dest` already exists.
    pub async fn fetch(&self, url: &str, dest: &Path) -> FetchOutcome {
        if fs::try_exists(dest).await.unwrap_or(false) {
            tracing::debug!(path = %dest.display(), "Asset already present");
            return FetchOutcome::AlreadyPresent;
        }

        match self.download(url, dest).await {
            Ok(bytes) => {
                tracing::debug!(path = %dest.display(), bytes, "Downloaded asset");
                FetchOutcome::Downloaded { bytes }
            }
            Err(e) => FetchOutcome::Failed(e),
        }
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::disk(parent, e))?;
        }
        let part = part_path(dest);

        retry::retry_with_backoff(
            &self.retry,
            "asset",
            |e: &DownloadError| RetryAction::from_retryable(e.is_retryable()),
            || async {
                // Always start from an empty .part file.
                let _ = fs::remove_file(&part).await;
                self.attempt(url, dest, &part).await
            },
        )
        .await
    }

    async fn attempt(&self, url: &str, dest: &Path, part: &Path) -> Result<u64, DownloadError> {
        let mut stream = self.session.get_stream(url).await?;

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(part)
            .await
            .map_err(|e| DownloadError::disk(part, e))?;

        let mut bytes_written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|e| DownloadError::disk(part, e))?;
            bytes_written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| DownloadError::disk(part, e))?;
        drop(file);

        fs::rename(part, dest)
            .await
            .map_err(|e| DownloadError::disk(dest, e))?;
        Ok(bytes_written)
    }
}
