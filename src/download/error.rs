use std::path::PathBuf;

use thiserror::Error;

use crate::http::HttpError;

/// Typed download errors enabling retry classification.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("Disk error at {path}: {source}")]
    Disk {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    pub(crate) fn disk(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Disk {
            path: path.to_path_buf(),
            source,
        }
    }

    /// HTTP status of the failed response, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            DownloadError::Http(e) => e.status(),
            DownloadError::Disk { .. } => None,
        }
    }

    /// Whether this error is transient and worth retrying. Disk failures
    /// won't fix themselves between attempts.
    pub fn is_retryable(&self) -> bool {
        match self {
            DownloadError::Http(e) => e.is_retryable(),
            DownloadError::Disk { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: u16) -> DownloadError {
        DownloadError::Http(HttpError::Status {
            status,
            url: "x".into(),
        })
    }

    #[test]
    fn test_client_errors_not_retryable() {
        assert!(!status(401).is_retryable());
        assert!(!status(403).is_retryable());
        assert!(!status(404).is_retryable());
    }

    #[test]
    fn test_rate_limit_and_server_errors_retryable() {
        assert!(status(429).is_retryable());
        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
    }

    #[test]
    fn test_disk_not_retryable() {
        let e = DownloadError::disk(
            std::path::Path::new("/x"),
            std::io::Error::other("disk full"),
        );
        assert!(!e.is_retryable());
        assert_eq!(e.status(), None);
    }

    #[test]
    fn test_status_exposes_http_code() {
        assert_eq!(status(404).status(), Some(404));
    }
}
