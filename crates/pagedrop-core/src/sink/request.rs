use crate::classifier::DownloadStart;
use crate::transfer::TransferId;
use std::path::PathBuf;

/// One direct download, as handed to the sink. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadRequest {
    pub locator: String,
    pub suggested_filename: Option<String>,
    pub mime_type: Option<String>,
    pub content_length: Option<u64>,
    pub user_agent: Option<String>,
    pub content_disposition: Option<String>,
}

impl DownloadRequest {
    /// Bare locator, as from a navigation or `enqueueDirectDownload`.
    pub fn from_locator(locator: &str) -> Self {
        Self {
            locator: locator.trim().to_string(),
            ..Default::default()
        }
    }

    /// Locator plus the metadata of a host download callback.
    pub fn from_download_start(event: &DownloadStart) -> Self {
        Self {
            locator: event.url.trim().to_string(),
            suggested_filename: None,
            mime_type: non_empty(event.mime_type.as_deref()),
            content_length: event.content_length.filter(|n| *n > 0),
            user_agent: non_empty(event.user_agent.as_deref()),
            content_disposition: non_empty(event.content_disposition.as_deref()),
        }
    }

    pub fn with_filename(mut self, filename: &str) -> Self {
        self.suggested_filename = non_empty(Some(filename));
        self
    }
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// A blob that reached durable storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedFile {
    pub path: PathBuf,
    pub filename: String,
    pub mime_type: String,
    pub len: u64,
    pub sha256: String,
}

/// A direct download handed to the transfer service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTicket {
    pub id: TransferId,
    pub filename: String,
    pub destination: PathBuf,
    pub mime_type: String,
}
