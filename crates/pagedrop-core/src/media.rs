//! Announcing new files to the platform media index.

use std::path::Path;

/// Makes a persisted file visible to other apps (media scanner on mobile).
pub trait MediaIndex: Send + Sync {
    fn announce(&self, path: &Path, mime_type: &str);
}

/// Index that only records the announcement in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMediaIndex;

impl MediaIndex for LogMediaIndex {
    fn announce(&self, path: &Path, mime_type: &str) {
        tracing::info!(path = %path.display(), mime = mime_type, "new file announced");
    }
}

/// Opens a persisted file in an external viewer.
pub trait FileViewer: Send + Sync {
    fn open(&self, path: &Path, mime_type: &str) -> anyhow::Result<()>;
}
