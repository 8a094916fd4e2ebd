//! Download sink: the only component that writes to storage.
//!
//! Every call ends in exactly one terminal outcome. The sink returns it and
//! emits exactly one terminal feedback event for it (success or error), so a
//! request that reaches the sink is never silently lost.

mod blob;
mod direct;
mod request;

pub use request::{DownloadRequest, PersistedFile, TransferTicket};

use crate::capability::{required_capabilities, write_capability};
use crate::context::BridgeContext;
use crate::error::BridgeError;
use crate::feedback::{self, FeedbackEvent};
use crate::filename::parse_content_disposition_filename;
use std::path::PathBuf;
use std::sync::Arc;

const PERMISSION_NOTICE: &str = "Storage permission required for download";

#[derive(Clone)]
pub struct DownloadSink {
    ctx: Arc<BridgeContext>,
}

impl DownloadSink {
    pub fn new(ctx: Arc<BridgeContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Arc<BridgeContext> {
        &self.ctx
    }

    /// Decodes a page payload and persists it under `filename` in the downloads directory.
    pub fn persist_encoded(
        &self,
        payload_data_uri: &str,
        filename: &str,
    ) -> Result<PersistedFile, BridgeError> {
        tracing::debug!(filename, payload_len = payload_data_uri.len(), "persist encoded payload");
        let result = self
            .ensure_write_capability()
            .and_then(|_| blob::persist(&self.ctx, payload_data_uri, filename));
        match &result {
            Ok(file) => {
                tracing::info!(
                    path = %file.path.display(),
                    bytes = file.len,
                    sha256 = %file.sha256,
                    "file saved"
                );
                self.emit(FeedbackEvent::info(format!(
                    "Download complete: {}\nSaved to {}",
                    file.filename,
                    file.path.display()
                )));
            }
            Err(e) => self.report("Error saving file", e),
        }
        result
    }

    /// Persists a `data:` locator directly. The name comes from the request's
    /// suggestion or Content-Disposition, or is synthesized.
    pub fn persist_inline(&self, request: &DownloadRequest) -> Result<PersistedFile, BridgeError> {
        let filename = request
            .suggested_filename
            .clone()
            .or_else(|| {
                request
                    .content_disposition
                    .as_deref()
                    .and_then(parse_content_disposition_filename)
            })
            .unwrap_or_default();
        self.persist_encoded(&request.locator, &filename)
    }

    /// Hands a network download to the transfer service.
    pub fn enqueue_direct(&self, request: &DownloadRequest) -> Result<TransferTicket, BridgeError> {
        tracing::debug!(url = %request.locator, "enqueue direct download");
        let result = self
            .ensure_write_capability()
            .and_then(|_| direct::enqueue(&self.ctx, request));
        match &result {
            Ok(ticket) => {
                tracing::info!(
                    id = %ticket.id,
                    url = %request.locator,
                    file = %ticket.filename,
                    "download enqueued"
                );
                self.emit(FeedbackEvent::info(format!(
                    "Download started: {}\nCheck the Downloads folder",
                    ticket.filename
                )));
            }
            Err(e) => self.report("Error starting download", e),
        }
        result
    }

    pub fn show_notice(&self, message: &str) {
        self.emit(FeedbackEvent::info(message));
    }

    /// Opens a previously persisted file with the platform viewer.
    pub fn open_persisted(&self, filename: &str) -> Result<PathBuf, BridgeError> {
        let result = blob::open(&self.ctx, filename);
        if let Err(e) = &result {
            self.report("Error opening file", e);
        }
        result
    }

    /// Below the scoped-storage level the write capability must be granted.
    /// When it is not, a new request is issued and the attempt fails.
    fn ensure_write_capability(&self) -> Result<(), BridgeError> {
        let platform = &self.ctx.config.platform;
        let Some(capability) = write_capability(platform) else {
            return Ok(());
        };
        if self.ctx.permissions.is_granted(capability) {
            return Ok(());
        }
        let wanted = self.ctx.permissions.missing(&required_capabilities(platform));
        let wanted = if wanted.is_empty() { vec![capability] } else { wanted };
        self.ctx
            .permissions
            .request_with_notice(wanted, Arc::clone(&self.ctx.notifier));
        Err(BridgeError::CapabilityDenied { capability })
    }

    fn report(&self, what: &str, err: &BridgeError) {
        tracing::error!(kind = err.kind(), "{}: {}", what, err);
        let message = match err {
            BridgeError::CapabilityDenied { .. } => PERMISSION_NOTICE.to_string(),
            other => format!("{}: {}", what, other),
        };
        self.emit(FeedbackEvent::error(message));
    }

    fn emit(&self, event: FeedbackEvent) {
        feedback::emit(self.ctx.notifier.as_ref(), event);
    }
}
