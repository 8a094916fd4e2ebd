//! libcurl transfer service: one background thread per direct download.
//!
//! Each transfer is a single GET written sequentially to `<destination>.part`
//! and renamed on success.

use super::{TransferCompletion, TransferId, TransferRequest, TransferService};
use crate::checksum::sha256_path;
use crate::config::TransferConfig;
use crate::media::MediaIndex;
use crate::storage::{PartFile, StorageError};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub struct CurlTransferService {
    settings: TransferConfig,
    media: Arc<dyn MediaIndex>,
    completions: Option<mpsc::UnboundedSender<TransferCompletion>>,
    next_id: AtomicU64,
}

impl CurlTransferService {
    pub fn new(settings: TransferConfig, media: Arc<dyn MediaIndex>) -> Self {
        Self {
            settings,
            media,
            completions: None,
            next_id: AtomicU64::new(0),
        }
    }

    /// Publish a [`TransferCompletion`] for every finished transfer on `tx`.
    pub fn with_completions(mut self, tx: mpsc::UnboundedSender<TransferCompletion>) -> Self {
        self.completions = Some(tx);
        self
    }
}

impl TransferService for CurlTransferService {
    fn enqueue(&self, request: TransferRequest) -> Result<TransferId> {
        if !request.url.starts_with("http://") && !request.url.starts_with("https://") {
            anyhow::bail!("unsupported URL for transfer: {}", request.url);
        }

        let id = TransferId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let settings = self.settings.clone();
        let media = Arc::clone(&self.media);
        let completions = self.completions.clone();

        std::thread::Builder::new()
            .name(format!("transfer-{}", id.0))
            .spawn(move || {
                tracing::info!(%id, url = %request.url, dest = %request.destination.display(), "transfer started");
                let result = download_single(&request, &settings);
                let sha256 = match &result {
                    Ok(bytes) => {
                        let sha256 = match sha256_path(&request.destination) {
                            Ok(digest) => Some(digest),
                            Err(e) => {
                                tracing::warn!(%id, "could not hash {}: {}", request.destination.display(), e);
                                None
                            }
                        };
                        tracing::info!(
                            %id,
                            bytes,
                            sha256 = sha256.as_deref().unwrap_or("-"),
                            title = %request.title,
                            notify = request.notify_on_completion,
                            "download complete"
                        );
                        if request.announce {
                            media.announce(&request.destination, &request.mime_type);
                        }
                        sha256
                    }
                    Err(e) => {
                        tracing::error!(%id, url = %request.url, "download failed: {:#}", e);
                        None
                    }
                };
                if let Some(tx) = completions {
                    let _ = tx.send(TransferCompletion {
                        id,
                        destination: request.destination.clone(),
                        result: result.map_err(|e| format!("{:#}", e)),
                        sha256,
                    });
                }
            })
            .context("failed to spawn transfer thread")?;

        Ok(id)
    }
}

/// Single GET of `request.url` into `request.destination`. Returns bytes written.
fn download_single(request: &TransferRequest, settings: &TransferConfig) -> Result<u64> {
    let mut part = PartFile::create(&request.destination)?;
    if let Some(len) = request.size_hint {
        part.preallocate(len);
    }

    let mut easy = curl::easy::Easy::new();
    easy.url(&request.url).context("invalid URL")?;
    easy.follow_location(true)?;
    easy.max_redirections(settings.max_redirections)?;
    easy.connect_timeout(Duration::from_secs(settings.connect_timeout_secs))?;
    easy.low_speed_limit(1024)?;
    easy.low_speed_time(Duration::from_secs(60))?;
    easy.timeout(Duration::from_secs(settings.timeout_secs))?;

    let mut list = curl::easy::List::new();
    for (k, v) in &request.headers {
        list.append(&format!("{}: {}", k.trim(), v.trim()))?;
    }
    if !request.headers.is_empty() {
        easy.http_headers(list)?;
    }

    let mut write_error: Option<StorageError> = None;
    let performed = {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(line) = str::from_utf8(data) {
                tracing::trace!(header = line.trim_end(), "response header");
            }
            true
        })?;
        transfer.write_function(|data| match part.write_all(data) {
            Ok(()) => Ok(data.len()),
            Err(e) => {
                write_error = Some(e);
                Ok(0) // abort transfer
            }
        })?;
        transfer.perform()
    };

    if let Some(e) = write_error {
        return Err(e).context("writing download");
    }
    performed.context("GET request failed")?;

    let code = easy.response_code().context("no response code")?;
    if !(200..300).contains(&code) {
        anyhow::bail!("GET {} returned HTTP {}", request.url, code);
    }

    let written = part.written();
    if let Some(hint) = request.size_hint {
        if written != hint {
            tracing::warn!(written, hint, "transfer size differs from announced length");
        }
    }
    let path: PathBuf = part.finalize()?;
    tracing::debug!(path = %path.display(), "transfer finalized");
    Ok(written)
}
