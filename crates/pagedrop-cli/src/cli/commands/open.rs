//! `pagedrop open <filename>`: open a persisted file with the desktop viewer.

use crate::cli::platform::{ConsoleNotifier, DirectoryGate, XdgOpenViewer};
use anyhow::Result;
use pagedrop_core::config::PagedropConfig;
use pagedrop_core::context::{BridgeContext, Platform};
use pagedrop_core::media::LogMediaIndex;
use pagedrop_core::sink::DownloadSink;
use pagedrop_core::transfer::CurlTransferService;
use std::sync::Arc;

pub fn run_open(cfg: PagedropConfig, filename: &str) -> Result<()> {
    let downloads_dir = cfg.downloads_dir()?;
    let transfer_cfg = cfg.transfer.clone();
    let ctx = BridgeContext::new(
        cfg,
        downloads_dir.clone(),
        Platform {
            notifier: Arc::new(ConsoleNotifier),
            gate: Arc::new(DirectoryGate::new(downloads_dir)),
            transfers: Arc::new(CurlTransferService::new(transfer_cfg, Arc::new(LogMediaIndex))),
            media: Arc::new(LogMediaIndex),
            viewer: Some(Arc::new(XdgOpenViewer)),
        },
    );
    let path = DownloadSink::new(ctx).open_persisted(filename)?;
    tracing::info!(path = %path.display(), "opened");
    Ok(())
}
