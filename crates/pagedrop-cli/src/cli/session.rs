//! One CLI run of the bridge: context, dispatcher and transfer completions.

use super::platform::{ConsoleNotifier, CountingTransfers, DirectoryGate, PrintingHost, XdgOpenViewer};
use anyhow::{Context, Result};
use pagedrop_core::bridge::{self, BridgeChannel};
use pagedrop_core::config::PagedropConfig;
use pagedrop_core::context::{BridgeContext, Platform};
use pagedrop_core::host::NavigationInterceptor;
use pagedrop_core::media::LogMediaIndex;
use pagedrop_core::transfer::{CurlTransferService, TransferCompletion};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct Session {
    pub ctx: Arc<BridgeContext>,
    channel: BridgeChannel,
    dispatcher: JoinHandle<usize>,
    completions: mpsc::UnboundedReceiver<TransferCompletion>,
    accepted: Arc<AtomicUsize>,
}

impl Session {
    /// Builds the desktop platform, requests startup capabilities and starts the dispatcher.
    pub fn start(cfg: PagedropConfig) -> Result<Self> {
        let downloads_dir = cfg.downloads_dir()?;
        tracing::info!(dir = %downloads_dir.display(), "downloads directory");
        let media = Arc::new(LogMediaIndex);
        let (tx, completions) = mpsc::unbounded_channel();
        let curl =
            CurlTransferService::new(cfg.transfer.clone(), media.clone()).with_completions(tx);
        let (transfers, accepted) = CountingTransfers::new(curl);

        let ctx = BridgeContext::new(
            cfg,
            downloads_dir.clone(),
            Platform {
                notifier: Arc::new(ConsoleNotifier),
                gate: Arc::new(DirectoryGate::new(downloads_dir)),
                transfers: Arc::new(transfers),
                media,
                viewer: Some(Arc::new(XdgOpenViewer)),
            },
        );
        ctx.request_startup_capabilities();

        let (channel, dispatcher) = bridge::spawn(Arc::clone(&ctx));
        Ok(Self {
            ctx,
            channel,
            dispatcher,
            completions,
            accepted,
        })
    }

    pub fn channel(&self) -> &BridgeChannel {
        &self.channel
    }

    pub fn interceptor(&self, host: PrintingHost) -> NavigationInterceptor {
        NavigationInterceptor::new(&self.ctx, self.channel.clone(), Arc::new(host))
    }

    /// Closes the channel, waits for every queued call, any pending capability
    /// notice and then every accepted transfer. Fails when any transfer failed.
    pub async fn finish(self) -> Result<()> {
        let Session {
            ctx,
            channel,
            dispatcher,
            mut completions,
            accepted,
        } = self;
        drop(channel);
        let handled = dispatcher.await.context("bridge dispatcher panicked")?;
        tracing::debug!(handled, "bridge calls handled");
        ctx.permissions.settle_reports().await;

        let expected = accepted.load(Ordering::SeqCst);
        let mut failed = 0;
        for _ in 0..expected {
            let Some(done) = completions.recv().await else {
                break;
            };
            match done.result {
                Ok(bytes) => println!(
                    "Download complete: {} ({} bytes, sha256 {})",
                    done.destination.display(),
                    bytes,
                    done.sha256.as_deref().unwrap_or("-")
                ),
                Err(e) => {
                    eprintln!("Download failed {}: {}", done.id, e);
                    failed += 1;
                }
            }
        }
        if failed > 0 {
            anyhow::bail!("{} transfer(s) failed", failed);
        }
        Ok(())
    }
}
