//! Explicit context shared by every bridge component.
//!
//! Holds the configuration and the platform services. Components receive an
//! `Arc<BridgeContext>` at construction; nothing is looked up globally.

use crate::capability::{required_capabilities, CapabilityGate, PermissionBroker};
use crate::config::PagedropConfig;
use crate::feedback::Notifier;
use crate::filename::MonotonicClock;
use crate::media::{FileViewer, MediaIndex};
use crate::transfer::TransferService;
use std::path::PathBuf;
use std::sync::Arc;

/// Platform services a host provides.
pub struct Platform {
    pub notifier: Arc<dyn Notifier>,
    pub gate: Arc<dyn CapabilityGate>,
    pub transfers: Arc<dyn TransferService>,
    pub media: Arc<dyn MediaIndex>,
    pub viewer: Option<Arc<dyn FileViewer>>,
}

pub struct BridgeContext {
    pub config: PagedropConfig,
    pub downloads_dir: PathBuf,
    pub notifier: Arc<dyn Notifier>,
    pub permissions: PermissionBroker,
    pub transfers: Arc<dyn TransferService>,
    pub media: Arc<dyn MediaIndex>,
    pub viewer: Option<Arc<dyn FileViewer>>,
    pub clock: MonotonicClock,
}

impl BridgeContext {
    pub fn new(config: PagedropConfig, downloads_dir: PathBuf, platform: Platform) -> Arc<Self> {
        Arc::new(Self {
            config,
            downloads_dir,
            notifier: platform.notifier,
            permissions: PermissionBroker::new(platform.gate),
            transfers: platform.transfers,
            media: platform.media,
            viewer: platform.viewer,
            clock: MonotonicClock::new(),
        })
    }

    /// Requests whatever startup capabilities are still missing. Returns true
    /// when a request was issued.
    pub fn request_startup_capabilities(&self) -> bool {
        let missing = self
            .permissions
            .missing(&required_capabilities(&self.config.platform));
        if missing.is_empty() {
            tracing::debug!("startup capabilities already granted");
            return false;
        }
        self.permissions
            .request_with_notice(missing, Arc::clone(&self.notifier));
        true
    }
}
