//! Desktop stand-ins for the mobile platform services.

use anyhow::{Context, Result};
use pagedrop_core::capability::{
    Capability, CapabilityGate, CapabilityOutcome, CapabilityRequest, PermissionBroker,
};
use pagedrop_core::feedback::{FeedbackEvent, Notifier, Severity};
use pagedrop_core::host::WebHost;
use pagedrop_core::media::FileViewer;
use pagedrop_core::transfer::{TransferId, TransferRequest, TransferService};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Prints notices: info to stdout, errors to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, event: &FeedbackEvent) {
        match event.severity {
            Severity::Info => println!("{}", event.message),
            Severity::Error => eprintln!("{}", event.message),
        }
    }
}

/// Storage capabilities are granted when the downloads directory is writable.
/// Prompts are answered immediately.
pub struct DirectoryGate {
    dir: PathBuf,
}

impl DirectoryGate {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn writable(&self) -> bool {
        std::fs::create_dir_all(&self.dir).is_ok()
            && std::fs::metadata(&self.dir)
                .map(|m| m.is_dir() && !m.permissions().readonly())
                .unwrap_or(false)
    }
}

impl CapabilityGate for DirectoryGate {
    fn is_granted(&self, _capability: Capability) -> bool {
        self.writable()
    }

    fn prompt(&self, request: CapabilityRequest, responder: PermissionBroker) {
        let granted = self.writable();
        let results = request.capabilities.iter().map(|c| (*c, granted)).collect();
        responder.deliver(request.id, CapabilityOutcome { results });
    }
}

/// Web host without a page: scripts are printed so they can be pasted into a console.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrintingHost {
    pub quiet: bool,
}

impl WebHost for PrintingHost {
    fn evaluate_script(&self, script: &str) {
        tracing::debug!(len = script.len(), "evaluate script");
        if !self.quiet {
            println!("{}", script);
        }
    }
}

/// Opens files with `xdg-open`.
#[derive(Debug, Default, Clone, Copy)]
pub struct XdgOpenViewer;

impl FileViewer for XdgOpenViewer {
    fn open(&self, path: &Path, mime_type: &str) -> Result<()> {
        tracing::info!(path = %path.display(), mime = mime_type, "opening file");
        let status = Command::new("xdg-open")
            .arg(path)
            .status()
            .context("no application available to open the file")?;
        if !status.success() {
            anyhow::bail!("xdg-open exited with {}", status);
        }
        Ok(())
    }
}

/// Counts accepted transfers so the CLI knows how many completions to wait for.
pub struct CountingTransfers<T> {
    inner: T,
    accepted: Arc<AtomicUsize>,
}

impl<T: TransferService> CountingTransfers<T> {
    pub fn new(inner: T) -> (Self, Arc<AtomicUsize>) {
        let accepted = Arc::new(AtomicUsize::new(0));
        (
            Self {
                inner,
                accepted: Arc::clone(&accepted),
            },
            accepted,
        )
    }
}

impl<T: TransferService> TransferService for CountingTransfers<T> {
    fn enqueue(&self, request: TransferRequest) -> Result<TransferId> {
        let id = self.inner.enqueue(request)?;
        self.accepted.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }
}
