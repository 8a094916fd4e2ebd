//! In-memory platform doubles shared by unit tests.

use crate::capability::{
    Capability, CapabilityGate, CapabilityOutcome, CapabilityRequest, PermissionBroker,
};
use crate::config::PagedropConfig;
use crate::context::{BridgeContext, Platform};
use crate::feedback::{FeedbackEvent, Notifier};
use crate::host::WebHost;
use crate::media::{FileViewer, MediaIndex};
use crate::transfer::{TransferId, TransferRequest, TransferService};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<FeedbackEvent>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<FeedbackEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: &FeedbackEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Gate with a fixed grant state and a scripted prompt answer.
pub struct ScriptedGate {
    granted: AtomicBool,
    answer: Option<bool>,
    prompts: AtomicUsize,
}

impl ScriptedGate {
    /// Everything already granted; prompts answer yes.
    pub fn granted() -> Self {
        Self {
            granted: AtomicBool::new(true),
            answer: Some(true),
            prompts: AtomicUsize::new(0),
        }
    }

    /// Nothing granted; every prompt is answered immediately with `grant`.
    pub fn answering(grant: bool) -> Self {
        Self {
            granted: AtomicBool::new(false),
            answer: Some(grant),
            prompts: AtomicUsize::new(0),
        }
    }

    /// Nothing granted; prompts stay open until the test delivers.
    pub fn deferred() -> Self {
        Self {
            granted: AtomicBool::new(false),
            answer: None,
            prompts: AtomicUsize::new(0),
        }
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

impl CapabilityGate for ScriptedGate {
    fn is_granted(&self, _capability: Capability) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    fn prompt(&self, request: CapabilityRequest, responder: PermissionBroker) {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        if let Some(grant) = self.answer {
            self.granted.store(grant, Ordering::SeqCst);
            let results = request.capabilities.iter().map(|c| (*c, grant)).collect();
            responder.deliver(request.id, CapabilityOutcome { results });
        }
    }
}

/// Transfer service that records requests instead of downloading.
#[derive(Default)]
pub struct RecordingTransfer {
    requests: Mutex<Vec<TransferRequest>>,
    fail_with: Option<String>,
}

impl RecordingTransfer {
    pub fn failing(message: &str) -> Self {
        Self {
            requests: Mutex::default(),
            fail_with: Some(message.to_string()),
        }
    }

    pub fn requests(&self) -> Vec<TransferRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl TransferService for RecordingTransfer {
    fn enqueue(&self, request: TransferRequest) -> anyhow::Result<TransferId> {
        if let Some(message) = &self.fail_with {
            anyhow::bail!("{}", message);
        }
        let mut requests = self.requests.lock().unwrap();
        requests.push(request);
        Ok(TransferId(requests.len() as u64))
    }
}

#[derive(Default)]
pub struct RecordingMediaIndex {
    announced: Mutex<Vec<(PathBuf, String)>>,
}

impl RecordingMediaIndex {
    pub fn announced(&self) -> Vec<(PathBuf, String)> {
        self.announced.lock().unwrap().clone()
    }
}

impl MediaIndex for RecordingMediaIndex {
    fn announce(&self, path: &Path, mime_type: &str) {
        self.announced
            .lock()
            .unwrap()
            .push((path.to_path_buf(), mime_type.to_string()));
    }
}

#[derive(Default)]
pub struct RecordingViewer {
    opened: Mutex<Vec<(PathBuf, String)>>,
}

impl RecordingViewer {
    pub fn opened(&self) -> Vec<(PathBuf, String)> {
        self.opened.lock().unwrap().clone()
    }
}

impl FileViewer for RecordingViewer {
    fn open(&self, path: &Path, mime_type: &str) -> anyhow::Result<()> {
        self.opened
            .lock()
            .unwrap()
            .push((path.to_path_buf(), mime_type.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingHost {
    scripts: Mutex<Vec<String>>,
}

impl RecordingHost {
    pub fn scripts(&self) -> Vec<String> {
        self.scripts.lock().unwrap().clone()
    }
}

impl WebHost for RecordingHost {
    fn evaluate_script(&self, script: &str) {
        self.scripts.lock().unwrap().push(script.to_string());
    }
}

/// Every double wired together, with handles kept for assertions.
pub struct Fixture {
    pub notifier: Arc<RecordingNotifier>,
    pub gate: Arc<ScriptedGate>,
    pub transfers: Arc<RecordingTransfer>,
    pub media: Arc<RecordingMediaIndex>,
    pub viewer: Arc<RecordingViewer>,
}

impl Fixture {
    pub fn new(gate: ScriptedGate, transfers: RecordingTransfer) -> Self {
        Self {
            notifier: Arc::new(RecordingNotifier::default()),
            gate: Arc::new(gate),
            transfers: Arc::new(transfers),
            media: Arc::new(RecordingMediaIndex::default()),
            viewer: Arc::new(RecordingViewer::default()),
        }
    }

    pub fn granted() -> Self {
        Self::new(ScriptedGate::granted(), RecordingTransfer::default())
    }

    pub fn context(&self, config: PagedropConfig, downloads_dir: &Path) -> Arc<BridgeContext> {
        BridgeContext::new(
            config,
            downloads_dir.to_path_buf(),
            Platform {
                notifier: self.notifier.clone(),
                gate: self.gate.clone(),
                transfers: self.transfers.clone(),
                media: self.media.clone(),
                viewer: Some(self.viewer.clone()),
            },
        )
    }

    pub fn events(&self) -> Vec<FeedbackEvent> {
        self.notifier.events()
    }
}
