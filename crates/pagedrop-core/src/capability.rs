//! Storage capability gate and the request broker.
//!
//! The platform prompt is asynchronous: [`CapabilityGate::prompt`] shows it and
//! the answer comes back through [`PermissionBroker::deliver`], keyed by the
//! request id. Waiters get the outcome through a oneshot channel. A request
//! made while one with the same id is still pending joins it instead of
//! prompting again; every waiter receives the same outcome.

use crate::config::PlatformConfig;
use crate::feedback::{self, FeedbackEvent, Notifier};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Fixed id used for every storage capability request.
pub const STORAGE_REQUEST_ID: RequestId = RequestId(1001);

const GRANTED_NOTICE: &str = "Permissions granted! You can now download and share files.";
const DENIED_NOTICE: &str =
    "Some permissions were denied. Downloading and sharing files may not work correctly.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ReadExternalStorage,
    WriteExternalStorage,
    ReadMediaImages,
    ReadMediaVideo,
    ReadMediaAudio,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ReadExternalStorage => "READ_EXTERNAL_STORAGE",
            Capability::WriteExternalStorage => "WRITE_EXTERNAL_STORAGE",
            Capability::ReadMediaImages => "READ_MEDIA_IMAGES",
            Capability::ReadMediaVideo => "READ_MEDIA_VIDEO",
            Capability::ReadMediaAudio => "READ_MEDIA_AUDIO",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capabilities the host asks for at startup, by platform level.
pub fn required_capabilities(platform: &PlatformConfig) -> Vec<Capability> {
    if platform.api_level >= platform.granular_media_api_level {
        vec![
            Capability::ReadMediaImages,
            Capability::ReadMediaVideo,
            Capability::ReadMediaAudio,
        ]
    } else {
        vec![
            Capability::ReadExternalStorage,
            Capability::WriteExternalStorage,
        ]
    }
}

/// Capability a write into the downloads area needs, if any.
pub fn write_capability(platform: &PlatformConfig) -> Option<Capability> {
    platform
        .requires_write_capability()
        .then_some(Capability::WriteExternalStorage)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityRequest {
    pub id: RequestId,
    pub capabilities: Vec<Capability>,
}

/// Per-capability answer to a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityOutcome {
    pub results: Vec<(Capability, bool)>,
}

impl CapabilityOutcome {
    pub fn all_granted(&self) -> bool {
        self.results.iter().all(|(_, granted)| *granted)
    }
}

/// Platform permission subsystem.
pub trait CapabilityGate: Send + Sync {
    fn is_granted(&self, capability: Capability) -> bool;

    /// Show the platform prompt. The answer must be handed to `responder.deliver`,
    /// synchronously or later from any thread.
    fn prompt(&self, request: CapabilityRequest, responder: PermissionBroker);
}

/// Outcome future for one request. `joined` is true when the request attached
/// to a prompt that was already showing.
pub struct PendingCapability {
    pub receiver: oneshot::Receiver<CapabilityOutcome>,
    pub joined: bool,
}

type Waiters = HashMap<RequestId, Vec<oneshot::Sender<CapabilityOutcome>>>;

/// Correlates prompts with their asynchronous answers.
#[derive(Clone)]
pub struct PermissionBroker {
    gate: Arc<dyn CapabilityGate>,
    pending: Arc<Mutex<Waiters>>,
    reports: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl PermissionBroker {
    pub fn new(gate: Arc<dyn CapabilityGate>) -> Self {
        Self {
            gate,
            pending: Arc::new(Mutex::new(HashMap::new())),
            reports: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn is_granted(&self, capability: Capability) -> bool {
        self.gate.is_granted(capability)
    }

    pub fn missing(&self, capabilities: &[Capability]) -> Vec<Capability> {
        capabilities
            .iter()
            .copied()
            .filter(|c| !self.gate.is_granted(*c))
            .collect()
    }

    pub fn is_pending(&self, id: RequestId) -> bool {
        self.lock_pending().contains_key(&id)
    }

    /// Ask for `capabilities` under [`STORAGE_REQUEST_ID`].
    pub fn request(&self, capabilities: Vec<Capability>) -> PendingCapability {
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.lock_pending();
            if let Some(waiters) = pending.get_mut(&STORAGE_REQUEST_ID) {
                waiters.push(tx);
                tracing::debug!(
                    request_id = STORAGE_REQUEST_ID.0,
                    "capability prompt already pending; joining"
                );
                return PendingCapability {
                    receiver: rx,
                    joined: true,
                };
            }
            pending.insert(STORAGE_REQUEST_ID, vec![tx]);
        }

        let request = CapabilityRequest {
            id: STORAGE_REQUEST_ID,
            capabilities,
        };
        tracing::info!(
            request_id = request.id.0,
            capabilities = ?request.capabilities,
            "requesting capabilities"
        );
        // Lock released: the gate may answer synchronously.
        self.gate.prompt(request, self.clone());
        PendingCapability {
            receiver: rx,
            joined: false,
        }
    }

    /// Completes the pending request `id`. Unknown ids are logged and dropped.
    pub fn deliver(&self, id: RequestId, outcome: CapabilityOutcome) {
        let waiters = self.lock_pending().remove(&id);
        match waiters {
            Some(waiters) => {
                tracing::info!(
                    request_id = id.0,
                    granted = outcome.all_granted(),
                    waiters = waiters.len(),
                    "capability result"
                );
                for tx in waiters {
                    let _ = tx.send(outcome.clone());
                }
            }
            None => tracing::warn!(request_id = id.0, "capability result with no pending request"),
        }
    }

    /// Requests `capabilities` and, when this call opened the prompt, reports
    /// the result to the user once it arrives. Needs a tokio runtime for the
    /// report; without one the request is still issued.
    pub fn request_with_notice(&self, capabilities: Vec<Capability>, notifier: Arc<dyn Notifier>) {
        let pending = self.request(capabilities);
        if pending.joined {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let report = handle.spawn(async move {
                    if let Ok(outcome) = pending.receiver.await {
                        let event = if outcome.all_granted() {
                            FeedbackEvent::info(GRANTED_NOTICE)
                        } else {
                            FeedbackEvent::error(DENIED_NOTICE)
                        };
                        feedback::emit(notifier.as_ref(), event);
                    }
                });
                self.reports
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(report);
            }
            Err(_) => tracing::debug!("no runtime; capability result will not be reported"),
        }
    }

    /// Waits until every result notice for an answered prompt has been
    /// emitted. Returns the number of notices waited on. While a prompt is
    /// still unanswered nothing is waited on.
    pub async fn settle_reports(&self) -> usize {
        if self.is_pending(STORAGE_REQUEST_ID) {
            tracing::debug!("capability prompt unanswered; not waiting for its notice");
            return 0;
        }
        let reports: Vec<_> = self
            .reports
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect();
        let count = reports.len();
        for report in reports {
            if let Err(e) = report.await {
                tracing::warn!("capability notice task failed: {}", e);
            }
        }
        count
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Waiters> {
        // A poisoned map only means a waiter panicked; the map itself is intact.
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}
