//! Platform doubles for integration tests.

use pagedrop_core::capability::{
    Capability, CapabilityGate, CapabilityOutcome, CapabilityRequest, PermissionBroker,
};
use pagedrop_core::feedback::{FeedbackEvent, Notifier};
use pagedrop_core::host::WebHost;
use pagedrop_core::media::MediaIndex;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Default)]
pub struct Notices(Mutex<Vec<FeedbackEvent>>);

impl Notices {
    pub fn all(&self) -> Vec<FeedbackEvent> {
        self.0.lock().unwrap().clone()
    }
}

impl Notifier for Notices {
    fn notify(&self, event: &FeedbackEvent) {
        self.0.lock().unwrap().push(event.clone());
    }
}

/// Gate with a fixed answer for checks and prompts alike.
pub struct FixedGate(pub bool);

impl CapabilityGate for FixedGate {
    fn is_granted(&self, _capability: Capability) -> bool {
        self.0
    }

    fn prompt(&self, request: CapabilityRequest, responder: PermissionBroker) {
        let results = request.capabilities.iter().map(|c| (*c, self.0)).collect();
        responder.deliver(request.id, CapabilityOutcome { results });
    }
}

#[derive(Default)]
pub struct Announced(Mutex<Vec<PathBuf>>);

impl Announced {
    pub fn paths(&self) -> Vec<PathBuf> {
        self.0.lock().unwrap().clone()
    }
}

impl MediaIndex for Announced {
    fn announce(&self, path: &Path, _mime_type: &str) {
        self.0.lock().unwrap().push(path.to_path_buf());
    }
}

#[derive(Default)]
pub struct Scripts(Mutex<Vec<String>>);

impl Scripts {
    pub fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl WebHost for Scripts {
    fn evaluate_script(&self, script: &str) {
        self.0.lock().unwrap().push(script.to_string());
    }
}
