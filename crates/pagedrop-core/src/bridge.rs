//! Bridge channel: the page's call surface into native code.
//!
//! Calls are one-way. Whatever thread they arrive on, they are queued onto a
//! single dispatcher task that owns every storage and notice operation and
//! handles calls in arrival order. Nothing is returned to the page; a call
//! means the operation was initiated, not finished.

use crate::classifier::is_data_locator;
use crate::context::BridgeContext;
use crate::error::BridgeError;
use crate::feedback::{self, FeedbackEvent};
use crate::sink::{DownloadRequest, DownloadSink};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One queued call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCall {
    PersistEncodedPayload {
        payload_data_uri: String,
        filename: String,
    },
    EnqueueDirectDownload(DownloadRequest),
    ShowNotice {
        message: String,
    },
}

impl BridgeCall {
    fn name(&self) -> &'static str {
        match self {
            BridgeCall::PersistEncodedPayload { .. } => "persistEncodedPayload",
            BridgeCall::EnqueueDirectDownload(_) => "enqueueDirectDownload",
            BridgeCall::ShowNotice { .. } => "showNotice",
        }
    }
}

/// JSON form of a call, for hosts that only pass strings
/// (`{"call":"showNotice","message":"..."}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "camelCase")]
pub enum WireMessage {
    #[serde(rename_all = "camelCase")]
    PersistEncodedPayload {
        payload_data_uri: String,
        filename: String,
    },
    EnqueueDirectDownload {
        locator: String,
    },
    ShowNotice {
        message: String,
    },
}

impl From<WireMessage> for BridgeCall {
    fn from(msg: WireMessage) -> Self {
        match msg {
            WireMessage::PersistEncodedPayload {
                payload_data_uri,
                filename,
            } => BridgeCall::PersistEncodedPayload {
                payload_data_uri,
                filename,
            },
            WireMessage::EnqueueDirectDownload { locator } => {
                BridgeCall::EnqueueDirectDownload(DownloadRequest::from_locator(&locator))
            }
            WireMessage::ShowNotice { message } => BridgeCall::ShowNotice { message },
        }
    }
}

/// Sending half of the bridge. Cheap to clone, usable from any thread.
#[derive(Clone)]
pub struct BridgeChannel {
    tx: mpsc::UnboundedSender<BridgeCall>,
    ctx: Arc<BridgeContext>,
}

impl BridgeChannel {
    /// `persistEncodedPayload(payloadDataUri, filename)`
    pub fn persist_encoded_payload(&self, payload_data_uri: &str, filename: &str) {
        self.send(BridgeCall::PersistEncodedPayload {
            payload_data_uri: payload_data_uri.to_string(),
            filename: filename.to_string(),
        });
    }

    /// `enqueueDirectDownload(locator)`
    pub fn enqueue_direct_download(&self, locator: &str) {
        self.enqueue_request(DownloadRequest::from_locator(locator));
    }

    /// Direct download carrying host callback metadata.
    pub fn enqueue_request(&self, request: DownloadRequest) {
        self.send(BridgeCall::EnqueueDirectDownload(request));
    }

    /// `showNotice(message)`
    pub fn show_notice(&self, message: &str) {
        self.send(BridgeCall::ShowNotice {
            message: message.to_string(),
        });
    }

    /// Parses one JSON wire message and queues it. Malformed input is reported
    /// as an error notice and dropped.
    pub fn dispatch_json(&self, raw: &str) {
        match serde_json::from_str::<WireMessage>(raw) {
            Ok(msg) => self.send(msg.into()),
            Err(e) => {
                let err = BridgeError::Bridge(format!("malformed message: {}", e));
                tracing::warn!(raw_len = raw.len(), "{}", err);
                feedback::emit(
                    self.ctx.notifier.as_ref(),
                    FeedbackEvent::error(format!("Error processing download: {}", err)),
                );
            }
        }
    }

    fn send(&self, call: BridgeCall) {
        let name = call.name();
        if self.tx.send(call).is_err() {
            let err = BridgeError::Bridge("dispatcher is not running".to_string());
            tracing::error!(call = name, "{}", err);
            feedback::emit(
                self.ctx.notifier.as_ref(),
                FeedbackEvent::error(format!("Error processing download: {}", err)),
            );
        } else {
            tracing::trace!(call = name, "bridge call queued");
        }
    }
}

/// Receiving half: runs queued calls one at a time against the sink.
pub struct UiDispatcher {
    rx: mpsc::UnboundedReceiver<BridgeCall>,
    sink: DownloadSink,
}

impl UiDispatcher {
    /// Runs until every [`BridgeChannel`] clone is dropped. Returns the number of calls handled.
    pub async fn run(mut self) -> usize {
        let mut handled = 0;
        while let Some(call) = self.rx.recv().await {
            self.handle(call);
            handled += 1;
        }
        tracing::debug!(handled, "bridge dispatcher stopped");
        handled
    }

    fn handle(&self, call: BridgeCall) {
        tracing::debug!(call = call.name(), "bridge call");
        // Outcomes are reported by the sink; the page gets nothing back.
        match call {
            BridgeCall::PersistEncodedPayload {
                payload_data_uri,
                filename,
            } => {
                let _ = self.sink.persist_encoded(&payload_data_uri, &filename);
            }
            BridgeCall::EnqueueDirectDownload(request) if is_data_locator(&request.locator) => {
                let _ = self.sink.persist_inline(&request);
            }
            BridgeCall::EnqueueDirectDownload(request) => {
                let _ = self.sink.enqueue_direct(&request);
            }
            BridgeCall::ShowNotice { message } => self.sink.show_notice(&message),
        }
    }
}

/// Creates a channel and its dispatcher without starting it.
pub fn channel(ctx: Arc<BridgeContext>) -> (BridgeChannel, UiDispatcher) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sink = DownloadSink::new(Arc::clone(&ctx));
    (BridgeChannel { tx, ctx }, UiDispatcher { rx, sink })
}

/// Creates a channel and spawns its dispatcher on the current tokio runtime.
pub fn spawn(ctx: Arc<BridgeContext>) -> (BridgeChannel, JoinHandle<usize>) {
    let (channel, dispatcher) = channel(ctx);
    (channel, tokio::spawn(dispatcher.run()))
}
