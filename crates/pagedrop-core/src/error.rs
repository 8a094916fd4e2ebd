//! Error taxonomy for a single download attempt.
//!
//! Every variant is terminal for the attempt: the sink surfaces it as an error
//! [`FeedbackEvent`](crate::feedback::FeedbackEvent) and a log line, nothing is retried.

use crate::capability::Capability;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Storage capability not granted; a new capability request has been issued.
    #[error("storage permission required for download ({capability})")]
    CapabilityDenied { capability: Capability },

    /// Encoded payload body is not valid base64.
    #[error("invalid encoded payload: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Open, write, sync or rename failed.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Transfer service unavailable or rejected the request.
    #[error("could not start download: {0}")]
    Enqueue(String),

    /// Malformed bridge message or dispatcher gone.
    #[error("bridge: {0}")]
    Bridge(String),
}

impl BridgeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BridgeError::Io {
            path: path.into(),
            source,
        }
    }

    /// Short machine-friendly kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::CapabilityDenied { .. } => "capability_denied",
            BridgeError::Decode(_) => "decode",
            BridgeError::Io { .. } => "io",
            BridgeError::Enqueue(_) => "enqueue",
            BridgeError::Bridge(_) => "bridge",
        }
    }
}
