//! Platform transfer service for direct downloads.
//!
//! The sink only enqueues; the service owns the transfer from then on and the
//! sink never sees its progress. [`CurlTransferService`] is the libcurl-backed
//! implementation; completions are published with the transfer id for hosts
//! that want them.

mod curl_service;

pub use curl_service::CurlTransferService;

use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransferId(pub u64);

impl std::fmt::Display for TransferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything the transfer service needs for one direct download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub url: String,
    pub destination: PathBuf,
    pub title: String,
    pub description: String,
    pub mime_type: String,
    /// Request headers, e.g. `User-Agent` and `Accept`.
    pub headers: BTreeMap<String, String>,
    /// Announced length, used to preallocate.
    pub size_hint: Option<u64>,
    /// Show a completion notification when done.
    pub notify_on_completion: bool,
    /// Announce the finished file to the media index.
    pub announce: bool,
}

/// Published by a transfer service when a transfer ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferCompletion {
    pub id: TransferId,
    pub destination: PathBuf,
    /// Bytes written, or the failure reason.
    pub result: Result<u64, String>,
    /// SHA-256 of the finished file, when it could be read back.
    pub sha256: Option<String>,
}

pub trait TransferService: Send + Sync {
    /// Hands the request to the transfer machinery. Returns once the transfer
    /// is queued, not when it is done.
    fn enqueue(&self, request: TransferRequest) -> anyhow::Result<TransferId>;
}
