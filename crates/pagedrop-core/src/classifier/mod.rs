//! Content classification: should a navigation or download callback be intercepted?
//!
//! Classification is a first-match walk over an ordered [`RuleTable`].
//! Document types come from configuration, so new types are data, not code.

mod rules;

pub use rules::{Predicate, Rule, RuleTable};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scheme prefix of in-memory page blobs.
pub const BLOB_SCHEME: &str = "blob:";

/// Scheme prefix of locators that carry their own bytes.
pub const DATA_SCHEME: &str = "data:";

/// What to do with one navigation or download callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Decision {
    /// Not a download; let the host navigate normally.
    Ignore,
    /// In-page blob; materialize it in the page and persist through the bridge.
    BlobIntercept,
    /// Network document; hand it to the platform transfer service.
    DirectIntercept,
}

impl Decision {
    /// True when the host must suppress its default handling.
    pub fn consumes_event(&self) -> bool {
        !matches!(self, Decision::Ignore)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Decision::Ignore => "ignore",
            Decision::BlobIntercept => "blob-intercept",
            Decision::DirectIntercept => "direct-intercept",
        })
    }
}

/// Metadata of a host download-start callback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadStart {
    pub url: String,
    pub user_agent: Option<String>,
    pub content_disposition: Option<String>,
    pub mime_type: Option<String>,
    pub content_length: Option<u64>,
}

/// Event under classification.
#[derive(Debug, Clone, Copy)]
pub enum Candidate<'a> {
    Navigation { url: &'a str },
    DownloadStart(&'a DownloadStart),
}

impl<'a> Candidate<'a> {
    pub fn url(&self) -> &'a str {
        match *self {
            Candidate::Navigation { url } => url,
            Candidate::DownloadStart(d) => &d.url,
        }
    }

    pub fn mime_type(&self) -> Option<&'a str> {
        match *self {
            Candidate::Navigation { .. } => None,
            Candidate::DownloadStart(d) => d.mime_type.as_deref(),
        }
    }

    pub fn content_disposition(&self) -> Option<&'a str> {
        match *self {
            Candidate::Navigation { .. } => None,
            Candidate::DownloadStart(d) => d.content_disposition.as_deref(),
        }
    }

    pub fn is_download_start(&self) -> bool {
        matches!(self, Candidate::DownloadStart(_))
    }
}

/// True for `blob:` locators (case-insensitive, leading whitespace ignored).
pub fn is_blob_locator(url: &str) -> bool {
    has_scheme(url, BLOB_SCHEME)
}

/// True for `data:` locators, which need no network transfer.
pub fn is_data_locator(url: &str) -> bool {
    has_scheme(url, DATA_SCHEME)
}

fn has_scheme(url: &str, scheme: &str) -> bool {
    url.trim_start()
        .get(..scheme.len())
        .map(|p| p.eq_ignore_ascii_case(scheme))
        .unwrap_or(false)
}
