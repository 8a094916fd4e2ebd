//! Filename resolution for persisted downloads.
//!
//! Names come from an explicit suggestion, the Content-Disposition header or
//! the URL path, in that order, and are sanitized. Derived names carry a
//! timestamp token so repeated downloads of the same resource do not collide;
//! when nothing usable exists a name is synthesized from the configured base
//! names. Known document types always end in their extension.

mod content_disposition;
mod path;
mod sanitize;

pub use content_disposition::parse_content_disposition_filename;
pub use path::filename_from_url_path;
pub use sanitize::sanitize_filename;

use crate::config::{DocumentType, NamingConfig};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Inputs available when naming a download.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilenameHints<'a> {
    pub url: &'a str,
    pub suggested: Option<&'a str>,
    pub content_disposition: Option<&'a str>,
}

/// Millisecond timestamps that never repeat within one process.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: AtomicU64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wall-clock millis, bumped past the previous value when the clock has not advanced.
    pub fn next_millis(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }
}

/// `<base>_<timestamp>.<ext>`, or `<base>_<timestamp>` without a document type.
pub fn synthesize(base: &str, timestamp: u64, doc_type: Option<&DocumentType>) -> String {
    match doc_type {
        Some(doc) => format!("{}_{}{}", base, timestamp, doc.dotted_extension()),
        None => format!("{}_{}", base, timestamp),
    }
}

/// Appends the document extension unless the name already ends with it.
pub fn normalize_extension(name: String, doc_type: Option<&DocumentType>) -> String {
    match doc_type {
        Some(doc) => {
            let ext = doc.dotted_extension();
            if name.to_ascii_lowercase().ends_with(&ext) {
                name
            } else {
                name + &ext
            }
        }
        None => name,
    }
}

/// `report.pdf` -> `report_<ts>.pdf`; names without an extension get the token appended.
fn with_timestamp(name: &str, timestamp: u64) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            format!("{}_{}.{}", stem, timestamp, ext)
        }
        _ => format!("{}_{}", name, timestamp),
    }
}

fn usable(name: String) -> Option<String> {
    (!name.is_empty() && name != "." && name != "..").then_some(name)
}

/// Resolves the final filename for a download.
///
/// `doc_type` is the recognized document type of the download's MIME, if any.
/// An explicit suggestion is used as given (sanitized); names derived from the
/// header or URL get `timestamp` inserted before the extension.
pub fn resolve_filename(
    hints: FilenameHints<'_>,
    naming: &NamingConfig,
    doc_type: Option<&DocumentType>,
    timestamp: u64,
) -> String {
    let explicit = hints
        .suggested
        .map(sanitize_filename)
        .and_then(usable);

    let name = explicit.or_else(|| {
        hints
            .content_disposition
            .and_then(parse_content_disposition_filename)
            .or_else(|| filename_from_url_path(hints.url))
            .map(|raw| sanitize_filename(&raw))
            .and_then(usable)
            .map(|n| with_timestamp(&n, timestamp))
    });

    match name {
        Some(n) => normalize_extension(n, doc_type),
        None => match doc_type {
            Some(_) => synthesize(&naming.blob_base_name, timestamp, doc_type),
            None => synthesize(&naming.fallback_base_name, timestamp, None),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf() -> DocumentType {
        DocumentType::new("application/pdf", "pdf")
    }

    fn hints(url: &str) -> FilenameHints<'_> {
        FilenameHints {
            url,
            ..Default::default()
        }
    }

    #[test]
    fn name_from_url_path_gets_timestamp() {
        let naming = NamingConfig::default();
        let pdf = pdf();
        assert_eq!(
            resolve_filename(hints("https://host/report.pdf"), &naming, Some(&pdf), 42),
            "report_42.pdf"
        );
    }

    #[test]
    fn content_disposition_overrides_url() {
        let naming = NamingConfig::default();
        let h = FilenameHints {
            url: "https://host/download?id=9",
            suggested: None,
            content_disposition: Some("attachment; filename=\"laudo.pdf\""),
        };
        assert_eq!(resolve_filename(h, &naming, None, 7), "laudo_7.pdf");
    }

    #[test]
    fn explicit_suggestion_kept_as_given() {
        let naming = NamingConfig::default();
        let pdf = pdf();
        let h = FilenameHints {
            url: "https://host/x.pdf",
            suggested: Some("relatorio_safeprag_1.pdf"),
            content_disposition: None,
        };
        assert_eq!(resolve_filename(h, &naming, Some(&pdf), 99), "relatorio_safeprag_1.pdf");
    }

    #[test]
    fn extension_normalized_for_documents() {
        let naming = NamingConfig::default();
        let pdf = pdf();
        assert_eq!(
            resolve_filename(hints("https://host/download"), &naming, Some(&pdf), 5),
            "download_5.pdf"
        );
        assert_eq!(
            resolve_filename(hints("https://host/REPORT.PDF"), &naming, Some(&pdf), 5),
            "REPORT_5.PDF"
        );
    }

    #[test]
    fn synthesized_when_nothing_usable() {
        let naming = NamingConfig::default();
        let pdf = pdf();
        assert_eq!(
            resolve_filename(hints("https://host/"), &naming, Some(&pdf), 1700000000000),
            "relatorio_safeprag_1700000000000.pdf"
        );
        assert_eq!(
            resolve_filename(hints("https://host/"), &naming, None, 3),
            "arquivo_3"
        );
    }

    #[test]
    fn same_inputs_different_timestamps_do_not_collide() {
        let naming = NamingConfig::default();
        let pdf = pdf();
        let inputs = [
            hints("https://host/report.pdf"),
            hints("https://host/"),
            FilenameHints {
                url: "https://host/x",
                suggested: None,
                content_disposition: Some("attachment; filename=a.pdf"),
            },
        ];
        for h in inputs {
            let a = resolve_filename(h, &naming, Some(&pdf), 1000);
            let b = resolve_filename(h, &naming, Some(&pdf), 1001);
            assert_ne!(a, b);
            assert!(a.ends_with(".pdf") && b.ends_with(".pdf"));
        }
    }

    #[test]
    fn monotonic_clock_never_repeats() {
        let clock = MonotonicClock::new();
        let mut prev = clock.next_millis();
        for _ in 0..1000 {
            let next = clock.next_millis();
            assert!(next > prev);
            prev = next;
        }
    }
}
