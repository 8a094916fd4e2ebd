//! Filename hint from a URL path.

use super::content_disposition::percent_decode;

/// Last non-empty path segment of `url`, percent-decoded.
///
/// Returns `None` if the URL cannot be parsed, has no hierarchical path
/// (`data:`, `blob:`), or the path is empty/root.
pub fn filename_from_url_path(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    if parsed.cannot_be_a_base() {
        return None;
    }
    let segment = parsed.path().split('/').filter(|s| !s.is_empty()).last()?;
    let decoded = percent_decode(segment);
    if decoded.is_empty() || decoded == "." || decoded == ".." {
        return None;
    }
    Some(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal() {
        assert_eq!(
            filename_from_url_path("https://host/reports/2024/report.pdf").as_deref(),
            Some("report.pdf")
        );
        assert_eq!(
            filename_from_url_path("https://host/download").as_deref(),
            Some("download")
        );
    }

    #[test]
    fn root_or_empty() {
        assert_eq!(filename_from_url_path("https://host/"), None);
        assert_eq!(filename_from_url_path("https://host"), None);
    }

    #[test]
    fn query_is_ignored_and_escapes_decoded() {
        assert_eq!(
            filename_from_url_path("https://host/laudo%20final.pdf?token=abc").as_deref(),
            Some("laudo final.pdf")
        );
    }

    #[test]
    fn opaque_urls_have_no_path_name() {
        assert_eq!(filename_from_url_path("blob:https://app.example/abc-123"), None);
        assert_eq!(filename_from_url_path("data:application/pdf;base64,AAAA"), None);
        assert_eq!(filename_from_url_path("not a url"), None);
    }
}
