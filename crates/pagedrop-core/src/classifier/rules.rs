use super::{Candidate, Decision, BLOB_SCHEME};
use crate::config::PagedropConfig;
use crate::filename::parse_content_disposition_filename;

/// Condition a rule tests. URL tests are ASCII case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// URL starts with this scheme prefix (`blob:`).
    Scheme(String),
    /// URL path ends with this suffix (`.pdf`); query and fragment are ignored.
    PathSuffix(String),
    /// URL contains this substring anywhere.
    UrlContains(String),
    /// Callback MIME type equals this type (parameters ignored).
    MimeIs(String),
    /// Content-Disposition filename ends with this suffix.
    DispositionSuffix(String),
    /// Any download-start callback.
    DownloadCallback,
}

impl Predicate {
    pub fn matches(&self, candidate: &Candidate<'_>) -> bool {
        let url = candidate.url().trim().to_ascii_lowercase();
        match self {
            Predicate::Scheme(scheme) => url.starts_with(scheme.as_str()),
            Predicate::PathSuffix(suffix) => path_of(&url).ends_with(suffix.as_str()),
            Predicate::UrlContains(needle) => url.contains(needle.as_str()),
            Predicate::MimeIs(mime) => candidate
                .mime_type()
                .and_then(|m| m.split(';').next())
                .map(|m| m.trim().eq_ignore_ascii_case(mime))
                .unwrap_or(false),
            Predicate::DispositionSuffix(suffix) => candidate
                .content_disposition()
                .and_then(parse_content_disposition_filename)
                .map(|name| name.to_ascii_lowercase().ends_with(suffix.as_str()))
                .unwrap_or(false),
            Predicate::DownloadCallback => candidate.is_download_start(),
        }
    }
}

/// Path portion of an already-lowercased URL; the whole string when it does not parse.
fn path_of(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) if !parsed.cannot_be_a_base() => parsed.path().to_string(),
        _ => url
            .split(|c| c == '?' || c == '#')
            .next()
            .unwrap_or("")
            .to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Short label for logs.
    pub name: String,
    pub predicate: Predicate,
    pub decision: Decision,
}

impl Rule {
    pub fn new(name: impl Into<String>, predicate: Predicate, decision: Decision) -> Self {
        Self {
            name: name.into(),
            predicate,
            decision,
        }
    }
}

/// Ordered rules; the first match decides, no match means [`Decision::Ignore`].
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Standard table: blob scheme first, then one group of document rules per
    /// configured type, the `download` token, and optionally the catch-all for
    /// download callbacks.
    pub fn from_config(cfg: &PagedropConfig) -> Self {
        let mut rules = vec![Rule::new(
            "blob-scheme",
            Predicate::Scheme(BLOB_SCHEME.to_string()),
            Decision::BlobIntercept,
        )];

        for doc in &cfg.document_types {
            let ext = doc.dotted_extension();
            let mime = doc.mime.to_ascii_lowercase();
            rules.push(Rule::new(
                format!("path-suffix{}", ext),
                Predicate::PathSuffix(ext.clone()),
                Decision::DirectIntercept,
            ));
            rules.push(Rule::new(
                format!("query-suffix{}", ext),
                Predicate::UrlContains(format!("{}?", ext)),
                Decision::DirectIntercept,
            ));
            rules.push(Rule::new(
                format!("url-mime:{}", mime),
                Predicate::UrlContains(mime.clone()),
                Decision::DirectIntercept,
            ));
            rules.push(Rule::new(
                format!("mime:{}", mime),
                Predicate::MimeIs(mime),
                Decision::DirectIntercept,
            ));
            rules.push(Rule::new(
                format!("disposition{}", ext),
                Predicate::DispositionSuffix(ext),
                Decision::DirectIntercept,
            ));
        }

        rules.push(Rule::new(
            "download-token",
            Predicate::UrlContains("download".to_string()),
            Decision::DirectIntercept,
        ));

        if cfg.intercept_download_callbacks {
            rules.push(Rule::new(
                "download-callback",
                Predicate::DownloadCallback,
                Decision::DirectIntercept,
            ));
        }

        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// First rule matching `candidate`.
    pub fn matching_rule(&self, candidate: &Candidate<'_>) -> Option<&Rule> {
        self.rules.iter().find(|r| r.predicate.matches(candidate))
    }

    pub fn classify(&self, candidate: &Candidate<'_>) -> Decision {
        let rule = self.matching_rule(candidate);
        let decision = rule.map(|r| r.decision).unwrap_or(Decision::Ignore);
        tracing::debug!(
            url = candidate.url(),
            rule = rule.map(|r| r.name.as_str()).unwrap_or("-"),
            %decision,
            "classified"
        );
        decision
    }
}
