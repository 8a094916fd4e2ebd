//! `pagedrop classify <url>`: show the decision and the rule that produced it.

use anyhow::Result;
use pagedrop_core::classifier::{Candidate, DownloadStart, RuleTable};
use pagedrop_core::config::PagedropConfig;

pub fn run_classify(
    cfg: &PagedropConfig,
    url: &str,
    mime: Option<String>,
    disposition: Option<String>,
    download: bool,
) -> Result<()> {
    let rules = RuleTable::from_config(cfg);
    let event;
    let candidate = if download || mime.is_some() || disposition.is_some() {
        event = DownloadStart {
            url: url.to_string(),
            mime_type: mime,
            content_disposition: disposition,
            ..Default::default()
        };
        Candidate::DownloadStart(&event)
    } else {
        Candidate::Navigation { url }
    };

    let decision = rules.classify(&candidate);
    match rules.matching_rule(&candidate) {
        Some(rule) => println!("{}\t(rule: {})", decision, rule.name),
        None => println!("{}", decision),
    }
    Ok(())
}
