//! Web host glue: the callbacks a web view delivers, routed through the classifier.

use crate::bridge::BridgeChannel;
use crate::classifier::{Candidate, Decision, DownloadStart, RuleTable};
use crate::context::BridgeContext;
use crate::materializer::MaterializerScript;
use crate::sink::DownloadRequest;
use std::sync::Arc;

const BLOB_NOTICE: &str = "Blob download detected - processing...";

/// The embedding web view.
pub trait WebHost: Send + Sync {
    /// Run `script` in the page's main frame. Fire-and-forget.
    fn evaluate_script(&self, script: &str);
}

/// Receives web view callbacks and decides whether each one is a download.
pub struct NavigationInterceptor {
    rules: RuleTable,
    script: MaterializerScript,
    channel: BridgeChannel,
    host: Arc<dyn WebHost>,
}

impl NavigationInterceptor {
    pub fn new(ctx: &BridgeContext, channel: BridgeChannel, host: Arc<dyn WebHost>) -> Self {
        Self {
            rules: RuleTable::from_config(&ctx.config),
            script: MaterializerScript::new(&ctx.config),
            channel,
            host,
        }
    }

    /// Navigation override hook. Returns true when the navigation was consumed
    /// and the host must not load `url`.
    pub fn should_override_url_loading(&self, url: &str) -> bool {
        let decision = self.rules.classify(&Candidate::Navigation { url });
        match decision {
            Decision::BlobIntercept => self.materialize(url),
            Decision::DirectIntercept => self.channel.enqueue_direct_download(url),
            Decision::Ignore => {}
        }
        decision.consumes_event()
    }

    /// Download-start hook. `Ignore` leaves the callback to the host.
    pub fn on_download_start(&self, event: &DownloadStart) -> Decision {
        let decision = self.rules.classify(&Candidate::DownloadStart(event));
        match decision {
            Decision::BlobIntercept => self.materialize(&event.url),
            Decision::DirectIntercept => self
                .channel
                .enqueue_request(DownloadRequest::from_download_start(event)),
            Decision::Ignore => {}
        }
        decision
    }

    /// Page-finished hook: installs the click and `location.assign` interceptors.
    pub fn on_page_finished(&self, url: &str) {
        tracing::debug!(url, "installing blob interception");
        self.host.evaluate_script(self.script.install());
    }

    fn materialize(&self, url: &str) {
        tracing::info!(url, "blob download intercepted");
        self.channel.show_notice(BLOB_NOTICE);
        self.host.evaluate_script(&self.script.materialize(url));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge;
    use crate::config::PagedropConfig;
    use crate::testing::{Fixture, RecordingHost};

    struct Harness {
        fx: Fixture,
        host: Arc<RecordingHost>,
        interceptor: NavigationInterceptor,
        dispatcher: tokio::task::JoinHandle<usize>,
        _dir: tempfile::TempDir,
    }

    fn harness(config: PagedropConfig) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let fx = Fixture::granted();
        let ctx = fx.context(config, dir.path());
        let (channel, dispatcher) = bridge::spawn(Arc::clone(&ctx));
        let host = Arc::new(RecordingHost::default());
        let interceptor = NavigationInterceptor::new(&ctx, channel, host.clone());
        Harness {
            fx,
            host,
            interceptor,
            dispatcher,
            _dir: dir,
        }
    }

    impl Harness {
        async fn finish(self) -> (Fixture, Arc<RecordingHost>) {
            drop(self.interceptor);
            self.dispatcher.await.unwrap();
            (self.fx, self.host)
        }
    }

    #[tokio::test]
    async fn blob_navigation_is_consumed_and_materialized() {
        let h = harness(PagedropConfig::default());
        assert!(h
            .interceptor
            .should_override_url_loading("blob:https://app.example/abc-123"));
        let (fx, host) = h.finish().await;

        let scripts = host.scripts();
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].ends_with(r#"window.__pagedrop.handle("blob:https://app.example/abc-123");"#));
        assert_eq!(fx.events()[0].message, BLOB_NOTICE);
        assert!(fx.transfers.requests().is_empty());
    }

    #[tokio::test]
    async fn document_navigation_becomes_direct_transfer() {
        let h = harness(PagedropConfig::default());
        assert!(h.interceptor.should_override_url_loading("https://host/report.pdf"));
        let (fx, host) = h.finish().await;

        assert!(host.scripts().is_empty());
        let sent = fx.transfers.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, "https://host/report.pdf");
        assert_eq!(sent[0].mime_type, "application/pdf");
        assert!(sent[0].title.ends_with(".pdf"));
    }

    #[tokio::test]
    async fn data_uri_navigation_is_persisted_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let fx = Fixture::granted();
        let ctx = fx.context(PagedropConfig::default(), dir.path());
        let (channel, dispatcher) = bridge::spawn(Arc::clone(&ctx));
        let interceptor = NavigationInterceptor::new(&ctx, channel, Arc::new(RecordingHost::default()));

        assert!(interceptor.should_override_url_loading("data:application/pdf;base64,JVBERi0x"));
        drop(interceptor);
        dispatcher.await.unwrap();

        let files: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(files.len(), 1);
        assert_eq!(std::fs::read(&files[0]).unwrap(), b"%PDF-1");
        assert!(fx.transfers.requests().is_empty());
        let events = fx.events();
        assert_eq!(events.len(), 1);
        assert!(!events[0].is_error());
        assert!(events[0].message.starts_with("Download complete: relatorio_safeprag_"));
    }

    #[tokio::test]
    async fn ordinary_navigation_proceeds() {
        let h = harness(PagedropConfig::default());
        assert!(!h
            .interceptor
            .should_override_url_loading("https://safeprag-final.vercel.app/dashboard"));
        let (fx, host) = h.finish().await;
        assert!(host.scripts().is_empty());
        assert!(fx.events().is_empty());
        assert!(fx.transfers.requests().is_empty());
    }

    #[tokio::test]
    async fn download_start_carries_callback_metadata() {
        let h = harness(PagedropConfig::default());
        let event = DownloadStart {
            url: "https://host/export?id=7".into(),
            user_agent: Some("Mozilla/5.0".into()),
            content_disposition: Some("attachment; filename=\"laudo.pdf\"".into()),
            mime_type: Some("application/pdf".into()),
            content_length: Some(512),
        };
        assert_eq!(h.interceptor.on_download_start(&event), Decision::DirectIntercept);
        let (fx, _host) = h.finish().await;

        let sent = fx.transfers.requests();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].title.starts_with("laudo_"));
        assert_eq!(sent[0].size_hint, Some(512));
        assert_eq!(sent[0].headers.get("User-Agent").map(String::as_str), Some("Mozilla/5.0"));
    }

    #[tokio::test]
    async fn blob_download_start_is_materialized() {
        let h = harness(PagedropConfig::default());
        let event = DownloadStart {
            url: "blob:https://app.example/f00d".into(),
            ..Default::default()
        };
        assert_eq!(h.interceptor.on_download_start(&event), Decision::BlobIntercept);
        let (_fx, host) = h.finish().await;
        assert_eq!(host.scripts().len(), 1);
    }

    #[tokio::test]
    async fn unrecognized_download_start_left_to_host_when_configured() {
        let mut cfg = PagedropConfig::default();
        cfg.intercept_download_callbacks = false;
        let h = harness(cfg);
        let event = DownloadStart {
            url: "https://host/export?id=7".into(),
            mime_type: Some("text/csv".into()),
            ..Default::default()
        };
        assert_eq!(h.interceptor.on_download_start(&event), Decision::Ignore);
        let (fx, _host) = h.finish().await;
        assert!(fx.transfers.requests().is_empty());
    }

    #[tokio::test]
    async fn page_finished_installs_interceptors() {
        let h = harness(PagedropConfig::default());
        h.interceptor.on_page_finished("https://safeprag-final.vercel.app/");
        h.interceptor.on_page_finished("https://safeprag-final.vercel.app/reports");
        let (_fx, host) = h.finish().await;
        let scripts = host.scripts();
        assert_eq!(scripts.len(), 2);
        assert!(scripts[0].contains("window.__pagedrop.installed"));
        assert_eq!(scripts[0], scripts[1]);
    }
}
