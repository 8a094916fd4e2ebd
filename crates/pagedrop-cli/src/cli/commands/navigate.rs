//! `pagedrop navigate <url>`: run a navigation through the interceptor.

use crate::cli::platform::PrintingHost;
use crate::cli::session::Session;
use anyhow::Result;
use pagedrop_core::config::PagedropConfig;

pub async fn run_navigate(cfg: PagedropConfig, url: &str) -> Result<()> {
    let session = Session::start(cfg)?;
    let interceptor = session.interceptor(PrintingHost { quiet: false });
    let consumed = interceptor.should_override_url_loading(url);
    drop(interceptor);
    if consumed {
        tracing::info!(url, "navigation intercepted");
    } else {
        println!("Not a download; the page would navigate to {}", url);
    }
    session.finish().await
}
