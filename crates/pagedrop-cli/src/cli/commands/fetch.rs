//! `pagedrop fetch <url>`: enqueue a direct download and wait for it.

use crate::cli::session::Session;
use anyhow::Result;
use pagedrop_core::config::PagedropConfig;
use pagedrop_core::sink::DownloadRequest;

pub async fn run_fetch(
    cfg: PagedropConfig,
    url: &str,
    name: Option<&str>,
    user_agent: Option<String>,
    mime: Option<String>,
) -> Result<()> {
    let mut request = DownloadRequest::from_locator(url);
    if let Some(name) = name {
        request = request.with_filename(name);
    }
    request.user_agent = user_agent;
    request.mime_type = mime;

    let session = Session::start(cfg)?;
    session.channel().enqueue_request(request);
    session.finish().await
}
