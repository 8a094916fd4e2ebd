//! `pagedrop persist <file>`: hand a local file over the bridge as an encoded payload.

use crate::cli::session::Session;
use anyhow::{Context, Result};
use pagedrop_core::config::PagedropConfig;
use pagedrop_core::filename::synthesize;
use pagedrop_core::materializer::encode_data_uri;
use std::path::Path;

pub async fn run_persist(
    cfg: PagedropConfig,
    path: &Path,
    name: Option<&str>,
    mime: &str,
) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let session = Session::start(cfg)?;
    let filename = match name {
        Some(n) => n.to_string(),
        None => {
            let doc = session.ctx.config.document_type_for_mime(mime).cloned();
            synthesize(
                &session.ctx.config.naming.blob_base_name,
                session.ctx.clock.next_millis(),
                doc.as_ref(),
            )
        }
    };
    tracing::info!(src = %path.display(), bytes = bytes.len(), %filename, "persisting local file");
    session
        .channel()
        .persist_encoded_payload(&encode_data_uri(mime, &bytes), &filename);
    session.finish().await
}
