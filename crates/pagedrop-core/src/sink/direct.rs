use super::{DownloadRequest, TransferTicket};
use crate::context::BridgeContext;
use crate::error::BridgeError;
use crate::filename::{resolve_filename, FilenameHints};
use crate::transfer::TransferRequest;
use std::collections::BTreeMap;

pub(super) fn enqueue(
    ctx: &BridgeContext,
    request: &DownloadRequest,
) -> Result<TransferTicket, BridgeError> {
    let cfg = &ctx.config;
    let mime_type = request
        .mime_type
        .clone()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| cfg.naming.default_mime.clone());
    let doc_type = cfg.document_type_for_mime(&mime_type).cloned();

    let filename = resolve_filename(
        FilenameHints {
            url: &request.locator,
            suggested: request.suggested_filename.as_deref(),
            content_disposition: request.content_disposition.as_deref(),
        },
        &cfg.naming,
        doc_type.as_ref(),
        ctx.clock.next_millis(),
    );

    let mut headers = BTreeMap::new();
    if let Some(ua) = request.user_agent.as_deref().filter(|ua| !ua.is_empty()) {
        headers.insert("User-Agent".to_string(), ua.to_string());
    }
    headers.insert("Accept".to_string(), cfg.accept_header());

    let destination = ctx.downloads_dir.join(&filename);
    let transfer = TransferRequest {
        url: request.locator.clone(),
        destination: destination.clone(),
        title: filename.clone(),
        description: cfg.transfer.description.clone(),
        mime_type: mime_type.clone(),
        headers,
        size_hint: request.content_length,
        notify_on_completion: true,
        announce: true,
    };

    let id = ctx
        .transfers
        .enqueue(transfer)
        .map_err(|e| BridgeError::Enqueue(format!("{:#}", e)))?;

    Ok(TransferTicket {
        id,
        filename,
        destination,
        mime_type,
    })
}
