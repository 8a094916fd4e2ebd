use super::PersistedFile;
use crate::checksum::sha256_bytes;
use crate::context::BridgeContext;
use crate::error::BridgeError;
use crate::filename::{normalize_extension, sanitize_filename, synthesize};
use crate::materializer::EncodedPayload;
use crate::storage;
use std::path::PathBuf;

pub(super) fn persist(
    ctx: &BridgeContext,
    payload_data_uri: &str,
    filename: &str,
) -> Result<PersistedFile, BridgeError> {
    let cfg = &ctx.config;
    let payload = EncodedPayload::from_data_uri(payload_data_uri, filename, &cfg.naming.default_mime);
    // Decode before anything touches the disk.
    let bytes = payload.decode()?;

    let doc_type = cfg.document_type_for_mime(&payload.mime_type).cloned();
    let sanitized = sanitize_filename(&payload.filename);
    let name = if sanitized.is_empty() {
        let doc = doc_type.unwrap_or_else(|| cfg.primary_document_type());
        synthesize(&cfg.naming.blob_base_name, ctx.clock.next_millis(), Some(&doc))
    } else {
        normalize_extension(sanitized, doc_type.as_ref())
    };

    let path = storage::persist_bytes(&ctx.downloads_dir, &name, &bytes)
        .map_err(|e| BridgeError::io(e.path, e.source))?;
    ctx.media.announce(&path, &payload.mime_type);

    Ok(PersistedFile {
        path,
        filename: name,
        mime_type: payload.mime_type,
        len: bytes.len() as u64,
        sha256: sha256_bytes(&bytes),
    })
}

pub(super) fn open(ctx: &BridgeContext, filename: &str) -> Result<PathBuf, BridgeError> {
    let name = sanitize_filename(filename);
    let path = ctx.downloads_dir.join(&name);
    if name.is_empty() || !path.is_file() {
        return Err(BridgeError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        ));
    }
    let viewer = ctx
        .viewer
        .as_ref()
        .ok_or_else(|| BridgeError::Bridge("no application available to open the file".to_string()))?;
    let mime = ctx
        .config
        .document_types
        .iter()
        .find(|d| name.to_ascii_lowercase().ends_with(&d.dotted_extension()))
        .map(|d| d.mime.clone())
        .unwrap_or_else(|| ctx.config.naming.default_mime.clone());
    viewer
        .open(&path, &mime)
        .map_err(|e| BridgeError::Bridge(format!("{:#}", e)))?;
    Ok(path)
}
