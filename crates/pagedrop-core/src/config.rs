use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// A downloadable document type the bridge intercepts (MIME plus extension without dot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentType {
    pub mime: String,
    pub extension: String,
}

impl DocumentType {
    pub fn new(mime: &str, extension: &str) -> Self {
        Self {
            mime: mime.to_string(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Extension without the leading dot, lowercase.
    pub fn bare_extension(&self) -> String {
        self.extension.trim_start_matches('.').to_ascii_lowercase()
    }

    /// `.pdf` style suffix, lowercase.
    pub fn dotted_extension(&self) -> String {
        format!(".{}", self.bare_extension())
    }
}

/// Platform levels that decide which storage capabilities are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// API level of the running platform.
    pub api_level: u32,
    /// From this level on, writes to the public downloads area need no capability.
    pub scoped_storage_api_level: u32,
    /// From this level on, the granular media-read capabilities replace the storage pair.
    pub granular_media_api_level: u32,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            api_level: 34,
            scoped_storage_api_level: 29,
            granular_media_api_level: 33,
        }
    }
}

impl PlatformConfig {
    /// True when persisting into the downloads area requires the write capability.
    pub fn requires_write_capability(&self) -> bool {
        self.api_level < self.scoped_storage_api_level
    }
}

/// Filename synthesis parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Base name for materialized blobs and unnamed document downloads.
    pub blob_base_name: String,
    /// Base name for unnamed downloads that are not a known document type.
    pub fallback_base_name: String,
    /// MIME used when nothing better is known.
    pub default_mime: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            blob_base_name: "relatorio_safeprag".to_string(),
            fallback_base_name: "arquivo".to_string(),
            default_mime: "application/pdf".to_string(),
        }
    }
}

/// Direct transfer parameters (curl transfer service).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Description attached to every enqueued transfer.
    pub description: String,
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
    pub max_redirections: u32,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            description: "SafePrag report download".to_string(),
            connect_timeout_secs: 30,
            timeout_secs: 3600,
            max_redirections: 10,
        }
    }
}

/// Global configuration loaded from `~/.config/pagedrop/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedropConfig {
    /// Public downloads directory. None = `$XDG_DOWNLOAD_DIR`, else `$HOME/Downloads`.
    #[serde(default)]
    pub downloads_dir: Option<PathBuf>,
    /// Name of the native object exposed to the page (`window[bridge_name]`).
    #[serde(default = "default_bridge_name")]
    pub bridge_name: String,
    /// Treat every non-blob download-start callback as a direct download.
    #[serde(default = "default_intercept_download_callbacks")]
    pub intercept_download_callbacks: bool,
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub naming: NamingConfig,
    #[serde(default)]
    pub transfer: TransferConfig,
    /// Ordered list of document types; the first one is the materializer's target type.
    #[serde(default = "default_document_types")]
    pub document_types: Vec<DocumentType>,
}

fn default_bridge_name() -> String {
    "Android".to_string()
}

fn default_intercept_download_callbacks() -> bool {
    true
}

fn default_document_types() -> Vec<DocumentType> {
    vec![DocumentType::new("application/pdf", "pdf")]
}

impl Default for PagedropConfig {
    fn default() -> Self {
        Self {
            downloads_dir: None,
            bridge_name: default_bridge_name(),
            intercept_download_callbacks: default_intercept_download_callbacks(),
            platform: PlatformConfig::default(),
            naming: NamingConfig::default(),
            transfer: TransferConfig::default(),
            document_types: default_document_types(),
        }
    }
}

impl PagedropConfig {
    /// Resolved downloads directory (config value, then environment).
    pub fn downloads_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.downloads_dir {
            return Ok(dir.clone());
        }
        if let Some(dir) = std::env::var_os("XDG_DOWNLOAD_DIR") {
            return Ok(PathBuf::from(dir));
        }
        let home = std::env::var_os("HOME").context("HOME is not set and no downloads_dir configured")?;
        Ok(PathBuf::from(home).join("Downloads"))
    }

    /// Looks up a document type by MIME (case-insensitive, parameters ignored).
    pub fn document_type_for_mime(&self, mime: &str) -> Option<&DocumentType> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        self.document_types
            .iter()
            .find(|d| d.mime.eq_ignore_ascii_case(essence))
    }

    /// The type the materializer encodes blobs as (first configured, or the default MIME).
    pub fn primary_document_type(&self) -> DocumentType {
        self.document_types
            .first()
            .cloned()
            .unwrap_or_else(|| DocumentType::new(&self.naming.default_mime, "pdf"))
    }

    /// `Accept` header value for direct transfers, e.g. `application/pdf,*/*`.
    pub fn accept_header(&self) -> String {
        let mut parts: Vec<&str> = self.document_types.iter().map(|d| d.mime.as_str()).collect();
        parts.push("*/*");
        parts.join(",")
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pagedrop")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<PagedropConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = PagedropConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: PagedropConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
