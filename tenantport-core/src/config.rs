use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::errors::CoreError;

const DEVELOPMENT_SIGNING_SECRET: &str = "tenantport-development-signing-secret";

/// Runtime knobs for the transfer engine. Values come from defaults, an optional TOML
/// file, then the environment, with CLI flags applied last by the binary.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    pub database_url: String,
    /// Root directory of the disk attachment store.
    pub storage_root: PathBuf,
    /// Secret keying signed rich-text references.
    pub signing_secret: Option<String>,
    /// Application segment of `gid://` references.
    pub application_name: String,
    /// Completed exports older than this are removed by cleanup.
    pub export_retention_hours: i64,
    /// Buffer size used when streaming attachment bytes.
    pub copy_chunk_size: usize,
    /// Reject unknown or dangling polymorphic references during validation.
    pub strict_polymorphic_references: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://tenantport.db?mode=rwc".to_string(),
            storage_root: PathBuf::from("./storage"),
            signing_secret: None,
            application_name: "tenantport".to_string(),
            export_retention_hours: 24,
            copy_chunk_size: 64 * 1024,
            strict_polymorphic_references: false,
        }
    }
}

impl TransferConfig {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CoreError::validation(format!("Failed to read config {}: {}", path.display(), e))
                .with_source(e)
        })?;
        let config: TransferConfig = toml::from_str(&raw).map_err(|e| {
            CoreError::validation(format!("Failed to parse config {}: {}", path.display(), e))
                .with_source(e)
        })?;
        Ok(config.with_env_overrides())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("TENANTPORT_DATABASE_URL") {
            self.database_url = url;
        }
        if let Ok(root) = std::env::var("TENANTPORT_STORAGE_ROOT") {
            self.storage_root = PathBuf::from(root);
        }
        if let Ok(secret) = std::env::var("TENANTPORT_SIGNING_SECRET") {
            self.signing_secret = Some(secret);
        }
        if let Ok(name) = std::env::var("TENANTPORT_APP_NAME") {
            self.application_name = name;
        }
        if let Some(hours) = env_parse("TENANTPORT_EXPORT_RETENTION_HOURS") {
            self.export_retention_hours = hours;
        }
        if let Some(size) = env_parse("TENANTPORT_COPY_CHUNK_SIZE") {
            self.copy_chunk_size = size;
        }
        if let Some(strict) = env_parse("TENANTPORT_STRICT_POLYMORPHIC") {
            self.strict_polymorphic_references = strict;
        }
        self
    }

    /// Secret for signed references, falling back to a fixed development value.
    pub fn signing_secret(&self) -> &str {
        match self.signing_secret.as_deref() {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                warn!("TENANTPORT_SIGNING_SECRET is not set; using the development secret");
                DEVELOPMENT_SIGNING_SECRET
            }
        }
    }

    pub fn export_retention(&self) -> chrono::Duration {
        chrono::Duration::hours(self.export_retention_hours)
    }

    pub fn chunk_size(&self) -> usize {
        self.copy_chunk_size.max(1024)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring unparseable {}={}", key, raw);
            None
        }
    }
}
