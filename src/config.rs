use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::audit::mac::IntegrityKey;
use crate::error::{GalleryLogError, Result};

/// Default config file, resolved relative to the working directory with any
/// supported extension (`gallery.toml`, `gallery.yaml`, ...).
pub const DEFAULT_CONFIG_NAME: &str = "gallery";

/// Prefix of environment overrides, e.g. `GALLERY_LOG_PATH`.
pub const ENV_PREFIX: &str = "GALLERY";

/// Legacy environment variable holding the integrity key.
pub const LEGACY_KEY_ENV: &str = "INTEGRITY_KEY";

#[derive(Clone, Deserialize)]
pub struct AppConfig {
    pub log_path: PathBuf,
    pub audit_log_path: PathBuf,
    #[serde(default)]
    pub integrity_key: Option<String>,
    #[serde(default)]
    pub writer_token: Option<String>,
    #[serde(default)]
    pub reader_token: Option<String>,
}

impl AppConfig {
    /// Load defaults, then the config file, then `GALLERY_*` environment
    /// variables.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let file_source = match config_file {
            Some(path) => ::config::File::from(path.to_path_buf()).required(true),
            None => ::config::File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let settings = ::config::Config::builder()
            .set_default("log_path", "gallery.log")?
            .set_default("audit_log_path", "audit.log")?
            .add_source(file_source)
            .add_source(::config::Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let mut config: AppConfig = settings.try_deserialize()?;
        if config.integrity_key.is_none() {
            config.integrity_key = env::var(LEGACY_KEY_ENV).ok();
        }

        info!("Configuration loaded (log: {:?})", config.log_path);
        Ok(config)
    }

    /// The MAC key. Missing or empty is a configuration error.
    pub fn integrity_key(&self) -> Result<IntegrityKey> {
        match self.integrity_key.as_deref() {
            Some(key) if !key.is_empty() => IntegrityKey::new(key.as_bytes()),
            _ => Err(GalleryLogError::missing_secret("Integrity key")),
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("AppConfig")
            .field("log_path", &self.log_path)
            .field("audit_log_path", &self.audit_log_path)
            .field("integrity_key", &redact(&self.integrity_key))
            .field("writer_token", &redact(&self.writer_token))
            .field("reader_token", &redact(&self.reader_token))
            .finish()
    }
}
