use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::DEFAULT_CHAT;
use crate::timestamp::TimestampParser;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const DEFAULT_STORAGE_PREFIX: &str = "bubbly-annotations";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Messages handed to the renderer per page.
    pub page_size: usize,
    /// Namespace in front of the report identity in storage keys.
    pub storage_prefix: String,
    /// Offset used for timestamps that carry no zone.
    pub utc_offset_minutes: i32,
    pub default_chat: String,
    pub diagnostics_dir: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            storage_prefix: DEFAULT_STORAGE_PREFIX.to_string(),
            utc_offset_minutes: 0,
            default_chat: DEFAULT_CHAT.to_string(),
            diagnostics_dir: None,
        }
    }
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("reading {}: {}", path.display(), e)))?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, CoreError> {
        let cfg: ViewerConfig =
            toml::from_str(raw).map_err(|e| CoreError::Config(format!("parsing config toml: {}", e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_toml_string(&self) -> Result<String, CoreError> {
        toml::to_string_pretty(self).map_err(|e| CoreError::Config(format!("serializing config: {}", e)))
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.page_size == 0 {
            return Err(CoreError::Config("page_size must be positive".to_string()));
        }
        if self.storage_prefix.trim().is_empty() {
            return Err(CoreError::Config("storage_prefix must not be empty".to_string()));
        }
        if self.default_chat.trim().is_empty() {
            return Err(CoreError::Config("default_chat must not be empty".to_string()));
        }
        self.timestamp_parser()?;
        Ok(())
    }

    pub fn timestamp_parser(&self) -> Result<TimestampParser, CoreError> {
        TimestampParser::with_utc_offset_minutes(self.utc_offset_minutes)
            .map_err(|e| CoreError::Config(e.to_string()))
    }
}
