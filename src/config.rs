//! Configuration management for leadflow.
//!
//! Settings load from `leadflow.toml` in the data directory when present,
//! falling back to defaults. Environment variables from a `.env` file are
//! loaded before parsing (see `main.rs`).

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ocr::OcrConfig;

const CONFIG_FILE: &str = "leadflow.toml";

/// HTTP server binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8001,
        }
    }
}

/// Top-level application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding leads.json, workflows.json, and the config file.
    pub data_dir: Option<PathBuf>,
    pub server: ServerConfig,
    pub ocr: OcrConfig,
}

impl Settings {
    /// Effective data directory (defaults to the current directory).
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Load settings, preferring `leadflow.toml` under `data_dir` (or the
/// current directory when no data dir was given).
pub fn load_settings(data_dir: Option<PathBuf>) -> anyhow::Result<Settings> {
    let base = data_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let mut settings = read_config_file(&base.join(CONFIG_FILE))?.unwrap_or_default();
    if data_dir.is_some() {
        settings.data_dir = data_dir;
    }
    Ok(settings)
}

fn read_config_file(path: &Path) -> anyhow::Result<Option<Settings>> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            debug!("Loading settings from {}", path.display());
            let settings = toml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(Some(settings))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_config_file() {
        let temp = TempDir::new().unwrap();
        let settings = load_settings(Some(temp.path().to_path_buf())).unwrap();
        assert_eq!(settings.server.port, 8001);
        assert_eq!(settings.ocr.backend, "tesseract");
        assert_eq!(settings.data_dir(), temp.path());
    }

    #[test]
    fn test_partial_config_file_overrides() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE),
            "[server]\nport = 9000\n\n[ocr]\nbackend = \"vision\"\n",
        )
        .unwrap();
        let settings = load_settings(Some(temp.path().to_path_buf())).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.ocr.backend, "vision");
        // Unspecified keys keep their defaults.
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.ocr.language, "eng");
    }
}
