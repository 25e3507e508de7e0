//! Export configuration
//!
//! Everything here has a default, so an empty file (or no file) is valid.
//!
//! # Sources (later wins)
//!
//! 1. Built-in defaults
//! 2. A TOML file passed to [`ExportConfig::load_from_file`]
//! 3. Environment: `SCENIC_UV_WRAP`, `SCENIC_DOCUMENT_NAME`
//!
//! # Example
//!
//! ```toml
//! document_name = "scene.js"
//! uv_wrap = "legacy"       # symmetric, legacy
//! overwrite_textures = false
//! indent = "  "
//!
//! [scene]
//! background = [0.1, 0.1, 0.1]
//! background_alpha = 1.0
//! camera = "Main Camera"
//! ```

use crate::error::{ExportError, Result};
use scenic_format::UvWrapMode;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// File name of the document inside the output folder
    pub document_name: String,
    pub format_version: f64,
    pub uv_wrap: UvWrapMode,
    /// Replace texture files already present in the output folder
    pub overwrite_textures: bool,
    /// Indentation of the written JSON; empty writes compact output
    pub indent: String,
    /// Value of `metadata.generatedBy`
    pub generated_by: Option<String>,
    pub scene: SceneDefaults,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            document_name: "scene.js".to_string(),
            format_version: scenic_format::FORMAT_VERSION,
            uv_wrap: UvWrapMode::Symmetric,
            overwrite_textures: false,
            indent: "\t".to_string(),
            generated_by: Some(concat!("scenic ", env!("CARGO_PKG_VERSION")).to_string()),
            scene: SceneDefaults::default(),
        }
    }
}

/// Scene-wide fallbacks written to `defaults`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDefaults {
    pub background: [f32; 3],
    pub background_alpha: f32,
    pub fog: Option<[f32; 3]>,
    /// Used when the selection contains no camera
    pub camera: Option<String>,
}

impl Default for SceneDefaults {
    fn default() -> Self {
        Self {
            background: [0.0; 3],
            background_alpha: 1.0,
            fog: None,
            camera: None,
        }
    }
}

impl ExportConfig {
    /// Defaults plus environment overrides
    pub fn load() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load a TOML file, then apply environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ExportError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ExportError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded export config from {}", path.display());
        Ok(config.with_env_overrides())
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key/value lookup
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(mode) = lookup("SCENIC_UV_WRAP") {
            match mode.parse() {
                Ok(mode) => {
                    self.uv_wrap = mode;
                    log::info!("UV wrap from env: {}", self.uv_wrap);
                }
                Err(e) => log::warn!("Ignoring SCENIC_UV_WRAP: {}", e),
            }
        }

        if let Some(name) = lookup("SCENIC_DOCUMENT_NAME") {
            if !name.is_empty() {
                self.document_name = name;
                log::info!("Document name from env: {}", self.document_name);
            }
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ExportConfig::default();
        assert_eq!(config.document_name, "scene.js");
        assert_eq!(config.uv_wrap, UvWrapMode::Symmetric);
        assert!(!config.overwrite_textures);
        assert_eq!(config.indent, "\t");
    }

    #[test]
    fn test_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "uv_wrap = \"legacy\"\n[scene]\ncamera = \"Main\"").unwrap();

        let config = ExportConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.uv_wrap, UvWrapMode::Legacy);
        assert_eq!(config.scene.camera.as_deref(), Some("Main"));
        assert_eq!(config.scene.background_alpha, 1.0);
    }

    #[test]
    fn test_bad_toml_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "uv_wrap = 3").unwrap();
        assert!(matches!(
            ExportConfig::load_from_file(file.path()),
            Err(ExportError::Config { .. })
        ));
    }

    #[test]
    fn test_overrides() {
        let config = ExportConfig::default().with_overrides(|key| match key {
            "SCENIC_UV_WRAP" => Some("legacy".into()),
            "SCENIC_DOCUMENT_NAME" => Some("level.json".into()),
            _ => None,
        });
        assert_eq!(config.uv_wrap, UvWrapMode::Legacy);
        assert_eq!(config.document_name, "level.json");

        let config = ExportConfig::default().with_overrides(|_| Some("bogus".into()));
        assert_eq!(config.uv_wrap, UvWrapMode::Symmetric);
    }
}
