use std::path::{Path, PathBuf};

/// How a document's relative references are resolved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Folder texture and geometry URLs are relative to. When unset the
    /// loader uses the document's own folder.
    pub base_path: Option<PathBuf>,
    /// Read image headers to fill in texture dimensions
    pub probe_textures: bool,
}

impl DecodeOptions {
    pub fn with_base_path(mut self, base: impl Into<PathBuf>) -> Self {
        self.base_path = Some(base.into());
        self
    }

    pub fn with_texture_probe(mut self, probe: bool) -> Self {
        self.probe_textures = probe;
        self
    }

    /// Base folder for a document read from `document`
    pub fn base_for(&self, document: &Path) -> PathBuf {
        match &self.base_path {
            Some(base) => base.clone(),
            None => document.parent().map(Path::to_path_buf).unwrap_or_default(),
        }
    }
}
