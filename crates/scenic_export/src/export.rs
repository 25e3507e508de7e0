//! Writing an encoded scene to a folder
//!
//! The folder receives the document plus a flat copy of every texture.
//! Texture copies are best effort: each failure is recorded in the
//! [`ExportReport`] and logged, and the export carries on.

use crate::config::ExportConfig;
use crate::encoder::{Encoded, SceneEncoder};
use crate::error::{ExportError, Result};
use crate::session::TextureCopy;
use crate::source::SourceObject;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A texture that did not make it into the output folder
#[derive(Debug, Error)]
pub enum ExportFailure {
    /// Destination exists and overwriting is off
    #[error("{} already exists, not overwritten", .file.display())]
    AlreadyPresent { file: PathBuf },

    #[error("cannot copy {}: {error}", .path.display())]
    CopyFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}

/// What an export produced
#[derive(Debug, Default)]
pub struct ExportReport {
    pub document: PathBuf,
    pub objects: usize,
    pub materials: usize,
    pub textures_copied: Vec<PathBuf>,
    pub failures: Vec<ExportFailure>,
}

impl ExportReport {
    /// True when every texture was copied
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "wrote {}", self.document.display())?;
        writeln!(
            f,
            "  {} objects, {} materials, {} textures copied",
            self.objects,
            self.materials,
            self.textures_copied.len()
        )?;
        for failure in &self.failures {
            writeln!(f, "  warning: {}", failure)?;
        }
        Ok(())
    }
}

/// Encode `objects` and write them to `dir`
pub fn export_to_folder(objects: &[SourceObject], dir: impl AsRef<Path>, config: &ExportConfig) -> Result<ExportReport> {
    let encoder = SceneEncoder::new(config.clone());
    let encoded = encoder.encode(objects);
    write_folder(&encoded, dir, config)
}

/// Write an already encoded scene to `dir`
pub fn write_folder(encoded: &Encoded, dir: impl AsRef<Path>, config: &ExportConfig) -> Result<ExportReport> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir).map_err(|source| ExportError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let text = scenic_format::write_document(&encoded.document, &config.indent)?;
    let document = dir.join(&config.document_name);
    std::fs::write(&document, text).map_err(|source| ExportError::WriteDocument {
        path: document.clone(),
        source,
    })?;
    log::info!("Wrote {}", document.display());

    let mut report = ExportReport {
        document,
        objects: encoded.document.object_count(),
        materials: encoded.document.materials.len(),
        ..ExportReport::default()
    };
    for copy in &encoded.texture_copies {
        match copy_texture(copy, dir, config.overwrite_textures) {
            Ok(dest) => report.textures_copied.push(dest),
            Err(failure) => {
                log::warn!("{}", failure);
                report.failures.push(failure);
            }
        }
    }

    Ok(report)
}

fn copy_texture(copy: &TextureCopy, dir: &Path, overwrite: bool) -> std::result::Result<PathBuf, ExportFailure> {
    let dest = dir.join(&copy.file_name);
    if !overwrite && dest.exists() {
        return Err(ExportFailure::AlreadyPresent { file: dest });
    }
    match std::fs::copy(&copy.source, &dest) {
        Ok(bytes) => {
            log::debug!("Copied {} ({} bytes)", dest.display(), bytes);
            Ok(dest)
        }
        Err(error) => Err(ExportFailure::CopyFailed {
            path: copy.source.clone(),
            error,
        }),
    }
}
