//! External geometry
//!
//! A geometry entry with a `url` instead of an embed id names a separate
//! model file. Resolvers turn such a reference into mesh payload with the
//! same layout as an embed.

use crate::error::{LoadError, Result};
use scenic_format::{normalize_quotes, EmbedRecord, FormatError};
use std::path::Path;

pub trait GeometryResolver: Send + Sync {
    /// Load the model `url` of format `kind`, relative to `base`
    fn resolve(&self, kind: &str, url: &str, base: &Path) -> Result<EmbedRecord>;
}

/// Reads JSON model files from disk
#[derive(Debug, Default, Clone, Copy)]
pub struct FileGeometryResolver;

impl GeometryResolver for FileGeometryResolver {
    fn resolve(&self, kind: &str, url: &str, base: &Path) -> Result<EmbedRecord> {
        let path = base.join(url);
        let bytes = std::fs::read(&path).map_err(|source| LoadError::Read {
            path: path.clone(),
            source,
        })?;
        let text = std::str::from_utf8(&bytes).map_err(FormatError::from)?;
        let text = normalize_quotes(text.trim_start_matches('\u{feff}'))?;
        let record: EmbedRecord = serde_json::from_str(&text).map_err(FormatError::from)?;
        log::debug!(
            "Resolved {} geometry {} ({} vertices)",
            kind,
            path.display(),
            record.vertex_count()
        );
        Ok(record)
    }
}

/// Refuses every external reference; for sandboxed loads
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGeometryResolver;

impl GeometryResolver for NoGeometryResolver {
    fn resolve(&self, kind: &str, url: &str, _base: &Path) -> Result<EmbedRecord> {
        Err(LoadError::UnsupportedGeometry {
            kind: kind.to_string(),
            url: url.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_resolver_reads_model() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("tri.js"),
            "{ 'metadata': { 'formatVersion': 3 }, 'vertices': [0,0,0, 1,0,0, 0,1,0], 'faces': [0, 0,1,2] }",
        )
        .unwrap();

        let record = FileGeometryResolver.resolve("ascii", "tri.js", dir.path()).unwrap();
        assert_eq!(record.vertex_count(), 3);
        assert_eq!(record.faces, vec![0, 0, 1, 2]);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileGeometryResolver.resolve("ascii", "gone.js", dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::Read { .. }));
    }

    #[test]
    fn test_no_resolver() {
        let err = NoGeometryResolver.resolve("ascii", "a.js", Path::new("")).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedGeometry { .. }));
    }
}
