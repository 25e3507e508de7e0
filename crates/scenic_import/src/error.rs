use scenic_format::FormatError;
use scenic_graph::GraphError;
use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a load.
///
/// Dangling references are not errors; they surface as
/// [`ReferenceIssue`](scenic_format::ReferenceIssue)s on the loaded scene.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed document: {0}")]
    Format(#[from] FormatError),

    #[error("scene graph rejected the scene: {0}")]
    Graph(#[from] GraphError),

    #[error("no resolver for {kind} geometry '{url}'")]
    UnsupportedGeometry { kind: String, url: String },
}

pub type Result<T> = std::result::Result<T, LoadError>;
