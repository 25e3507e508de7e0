//! # scenic_format - Scene Interchange Format
//!
//! Shared schema of the JSON scene documents written by the exporter and read
//! by the loader:
//!
//! - [`Document`] and its record types
//! - the per-face bit-field codec ([`face`])
//! - color packing, UV wrapping and handedness conversion
//! - reference validation
//!
//! ## Example
//!
//! ```ignore
//! use scenic_format::{parse_document, FaceReader};
//!
//! let doc = parse_document(&std::fs::read("scene.js")?)?;
//! for (name, embed) in &doc.embeds {
//!     let faces = FaceReader::new(&embed.faces, embed.uv_layer_count()).count();
//!     println!("{name}: {faces} faces");
//! }
//! ```

pub mod color;
pub mod convert;
pub mod document;
pub mod error;
pub mod face;
pub mod text;
pub mod uv;
pub mod validate;

pub use color::Color;
pub use document::*;
pub use error::{FormatError, Result};
pub use face::{encode_triangle, FaceError, FaceFlags, FaceReader, FaceRecord};
pub use text::{normalize_quotes, parse_document, parse_document_str, write_document};
pub use uv::UvWrapMode;
pub use validate::{IndexKind, ReferenceIssue, ValidationReport};

pub mod prelude {
    pub use crate::color::Color;
    pub use crate::document::{
        CameraRecord, Document, EmbedRecord, GeometryRecord, GeometryRef, LightKind, LightRecord, MaterialKind,
        MaterialRecord, ObjectRecord, ProjectionKind, TextureRecord,
    };
    pub use crate::face::{FaceFlags, FaceReader};
    pub use crate::{parse_document, write_document};
}
