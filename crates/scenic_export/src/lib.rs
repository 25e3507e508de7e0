//! # scenic_export - Scene Encoder
//!
//! Turns a selection of [`SourceObject`]s into one scene document plus the
//! texture files it references.
//!
//! - [`SceneEncoder`] assembles the [`Document`](scenic_format::Document)
//! - [`EncodeSession`] owns the per-export dedup state
//! - [`export_to_folder`] writes the document and copies textures
//! - [`obj`] reads Wavefront OBJ files as source objects
//!
//! ## Example
//!
//! ```ignore
//! use scenic_export::{export_to_folder, obj, ExportConfig};
//!
//! let objects = obj::load_obj("level.obj")?;
//! let report = export_to_folder(&objects, "out", &ExportConfig::load())?;
//! print!("{report}");
//! ```

pub mod config;
pub mod encoder;
pub mod error;
pub mod export;
pub mod obj;
pub mod session;
pub mod source;

pub use config::{ExportConfig, SceneDefaults};
pub use encoder::{Encoded, SceneEncoder};
pub use error::{ExportError, Result};
pub use export::{export_to_folder, write_folder, ExportFailure, ExportReport};
pub use session::{EncodeSession, MaterialSlot, TextureCopy, TextureSlot};
pub use source::*;
