//! # scenic_import - Scene Decoder
//!
//! Reads scene documents back into a live [`SceneGraph`](scenic_graph::SceneGraph).
//!
//! - [`SceneDecoder`] resolves references and rebuilds meshes, materials,
//!   cameras and lights into a [`DecodedScene`]
//! - [`SceneLoader`] reads a file, decodes it and attaches the result in one
//!   step, then fires a completion callback
//! - [`GeometryResolver`] loads geometry stored outside the document
//!
//! ## Example
//!
//! ```ignore
//! use scenic_graph::SceneGraph;
//! use scenic_import::{DecodeOptions, SceneLoader};
//!
//! let (mut graph, _backend) = SceneGraph::headless();
//! let root = graph.root();
//! let scene = SceneLoader::new(DecodeOptions::default())
//!     .load(&mut graph, root, "out/scene.js", |graph, scene| {
//!         log::info!("loaded, bounds {:?}", scene.bounds(graph));
//!     })?;
//! ```

pub mod decoder;
pub mod error;
pub mod loader;
pub mod mesh;
pub mod options;
pub mod resolver;

pub use decoder::{DecodedNode, DecodedScene, NodeContent, SceneDecoder};
pub use error::{LoadError, Result};
pub use loader::{instantiate, LoadedScene, SceneLoader};
pub use mesh::build_mesh;
pub use options::DecodeOptions;
pub use resolver::{FileGeometryResolver, GeometryResolver, NoGeometryResolver};
