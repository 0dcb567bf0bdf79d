//! Asset loading/parsers.
//! Wavefront OBJ -> flat, renderer-ready mesh buffers (positions, normals,
//! texture coordinates and optional tangent frames).

pub mod error;
pub mod mesh;
pub mod obj;
pub mod tangent;
pub mod tokenize;

pub use error::{IndexKind, MeshError, ObjError};
pub use mesh::Mesh;
pub use obj::{LoadOptions, load_obj, load_obj_from_reader, load_obj_from_str, load_obj_with};
