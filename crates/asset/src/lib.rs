//! Asset loading/parsers: OBJ geometry, MTL materials, tangents, extents
//! and material textures.

pub mod error;
pub mod extents;
pub mod index;
pub mod mesh;
pub mod model;
pub mod mtl;
pub mod obj;
pub mod tangent;
pub mod texture;

pub use error::{FaceError, ParseError, ReferenceError};
pub use extents::{Extents, HasExtents, compute_extents};
pub use index::resolve_index;
pub use mesh::{Geometry, MeshData, MeshVertex, VertexAttribute};
pub use model::{LoadOptions, Model, load_model_from_path};
pub use mtl::{Material, MaterialLibrary, ResolvedMaterial, TextureSlot, parse_mtl};
pub use obj::{FaceLayout, ObjData, parse_obj};
pub use tangent::{TangentError, generate_tangents};
pub use texture::{TextureCache, TextureData};
