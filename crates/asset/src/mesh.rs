//! CPU-side geometry produced by the OBJ parser.

use crate::tangent::{TangentError, generate_tangents};

pub const DEFAULT_TEXCOORD: [f32; 2] = [0.0, 0.0];
pub const DEFAULT_NORMAL: [f32; 3] = [0.0, 0.0, 1.0];
pub const DEFAULT_COLOR: [f32; 3] = [1.0, 1.0, 1.0];
pub const DEFAULT_TANGENT: [f32; 3] = [1.0, 0.0, 0.0];

/// A vertex attribute that is either uniform over the whole geometry or
/// given per vertex.
#[derive(Clone, Debug, PartialEq)]
pub enum VertexAttribute<const N: usize> {
    Constant([f32; N]),
    PerVertex(Vec<[f32; N]>),
}

impl<const N: usize> VertexAttribute<N> {
    /// Build from per-vertex optional values. All-absent collapses to
    /// `Constant(default)`; partially absent values are filled with `default`.
    pub fn from_optional(values: Vec<Option<[f32; N]>>, default: [f32; N]) -> Self {
        if values.iter().all(Option::is_none) {
            return VertexAttribute::Constant(default);
        }
        VertexAttribute::PerVertex(values.into_iter().map(|v| v.unwrap_or(default)).collect())
    }

    #[inline]
    pub fn is_constant(&self) -> bool {
        matches!(self, VertexAttribute::Constant(_))
    }

    pub fn per_vertex(&self) -> Option<&[[f32; N]]> {
        match self {
            VertexAttribute::PerVertex(values) => Some(values),
            VertexAttribute::Constant(_) => None,
        }
    }

    /// Value for vertex `i`. Constants answer for every index.
    pub fn get(&self, i: usize) -> Option<[f32; N]> {
        match self {
            VertexAttribute::Constant(value) => Some(*value),
            VertexAttribute::PerVertex(values) => values.get(i).copied(),
        }
    }

    /// Collapse into a uniform per-vertex vector of `count` entries.
    pub fn expand(&self, count: usize) -> Vec<[f32; N]> {
        match self {
            VertexAttribute::Constant(value) => vec![*value; count],
            VertexAttribute::PerVertex(values) => values.clone(),
        }
    }

    /// Flat float sequence of [`expand`](Self::expand).
    pub fn flatten(&self, count: usize) -> Vec<f32> {
        self.expand(count).into_iter().flatten().collect()
    }
}

/// One named, material-tagged unit of render-ready vertex data.
///
/// All per-vertex attributes share one vertex count; `indices` holds three
/// entries per triangle into those attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    pub object: String,
    pub groups: Vec<String>,
    pub material: Option<String>,
    pub positions: Vec<[f32; 3]>,
    pub texcoords: VertexAttribute<2>,
    pub normals: VertexAttribute<3>,
    pub colors: VertexAttribute<3>,
    pub tangents: Option<VertexAttribute<3>>,
    pub indices: Vec<u32>,
}

impl Geometry {
    #[inline]
    pub fn name(&self) -> &str {
        &self.object
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Attach tangents. Per-vertex texcoords and normals run the tangent
    /// generator; otherwise the tangent is the constant `(1, 0, 0)`.
    pub fn generate_tangents(&mut self) -> Result<(), TangentError> {
        let tangents = match (self.texcoords.per_vertex(), self.normals.per_vertex()) {
            (Some(texcoords), Some(normals)) => VertexAttribute::PerVertex(generate_tangents(
                &self.positions,
                texcoords,
                normals,
                &self.indices,
            )?),
            _ => VertexAttribute::Constant(DEFAULT_TANGENT),
        };
        self.tangents = Some(tangents);
        Ok(())
    }

    /// Returns `true` if there is at least one triangle, every per-vertex
    /// attribute matches the position count and every index is in range.
    pub fn is_valid(&self) -> bool {
        let count = self.vertex_count();
        let lengths_match = [
            self.texcoords.per_vertex().map(<[_]>::len),
            self.normals.per_vertex().map(<[_]>::len),
            self.colors.per_vertex().map(<[_]>::len),
            self.tangents
                .as_ref()
                .and_then(VertexAttribute::per_vertex)
                .map(<[_]>::len),
        ]
        .into_iter()
        .flatten()
        .all(|len| len == count);

        lengths_match
            && !self.indices.is_empty()
            && self.indices.len() % 3 == 0
            && self.indices.iter().all(|&i| (i as usize) < count)
    }

    /// Interleave every attribute into upload-ready vertices.
    pub fn to_mesh_data(&self) -> MeshData {
        let count = self.vertex_count();
        let texcoords = self.texcoords.expand(count);
        let normals = self.normals.expand(count);
        let colors = self.colors.expand(count);
        let tangents = self
            .tangents
            .as_ref()
            .map_or_else(|| vec![DEFAULT_TANGENT; count], |t| t.expand(count));

        let vertices = (0..count)
            .map(|i| MeshVertex {
                position: self.positions[i],
                normal: normals[i],
                uv: texcoords[i],
                color: colors[i],
                tangent: tangents[i],
            })
            .collect();

        MeshData::new(vertices, self.indices.clone())
    }
}

/// Interleaved vertex. Values are in object space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 3],
    pub tangent: [f32; 3],
}

/// Indexed triangle mesh with tightly-packed vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Returns `true` if both vertex and index buffers are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.vertices.is_empty() && !self.indices.is_empty()
    }
}
