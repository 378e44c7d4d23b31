//! Per-vertex tangents for normal-mapped shading.

use corelib::{Vec2, Vec3};
use thiserror::Error;

use crate::mesh::DEFAULT_TANGENT;

/// UV-space determinants at or below this magnitude count as degenerate.
const MIN_UV_DETERMINANT: f32 = 1e-12;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TangentError {
    #[error(
        "attribute lengths differ: {positions} positions, {texcoords} texcoords, {normals} normals"
    )]
    LengthMismatch {
        positions: usize,
        texcoords: usize,
        normals: usize,
    },
    #[error("triangle index {index} out of range for {count} vertices")]
    IndexOutOfRange { index: u32, count: usize },
}

/// Compute one tangent per vertex.
///
/// Every three entries of `indices` form a triangle. Each triangle's tangent
/// is solved from its object-space edges and UV deltas and written to all
/// three of its vertices, so a vertex shared by several triangles keeps the
/// tangent of the last one processed. Triangles with a degenerate UV mapping
/// get `(1, 0, 0)`, as do vertices no triangle references.
pub fn generate_tangents(
    positions: &[[f32; 3]],
    texcoords: &[[f32; 2]],
    normals: &[[f32; 3]],
    indices: &[u32],
) -> Result<Vec<[f32; 3]>, TangentError> {
    let count = positions.len();
    if texcoords.len() != count || normals.len() != count {
        return Err(TangentError::LengthMismatch {
            positions: count,
            texcoords: texcoords.len(),
            normals: normals.len(),
        });
    }
    if let Some(&index) = indices.iter().find(|&&i| i as usize >= count) {
        return Err(TangentError::IndexOutOfRange { index, count });
    }

    let mut tangents = vec![DEFAULT_TANGENT; count];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let tangent = triangle_tangent(
            [positions[a], positions[b], positions[c]].map(Vec3::from),
            [texcoords[a], texcoords[b], texcoords[c]].map(Vec2::from),
        );
        for v in [a, b, c] {
            tangents[v] = tangent;
        }
    }

    log::debug!(
        "Generated tangents for {} vertices over {} triangles",
        count,
        indices.len() / 3
    );
    Ok(tangents)
}

fn triangle_tangent(p: [Vec3; 3], uv: [Vec2; 3]) -> [f32; 3] {
    let dp1 = p[1] - p[0];
    let dp2 = p[2] - p[0];
    let duv1 = uv[1] - uv[0];
    let duv2 = uv[2] - uv[0];

    let det = duv1.x * duv2.y - duv2.x * duv1.y;
    if det.abs() <= MIN_UV_DETERMINANT {
        return DEFAULT_TANGENT;
    }

    ((dp1 * duv2.y - dp2 * duv1.y) / det)
        .try_normalize()
        .map_or(DEFAULT_TANGENT, |t| t.to_array())
}

#[cfg(test)]
mod tests {
    use super::*;

    const UP: [f32; 3] = [0.0, 0.0, 1.0];

    fn assert_close(a: [f32; 3], b: [f32; 3]) {
        for k in 0..3 {
            assert!((a[k] - b[k]).abs() < 1e-5, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn aligned_uvs_give_x_axis() {
        let positions = [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]];
        let texcoords = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let t = generate_tangents(&positions, &texcoords, &[UP; 3], &[0, 1, 2]).unwrap();
        for tangent in t {
            assert_close(tangent, [1.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn rotated_uvs_follow_u_direction() {
        // u grows along +y
        let positions = [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [-1.0, 0.0, 0.0]];
        let texcoords = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let t = generate_tangents(&positions, &texcoords, &[UP; 3], &[0, 1, 2]).unwrap();
        assert_close(t[0], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn degenerate_uvs_fall_back() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let texcoords = [[0.5, 0.5]; 3];
        let t = generate_tangents(&positions, &texcoords, &[UP; 3], &[0, 1, 2]).unwrap();
        assert_eq!(t, vec![DEFAULT_TANGENT; 3]);
    }

    #[test]
    fn shared_vertex_keeps_last_triangle() {
        // Two triangles share vertices 0 and 2; the second one mirrors u.
        let positions = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [-1.0, 0.0, 0.0],
        ];
        let texcoords = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 0.0]];
        let indices = [0, 1, 2, 0, 2, 3];
        let t = generate_tangents(&positions, &texcoords, &[UP; 4], &indices).unwrap();
        assert_close(t[1], [1.0, 0.0, 0.0]);
        assert_close(t[0], [-1.0, 0.0, 0.0]);
        assert_close(t[2], [-1.0, 0.0, 0.0]);
        assert_close(t[3], [-1.0, 0.0, 0.0]);
    }

    #[test]
    fn untouched_vertices_get_default() {
        let positions = [[0.0; 3]; 4];
        let texcoords = [[0.0; 2]; 4];
        let t = generate_tangents(&positions, &texcoords, &[UP; 4], &[]).unwrap();
        assert_eq!(t, vec![DEFAULT_TANGENT; 4]);
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let err = generate_tangents(&[[0.0; 3]; 3], &[[0.0; 2]; 2], &[UP; 3], &[0, 1, 2]);
        assert_eq!(
            err,
            Err(TangentError::LengthMismatch {
                positions: 3,
                texcoords: 2,
                normals: 3
            })
        );
    }

    #[test]
    fn rejects_out_of_range_index() {
        let err = generate_tangents(&[[0.0; 3]; 3], &[[0.0; 2]; 3], &[UP; 3], &[0, 1, 3]);
        assert_eq!(err, Err(TangentError::IndexOutOfRange { index: 3, count: 3 }));
    }
}
