//! Per-vertex tangent/bitangent synthesis from triangle positions and UVs.
//!
//! Each triangle solves
//!     e1 = du1 * T + dv1 * B
//!     e2 = du2 * T + dv2 * B
//! for `T` and `B`, and adds the result to all three of its vertices.
//! Results are accumulated, not normalized.

use corelib::{Vec2, Vec3};

/// Summed tangent and bitangent per vertex, both `positions.len()` long.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TangentFrames {
    pub tangents: Vec<[f32; 3]>,
    pub bitangents: Vec<[f32; 3]>,
}

/// Compute tangent frames for an indexed triangle list.
///
/// Triangles whose UV determinant is zero relative to their UV edge lengths
/// contribute nothing, so a
/// degenerate mapping yields zero vectors instead of `NaN`/`Inf`. Missing
/// texture coordinates count as `(0, 0)`, which makes every triangle degenerate.
pub fn compute_tangent_frames(
    positions: &[[f32; 3]],
    tex_coords: &[[f32; 2]],
    indices: &[u32],
) -> TangentFrames {
    let mut tangents = vec![Vec3::ZERO; positions.len()];
    let mut bitangents = vec![Vec3::ZERO; positions.len()];
    let mut degenerate = 0usize;

    let uv_at = |i: usize| Vec2::from(tex_coords.get(i).copied().unwrap_or([0.0, 0.0]));

    for tri in indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (Some(&p0), Some(&p1), Some(&p2)) =
            (positions.get(i0), positions.get(i1), positions.get(i2))
        else {
            log::warn!("Skipping triangle {:?} with out-of-range index", tri);
            continue;
        };
        let (p0, p1, p2) = (Vec3::from(p0), Vec3::from(p1), Vec3::from(p2));

        let e1 = p1 - p0;
        let e2 = p2 - p0;
        let d1 = uv_at(i1) - uv_at(i0);
        let d2 = uv_at(i2) - uv_at(i0);

        // Near-zero relative to the UV edge lengths, not in absolute UV units.
        let det = d1.x * d2.y - d2.x * d1.y;
        if !det.is_finite() || det.abs() <= f32::EPSILON * d1.length() * d2.length() {
            degenerate += 1;
            continue;
        }
        let r = 1.0 / det;
        let tangent = (e1 * d2.y - e2 * d1.y) * r;
        let bitangent = (e2 * d1.x - e1 * d2.x) * r;
        if !tangent.is_finite() || !bitangent.is_finite() {
            degenerate += 1;
            continue;
        }

        for i in [i0, i1, i2] {
            tangents[i] += tangent;
            bitangents[i] += bitangent;
        }
    }

    if degenerate > 0 {
        log::warn!(
            "{} of {} triangles have a degenerate UV mapping; their tangent contribution is zero",
            degenerate,
            indices.len() / 3
        );
    }

    TangentFrames {
        tangents: tangents.iter().map(Vec3::to_array).collect(),
        bitangents: bitangents.iter().map(Vec3::to_array).collect(),
    }
}
