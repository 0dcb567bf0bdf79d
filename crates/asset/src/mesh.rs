//! CPU-side mesh representation produced by the loaders.

use corelib::handles::HandleTable;

use crate::error::MeshError;

/// Shader attribute locations used by [`Mesh::attribute_layout`].
pub const POSITION_LOCATION: u32 = 0;
pub const NORMAL_LOCATION: u32 = 1;
pub const TEX_COORD_LOCATION: u32 = 2;
pub const TANGENT_LOCATION: u32 = 3;
pub const BITANGENT_LOCATION: u32 = 4;

/// Flat triangle mesh. Every face corner of the source owns one entry in the
/// per-vertex channels; nothing is deduplicated across faces.
///
/// `normals` and `tex_coords` are either empty (channel absent) or exactly as
/// long as `vertices`. `tangents`/`bitangents` are `Some` only when requested.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub tangents: Option<Vec<[f32; 3]>>,
    pub bitangents: Option<Vec<[f32; 3]>>,
}

impl Mesh {
    /// Returns `true` if both vertex and index buffers are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.vertices.is_empty() && !self.indices.is_empty()
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check the structural invariants (triangle list, index bounds, channel lengths).
    pub fn validate(&self) -> Result<(), MeshError> {
        if self.indices.len() % 3 != 0 {
            return Err(MeshError::NotTriangleList(self.indices.len()));
        }

        let vertex_count = self.vertices.len();
        if let Some((at, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|&(_, &i)| i as usize >= vertex_count)
        {
            return Err(MeshError::IndexOutOfBounds {
                at,
                index,
                vertex_count,
            });
        }

        // Absent channels are empty, present ones match the vertex count.
        let optional = [
            ("normals", self.normals.len()),
            ("tex_coords", self.tex_coords.len()),
        ];
        for (channel, len) in optional {
            if len != 0 && len != vertex_count {
                return Err(MeshError::ChannelLength {
                    channel,
                    len,
                    expected: vertex_count,
                });
            }
        }

        let frames = [
            ("tangents", self.tangents.as_ref()),
            ("bitangents", self.bitangents.as_ref()),
        ];
        for (channel, data) in frames {
            if let Some(data) = data {
                if data.len() != vertex_count {
                    return Err(MeshError::ChannelLength {
                        channel,
                        len: data.len(),
                        expected: vertex_count,
                    });
                }
            }
        }

        Ok(())
    }

    /// Positions as a flat `f32` slice, stride 3.
    pub fn positions_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Normals as a flat `f32` slice, stride 3.
    pub fn normals_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.normals)
    }

    /// Texture coordinates as a flat `f32` slice, stride 2.
    pub fn tex_coords_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.tex_coords)
    }

    pub fn tangents_flat(&self) -> Option<&[f32]> {
        self.tangents.as_deref().map(|t| bytemuck::cast_slice(t))
    }

    pub fn bitangents_flat(&self) -> Option<&[f32]> {
        self.bitangents.as_deref().map(|b| bytemuck::cast_slice(b))
    }

    /// Index buffer bytes, ready for a `u32` index buffer upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Attribute name -> shader location for every channel this mesh carries.
    pub fn attribute_layout(&self) -> HandleTable {
        let mut layout = HandleTable::new();
        layout.register("position", POSITION_LOCATION);
        if !self.normals.is_empty() {
            layout.register("normal", NORMAL_LOCATION);
        }
        if !self.tex_coords.is_empty() {
            layout.register("tex_coord", TEX_COORD_LOCATION);
        }
        if self.tangents.is_some() {
            layout.register("tangent", TANGENT_LOCATION);
        }
        if self.bitangents.is_some() {
            layout.register("bitangent", BITANGENT_LOCATION);
        }
        layout
    }
}
