// Standard vertex format is to have two streams:
// Position = positions only
// Interleaved = all other data, interleaved
use bytemuck::{Pod, Zeroable};

/// Per-vertex data other than position, laid out for a vertex buffer.
/// `joint_ids` holds four joint indices, one per byte, first joint in the
/// lowest byte.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable, Pod)]
pub struct Interleaved {
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
    pub joint_ids: u32,
    pub weights: [f32; 4],
}

impl Interleaved {
    /// Unpacks `joint_ids`
    #[must_use]
    pub const fn joints(&self) -> [u8; 4] {
        self.joint_ids.to_le_bytes()
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable, Pod)]
pub struct Position {
    pub position: [f32; 3],
}

/// Vertex and index streams for one mesh
#[derive(Clone, Debug, Default)]
pub struct Buffers {
    pub positions: Vec<Position>,
    pub interleaved: Vec<Interleaved>,
    pub indices: Vec<u16>,
}

impl Buffers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    #[must_use]
    pub fn interleaved_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.interleaved)
    }

    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
