use crate::{
    skin_error::SkinError,
    vertex::{Buffers, Interleaved, Position},
};
use log::{debug, error, info};
use smallvec::SmallVec;

/// Most bones that can influence one vertex
pub const MAX_INFLUENCES: usize = 4;

/// Intermediate vertex as produced by an importer
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
    /// Bone indices, aligned with `weights`
    pub joints: SmallVec<[u8; MAX_INFLUENCES]>,
    pub weights: SmallVec<[f32; MAX_INFLUENCES]>,
}

impl Vertex {
    /// Bone index of influence `i`, or 0 past the influence count
    #[must_use]
    pub fn joint(&self, i: usize) -> u8 {
        self.joints.get(i).copied().unwrap_or_default()
    }

    /// Weight of influence `i`, or 0 past the influence count
    #[must_use]
    pub fn weight(&self, i: usize) -> f32 {
        self.weights.get(i).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn joint_ids(&self) -> [u8; MAX_INFLUENCES] {
        [self.joint(0), self.joint(1), self.joint(2), self.joint(3)]
    }

    #[must_use]
    pub fn weight_array(&self) -> [f32; MAX_INFLUENCES] {
        [self.weight(0), self.weight(1), self.weight(2), self.weight(3)]
    }

    /// Joint indices packed one per byte, first joint in the lowest byte
    #[must_use]
    pub fn packed_joint_ids(&self) -> u32 {
        u32::from_le_bytes(self.joint_ids())
    }
}

/// Triangle mesh with per-vertex bone influences
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub faces: Vec<[u16; 3]>,
    pub vertices: Vec<Vertex>,
}

impl Mesh {
    /// Checks faces and bone influences against the mesh and a skeleton with
    /// `bone_count` bones
    ///
    /// # Errors
    /// May return `SkinError` for a face index past the vertices, a vertex
    /// with more than four influences or different numbers of joints and
    /// weights, or a joint index that is not a bone
    pub fn validate(&self, bone_count: usize) -> Result<(), SkinError> {
        let vertex_count = self.vertices.len();
        for (index, face) in self.faces.iter().enumerate() {
            if face.iter().any(|&v| usize::from(v) >= vertex_count) {
                error!("face {} {:?} is out of range", index, face);
                return Err(SkinError::FaceOutOfRange(index));
            }
        }
        for (index, vertex) in self.vertices.iter().enumerate() {
            if vertex.joints.len() > MAX_INFLUENCES {
                error!(
                    "vertex {} has {} influences",
                    index,
                    vertex.joints.len()
                );
                return Err(SkinError::TooManyInfluences(index));
            }
            if vertex.joints.len() != vertex.weights.len() {
                error!(
                    "vertex {} has {} joints and {} weights",
                    index,
                    vertex.joints.len(),
                    vertex.weights.len()
                );
                return Err(SkinError::InfluenceMismatch(index));
            }
            if vertex.joints.iter().any(|&j| usize::from(j) >= bone_count) {
                error!(
                    "vertex {} joints {:?} for {} bones",
                    index, vertex.joints, bone_count
                );
                return Err(SkinError::JointOutOfRange(index));
            }
        }
        debug!(
            "mesh faces={} vertices={} valid for {} bones",
            self.faces.len(),
            vertex_count,
            bone_count
        );
        Ok(())
    }

    /// Gives full weight to vertices that name exactly one bone but carry no
    /// weight for it. Returns how many were changed.
    pub fn set_single_bone_weights(&mut self) -> usize {
        let mut count = 0;
        for vertex in &mut self.vertices {
            if vertex.joints.len() == 1
                && vertex.weights.iter().all(|w| w.abs() < f32::EPSILON)
            {
                vertex.weights.clear();
                vertex.weights.push(1.0_f32);
                count += 1;
            }
        }
        if count > 0 {
            info!("set weight 1.0 on {} single bone vertices", count);
        }
        count
    }

    /// Splits the mesh into position and interleaved vertex streams plus
    /// indices
    #[must_use]
    pub fn interleave(&self) -> Buffers {
        let positions = self
            .vertices
            .iter()
            .map(|v| Position {
                position: v.position,
            })
            .collect();
        let interleaved = self
            .vertices
            .iter()
            .map(|v| Interleaved {
                normal: v.normal,
                tex_coord: v.tex_coord,
                joint_ids: v.packed_joint_ids(),
                weights: v.weight_array(),
            })
            .collect();
        let indices = self.faces.iter().flatten().copied().collect();
        Buffers {
            positions,
            interleaved,
            indices,
        }
    }
}
