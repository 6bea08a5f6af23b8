use crate::{
    anim::{Animation, Pose, Skeleton},
    dualquat::DualQuat,
    rigid::RigidTransform,
    skin_error::SkinError,
};
use log::trace;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How skinning transforms are laid out for the vertex shader
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum BlendStyle {
    /// Column major 4x4 matrix per bone
    #[default]
    Matrix,
    /// Rotation x, y and z followed by translation. The shader rebuilds w
    /// as `sqrt(1 - x*x - y*y - z*z)`.
    QuatTranslation,
    /// Real then dual part, each as x, y, z, w
    DualQuat,
}

impl BlendStyle {
    pub const ALL: [Self; 3] =
        [Self::Matrix, Self::QuatTranslation, Self::DualQuat];

    #[must_use]
    pub const fn floats_per_bone(self) -> usize {
        match self {
            Self::Matrix => 16,
            Self::QuatTranslation => 6,
            Self::DualQuat => 8,
        }
    }

    /// Encodes a pose for upload
    ///
    /// # Errors
    /// May return `SkinError` if the pose and inverse bind pose are not the
    /// same length
    pub fn encode(
        self,
        pose: &Pose,
        inv_bind: &[RigidTransform],
    ) -> Result<SkinBuffer, SkinError> {
        let skin = skin_transforms(pose, inv_bind)?;
        let mut data = Vec::with_capacity(skin.len() * self.floats_per_bone());
        for t in &skin {
            match self {
                Self::Matrix => data.extend_from_slice(&t.to_array()),
                Self::QuatTranslation => encode_quat(t, &mut data),
                Self::DualQuat => encode_dual_quat(t, &mut data),
            }
        }
        trace!("encoded {} bones as {}", skin.len(), self);
        Ok(SkinBuffer { style: self, data })
    }
}

impl fmt::Display for BlendStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matrix => write!(f, "matrix"),
            Self::QuatTranslation => write!(f, "quaternion"),
            Self::DualQuat => write!(f, "dual quat"),
        }
    }
}

/// Combines each posed bone with its inverse bind pose. The result maps a
/// vertex from its bind position to its posed position, so an unanimated
/// pose gives the identity for every bone.
///
/// # Errors
/// May return `SkinError` if the inputs are not the same length
pub fn skin_transforms(
    pose: &Pose,
    inv_bind: &[RigidTransform],
) -> Result<Vec<RigidTransform>, SkinError> {
    if pose.len() != inv_bind.len() {
        return Err(SkinError::CountMismatch(pose.len(), inv_bind.len()));
    }
    Ok(pose
        .as_slice()
        .iter()
        .zip(inv_bind)
        .map(|(p, i)| p.mul(i))
        .collect())
}

fn encode_quat(t: &RigidTransform, data: &mut Vec<f32>) {
    // q and -q are the same rotation so keep w positive for the shader
    let q = if t.rot.w < 0.0_f32 { -t.rot } else { t.rot };
    data.extend_from_slice(&[q.i, q.j, q.k, t.pos.x, t.pos.y, t.pos.z]);
}

fn encode_dual_quat(t: &RigidTransform, data: &mut Vec<f32>) {
    let mut dq = DualQuat::from(t);
    if dq.real.w < 0.0_f32 {
        dq.real = -dq.real;
        dq.dual = -dq.dual;
    }
    let [real, dual]: [[f32; 4]; 2] = dq.into();
    data.extend_from_slice(&real);
    data.extend_from_slice(&dual);
}

/// Encoded skinning transforms ready for a uniform or storage buffer
#[derive(Clone, Debug, PartialEq)]
pub struct SkinBuffer {
    style: BlendStyle,
    data: Vec<f32>,
}

impl SkinBuffer {
    #[must_use]
    pub const fn style(&self) -> BlendStyle {
        self.style
    }

    #[must_use]
    pub const fn floats_per_bone(&self) -> usize {
        self.style.floats_per_bone()
    }

    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.data.len() / self.floats_per_bone()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Floats for one bone
    #[must_use]
    pub fn bone(&self, index: usize) -> Option<&[f32]> {
        let n = self.floats_per_bone();
        let start = index.checked_mul(n)?;
        self.data.get(start..start.checked_add(n)?)
    }
}

/// Solves the pose of `skeleton` at `delta` seconds into `animation` and
/// encodes it. With no animation this is the bind pose, which encodes as
/// identity transforms.
///
/// # Errors
/// May return `SkinError` if `delta` is outside the animation or the
/// animation doesn't have one track per bone
pub fn bones_at_time(
    style: BlendStyle,
    skeleton: &Skeleton,
    animation: Option<&Animation>,
    delta: f32,
) -> Result<SkinBuffer, SkinError> {
    let pose = skeleton.pose(animation, delta)?;
    style.encode(&pose, skeleton.inv_bind_pose())
}
