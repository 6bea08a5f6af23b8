use crate::quat;
use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

/// Rotation followed by translation
///
/// The rotation is kept at unit length by both composition operators.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    pub rot: glm::Quat,
    pub pos: glm::Vec3,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self {
            rot: glm::Quat::identity(),
            pos: glm::Vec3::zeros(),
        }
    }
}

impl RigidTransform {
    #[must_use]
    pub const fn new(rot: glm::Quat, pos: glm::Vec3) -> Self {
        Self { rot, pos }
    }

    #[must_use]
    pub fn identity() -> Self {
        Self::default()
    }

    /// Standard composition `self * o`, meaning apply `o` then `self`
    #[must_use]
    pub fn mul(&self, o: &Self) -> Self {
        Self {
            rot: quat::normalize(&quat::mul(&self.rot, &o.rot)),
            pos: self.pos + quat::transform_point(&self.rot, &o.pos),
        }
    }

    /// Like `mul` but the translation of `o` is not rotated by `self`. This is
    /// for animation deltas whose translation is already expressed in the
    /// parent frame rather than the bone's own frame.
    #[must_use]
    pub fn anim_compose(&self, o: &Self) -> Self {
        Self {
            rot: quat::normalize(&quat::mul(&self.rot, &o.rot)),
            pos: self.pos + o.pos,
        }
    }

    /// Inverse of a transform with a unit rotation. Negating w gives a
    /// quaternion for the same rotation as the conjugate without touching the
    /// vector part.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let rot = glm::quat(self.rot.i, self.rot.j, self.rot.k, -self.rot.w);
        Self {
            rot,
            pos: -quat::transform_point(&rot, &self.pos),
        }
    }

    /// Column-major 4x4 matrix with the translation in elements 12, 13, 14
    #[must_use]
    pub fn to_array(&self) -> [f32; 16] {
        let mut ret = quat::to_array(&self.rot);
        ret[12] = self.pos.x;
        ret[13] = self.pos.y;
        ret[14] = self.pos.z;
        ret
    }

    #[must_use]
    pub fn to_mat4(&self) -> glm::Mat4 {
        glm::Mat4::from_column_slice(&self.to_array())
    }

    /// Transforms a point
    #[must_use]
    pub fn transform_point(&self, p: &glm::Vec3) -> glm::Vec3 {
        self.pos + quat::transform_point(&self.rot, p)
    }
}

/// Operator used to combine a bind pose transform with a sampled animation
/// delta. Which one is correct depends on the format the data came from so
/// it is chosen when the skeleton is built and never guessed from data.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum Composition {
    /// `RigidTransform::mul`
    #[default]
    Standard,
    /// `RigidTransform::anim_compose`
    RootFrame,
}

impl Composition {
    #[must_use]
    pub fn compose(
        self,
        bind: &RigidTransform,
        delta: &RigidTransform,
    ) -> RigidTransform {
        match self {
            Self::Standard => bind.mul(delta),
            Self::RootFrame => bind.anim_compose(delta),
        }
    }
}
