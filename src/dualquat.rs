use crate::rigid::RigidTransform;
use nalgebra_glm as glm;

/// Dual quaternion
/// GLM has support in the `GLM_GTX_dual_quaternion` extension but this does not
/// seem to be available in the `nalgebra_glm` implementation. So some
/// functionality is implemented here using `glm::Quat`.
///
/// These are derived from a `RigidTransform` for the dual quaternion skinning
/// shader rather than being authored directly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DualQuat {
    pub real: glm::Quat,
    pub dual: glm::Quat,
}

impl Default for DualQuat {
    fn default() -> Self {
        Self {
            // Real part contains the rotation
            real: glm::quat(0.0, 0.0, 0.0, 1.0),
            // Dual part contains the translation but is also effected by
            // the rotation
            dual: glm::quat(0.0, 0.0, 0.0, 0.0),
        }
    }
}

impl DualQuat {
    /// Creates a unit dual quaternion from a unit rotation and a translation
    /// as `real = r` and `dual = 1/2 * t * r`, where t is the translation as a
    /// pure quaternion.
    #[must_use]
    pub fn new(rot: &glm::Quat, trans: &glm::Vec3) -> Self {
        let pure = glm::quat(trans.x, trans.y, trans.z, 0.0_f32);
        Self {
            real: *rot,
            dual: pure * *rot * 0.5_f32,
        }
    }
}

impl From<&RigidTransform> for DualQuat {
    fn from(t: &RigidTransform) -> Self {
        Self::new(&t.rot, &t.pos)
    }
}

/// Conversion to GLSL shader ready mat2x4
impl From<DualQuat> for [[f32; 4]; 2] {
    fn from(dq: DualQuat) -> [[f32; 4]; 2] {
        [
            [
                dq.real.coords.x,
                dq.real.coords.y,
                dq.real.coords.z,
                dq.real.coords.w,
            ],
            [
                dq.dual.coords.x,
                dq.dual.coords.y,
                dq.dual.coords.z,
                dq.dual.coords.w,
            ],
        ]
    }
}

#[must_use]
pub fn mul(q1: &DualQuat, q2: &DualQuat) -> DualQuat {
    DualQuat {
        real: q1.real * q2.real,
        dual: q1.real * q2.dual + q1.dual * q2.real,
    }
}

#[must_use]
pub fn conjugate(q: &DualQuat) -> DualQuat {
    DualQuat {
        real: q.real.conjugate(),
        dual: q.dual.conjugate(),
    }
}

/// Splits a unit dual quaternion back into rotation and translation. The
/// translation is the vector part of `2 * d * r'`.
#[must_use]
pub fn decompose(dq: &DualQuat) -> (glm::Quat, glm::Vec3) {
    let t = dq.dual * dq.real.conjugate() * 2.0_f32;
    (dq.real, glm::vec3(t.i, t.j, t.k))
}

/// Converts a unit dual quaternion to a 4x4 transform matrix
#[must_use]
pub fn to_mat4(dq: &DualQuat) -> glm::Mat4 {
    let (rot, trans) = decompose(dq);
    RigidTransform::new(rot, trans).to_mat4()
}
