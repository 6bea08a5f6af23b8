//! Quaternion algebra on `glm::Quat`
//!
//! `nalgebra_glm` has most of this but a few conventions here must be exact
//! because imported data depends on them: the Euler angle order used by MS3D
//! files, the column-major matrix layout expected by the shaders, and the way
//! slerp treats quaternions that are almost the same or almost opposite.
//!
//! Remember that `glm::quat` takes parameters in x, y, z, w order.
use crate::skin_error::SkinError;
use itertools::Itertools;
use nalgebra_glm as glm;

/// Below this value for `sin(half angle)` slerp uses a linear blend
const SLERP_EPSILON: f32 = 1.0e-5_f32;

/// Creates a quaternion from Euler angles in radians. The rotation about X
/// is applied first, then Y, then Z. This is the order written by the MS3D
/// exporter so bone and keyframe rotations from those files come through
/// here.
#[must_use]
pub fn from_euler(x: f32, y: f32, z: f32) -> glm::Quat {
    let (s1, c1) = (x * 0.5_f32).sin_cos();
    let (s2, c2) = (y * 0.5_f32).sin_cos();
    let (s3, c3) = (z * 0.5_f32).sin_cos();
    let c1c2 = c1 * c2;
    let s1s2 = s1 * s2;
    glm::quat_normalize(&glm::quat(
        s1 * c2 * c3 - c1 * s2 * s3,
        c1 * s2 * c3 + s1 * c2 * s3,
        c1c2 * s3 - s1s2 * c3,
        c1c2 * c3 + s1s2 * s3,
    ))
}

/// Creates a quaternion for a rotation of `angle` radians about `axis`. The
/// axis does not need to be normalized.
///
/// # Errors
/// Returns `SkinError::ZeroAxis` if the axis has zero length
pub fn from_axis_angle(
    angle: f32,
    axis: &glm::Vec3,
) -> Result<glm::Quat, SkinError> {
    let len = glm::length(axis);
    if len <= 0.0_f32 {
        return Err(SkinError::ZeroAxis);
    }
    let (s, c) = (angle * 0.5_f32).sin_cos();
    let s = s / len;
    Ok(glm::quat_normalize(&glm::quat(
        s * axis.x,
        s * axis.y,
        s * axis.z,
        c,
    )))
}

/// Hamilton product `q1 * q2`, meaning apply `q2` then `q1`
#[must_use]
pub fn mul(q1: &glm::Quat, q2: &glm::Quat) -> glm::Quat {
    q1 * q2
}

#[must_use]
pub fn normalize(q: &glm::Quat) -> glm::Quat {
    glm::quat_normalize(q)
}

#[must_use]
pub fn conjugate(q: &glm::Quat) -> glm::Quat {
    glm::quat_conjugate(q)
}

/// Rotates a point by a unit quaternion as `q * p * q'`
#[must_use]
pub fn transform_point(q: &glm::Quat, p: &glm::Vec3) -> glm::Vec3 {
    let pure = glm::quat(p.x, p.y, p.z, 0.0_f32);
    let r = q * pure * conjugate(q);
    glm::vec3(r.i, r.j, r.k)
}

/// Rotation matrix as 16 column-major values. The translation column is left
/// as identity for the caller to fill in. The quaternion does not have to be
/// unit length since each term is divided by the squared length.
#[must_use]
pub fn to_array(q: &glm::Quat) -> [f32; 16] {
    let mut ret = [0.0_f32; 16];
    ret[15] = 1.0_f32;

    let w2 = q.w * q.w;
    let x2 = q.i * q.i;
    let y2 = q.j * q.j;
    let z2 = q.k * q.k;
    let len2 = w2 + x2 + y2 + z2;

    // Diagonal
    ret[0] = (x2 - y2 - z2 + w2) / len2;
    ret[5] = (-x2 + y2 - z2 + w2) / len2;
    ret[10] = (-x2 - y2 + z2 + w2) / len2;

    // Off diagonal
    let wx = 2.0_f32 * q.w * q.i;
    let wy = 2.0_f32 * q.w * q.j;
    let wz = 2.0_f32 * q.w * q.k;
    let xy = 2.0_f32 * q.i * q.j;
    let xz = 2.0_f32 * q.i * q.k;
    let yz = 2.0_f32 * q.j * q.k;
    ret[1] = (xy + wz) / len2;
    ret[4] = (xy - wz) / len2;
    ret[2] = (xz - wy) / len2;
    ret[8] = (xz + wy) / len2;
    ret[6] = (yz + wx) / len2;
    ret[9] = (yz - wx) / len2;

    ret
}

#[must_use]
pub fn to_mat4(q: &glm::Quat) -> glm::Mat4 {
    glm::Mat4::from_column_slice(&to_array(q))
}

/// Spherical interpolation from `q1` at weight 0 to `q2` at weight 1
///
/// If the quaternions are identical (or exactly opposite, which is the same
/// rotation) `q1` is returned. When they are so close to that case that
/// `sin(half angle)` would be a bad divisor, a normalized linear blend is
/// used instead. No hemisphere flip is done otherwise, so the path is the
/// one implied by the signs of the inputs.
#[must_use]
pub fn slerp(q1: &glm::Quat, q2: &glm::Quat, weight: f32) -> glm::Quat {
    let cos_half = glm::quat_dot(q1, q2);
    if cos_half.abs() >= 1.0_f32 {
        return *q1;
    }

    let sin_half = half_angle_sine(q1, q2);
    if sin_half < f64::from(SLERP_EPSILON) {
        let q2 = if cos_half < 0.0_f32 { -*q2 } else { *q2 };
        return glm::quat_normalize(&(q1 * (1.0_f32 - weight) + q2 * weight));
    }

    let half_angle = sin_half.atan2(f64::from(cos_half));
    let weight = f64::from(weight);
    let c = ((1.0_f64 - weight) * half_angle).sin() / sin_half;
    let oc = (weight * half_angle).sin() / sin_half;
    #[allow(clippy::cast_possible_truncation)]
    let (c, oc) = (c as f32, oc as f32);
    q1 * c + q2 * oc
}

/// `sin(half angle)` between two unit quaternions, from the length of their
/// wedge product. Worked in f64 since `sqrt(1 - cos^2)` in f32 can't resolve
/// angles this small.
fn half_angle_sine(q1: &glm::Quat, q2: &glm::Quat) -> f64 {
    let a = [q1.i, q1.j, q1.k, q1.w].map(f64::from);
    let b = [q2.i, q2.j, q2.k, q2.w].map(f64::from);
    (0..4_usize)
        .tuple_combinations()
        .map(|(i, j)| a[i].mul_add(b[j], -(a[j] * b[i])).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Returns the rotation axis and angle in radians. A rotation of 0 or 360
/// degrees has no meaningful axis and is returned as 0 radians about X.
#[must_use]
pub fn to_axis_angle(q: &glm::Quat) -> (glm::Vec3, f32) {
    let w = q.w.clamp(-1.0_f32, 1.0_f32);
    let len = w.mul_add(-w, 1.0_f32).sqrt();
    if len <= 0.0_f32 {
        return (glm::vec3(1.0_f32, 0.0_f32, 0.0_f32), 0.0_f32);
    }
    (
        glm::vec3(q.i / len, q.j / len, q.k / len),
        2.0_f32 * w.acos(),
    )
}

/// Approximate equality for rotations, allowing for `q` and `-q` being the
/// same rotation
#[must_use]
pub fn same_rotation(q1: &glm::Quat, q2: &glm::Quat, epsilon: f32) -> bool {
    glm::quat_dot(q1, q2).abs() >= 1.0_f32 - epsilon
}

#[cfg(test)]
mod tests {
    use nalgebra_glm as glm;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_3, PI};

    const EPSILON: f32 = 0.0001_f32;

    fn compare(q1: &glm::Quat, q2: &glm::Quat) {
        let c = glm::quat_equal_eps(q1, q2, EPSILON);
        assert!(c.x && c.y && c.z && c.w, "{q1:?} != {q2:?}");
    }

    #[test]
    fn from_euler_single_axis() {
        let x = glm::vec3(1.0_f32, 0.0, 0.0);
        let y = glm::vec3(0.0_f32, 1.0, 0.0);
        let z = glm::vec3(0.0_f32, 0.0, 1.0);
        compare(
            &super::from_euler(0.7, 0.0, 0.0),
            &glm::quat_angle_axis(0.7, &x),
        );
        compare(
            &super::from_euler(0.0, -1.2, 0.0),
            &glm::quat_angle_axis(-1.2, &y),
        );
        compare(
            &super::from_euler(0.0, 0.0, 2.5),
            &glm::quat_angle_axis(2.5, &z),
        );
    }

    #[test]
    fn from_euler_order() {
        // X is applied first, then Y, then Z
        let (ax, ay, az) = (0.3_f32, -0.8_f32, 1.9_f32);
        let qx = glm::quat_angle_axis(ax, &glm::vec3(1.0, 0.0, 0.0));
        let qy = glm::quat_angle_axis(ay, &glm::vec3(0.0, 1.0, 0.0));
        let qz = glm::quat_angle_axis(az, &glm::vec3(0.0, 0.0, 1.0));
        compare(&super::from_euler(ax, ay, az), &(qz * qy * qx));
    }

    #[test]
    fn from_axis_angle() {
        // Axis is normalized internally
        let q = super::from_axis_angle(FRAC_PI_3, &glm::vec3(0.0, 0.0, 4.0))
            .unwrap();
        compare(
            &q,
            &glm::quat_angle_axis(FRAC_PI_3, &glm::vec3(0.0, 0.0, 1.0)),
        );
        assert!((glm::quat_length(&q) - 1.0).abs() < EPSILON);

        let res = super::from_axis_angle(1.0, &glm::vec3(0.0, 0.0, 0.0));
        assert!(matches!(res, Err(crate::SkinError::ZeroAxis)));
    }

    #[test]
    fn mul() {
        // Same values as the dual quaternion product test
        let q1 = glm::quat(1.0_f32, 2.0, 3.0, 4.0);
        let q2 = glm::quat(4.0_f32, 3.0, 2.0, 1.0);
        let res = super::mul(&q1, &q2);
        assert!(
            res.i == 12.0_f32
                && res.j == 24.0_f32
                && res.k == 6.0_f32
                && res.w == -12.0_f32
        );
    }

    #[test]
    fn transform_point() {
        let q = glm::quat_angle_axis(FRAC_PI_2, &glm::vec3(0.0, 0.0, 1.0));
        let p = super::transform_point(&q, &glm::vec3(1.0, 0.0, 2.0));
        let c = glm::equal_eps(&p, &glm::vec3(0.0, 1.0, 2.0), EPSILON);
        assert!(c.x && c.y && c.z);
    }

    #[test]
    fn to_mat4() {
        let q = glm::quat_angle_axis(
            1.1_f32,
            &glm::normalize(&glm::vec3(0.811_107, 0.486_664, 0.324_443)),
        );
        let m1 = super::to_mat4(&q);
        let m2 = glm::quat_to_mat4(&q);
        let c = glm::equal_columns_eps(&m1, &m2, EPSILON);
        assert!(c.x && c.y && c.z && c.w);

        // Non unit quaternions give the same rotation
        let m3 = super::to_mat4(&(q * 3.0_f32));
        let c = glm::equal_columns_eps(&m1, &m3, EPSILON);
        assert!(c.x && c.y && c.z && c.w);

        // Translation column is identity
        let arr = super::to_array(&q);
        assert!(arr[12] == 0.0 && arr[13] == 0.0 && arr[14] == 0.0);
        assert!(arr[15] == 1.0);
    }

    #[test]
    fn slerp_boundaries() {
        let q1 = glm::quat_angle_axis(0.4, &glm::vec3(0.0, 1.0, 0.0));
        let q2 = glm::quat_angle_axis(
            2.1,
            &glm::normalize(&glm::vec3(1.0, 1.0, 0.0)),
        );
        compare(&super::slerp(&q1, &q2, 0.0), &q1);
        assert!(super::same_rotation(
            &super::slerp(&q1, &q2, 1.0),
            &q2,
            EPSILON
        ));
        for i in 0..=10 {
            #[allow(clippy::cast_precision_loss)]
            let w = i as f32 * 0.1;
            compare(&super::slerp(&q1, &q1, w), &q1);
        }
    }

    #[test]
    fn slerp_halfway() {
        let z = glm::vec3(0.0_f32, 0.0, 1.0);
        let q1 = glm::Quat::identity();
        let q2 = glm::quat_angle_axis(PI, &z);
        let res = super::slerp(&q1, &q2, 0.5);
        compare(&res, &glm::quat_angle_axis(FRAC_PI_2, &z));
        assert!((glm::quat_length(&res) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn slerp_opposite() {
        // q and -q are the same rotation so nothing moves
        let q = glm::quat(1.0_f32, 0.0, 0.0, 0.0);
        let res = super::slerp(&q, &-q, 0.5);
        compare(&res, &q);
        let q = glm::Quat::identity();
        let res = super::slerp(&q, &-q, 0.25);
        compare(&res, &q);
    }

    #[test]
    fn slerp_nearly_same() {
        // Too close for the slerp divisor so the linear blend is used
        let q1 = glm::Quat::identity();
        let q2 = glm::quat(0.0_f32, 0.0, 5.0e-6, 0.999_999_94);
        let res = super::slerp(&q1, &q2, 0.5);
        assert!((glm::quat_length(&res) - 1.0).abs() < EPSILON);
        assert!(res.k > 2.4e-6 && res.k < 2.6e-6, "{res:?}");

        // Nearly opposite blends towards the same rotation, not through zero
        let res = super::slerp(&q1, &-q2, 0.5);
        assert!((glm::quat_length(&res) - 1.0).abs() < EPSILON);
        assert!(res.k > 2.4e-6 && res.k < 2.6e-6, "{res:?}");
        assert!(super::same_rotation(&res, &q1, EPSILON));
    }

    #[test]
    fn to_axis_angle() {
        let axis = glm::normalize(&glm::vec3(1.0_f32, -2.0, 0.5));
        let q = glm::quat_angle_axis(1.3, &axis);
        let (res_axis, res_angle) = super::to_axis_angle(&q);
        let c = glm::equal_eps(&res_axis, &axis, EPSILON);
        assert!(c.x && c.y && c.z);
        assert!((res_angle - 1.3).abs() < EPSILON);

        let (res_axis, res_angle) =
            super::to_axis_angle(&glm::Quat::identity());
        assert_eq!(res_axis, glm::vec3(1.0, 0.0, 0.0));
        assert!(res_angle.abs() < EPSILON);
    }
}
