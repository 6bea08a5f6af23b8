use super::types::{Keyframe, TIME_EPSILON};
use crate::{quat, rigid::RigidTransform, skin_error::SkinError};
use nalgebra_glm as glm;

/// Samples a keyframe track at `time`, which must already be in the track's
/// own time domain (see `TimeOrigin::local_time`).
///
/// A time that lands on a keyframe returns that keyframe's data unchanged.
/// Otherwise the bracketing keyframes are blended, linearly for translation
/// and by slerp for rotation. A time within `TIME_EPSILON` past the last
/// keyframe is treated as the last keyframe.
///
/// # Errors
/// May return `SkinError` if the track is empty, `time` is not finite or is
/// outside the track, or the keyframes are not sorted.
pub fn sample(
    track: &[Keyframe],
    time: f32,
) -> Result<RigidTransform, SkinError> {
    let (Some(first), Some(last)) = (track.first(), track.last()) else {
        return Err(SkinError::NoKeyframes);
    };
    if !time.is_finite() || time < first.time || time > last.time + TIME_EPSILON
    {
        return Err(SkinError::TimeOutOfRange(time, first.time, last.time));
    }
    let time = time.min(last.time);

    // First keyframe at or after the requested time
    let index = track.partition_point(|k| k.time < time);
    let Some(after) = track.get(index) else {
        return Err(SkinError::TimeOutOfRange(time, first.time, last.time));
    };

    // Exact hits are copied so there is no interpolation drift
    #[allow(clippy::float_cmp)]
    let exact = after.time == time;
    if exact {
        return Ok(after.data);
    }

    let Some(before) = index.checked_sub(1).and_then(|i| track.get(i)) else {
        return Err(SkinError::TimeOutOfRange(time, first.time, last.time));
    };
    let weight = (time - before.time) / (after.time - before.time);
    if !(0.0_f32..=1.0_f32).contains(&weight) {
        return Err(SkinError::WeightOutOfRange(weight));
    }

    Ok(RigidTransform {
        rot: quat::slerp(&before.data.rot, &after.data.rot, weight),
        pos: glm::lerp(&before.data.pos, &after.data.pos, weight),
    })
}
