use super::types::{Keyframe, KeyframeTrack, TIME_EPSILON};
use crate::{quat, rigid::RigidTransform, skin_error::SkinError};
use log::{debug, error};
use nalgebra_glm as glm;

/// Rotation keyframe from a channel with its own time list
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationKey {
    pub time: f32,
    pub data: glm::Quat,
}

/// Translation keyframe from a channel with its own time list
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TranslationKey {
    pub time: f32,
    pub data: glm::Vec3,
}

/// Helper to calculate the parameter used for interpolation
fn weight(start: f32, end: f32, current: f32) -> f32 {
    const EPSILON: f32 = 0.0005_f32;
    ((current - start) / (end - start).max(EPSILON)).clamp(0.0_f32, 1.0_f32)
}

/// Rotation at `time`. Before the first key the first key is used and past
/// the last key the last key is used.
fn find_rotation(channel: &[RotationKey], time: f32) -> glm::Quat {
    let index = channel.partition_point(|k| k.time < time);
    let before = index.checked_sub(1).and_then(|i| channel.get(i));
    match (before, channel.get(index)) {
        (Some(before), Some(after)) => quat::slerp(
            &before.data,
            &after.data,
            weight(before.time, after.time, time),
        ),
        (None, Some(only)) | (Some(only), None) => only.data,
        (None, None) => glm::Quat::identity(),
    }
}

/// Translation at `time`, held at the ends like `find_rotation`
fn find_translation(channel: &[TranslationKey], time: f32) -> glm::Vec3 {
    let index = channel.partition_point(|k| k.time < time);
    let before = index.checked_sub(1).and_then(|i| channel.get(i));
    match (before, channel.get(index)) {
        (Some(before), Some(after)) => glm::lerp(
            &before.data,
            &after.data,
            weight(before.time, after.time, time),
        ),
        (None, Some(only)) | (Some(only), None) => only.data,
        (None, None) => glm::Vec3::zeros(),
    }
}

/// Merges separate rotation and translation channels into one track with
/// keyframes every `1 / fps` seconds from the earliest key.
///
/// Returns `None` when both channels are empty so the bone stays in its bind
/// pose. An empty channel next to a non-empty one contributes no change. When
/// both have keys they must end at the same time.
///
/// # Errors
/// May return `SkinError` if `fps` is not positive or the channels end at
/// different times.
#[allow(clippy::cast_precision_loss)]
pub fn resample_track(
    rotations: &[RotationKey],
    translations: &[TranslationKey],
    fps: f32,
) -> Result<Option<KeyframeTrack>, SkinError> {
    if rotations.is_empty() && translations.is_empty() {
        return Ok(None);
    }
    if fps.is_nan() || fps <= 0.0_f32 {
        return Err(SkinError::InvalidFrameRate);
    }

    let mut rotations = rotations.to_vec();
    rotations.sort_by(|a, b| a.time.total_cmp(&b.time));
    let mut translations = translations.to_vec();
    translations.sort_by(|a, b| a.time.total_cmp(&b.time));

    let r_span = rotations.first().zip(rotations.last());
    let t_span = translations.first().zip(translations.last());
    let (start, end) = match (r_span, t_span) {
        (Some((r_first, r_last)), Some((t_first, t_last))) => {
            if (r_last.time - t_last.time).abs() > TIME_EPSILON {
                error!(
                    "rotation channel ends at {} but translation at {}",
                    r_last.time, t_last.time
                );
                return Err(SkinError::ChannelEndMismatch);
            }
            (r_first.time.min(t_first.time), r_last.time.max(t_last.time))
        }
        (Some((first, last)), None) => (first.time, last.time),
        (None, Some((first, last))) => (first.time, last.time),
        (None, None) => return Ok(None),
    };
    let duration = end - start;

    let mut track = Vec::new();
    let mut frame = 0_u32;
    loop {
        let offset = frame as f32 / fps;
        if offset > duration + TIME_EPSILON {
            break;
        }
        let time = start + offset;
        track.push(Keyframe {
            time,
            data: RigidTransform::new(
                find_rotation(&rotations, time),
                find_translation(&translations, time),
            ),
        });
        frame += 1;
    }
    debug!(
        "resampled {} rotations and {} translations to {} keyframes",
        rotations.len(),
        translations.len(),
        track.len()
    );
    Ok(Some(track))
}
