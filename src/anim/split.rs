use super::types::{Animation, Keyframe, KeyframeTrack};
use crate::skin_error::SkinError;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Frame numbers are converted to times and then moved back by this much
/// before searching. Without resampling, the keyframe wanted is then the
/// next one found, even with a little float error in the stored times.
const SPLIT_EPSILON: f32 = 0.001_f32;

/// Inclusive range of frame numbers to become one animation
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct FrameRange {
    pub start: u32,
    pub end: u32,
    /// Defaults to the frame range written as `<start-end>`
    #[serde(default)]
    pub name: Option<String>,
}

impl FrameRange {
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self {
            start,
            end,
            name: None,
        }
    }

    #[must_use]
    pub fn named(start: u32, end: u32, name: &str) -> Self {
        Self {
            start,
            end,
            name: Some(name.to_string()),
        }
    }
}

/// Options for splitting one long animation into several. This is for
/// formats like MS3D that only store a single animation.
#[derive(Serialize, Deserialize, PartialEq, Debug)]
#[serde(default)]
pub struct SplitOptions {
    /// Frames per second used to convert frame numbers to times
    pub fps: f32,
    /// Playback speed. Durations and keyframe times are divided by this.
    pub speed: f32,
    pub ranges: Vec<FrameRange>,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            fps: 24.0_f32,
            speed: 1.0_f32,
            ranges: Vec::new(),
        }
    }
}

impl SplitOptions {
    /// Reads options from YAML text
    ///
    /// # Errors
    /// May return `SkinError`
    pub fn from_yaml(text: &str) -> Result<Self, SkinError> {
        Ok(serde_yaml::from_str(text)?)
    }
}

/// Splits `total` into one animation per frame range.
///
/// Frame boundaries are assumed to land on existing keyframes so nothing is
/// resampled. Keyframes are copied from the first one at or after the start
/// time to the first one at or after the end time, with times divided by the
/// playback speed. Bones without a track keep no track.
///
/// # Errors
/// May return `SkinError` if the frame rate or speed is not positive, a range
/// is reversed or past the end of `total`, or a track has no keyframe for a
/// range.
#[allow(clippy::cast_precision_loss)]
pub fn split(
    total: &Animation,
    options: &SplitOptions,
) -> Result<Vec<Animation>, SkinError> {
    if options.fps.is_nan() || options.fps <= 0.0_f32 {
        return Err(SkinError::InvalidFrameRate);
    }
    if options.speed.is_nan() || options.speed <= 0.0_f32 {
        return Err(SkinError::InvalidSpeed);
    }

    let mut ret = Vec::with_capacity(options.ranges.len());
    for range in &options.ranges {
        if range.end < range.start {
            return Err(SkinError::InvalidRange(range.start, range.end));
        }
        if range.end == range.start {
            warn!("frame range {} is a single frame", range.start);
        }
        let start_time = range.start as f32 / options.fps - SPLIT_EPSILON;
        let end_time = range.end as f32 / options.fps - SPLIT_EPSILON;
        if start_time > total.duration || end_time > total.duration {
            return Err(SkinError::RangeExceedsDuration(range.start, range.end));
        }

        let tracks = total
            .tracks
            .iter()
            .enumerate()
            .map(|(index, track)| {
                track
                    .as_ref()
                    .map(|t| {
                        split_track(t, start_time, end_time, options.speed)
                            .ok_or(SkinError::KeyframeNotFound(index))
                    })
                    .transpose()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let name = range
            .name
            .clone()
            .unwrap_or_else(|| format!("<{}-{}>", range.start, range.end));
        debug!(
            "split name={} start_time={} end_time={}",
            name, start_time, end_time
        );
        ret.push(Animation {
            name,
            duration: (end_time - start_time) / options.speed,
            tracks,
        });
    }

    info!(
        "split animation={} into {} animations",
        total.name,
        ret.len()
    );
    Ok(ret)
}

/// Copies the keyframes covering `start_time` to `end_time`. Returns `None`
/// if either time is past the last keyframe.
fn split_track(
    track: &[Keyframe],
    start_time: f32,
    end_time: f32,
    speed: f32,
) -> Option<KeyframeTrack> {
    let start = track.partition_point(|k| k.time < start_time);
    let end = track.partition_point(|k| k.time < end_time);
    track.get(start..=end).map(|keys| {
        keys.iter()
            .map(|k| Keyframe {
                time: k.time / speed,
                data: k.data,
            })
            .collect()
    })
}
