pub mod pose;
pub mod resample;
pub mod sample;
pub mod split;
mod types;

// Re-exports
pub use {
    pose::Pose,
    resample::{resample_track, RotationKey, TranslationKey},
    sample::sample,
    split::{split, FrameRange, SplitOptions},
    types::{
        Animation, Bone, Convention, Keyframe, KeyframeTrack, Skeleton,
        SourceFormat, TimeOrigin, TIME_EPSILON,
    },
};
