use std::{error, fmt};

/// Unified error type
///
/// Every variant is a precondition or data integrity failure. None of them
/// are transient so there is nothing to retry. Input data is expected to be
/// validated when a model is imported, which is where most of these are
/// returned from.
#[derive(Debug)]
pub enum SkinError {
    ZeroAxis,
    TimeOutOfRange(f32, f32, f32),
    WeightOutOfRange(f32),
    NoBones,
    RootNotFirst,
    MultipleRoots(usize),
    ParentNotBefore(usize),
    TrackCount(usize, usize),
    EmptyTrack(usize),
    NoKeyframes,
    UnsortedTrack(usize),
    TrackEndMismatch(usize),
    ChannelEndMismatch,
    InvalidFrameRate,
    InvalidSpeed,
    InvalidRange(u32, u32),
    RangeExceedsDuration(u32, u32),
    KeyframeNotFound(usize),
    CountMismatch(usize, usize),
    TooManyInfluences(usize),
    InfluenceMismatch(usize),
    JointOutOfRange(usize),
    FaceOutOfRange(usize),
    SerdeYamlError(Box<serde_yaml::Error>),
}

impl error::Error for SkinError {}

impl fmt::Display for SkinError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ZeroAxis => write!(f, "rotation axis has zero length"),
            Self::TimeOutOfRange(t, start, end) => {
                write!(f, "time {t} is outside keyframe range {start}..={end}")
            }
            Self::WeightOutOfRange(w) => {
                write!(f, "interpolation weight {w} is outside 0..=1")
            }
            Self::NoBones => write!(f, "skeleton has no bones"),
            Self::RootNotFirst => write!(f, "bone 0 must be the root bone"),
            Self::MultipleRoots(a) => {
                write!(f, "bone {a} is a second root bone")
            }
            Self::ParentNotBefore(a) => {
                write!(f, "bone {a} does not follow its parent")
            }
            Self::TrackCount(a, b) => {
                write!(f, "animation has {a} tracks for {b} bones")
            }
            Self::EmptyTrack(a) => write!(f, "track for bone {a} is empty"),
            Self::NoKeyframes => write!(f, "keyframe track is empty"),
            Self::UnsortedTrack(a) => {
                write!(f, "track for bone {a} is not sorted by time")
            }
            Self::TrackEndMismatch(a) => {
                write!(f, "track for bone {a} ends at a different time")
            }
            Self::ChannelEndMismatch => {
                write!(
                    f,
                    "final keyframe is missing from the rotation or \
                     translation channel"
                )
            }
            Self::InvalidFrameRate => write!(f, "frame rate must be positive"),
            Self::InvalidSpeed => write!(f, "playback speed must be positive"),
            Self::InvalidRange(a, b) => {
                write!(f, "frame range ({a}, {b}) ends before it starts")
            }
            Self::RangeExceedsDuration(a, b) => {
                write!(f, "frame range ({a}, {b}) exceeds animation duration")
            }
            Self::KeyframeNotFound(a) => {
                write!(f, "no keyframe for split range on bone {a}")
            }
            Self::CountMismatch(a, b) => {
                write!(f, "pose has {a} bones but inverse bind pose has {b}")
            }
            Self::TooManyInfluences(a) => {
                write!(f, "vertex {a} has more than four bone influences")
            }
            Self::InfluenceMismatch(a) => {
                write!(f, "vertex {a} has mismatched joint and weight counts")
            }
            Self::JointOutOfRange(a) => {
                write!(f, "vertex {a} references a bone that does not exist")
            }
            Self::FaceOutOfRange(a) => {
                write!(f, "face {a} references a vertex that does not exist")
            }
            Self::SerdeYamlError(e) => {
                write!(f, "serde_yaml::Error: {e}")
            }
        }
    }
}

impl From<serde_yaml::Error> for SkinError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::SerdeYamlError(Box::new(e))
    }
}
