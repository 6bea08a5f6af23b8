use super::pose::{self, Pose};
use crate::{
    rigid::{Composition, RigidTransform},
    skin_error::SkinError,
};
use ahash::{HashMap, HashMapExt};
use itertools::Itertools;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};

/// Tolerance in seconds when comparing keyframe times
pub const TIME_EPSILON: f32 = 0.0001_f32;

/// A bone in its bind pose. The transform maps from bone space to the space
/// of the parent bone. The root has no parent.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bone {
    pub name: String,
    pub parent: Option<usize>,
    pub transform: RigidTransform,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub data: RigidTransform,
}

/// Keyframes for one bone, sorted by time
pub type KeyframeTrack = Vec<Keyframe>;

/// One track per bone, indexed the same as the skeleton's bones. A bone with
/// no track stays in its bind pose for this animation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Animation {
    pub name: String,
    pub duration: f32,
    pub tracks: Vec<Option<KeyframeTrack>>,
}

/// Where time 0 of an animation is found in its keyframe tracks
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum TimeOrigin {
    /// Keyframe times are animation times
    #[default]
    Zero,
    /// Each track starts at its own first keyframe time, which is added to
    /// the animation time before lookup
    FirstKeyframe,
}

impl TimeOrigin {
    /// Converts an animation time to the time domain of `track`
    #[must_use]
    pub fn local_time(self, track: &[Keyframe], time: f32) -> f32 {
        match self {
            Self::Zero => time,
            Self::FirstKeyframe => {
                time + track.first().map_or(0.0_f32, |k| k.time)
            }
        }
    }

    /// Length of `track` as seen by the animation
    fn track_end(self, first: &Keyframe, last: &Keyframe) -> f32 {
        match self {
            Self::Zero => last.time,
            Self::FirstKeyframe => last.time - first.time,
        }
    }
}

/// How animation data from a particular source format is applied
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Convention {
    pub composition: Composition,
    pub time_origin: TimeOrigin,
}

/// Importers that produce skeletons, each with a fixed `Convention`
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum SourceFormat {
    /// Milkshape 3D. Keyframe translations are in the bone's own frame and
    /// tracks don't start at time 0.
    Ms3d,
    /// Ogre XML skeleton. Keyframe translations are in the parent frame.
    Ogre,
}

impl SourceFormat {
    #[must_use]
    pub const fn convention(self) -> Convention {
        match self {
            Self::Ms3d => Convention {
                composition: Composition::Standard,
                time_origin: TimeOrigin::FirstKeyframe,
            },
            Self::Ogre => Convention {
                composition: Composition::RootFrame,
                time_origin: TimeOrigin::Zero,
            },
        }
    }
}

impl From<SourceFormat> for Convention {
    fn from(f: SourceFormat) -> Self {
        f.convention()
    }
}

/// Bones in preorder with their animations
///
/// Nothing is changed after construction. The inverse bind pose is
/// calculated once here and the pose solver works on copies of the bones, so
/// a `Skeleton` can be shared by any number of solves.
#[derive(Clone, Debug)]
pub struct Skeleton {
    name: String,
    bones: Vec<Bone>,
    animations: Vec<Animation>,
    inv_bind: Vec<RigidTransform>,
    convention: Convention,
    bone_lookup: HashMap<String, usize>,
    animation_lookup: HashMap<String, usize>,
}

impl Skeleton {
    /// Validates the bones and animations and calculates the inverse bind
    /// pose.
    ///
    /// # Errors
    /// May return `SkinError` if bones are not in preorder with the root
    /// first, or if any animation has tracks that don't match the bones or
    /// each other.
    pub fn new(
        name: &str,
        bones: Vec<Bone>,
        animations: Vec<Animation>,
        convention: Convention,
    ) -> Result<Self, SkinError> {
        validate_bones(&bones)?;
        for animation in &animations {
            validate_animation(
                animation,
                bones.len(),
                convention.time_origin,
            )?;
        }
        let inv_bind = pose::inverse_bind_pose(&bones)?;

        let mut bone_lookup = HashMap::with_capacity(bones.len());
        for (index, bone) in bones.iter().enumerate() {
            bone_lookup.entry(bone.name.clone()).or_insert(index);
        }
        let mut animation_lookup = HashMap::with_capacity(animations.len());
        for (index, animation) in animations.iter().enumerate() {
            animation_lookup
                .entry(animation.name.clone())
                .or_insert(index);
        }

        info!(
            "skeleton={} bones={} animations={} convention={:?}",
            name,
            bones.len(),
            animations.len(),
            convention
        );
        Ok(Self {
            name: name.to_string(),
            bones,
            animations,
            inv_bind,
            convention,
            bone_lookup,
            animation_lookup,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind pose bones, bone to parent space
    #[must_use]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    #[must_use]
    pub fn animations(&self) -> &[Animation] {
        &self.animations
    }

    /// One model to bone space transform per bone
    #[must_use]
    pub fn inv_bind_pose(&self) -> &[RigidTransform] {
        &self.inv_bind
    }

    #[must_use]
    pub const fn convention(&self) -> Convention {
        self.convention
    }

    #[must_use]
    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bone_lookup.get(name).copied()
    }

    #[must_use]
    pub fn animation_index(&self, name: &str) -> Option<usize> {
        self.animation_lookup.get(name).copied()
    }

    #[must_use]
    pub fn animation(&self, name: &str) -> Option<&Animation> {
        self.animation_index(name)
            .and_then(|index| self.animations.get(index))
    }

    /// Solves the model space pose at `delta` seconds into `animation`, or
    /// the bind pose if there is no animation
    ///
    /// # Errors
    /// May return `SkinError` if `delta` is outside the animation or the
    /// animation doesn't have one track per bone
    pub fn pose(
        &self,
        animation: Option<&Animation>,
        delta: f32,
    ) -> Result<Pose, SkinError> {
        pose::calculate(&self.bones, animation, delta, self.convention)
    }
}

/// Checks that bone 0 is the only root and that every other bone comes after
/// its parent
fn validate_bones(bones: &[Bone]) -> Result<(), SkinError> {
    let Some(root) = bones.first() else {
        error!("skeleton has no bones");
        return Err(SkinError::NoBones);
    };
    if root.parent.is_some() {
        error!("bone 0 ({}) is not a root", root.name);
        return Err(SkinError::RootNotFirst);
    }
    for (index, bone) in bones.iter().enumerate().skip(1) {
        match bone.parent {
            None => {
                error!("bone {} ({}) is a second root", index, bone.name);
                return Err(SkinError::MultipleRoots(index));
            }
            Some(parent) if parent >= index => {
                error!(
                    "bone {} ({}) has parent {} which is not before it",
                    index, bone.name, parent
                );
                return Err(SkinError::ParentNotBefore(index));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Checks that there is one track per bone, that tracks have finite sorted
/// times and that they all end at the same time
fn validate_animation(
    animation: &Animation,
    bone_count: usize,
    time_origin: TimeOrigin,
) -> Result<(), SkinError> {
    if animation.tracks.len() != bone_count {
        error!(
            "animation {} has {} tracks for {} bones",
            animation.name,
            animation.tracks.len(),
            bone_count
        );
        return Err(SkinError::TrackCount(animation.tracks.len(), bone_count));
    }

    let mut end: Option<f32> = None;
    for (index, track) in animation.tracks.iter().enumerate() {
        let Some(track) = track else {
            continue;
        };
        let (Some(first), Some(last)) = (track.first(), track.last()) else {
            error!(
                "animation {} bone {} track is empty",
                animation.name, index
            );
            return Err(SkinError::EmptyTrack(index));
        };
        if track.iter().any(|k| !k.time.is_finite())
            || track.iter().tuple_windows().any(|(a, b)| b.time < a.time)
        {
            error!(
                "animation {} bone {} track is unsorted",
                animation.name, index
            );
            return Err(SkinError::UnsortedTrack(index));
        }

        let track_end = time_origin.track_end(first, last);
        match end {
            Some(e) if (e - track_end).abs() > TIME_EPSILON => {
                error!(
                    "animation {} bone {} track ends at {} not {}",
                    animation.name, index, track_end, e
                );
                return Err(SkinError::TrackEndMismatch(index));
            }
            Some(_) => {}
            None => end = Some(track_end),
        }
    }
    debug!(
        "animation={} duration={} track end={:?}",
        animation.name, animation.duration, end
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        Animation, Bone, Convention, Keyframe, Skeleton, SourceFormat,
        TimeOrigin,
    };
    use crate::{
        rigid::{Composition, RigidTransform},
        skin_error::SkinError,
    };
    use nalgebra_glm as glm;

    fn bone(name: &str, parent: Option<usize>, y: f32) -> Bone {
        Bone {
            name: name.to_string(),
            parent,
            transform: RigidTransform::new(
                glm::Quat::identity(),
                glm::vec3(0.0, y, 0.0),
            ),
        }
    }

    fn track(times: &[f32]) -> Vec<Keyframe> {
        times
            .iter()
            .map(|&time| Keyframe {
                time,
                data: RigidTransform::default(),
            })
            .collect()
    }

    fn build(
        bones: Vec<Bone>,
        animations: Vec<Animation>,
    ) -> Result<Skeleton, SkinError> {
        Skeleton::new("test", bones, animations, Convention::default())
    }

    fn chain() -> Vec<Bone> {
        vec![
            bone("root", None, 0.0),
            bone("spine", Some(0), 1.0),
            bone("head", Some(1), 1.0),
            bone("arm", Some(1), 0.5),
        ]
    }

    #[test]
    fn new() {
        let skeleton = build(chain(), Vec::new()).unwrap();
        assert_eq!(skeleton.bones().len(), 4);
        assert_eq!(skeleton.inv_bind_pose().len(), 4);
        assert_eq!(skeleton.bone_index("head"), Some(2));
        assert_eq!(skeleton.bone_index("tail"), None);
        assert!(skeleton.animation("walk").is_none());
    }

    #[test]
    fn bad_bones() {
        let res = build(Vec::new(), Vec::new());
        assert!(matches!(res, Err(SkinError::NoBones)));

        let mut bones = chain();
        bones[0].parent = Some(1);
        let res = build(bones, Vec::new());
        assert!(matches!(res, Err(SkinError::RootNotFirst)));

        let mut bones = chain();
        bones[2].parent = None;
        let res = build(bones, Vec::new());
        assert!(matches!(res, Err(SkinError::MultipleRoots(2))));

        // Parent must come before the child, not at or after it
        let mut bones = chain();
        bones[1].parent = Some(1);
        let res = build(bones, Vec::new());
        assert!(matches!(res, Err(SkinError::ParentNotBefore(1))));
        let mut bones = chain();
        bones[1].parent = Some(3);
        let res = build(bones, Vec::new());
        assert!(matches!(res, Err(SkinError::ParentNotBefore(1))));
    }

    #[test]
    fn bad_animations() {
        let animation = Animation {
            name: "short".to_string(),
            duration: 1.0,
            tracks: vec![None, None],
        };
        let res = build(chain(), vec![animation]);
        assert!(matches!(res, Err(SkinError::TrackCount(2, 4))));

        let animation = Animation {
            name: "empty".to_string(),
            duration: 1.0,
            tracks: vec![None, Some(Vec::new()), None, None],
        };
        let res = build(chain(), vec![animation]);
        assert!(matches!(res, Err(SkinError::EmptyTrack(1))));

        let animation = Animation {
            name: "unsorted".to_string(),
            duration: 1.0,
            tracks: vec![
                None,
                None,
                Some(track(&[0.0, 0.6, 0.5, 1.0])),
                None,
            ],
        };
        let res = build(chain(), vec![animation]);
        assert!(matches!(res, Err(SkinError::UnsortedTrack(2))));

        // A NaN time compares false both ways so is caught on its own
        let animation = Animation {
            name: "nan".to_string(),
            duration: 1.0,
            tracks: vec![
                None,
                Some(track(&[0.0, f32::NAN, 1.0])),
                None,
                None,
            ],
        };
        let res = build(chain(), vec![animation]);
        assert!(matches!(res, Err(SkinError::UnsortedTrack(1))));

        let animation = Animation {
            name: "ragged".to_string(),
            duration: 1.0,
            tracks: vec![
                Some(track(&[0.0, 1.0])),
                None,
                Some(track(&[0.0, 0.5, 0.9])),
                None,
            ],
        };
        let res = build(chain(), vec![animation]);
        assert!(matches!(res, Err(SkinError::TrackEndMismatch(2))));
    }

    #[test]
    fn track_end_follows_time_origin() {
        // Same length but different start times is fine when each track is
        // measured from its own first keyframe
        let animation = Animation {
            name: "offset".to_string(),
            duration: 1.0,
            tracks: vec![
                Some(track(&[0.5, 1.0, 1.5])),
                Some(track(&[2.0, 3.0])),
                None,
                None,
            ],
        };
        let ms3d = Skeleton::new(
            "test",
            chain(),
            vec![animation.clone()],
            SourceFormat::Ms3d.into(),
        )
        .unwrap();
        assert_eq!(ms3d.animation_index("offset"), Some(0));

        let res = Skeleton::new(
            "test",
            chain(),
            vec![animation],
            SourceFormat::Ogre.into(),
        );
        assert!(matches!(res, Err(SkinError::TrackEndMismatch(1))));
    }

    #[test]
    fn conventions() {
        let c = SourceFormat::Ms3d.convention();
        assert_eq!(c.composition, Composition::Standard);
        assert_eq!(c.time_origin, TimeOrigin::FirstKeyframe);
        let c = SourceFormat::Ogre.convention();
        assert_eq!(c.composition, Composition::RootFrame);
        assert_eq!(c.time_origin, TimeOrigin::Zero);

        let t = track(&[0.25, 1.0]);
        assert!((TimeOrigin::Zero.local_time(&t, 0.5) - 0.5).abs() < 1e-6);
        assert!(
            (TimeOrigin::FirstKeyframe.local_time(&t, 0.5) - 0.75).abs() < 1e-6
        );
    }
}
