use super::{
    sample,
    types::{Animation, Bone, Convention},
};
use crate::{rigid::RigidTransform, skin_error::SkinError};
use log::trace;

/// Bone to model space transform for every bone, indexed like the bones
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pose(pub Vec<RigidTransform>);

impl Pose {
    #[must_use]
    pub fn as_slice(&self) -> &[RigidTransform] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Calculates a model space pose from bind pose bones and an optional
/// animation at `delta` seconds.
///
/// The bones are visited once in stored order. Since they are in preorder a
/// parent has always been resolved to model space before its children. The
/// work is done on a copy of the transforms so `bones` is never changed.
///
/// # Errors
/// May return `SkinError` if the animation doesn't have one track per bone,
/// `delta` is outside an animated track or a bone comes before its parent.
pub fn calculate(
    bones: &[Bone],
    animation: Option<&Animation>,
    delta: f32,
    convention: Convention,
) -> Result<Pose, SkinError> {
    if let Some(a) = animation.filter(|a| a.tracks.len() != bones.len()) {
        return Err(SkinError::TrackCount(a.tracks.len(), bones.len()));
    }
    let mut transforms: Vec<RigidTransform> =
        bones.iter().map(|b| b.transform).collect();

    for (index, bone) in bones.iter().enumerate() {
        // Bones without a track are not individually animated
        if let Some(track) = animation
            .and_then(|a| a.tracks.get(index))
            .and_then(Option::as_ref)
        {
            // Keyframes are a delta on the bind pose and don't introduce a
            // new coordinate space, so this is still bone to parent
            let local_time = convention.time_origin.local_time(track, delta);
            let anim = sample::sample(track, local_time)?;
            transforms[index] =
                convention.composition.compose(&transforms[index], &anim);
        }

        let Some(parent) = bone.parent else {
            continue;
        };
        if parent >= index {
            return Err(SkinError::ParentNotBefore(index));
        }
        // model/parent * parent/bone = model/bone
        transforms[index] = transforms[parent].mul(&transforms[index]);
    }
    trace!("pose delta={} bones={}", delta, transforms.len());

    Ok(Pose(transforms))
}

/// Calculates the inverse bind pose. Each transform maps from model space to
/// the bone's space in the bind pose.
///
/// # Errors
/// May return `SkinError` if a bone comes before its parent
pub fn inverse_bind_pose(
    bones: &[Bone],
) -> Result<Vec<RigidTransform>, SkinError> {
    let pose = calculate(bones, None, 0.0_f32, Convention::default())?;
    Ok(pose.0.iter().map(RigidTransform::inverse).collect())
}
