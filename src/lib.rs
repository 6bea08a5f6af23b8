//! Skeletal pose solving and skinning transform encoding
//!
//! A `Skeleton` holds bind pose bones in preorder and their animations. A
//! pose is solved at any time into an animation, then combined with the
//! inverse bind pose and encoded for a vertex shader as matrices,
//! quaternions with translations, or dual quaternions.
//!
//! ```
//! use skinbones::{bones_at_time, BlendStyle, Bone, RigidTransform};
//! use skinbones::{Skeleton, SourceFormat};
//!
//! let bones = vec![Bone {
//!     name: "root".to_string(),
//!     parent: None,
//!     transform: RigidTransform::default(),
//! }];
//! let skeleton =
//!     Skeleton::new("one", bones, Vec::new(), SourceFormat::Ogre.into())
//!         .unwrap();
//! let buffer =
//!     bones_at_time(BlendStyle::DualQuat, &skeleton, None, 0.0).unwrap();
//! assert_eq!(buffer.as_slice().len(), 8);
//! ```

pub mod anim;
pub mod dualquat;
pub mod mesh;
pub mod quat;
pub mod rigid;
mod skin_error;
pub mod skinning;
pub mod vertex;

// Re-exports
pub use {
    anim::{
        Animation, Bone, Convention, Keyframe, KeyframeTrack, Pose, Skeleton,
        SourceFormat, TimeOrigin,
    },
    dualquat::DualQuat,
    mesh::{Mesh, Vertex},
    rigid::{Composition, RigidTransform},
    skin_error::SkinError,
    skinning::{bones_at_time, BlendStyle, SkinBuffer},
};
