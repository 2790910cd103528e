//! Kinemix Animation Core
//!
//! Frame-driven animation playback and skeletal crossfading, independent of
//! any scene graph or renderer. The crate provides:
//! - keyframe tracks with cached interval lookup and lerp/slerp sampling,
//! - a playback controller (repeat modes, speed, playback window, easing, callbacks),
//! - skeleton clips and a pose blender that crossfades two of them,
//! - an engine that ticks everything once per frame and reports lifecycle events.
//!
//! Skeleton storage is external; implement [`Skeleton`] to plug one in.

pub mod animation;
pub mod blend;
pub mod clip;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod ids;
pub mod interp;
pub mod outputs;
pub mod pose;
pub mod target;
pub mod track;

pub use animation::{Animation, Crossfade, PoseSource};
pub use blend::{BlendPhase, PoseBlender};
pub use clip::{parse_skeleton_clip_json, BoneChannel, SkeletonClip, SkeletonClipData};
pub use config::{Config, ControllerConfig, RepeatMode, DEFAULT_REPEAT_COUNT};
pub use controller::{AnimationController, ControllerState};
pub use engine::Engine;
pub use error::AnimationError;
pub use ids::AnimationId;
pub use interp::{ChannelKind, CubicBezier, EaseIn, EaseInOut, EaseOut, Interpolator, Linear};
pub use outputs::{EngineEvent, Outputs};
pub use pose::{share, BoneTransform, Pose, SharedSkeleton, Skeleton};
pub use target::{
    AnimationKind, AnimationTarget, ClipSampler, FnTarget, SkeletonAnimation, TrackAnimation,
};
pub use track::{KeyframeTrack, TrackData};

/// Result type for fallible animation operations.
pub type Result<T> = std::result::Result<T, AnimationError>;
