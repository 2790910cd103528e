//! Error types for kinemix animation core.
//!
//! Configuration problems are reported when a track, controller or blend is
//! built. Per-frame ticking never fails; anomalies found while sampling are
//! logged and clamped instead.

use serde::{Deserialize, Serialize};

use crate::interp::ChannelKind;

/// Error returned by constructors, setters and blend/engine operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AnimationError {
    /// Duration must be a finite value greater than zero.
    #[error("Invalid duration: {duration} (must be > 0)")]
    InvalidDuration { duration: f32 },

    /// Speed multiplier must be a finite value greater than zero.
    #[error("Invalid speed: {speed} (must be > 0)")]
    InvalidSpeed { speed: f32 },

    /// Offset must leave a non-empty playback window.
    #[error("Offset {offset} is out of range [0, {duration})")]
    InvalidOffset { offset: f32, duration: f32 },

    /// Playback window must satisfy 0 <= start < end <= duration.
    #[error("Invalid playback window [{start}, {end}] for duration {duration}")]
    InvalidWindow { start: f32, end: f32, duration: f32 },

    /// A key needs one time float plus at least one value float.
    #[error("Invalid key size: {floats_per_key} floats per key (need at least 2, the key includes time)")]
    InvalidKeySize { floats_per_key: usize },

    /// The key data does not hold a single full key.
    #[error("Not enough key data: {len} floats for keys of {floats_per_key} floats")]
    NotEnoughKeyData { len: usize, floats_per_key: usize },

    /// The key data ends with a partial key.
    #[error("Key data length {len} is not a multiple of {floats_per_key}")]
    PartialKeyData { len: usize, floats_per_key: usize },

    /// Key times must be non-decreasing.
    #[error("Key {index} at time {time} precedes the previous key at {previous}")]
    UnorderedKeys { index: usize, time: f32, previous: f32 },

    /// Key index outside the fixed track length.
    #[error("Key index {index} is out of range (track has {num_keys} keys)")]
    KeyIndexOutOfRange { index: usize, num_keys: usize },

    /// Value slice width does not match the track value width.
    #[error("This key needs {expected} floats per value, got {actual}")]
    ValueWidthMismatch { expected: usize, actual: usize },

    /// Channel kind cannot be used with the given value width.
    #[error("{kind:?} channel cannot hold {value_width} floats per value")]
    UnsupportedChannel { kind: ChannelKind, value_width: usize },

    /// Bone index outside the skeleton.
    #[error("Bone {bone} is out of range (skeleton has {bone_count} bones)")]
    BoneOutOfRange { bone: usize, bone_count: usize },

    /// Pose or clip does not match the skeleton it is applied to.
    #[error("Bone count mismatch: expected {expected}, got {actual}")]
    BoneCountMismatch { expected: usize, actual: usize },

    /// An animation does not support a capability required by the caller.
    #[error("Animation '{animation}' does not support {capability}")]
    MissingCapability {
        animation: String,
        capability: String,
    },

    /// A crossfade needs a blender and two clips that are all different animations.
    #[error("Animation {id} appears more than once in a crossfade")]
    CrossfadeAlias { id: u32 },

    /// No running animation has the requested id.
    #[error("Animation not found: {id}")]
    AnimationNotFound { id: u32 },

    /// Stored clip could not be parsed.
    #[error("Parse error: {reason}")]
    Parse { reason: String },
}

impl AnimationError {
    /// Get error category for logging/metrics
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidDuration { .. }
            | Self::InvalidSpeed { .. }
            | Self::InvalidOffset { .. }
            | Self::InvalidWindow { .. }
            | Self::InvalidKeySize { .. }
            | Self::NotEnoughKeyData { .. }
            | Self::PartialKeyData { .. }
            | Self::UnorderedKeys { .. }
            | Self::ValueWidthMismatch { .. }
            | Self::UnsupportedChannel { .. } => "configuration",
            Self::KeyIndexOutOfRange { .. } | Self::AnimationNotFound { .. } => "lookup",
            Self::BoneOutOfRange { .. }
            | Self::BoneCountMismatch { .. }
            | Self::MissingCapability { .. }
            | Self::CrossfadeAlias { .. } => "consumer",
            Self::Parse { .. } => "data",
        }
    }
}

impl From<serde_json::Error> for AnimationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            reason: err.to_string(),
        }
    }
}
