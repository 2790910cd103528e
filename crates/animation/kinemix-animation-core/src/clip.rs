//! Skeleton clips: per-bone position/rotation/scale tracks with a fixed duration.
//!
//! Bones without a channel (or a channel missing one of its tracks) keep
//! whatever the destination pose already holds for that component, so a clip
//! can be layered over a bind pose.

use serde::{Deserialize, Serialize};

use crate::error::AnimationError;
use crate::interp::ChannelKind;
use crate::pose::Pose;
use crate::track::KeyframeTrack;
use crate::Result;

/// Tracks animating one bone.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BoneChannel {
    pub bone: usize,
    #[serde(default)]
    pub position: Option<KeyframeTrack>,
    #[serde(default)]
    pub rotation: Option<KeyframeTrack>,
    #[serde(default)]
    pub scale: Option<KeyframeTrack>,
}

impl BoneChannel {
    pub fn new(bone: usize) -> Self {
        Self {
            bone,
            position: None,
            rotation: None,
            scale: None,
        }
    }

    pub fn with_position(mut self, track: KeyframeTrack) -> Self {
        self.position = Some(track);
        self
    }

    pub fn with_rotation(mut self, track: KeyframeTrack) -> Self {
        self.rotation = Some(track);
        self
    }

    pub fn with_scale(mut self, track: KeyframeTrack) -> Self {
        self.scale = Some(track);
        self
    }

    fn validate(&self) -> Result<()> {
        let expect = |track: &Option<KeyframeTrack>, kind: ChannelKind, width: usize| {
            match track {
                Some(t) if t.kind() != kind || t.value_width() != width => {
                    Err(AnimationError::UnsupportedChannel {
                        kind: t.kind(),
                        value_width: t.value_width(),
                    })
                }
                _ => Ok(()),
            }
        };
        expect(&self.position, ChannelKind::Linear, 3)?;
        expect(&self.rotation, ChannelKind::Spherical, 4)?;
        expect(&self.scale, ChannelKind::Linear, 3)
    }
}

/// Serialized clip layout (see `fixtures/clips/*.json`).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkeletonClipData {
    pub name: String,
    /// Seconds.
    pub duration: f32,
    pub bone_count: usize,
    pub channels: Vec<BoneChannel>,
}

/// A complete skeletal animation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "SkeletonClipData", into = "SkeletonClipData")]
pub struct SkeletonClip {
    name: String,
    duration: f32,
    bone_count: usize,
    channels: Vec<BoneChannel>,
}

impl SkeletonClip {
    pub fn new(
        name: impl Into<String>,
        duration: f32,
        bone_count: usize,
        channels: Vec<BoneChannel>,
    ) -> Result<Self> {
        if !(duration.is_finite() && duration > 0.0) {
            return Err(AnimationError::InvalidDuration { duration });
        }
        for channel in &channels {
            if channel.bone >= bone_count {
                return Err(AnimationError::BoneOutOfRange {
                    bone: channel.bone,
                    bone_count,
                });
            }
            channel.validate()?;
        }
        Ok(Self {
            name: name.into(),
            duration,
            bone_count,
            channels,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    #[inline]
    pub fn bone_count(&self) -> usize {
        self.bone_count
    }

    #[inline]
    pub fn channels(&self) -> &[BoneChannel] {
        &self.channels
    }

    /// Sample every channel at clip time `time` into `pose`.
    ///
    /// `pose` must have exactly [`bone_count`](Self::bone_count) bones.
    pub fn compute_pose(&mut self, time: f32, pose: &mut Pose) -> Result<()> {
        if pose.bone_count() != self.bone_count {
            return Err(AnimationError::BoneCountMismatch {
                expected: self.bone_count,
                actual: pose.bone_count(),
            });
        }
        let bones = pose.bones_mut();
        for channel in &mut self.channels {
            let out = &mut bones[channel.bone];
            if let Some(track) = channel.position.as_mut() {
                track.sample_into(time, &mut out.position);
            }
            if let Some(track) = channel.rotation.as_mut() {
                track.sample_into(time, &mut out.rotation);
            }
            if let Some(track) = channel.scale.as_mut() {
                track.sample_into(time, &mut out.scale);
            }
        }
        Ok(())
    }
}

impl TryFrom<SkeletonClipData> for SkeletonClip {
    type Error = AnimationError;

    fn try_from(data: SkeletonClipData) -> Result<Self> {
        Self::new(data.name, data.duration, data.bone_count, data.channels)
    }
}

impl From<SkeletonClip> for SkeletonClipData {
    fn from(clip: SkeletonClip) -> Self {
        SkeletonClipData {
            name: clip.name,
            duration: clip.duration,
            bone_count: clip.bone_count,
            channels: clip.channels,
        }
    }
}

/// Parse a stored skeleton clip from JSON, validating tracks and bone indices.
pub fn parse_skeleton_clip_json(s: &str) -> Result<SkeletonClip> {
    let clip: SkeletonClip = serde_json::from_str(s)?;
    log::debug!(
        "parsed clip '{}' ({} channels, {:.3}s)",
        clip.name,
        clip.channels.len(),
        clip.duration
    );
    Ok(clip)
}
