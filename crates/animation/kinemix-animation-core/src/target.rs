//! Animation targets: what a controller drives once per tick.
//!
//! A target only has to accept a playback ratio. Skeleton-driving targets also
//! expose the [`ClipSampler`] capability so a pose blender can snapshot them;
//! the kind tag tells callers which capabilities to expect.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clip::SkeletonClip;
use crate::pose::{Pose, SharedSkeleton, Skeleton};
use crate::track::KeyframeTrack;
use crate::Result;

/// Tag describing which capabilities an animation offers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnimationKind {
    /// Drives an arbitrary property through `apply`.
    Generic,
    /// Plays a skeleton clip; can be snapshotted by a pose blender.
    SkeletonClip,
    /// Crossfades two skeleton clips.
    PoseBlend,
}

/// Receives the interpolated playback ratio each tick.
pub trait AnimationTarget {
    /// `ratio` is 0 at the start state and 1 at the stop state.
    fn apply(&mut self, ratio: f32);

    fn kind(&self) -> AnimationKind {
        AnimationKind::Generic
    }

    fn as_clip_sampler(&mut self) -> Option<&mut dyn ClipSampler> {
        None
    }
}

/// Samples a skeleton clip into a caller-owned pose.
pub trait ClipSampler {
    fn bone_count(&self) -> usize;

    fn clip_duration(&self) -> f32;

    /// Current skeleton pose, used as the base for bones the clip leaves untouched.
    fn base_pose(&self) -> Pose;

    fn sample_pose(&mut self, time: f32, pose: &mut Pose) -> Result<()>;
}

/// Plays a [`SkeletonClip`] into a shared skeleton.
pub struct SkeletonAnimation<S: Skeleton> {
    clip: SkeletonClip,
    skeleton: SharedSkeleton<S>,
}

impl<S: Skeleton> SkeletonAnimation<S> {
    pub fn new(clip: SkeletonClip, skeleton: SharedSkeleton<S>) -> Self {
        Self { clip, skeleton }
    }

    #[inline]
    pub fn clip(&self) -> &SkeletonClip {
        &self.clip
    }

    #[inline]
    pub fn skeleton(&self) -> &SharedSkeleton<S> {
        &self.skeleton
    }
}

impl<S: Skeleton> fmt::Debug for SkeletonAnimation<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkeletonAnimation")
            .field("clip", &self.clip.name())
            .finish_non_exhaustive()
    }
}

impl<S: Skeleton> AnimationTarget for SkeletonAnimation<S> {
    fn apply(&mut self, ratio: f32) {
        let time = ratio * self.clip.duration();
        let mut skeleton = self.skeleton.borrow_mut();
        if let Err(err) = self.clip.compute_pose(time, skeleton.pose_mut()) {
            log::warn!("clip '{}' not applied: {err}", self.clip.name());
            return;
        }
        skeleton.notify_pose_changed();
    }

    fn kind(&self) -> AnimationKind {
        AnimationKind::SkeletonClip
    }

    fn as_clip_sampler(&mut self) -> Option<&mut dyn ClipSampler> {
        Some(self)
    }
}

impl<S: Skeleton> ClipSampler for SkeletonAnimation<S> {
    fn bone_count(&self) -> usize {
        self.skeleton.borrow().bone_count()
    }

    fn clip_duration(&self) -> f32 {
        self.clip.duration()
    }

    fn base_pose(&self) -> Pose {
        self.skeleton.borrow().pose().clone()
    }

    fn sample_pose(&mut self, time: f32, pose: &mut Pose) -> Result<()> {
        self.clip.compute_pose(time, pose)
    }
}

/// Samples one keyframe track across its keyed range and hands the values to a sink.
///
/// Ratio 0 maps to the first key time and ratio 1 to the last.
pub struct TrackAnimation<F: FnMut(&[f32])> {
    track: KeyframeTrack,
    sink: F,
    scratch: Vec<f32>,
}

impl<F: FnMut(&[f32])> TrackAnimation<F> {
    pub fn new(track: KeyframeTrack, sink: F) -> Self {
        let scratch = vec![0.0; track.value_width()];
        Self {
            track,
            sink,
            scratch,
        }
    }

    #[inline]
    pub fn track(&self) -> &KeyframeTrack {
        &self.track
    }
}

impl<F: FnMut(&[f32])> AnimationTarget for TrackAnimation<F> {
    fn apply(&mut self, ratio: f32) {
        let time = self.track.start_time() + ratio * self.track.duration();
        self.track.sample_into(time, &mut self.scratch);
        (self.sink)(&self.scratch);
    }
}

/// Closure target receiving the raw ratio.
pub struct FnTarget<F: FnMut(f32)>(pub F);

impl<F: FnMut(f32)> AnimationTarget for FnTarget<F> {
    #[inline]
    fn apply(&mut self, ratio: f32) {
        (self.0)(ratio)
    }
}
