//! The tickable animation interface shared by controllers and the pose blender.
//!
//! The engine only sees `dyn Animation`. Special behaviour (snapshotting a
//! clip, starting a crossfade) is reached through capability accessors that
//! return `None` unless the implementation supports it.

use crate::error::AnimationError;
use crate::target::{AnimationKind, ClipSampler};
use crate::Result;

/// A clip ready to be snapshotted: the sampler plus the positions of interest.
///
/// Positions are ratios of the clip (0 = first frame, 1 = last), the same
/// unit the owning controller applies. The sampler converts them to clip time.
pub struct PoseSource<'a> {
    /// Ratio currently shown by the owning controller.
    pub ratio: f32,
    /// Ratio at the start of the owning controller's playback window.
    pub start_ratio: f32,
    pub sampler: &'a mut dyn ClipSampler,
}

impl PoseSource<'_> {
    /// Clip seconds currently shown.
    pub fn time(&self) -> f32 {
        self.ratio * self.sampler.clip_duration()
    }

    /// Clip seconds at the window start.
    pub fn start_time(&self) -> f32 {
        self.start_ratio * self.sampler.clip_duration()
    }
}

/// Starts pose crossfades.
pub trait Crossfade {
    /// Snapshot `from` at its current time and `to` at its start time, then blend
    /// from the first snapshot to the second over `blend_duration` seconds.
    fn begin(
        &mut self,
        from: PoseSource<'_>,
        to: PoseSource<'_>,
        blend_duration: f32,
    ) -> Result<()>;

    fn is_active(&self) -> bool;
}

/// Anything the engine can tick once per frame.
pub trait Animation {
    /// Advance by `frame_delta` seconds. Returns whether it is still running.
    fn tick(&mut self, frame_delta: f32) -> bool;

    /// Finished animations are dropped by the engine after their tick.
    fn is_finished(&self) -> bool;

    fn kind(&self) -> AnimationKind;

    fn name(&self) -> Option<&str> {
        None
    }

    /// Completed cycles so far; used to report repeats.
    fn iteration_count(&self) -> u32 {
        0
    }

    fn pose_source(&mut self) -> Option<PoseSource<'_>> {
        None
    }

    fn as_crossfade(&mut self) -> Option<&mut dyn Crossfade> {
        None
    }
}

pub(crate) fn missing_capability(animation: Option<&str>, capability: &str) -> AnimationError {
    AnimationError::MissingCapability {
        animation: animation.unwrap_or("<unnamed>").to_string(),
        capability: capability.to_string(),
    }
}
