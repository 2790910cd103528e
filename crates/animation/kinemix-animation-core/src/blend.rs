//! Skeletal crossfade between two clips.
//!
//! At `begin` the blender freezes two reference poses: the outgoing clip at
//! its current playback time and the incoming clip at its start time. Each
//! tick it rebuilds a two-key track per bone channel (key 0 = outgoing,
//! key 1 = incoming, at times 0 and the blend duration), samples it at the
//! blend-local time and swaps the result into the skeleton.

use std::fmt;
use std::mem;

use serde::{Deserialize, Serialize};

use crate::animation::{Animation, Crossfade, PoseSource};
use crate::error::AnimationError;
use crate::interp::ChannelKind;
use crate::pose::{Pose, SharedSkeleton, Skeleton};
use crate::target::AnimationKind;
use crate::track::KeyframeTrack;
use crate::Result;

/// Which update of the current transition was just written.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendPhase {
    /// First update after `begin`.
    First,
    Middle,
    /// Update that reached the blend duration; the session ends with it.
    Last,
}

/// Two-key tracks reused for every bone.
#[derive(Clone, Debug)]
struct BlendTracks {
    position: KeyframeTrack,
    rotation: KeyframeTrack,
    scale: KeyframeTrack,
}

impl BlendTracks {
    fn new() -> Result<Self> {
        Ok(Self {
            position: KeyframeTrack::with_num_keys(2, 4, ChannelKind::Linear)?,
            rotation: KeyframeTrack::with_num_keys(2, 5, ChannelKind::Spherical)?,
            scale: KeyframeTrack::with_num_keys(2, 4, ChannelKind::Linear)?,
        })
    }
}

/// Crossfades two skeleton clips into one shared skeleton.
pub struct PoseBlender<S: Skeleton> {
    skeleton: SharedSkeleton<S>,
    snapshot_a: Pose,
    snapshot_b: Pose,
    working: Pose,
    blend_duration: f32,
    blend_elapsed: f32,
    active: bool,
    phase: Option<BlendPhase>,
    tracks: BlendTracks,
}

impl<S: Skeleton> PoseBlender<S> {
    pub fn new(skeleton: SharedSkeleton<S>) -> Result<Self> {
        let bone_count = skeleton.borrow().bone_count();
        Ok(Self {
            skeleton,
            snapshot_a: Pose::new(bone_count),
            snapshot_b: Pose::new(bone_count),
            working: Pose::new(bone_count),
            blend_duration: 0.0,
            blend_elapsed: 0.0,
            active: false,
            phase: None,
            tracks: BlendTracks::new()?,
        })
    }

    /// Start a crossfade over `blend_duration` seconds.
    ///
    /// Both clips must match the skeleton's bone count. If a blend is already
    /// running, the outgoing snapshot is the pose it currently shows, so
    /// back-to-back transitions stay continuous. A duration of zero or less
    /// cuts straight to the incoming snapshot on the next tick.
    pub fn begin(
        &mut self,
        from: PoseSource<'_>,
        to: PoseSource<'_>,
        blend_duration: f32,
    ) -> Result<()> {
        let bone_count = self.skeleton.borrow().bone_count();
        for sampler in [&*from.sampler, &*to.sampler] {
            if sampler.bone_count() != bone_count {
                return Err(AnimationError::BoneCountMismatch {
                    expected: bone_count,
                    actual: sampler.bone_count(),
                });
            }
        }
        let (from_time, to_time) = (from.time(), to.start_time());
        if self.active && self.snapshot_a.bone_count() == bone_count {
            let mut current = Pose::new(bone_count);
            self.evaluate(self.blend_elapsed, &mut current);
            self.snapshot_a = current;
        } else {
            self.snapshot_a = from.sampler.base_pose();
            from.sampler.sample_pose(from_time, &mut self.snapshot_a)?;
        }
        self.snapshot_b = to.sampler.base_pose();
        to.sampler.sample_pose(to_time, &mut self.snapshot_b)?;
        if self.working.bone_count() != bone_count {
            self.working = Pose::new(bone_count);
        }

        log::debug!(
            "blend begin: {:.3}s over {bone_count} bones (from t={:.3}, to t={:.3}, restart={})",
            blend_duration,
            from_time,
            to_time,
            self.active
        );
        self.blend_duration = if blend_duration.is_finite() {
            blend_duration
        } else {
            0.0
        };
        self.blend_elapsed = 0.0;
        self.active = true;
        self.phase = None;
        Ok(())
    }

    /// Advance the blend by `frame_delta` and push the blended pose to the
    /// skeleton. Returns whether the blend is still active.
    pub fn tick(&mut self, frame_delta: f32) -> bool {
        if !self.active {
            return false;
        }
        let frame_delta = if frame_delta.is_finite() && frame_delta > 0.0 {
            frame_delta
        } else {
            0.0
        };
        let first = self.phase.is_none();
        let done = if self.blend_duration <= 0.0 {
            self.working.copy_from(&self.snapshot_b);
            true
        } else {
            self.blend_elapsed = (self.blend_elapsed + frame_delta).min(self.blend_duration);
            let mut working = mem::take(&mut self.working);
            self.evaluate(self.blend_elapsed, &mut working);
            self.working = working;
            self.blend_elapsed >= self.blend_duration
        };
        self.phase = Some(match (first, done) {
            (_, true) => BlendPhase::Last,
            (true, false) => BlendPhase::First,
            (false, false) => BlendPhase::Middle,
        });

        {
            let mut skeleton = self.skeleton.borrow_mut();
            mem::swap(skeleton.pose_mut(), &mut self.working);
            skeleton.notify_pose_changed();
        }

        if done {
            self.active = false;
            log::debug!("blend end after {:.3}s", self.blend_elapsed);
        }
        !done
    }

    /// Blended pose at blend-local `time` into `out` (resized to the skeleton).
    pub fn evaluate(&mut self, time: f32, out: &mut Pose) {
        let bone_count = self.snapshot_a.bone_count();
        if out.bone_count() != bone_count {
            *out = Pose::new(bone_count);
        }
        let duration = self.blend_duration.max(0.0);
        let tracks = &mut self.tracks;
        let a = self.snapshot_a.bones();
        let b = self.snapshot_b.bones();
        for (bone, dest) in out.bones_mut().iter_mut().enumerate() {
            let (a, b) = (&a[bone], &b[bone]);
            if duration <= 0.0 {
                *dest = *b;
                continue;
            }
            sample_pair(&mut tracks.position, &a.position, &b.position, duration, time, &mut dest.position);
            sample_pair(&mut tracks.rotation, &a.rotation, &b.rotation, duration, time, &mut dest.rotation);
            sample_pair(&mut tracks.scale, &a.scale, &b.scale, duration, time, &mut dest.scale);
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn blend_duration(&self) -> f32 {
        self.blend_duration
    }

    #[inline]
    pub fn blend_elapsed(&self) -> f32 {
        self.blend_elapsed
    }

    /// Phase of the latest update, `None` before the first tick of a session.
    #[inline]
    pub fn phase(&self) -> Option<BlendPhase> {
        self.phase
    }

    /// Weight of the outgoing snapshot: 1 at blend start, 0 at the end.
    pub fn weight_a(&self) -> f32 {
        if self.blend_duration <= 0.0 {
            0.0
        } else {
            (self.blend_duration - self.blend_elapsed) / self.blend_duration
        }
    }

    #[inline]
    pub fn snapshot_a(&self) -> &Pose {
        &self.snapshot_a
    }

    #[inline]
    pub fn snapshot_b(&self) -> &Pose {
        &self.snapshot_b
    }

    #[inline]
    pub fn skeleton(&self) -> &SharedSkeleton<S> {
        &self.skeleton
    }
}

/// Rewrite a two-key track to `a -> b` over `[0, duration]` and sample it.
fn sample_pair(
    track: &mut KeyframeTrack,
    a: &[f32],
    b: &[f32],
    duration: f32,
    time: f32,
    dest: &mut [f32],
) {
    let written = track
        .set_key(1, duration, b)
        .and_then(|_| track.set_key(0, 0.0, a));
    if let Err(err) = written {
        log::warn!("blend track rejected keys: {err}");
        dest.copy_from_slice(b);
        return;
    }
    track.sample_into(time, dest);
}

impl<S: Skeleton> fmt::Debug for PoseBlender<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoseBlender")
            .field("bone_count", &self.snapshot_a.bone_count())
            .field("blend_duration", &self.blend_duration)
            .field("blend_elapsed", &self.blend_elapsed)
            .field("active", &self.active)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl<S: Skeleton> Crossfade for PoseBlender<S> {
    fn begin(
        &mut self,
        from: PoseSource<'_>,
        to: PoseSource<'_>,
        blend_duration: f32,
    ) -> Result<()> {
        PoseBlender::begin(self, from, to, blend_duration)
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl<S: Skeleton> Animation for PoseBlender<S> {
    fn tick(&mut self, frame_delta: f32) -> bool {
        PoseBlender::tick(self, frame_delta)
    }

    /// A blender stays registered between sessions.
    fn is_finished(&self) -> bool {
        false
    }

    fn kind(&self) -> AnimationKind {
        AnimationKind::PoseBlend
    }

    fn as_crossfade(&mut self) -> Option<&mut dyn Crossfade> {
        Some(self)
    }
}
