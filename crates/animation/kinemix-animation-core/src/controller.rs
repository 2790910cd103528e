//! Playback state machine: elapsed time, repeat handling and the per-tick apply.
//!
//! A controller is created with a target and a clip duration, optionally
//! configured (repeat mode/count, speed, playback window, interpolator,
//! callbacks) and then ticked once per frame. Each tick makes exactly one
//! `apply` call on the target until the controller finishes.
//!
//! Configuration is meant to happen before the first tick; changing it while
//! running is allowed but its effect on the current cycle is unspecified.
//! The one supported mid-run change is `set_repeat_count(0)`, which stops
//! cleanly at the next cycle boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::animation::{Animation, PoseSource};
use crate::config::{ControllerConfig, RepeatMode, DEFAULT_REPEAT_COUNT};
use crate::error::AnimationError;
use crate::interp::{BoxedInterpolator, Interpolator};
use crate::target::{AnimationKind, AnimationTarget};
use crate::Result;

/// Lifecycle of a controller.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControllerState {
    /// Constructed or reset, not ticked yet.
    Idle,
    Running,
    /// Terminal; further ticks are no-ops.
    Finished,
}

type FinishCallback = Box<dyn FnMut()>;
type RepeatCallback = Box<dyn FnMut(u32) -> bool>;

/// Drives one target through time.
pub struct AnimationController<T: AnimationTarget> {
    target: T,
    name: Option<String>,

    clip_duration: f32,
    window_start: f32,
    window_end: f32,
    repeat_mode: RepeatMode,
    repeat_count: i32,
    configured_repeat_count: i32,
    speed: f32,
    interpolator: Option<BoxedInterpolator>,
    on_finish: Option<FinishCallback>,
    on_repeat: Option<RepeatCallback>,

    elapsed_time: f32,
    iteration_count: u32,
    state: ControllerState,
    last_ratio: Option<f32>,
}

impl<T: AnimationTarget> AnimationController<T> {
    /// Create a controller playing `duration` seconds of `target`.
    pub fn new(target: T, duration: f32) -> Result<Self> {
        if !(duration.is_finite() && duration > 0.0) {
            return Err(AnimationError::InvalidDuration { duration });
        }
        Ok(Self {
            target,
            name: None,
            clip_duration: duration,
            window_start: 0.0,
            window_end: duration,
            repeat_mode: RepeatMode::Once,
            repeat_count: DEFAULT_REPEAT_COUNT,
            configured_repeat_count: DEFAULT_REPEAT_COUNT,
            speed: 1.0,
            interpolator: None,
            on_finish: None,
            on_repeat: None,
            elapsed_time: 0.0,
            iteration_count: 0,
            state: ControllerState::Idle,
            last_ratio: None,
        })
    }

    /// Create and configure in one step.
    pub fn with_config(target: T, duration: f32, cfg: &ControllerConfig) -> Result<Self> {
        let mut controller = Self::new(target, duration)?;
        controller
            .set_repeat_mode(cfg.repeat_mode)
            .set_repeat_count(cfg.repeat_count)
            .set_speed(cfg.speed)?;
        if let Some((start, end)) = cfg.window {
            controller.set_window(start, end)?;
        }
        if let Some(name) = &cfg.name {
            controller.set_name(name.clone());
        }
        Ok(controller)
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) -> &mut Self {
        self.repeat_mode = mode;
        self
    }

    /// Negative repeats forever, 0 stops at the end of the current cycle,
    /// N plays N more cycles. Ignored in [`RepeatMode::Once`].
    pub fn set_repeat_count(&mut self, count: i32) -> &mut Self {
        self.repeat_count = count;
        self.configured_repeat_count = count;
        self
    }

    pub fn set_speed(&mut self, speed: f32) -> Result<&mut Self> {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(AnimationError::InvalidSpeed { speed });
        }
        self.speed = speed;
        Ok(self)
    }

    /// Start playback `offset` seconds into the clip; the cycle becomes
    /// `duration - offset` long.
    ///
    /// Accepts `[0, duration)`: an offset equal to the duration would leave a
    /// zero-length cycle, so it is rejected as [`AnimationError::InvalidOffset`].
    pub fn set_offset(&mut self, offset: f32) -> Result<&mut Self> {
        if !(offset >= 0.0 && offset < self.clip_duration) {
            return Err(AnimationError::InvalidOffset {
                offset,
                duration: self.clip_duration,
            });
        }
        self.window_start = offset;
        self.window_end = self.clip_duration;
        Ok(self)
    }

    /// Play only `[start, end]` of the clip.
    pub fn set_window(&mut self, start: f32, end: f32) -> Result<&mut Self> {
        if !(start >= 0.0 && start < end && end <= self.clip_duration) {
            return Err(AnimationError::InvalidWindow {
                start,
                end,
                duration: self.clip_duration,
            });
        }
        self.window_start = start;
        self.window_end = end;
        Ok(self)
    }

    pub fn set_interpolator(&mut self, interpolator: impl Interpolator + 'static) -> &mut Self {
        self.interpolator = Some(BoxedInterpolator(Box::new(interpolator)));
        self
    }

    pub fn clear_interpolator(&mut self) -> &mut Self {
        self.interpolator = None;
        self
    }

    /// Called once, right after the final apply.
    pub fn set_on_finish(&mut self, callback: impl FnMut() + 'static) -> &mut Self {
        self.on_finish = Some(Box::new(callback));
        self
    }

    /// Called at each cycle boundary of an infinite run with the iteration
    /// count; returning `false` stops the animation. Registering it makes the
    /// run infinite (repeat count -1).
    pub fn set_on_repeat(&mut self, callback: impl FnMut(u32) -> bool + 'static) -> &mut Self {
        self.on_repeat = Some(Box::new(callback));
        self.set_repeat_count(-1)
    }

    /// Advance playback by `frame_delta` seconds of wall time.
    ///
    /// Returns whether the controller is still running. Negative or non-finite
    /// deltas are treated as zero. A delta spanning several cycles counts as a
    /// single cycle boundary.
    pub fn tick(&mut self, frame_delta: f32) -> bool {
        if self.state == ControllerState::Finished {
            return false;
        }
        let frame_delta = if frame_delta.is_finite() && frame_delta >= 0.0 {
            frame_delta
        } else {
            log::warn!(
                "{}: ignoring frame delta {frame_delta}",
                self.display_name()
            );
            0.0
        };
        self.state = ControllerState::Running;

        let cycle = self.cycle_duration();
        let previous_cycle = (self.elapsed_time / cycle).floor();
        self.elapsed_time += frame_delta * self.speed;
        let current_cycle = (self.elapsed_time / cycle).floor();
        let cycle_time = self.elapsed_time % cycle;
        let cycled = current_cycle != previous_cycle;

        let mut still_running = !cycled;
        if cycled && self.repeat_mode != RepeatMode::Once {
            self.iteration_count += 1;
            log::trace!(
                "{}: cycle {} complete",
                self.display_name(),
                self.iteration_count
            );
            still_running = match self.repeat_count {
                0 => false,
                n if n > 0 => {
                    self.repeat_count -= 1;
                    true
                }
                _ => match self.on_repeat.as_mut() {
                    Some(on_repeat) => on_repeat(self.iteration_count),
                    None => true,
                },
            };
        }

        if still_running {
            let progress = cycle_time / cycle;
            let reverse = self.repeat_mode == RepeatMode::PingPong && self.iteration_count % 2 == 1;
            let progress = if reverse { 1.0 - progress } else { progress };
            self.apply_progress(progress);
        } else {
            self.apply_progress(1.0);
            self.state = ControllerState::Finished;
            log::debug!(
                "{}: finished after {:.3}s ({} iterations)",
                self.display_name(),
                self.elapsed_time,
                self.iteration_count
            );
            if let Some(on_finish) = self.on_finish.as_mut() {
                on_finish();
            }
        }
        still_running
    }

    /// Back to `Idle` at time zero with the configured repeat count restored.
    pub fn reset(&mut self) {
        self.elapsed_time = 0.0;
        self.iteration_count = 0;
        self.repeat_count = self.configured_repeat_count;
        self.state = ControllerState::Idle;
        self.last_ratio = None;
    }

    /// Map cycle progress in `[0, 1]` through the interpolator to a clip ratio.
    fn ratio_for(&self, progress: f32) -> f32 {
        let eased = match &self.interpolator {
            Some(BoxedInterpolator(interp)) => interp.map_ratio(progress),
            None => progress,
        };
        (self.window_start + eased * self.cycle_duration()) / self.clip_duration
    }

    fn apply_progress(&mut self, progress: f32) {
        let ratio = self.ratio_for(progress);
        self.last_ratio = Some(ratio);
        self.target.apply(ratio);
    }

    fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("animation")
    }

    #[inline]
    pub fn state(&self) -> ControllerState {
        self.state
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.state == ControllerState::Finished
    }

    /// Scaled time accumulated since start (or reset); spans all cycles.
    #[inline]
    pub fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    #[inline]
    pub fn iteration_count(&self) -> u32 {
        self.iteration_count
    }

    /// Remaining repeat count (decrements as cycles complete).
    #[inline]
    pub fn repeat_count(&self) -> i32 {
        self.repeat_count
    }

    #[inline]
    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    #[inline]
    pub fn offset(&self) -> f32 {
        self.window_start
    }

    #[inline]
    pub fn window(&self) -> (f32, f32) {
        (self.window_start, self.window_end)
    }

    /// Duration passed at construction.
    #[inline]
    pub fn duration(&self) -> f32 {
        self.clip_duration
    }

    /// Length of one cycle: the playback window length.
    #[inline]
    pub fn cycle_duration(&self) -> f32 {
        self.window_end - self.window_start
    }

    /// Ratio handed to the target by the latest apply.
    #[inline]
    pub fn last_ratio(&self) -> Option<f32> {
        self.last_ratio
    }

    /// Controller time currently shown: the latest applied ratio in controller
    /// seconds, or the window start before the first tick. Matches the clip's
    /// own time only when the controller duration equals the clip duration.
    pub fn playback_time(&self) -> f32 {
        self.last_ratio
            .map_or(self.window_start, |r| r * self.clip_duration)
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn target(&self) -> &T {
        &self.target
    }

    #[inline]
    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }
}

impl<T: AnimationTarget> fmt::Debug for AnimationController<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationController")
            .field("kind", &self.target.kind())
            .field("name", &self.name)
            .field("duration", &self.clip_duration)
            .field("window", &(self.window_start, self.window_end))
            .field("repeat_mode", &self.repeat_mode)
            .field("repeat_count", &self.repeat_count)
            .field("speed", &self.speed)
            .field("interpolator", &self.interpolator)
            .field("elapsed_time", &self.elapsed_time)
            .field("iteration_count", &self.iteration_count)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<T: AnimationTarget> Animation for AnimationController<T> {
    fn tick(&mut self, frame_delta: f32) -> bool {
        AnimationController::tick(self, frame_delta)
    }

    fn is_finished(&self) -> bool {
        AnimationController::is_finished(self)
    }

    fn kind(&self) -> AnimationKind {
        self.target.kind()
    }

    fn name(&self) -> Option<&str> {
        AnimationController::name(self)
    }

    fn iteration_count(&self) -> u32 {
        self.iteration_count
    }

    fn pose_source(&mut self) -> Option<PoseSource<'_>> {
        let start_ratio = self.window_start / self.clip_duration;
        let ratio = self.last_ratio.unwrap_or(start_ratio);
        self.target.as_clip_sampler().map(|sampler| PoseSource {
            ratio,
            start_ratio,
            sampler,
        })
    }
}
