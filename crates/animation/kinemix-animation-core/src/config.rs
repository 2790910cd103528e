//! Configuration for controllers and the engine.

use serde::{Deserialize, Serialize};

/// Repeat count applied to the repeating modes unless configured otherwise.
///
/// Two extra cycles make a ping-pong run forward, back and forward again.
pub const DEFAULT_REPEAT_COUNT: i32 = 2;

/// What happens at a cycle boundary.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Play one cycle and stop; the repeat count is ignored.
    #[default]
    Once,
    /// Restart from the beginning each cycle.
    Repeated,
    /// Alternate forward and reverse cycles.
    PingPong,
}

/// Optional controller settings, applied by `AnimationController::with_config`.
///
/// Values are validated exactly like the individual setters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControllerConfig {
    pub name: Option<String>,
    pub repeat_mode: RepeatMode,
    /// Negative = infinite, 0 = stop after the current cycle, N = N more cycles.
    pub repeat_count: i32,
    pub speed: f32,
    /// Played portion `(start, end)` of the clip, in clip seconds. `None` plays all of it.
    pub window: Option<(f32, f32)>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            name: None,
            repeat_mode: RepeatMode::Once,
            repeat_count: DEFAULT_REPEAT_COUNT,
            speed: 1.0,
            window: None,
        }
    }
}

/// Engine sizing and frame-delta policy.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Initial capacity hint for running animations.
    pub animation_capacity: usize,
    /// Maximum events to retain per tick; further events are dropped.
    pub max_events_per_tick: usize,
    /// Clamp for a single frame delta (seconds), so a hitch cannot skip cycles.
    pub max_frame_delta: Option<f32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            animation_capacity: 64,
            max_events_per_tick: 1024,
            max_frame_delta: None,
        }
    }
}
