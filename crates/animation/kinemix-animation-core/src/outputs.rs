//! Per-tick events reported by the engine.
//!
//! Pose and property values go straight to their targets; the engine only
//! reports discrete lifecycle signals so hosts can react (chain clips, fire
//! sounds) without polling every animation.

use serde::{Deserialize, Serialize};

use crate::ids::AnimationId;

/// Discrete lifecycle signals emitted while ticking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum EngineEvent {
    AnimationStarted {
        id: AnimationId,
        name: Option<String>,
    },
    /// A cycle boundary was crossed and playback continues.
    AnimationRepeated {
        id: AnimationId,
        iteration: u32,
    },
    /// Final apply done; the animation was removed.
    AnimationFinished {
        id: AnimationId,
        name: Option<String>,
    },
    /// Removed by `Engine::stop` without a final apply.
    AnimationStopped {
        id: AnimationId,
    },
    BlendStarted {
        blender: AnimationId,
        from: AnimationId,
        to: AnimationId,
        duration: f32,
    },
    BlendEnded {
        blender: AnimationId,
    },
}

/// Events of the latest `Engine::tick`, plus those raised between ticks.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub events: Vec<EngineEvent>,
    /// Events not stored because the per-tick limit was reached.
    #[serde(default)]
    pub dropped_events: usize,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.events.clear();
        self.dropped_events = 0;
    }

    /// Store `event` unless `limit` events are already held.
    #[inline]
    pub fn push_event(&mut self, event: EngineEvent, limit: usize) {
        if self.events.len() < limit {
            self.events.push(event);
        } else {
            self.dropped_events += 1;
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
