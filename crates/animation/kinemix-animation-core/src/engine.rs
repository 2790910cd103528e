//! Engine: owns running animations and ticks them once per frame.
//!
//! Methods:
//! - new, start, stop, get/get_mut, crossfade, tick
//!
//! Clip controllers are ticked before pose blenders so a blender always reads
//! (and overwrites) the pose its producers wrote in the same frame. Within each
//! group the order is start order.

use std::mem;

use crate::animation::{missing_capability, Animation, PoseSource};
use crate::config::Config;
use crate::error::AnimationError;
use crate::ids::{AnimationId, IdAllocator};
use crate::outputs::{EngineEvent, Outputs};
use crate::target::AnimationKind;
use crate::Result;

struct Slot {
    id: AnimationId,
    kind: AnimationKind,
    animation: Box<dyn Animation>,
    /// Iteration count seen after the previous tick.
    last_iteration: u32,
    blend_active: bool,
}

/// Driver for a set of animations sharing one frame clock.
pub struct Engine {
    cfg: Config,
    ids: IdAllocator,
    slots: Vec<Slot>,
    /// Events raised by start/stop/crossfade since the last tick.
    pending: Outputs,
    outputs: Outputs,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("cfg", &self.cfg)
            .field("running", &self.slots.len())
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Engine {
    pub fn new(cfg: Config) -> Self {
        let slots = Vec::with_capacity(cfg.animation_capacity);
        Self {
            cfg,
            ids: IdAllocator::new(),
            slots,
            pending: Outputs::default(),
            outputs: Outputs::default(),
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Register `animation`; it is ticked from the next [`tick`](Self::tick) on.
    pub fn start(&mut self, animation: impl Animation + 'static) -> AnimationId {
        self.start_boxed(Box::new(animation))
    }

    pub fn start_boxed(&mut self, animation: Box<dyn Animation>) -> AnimationId {
        let id = self.ids.alloc();
        let kind = animation.kind();
        let name = animation.name().map(str::to_owned);
        log::debug!("start {:?} ({kind:?}, {})", id, name.as_deref().unwrap_or("unnamed"));
        self.pending.push_event(
            EngineEvent::AnimationStarted { id, name },
            self.cfg.max_events_per_tick,
        );
        self.slots.push(Slot {
            id,
            kind,
            last_iteration: animation.iteration_count(),
            blend_active: false,
            animation,
        });
        id
    }

    /// Remove an animation immediately; no final apply and no finish callback.
    pub fn stop(&mut self, id: AnimationId) -> Result<Box<dyn Animation>> {
        let index = self.index_of(id)?;
        let slot = self.slots.remove(index);
        log::debug!("stop {:?}", id);
        self.pending
            .push_event(EngineEvent::AnimationStopped { id }, self.cfg.max_events_per_tick);
        Ok(slot.animation)
    }

    pub fn get(&self, id: AnimationId) -> Option<&dyn Animation> {
        let slot = self.slots.iter().find(|s| s.id == id)?;
        Some(slot.animation.as_ref())
    }

    pub fn get_mut(&mut self, id: AnimationId) -> Option<&mut dyn Animation> {
        let slot = self.slots.iter_mut().find(|s| s.id == id)?;
        Some(slot.animation.as_mut())
    }

    #[inline]
    pub fn contains(&self, id: AnimationId) -> bool {
        self.slots.iter().any(|s| s.id == id)
    }

    /// Ids of running animations in start order.
    pub fn ids(&self) -> impl Iterator<Item = AnimationId> + '_ {
        self.slots.iter().map(|s| s.id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Start a crossfade on `blender` from the clip played by `from` to the
    /// clip played by `to`.
    ///
    /// `blender` must be a pose blend and both sources must be skeleton clips.
    /// Ending the outgoing controller is left to the caller.
    pub fn crossfade(
        &mut self,
        blender: AnimationId,
        from: AnimationId,
        to: AnimationId,
        blend_duration: f32,
    ) -> Result<()> {
        for id in [from, to] {
            if id == blender {
                return Err(AnimationError::CrossfadeAlias { id: id.0 });
            }
        }
        if from == to {
            return Err(AnimationError::CrossfadeAlias { id: from.0 });
        }
        let bi = self.index_of(blender)?;
        let fi = self.index_of(from)?;
        let ti = self.index_of(to)?;
        let Some([b, f, t]) = disjoint_mut(&mut self.slots, [bi, fi, ti]) else {
            return Err(AnimationError::CrossfadeAlias { id: blender.0 });
        };

        let blender_name = b.animation.name().map(str::to_owned);
        let fade = match b.kind {
            AnimationKind::PoseBlend => b.animation.as_crossfade(),
            _ => None,
        };
        let Some(fade) = fade else {
            return Err(missing_capability(blender_name.as_deref(), "crossfade"));
        };
        let from_source = pose_source_of(f)?;
        let to_source = pose_source_of(t)?;
        fade.begin(from_source, to_source, blend_duration)?;
        b.blend_active = true;

        self.pending.push_event(
            EngineEvent::BlendStarted {
                blender,
                from,
                to,
                duration: blend_duration,
            },
            self.cfg.max_events_per_tick,
        );
        Ok(())
    }

    /// Advance every animation by `frame_delta` seconds and drop the finished ones.
    ///
    /// The returned outputs hold this tick's events plus any raised by
    /// start/stop/crossfade since the previous tick.
    pub fn tick(&mut self, frame_delta: f32) -> &Outputs {
        mem::swap(&mut self.outputs, &mut self.pending);
        self.pending.clear();

        let frame_delta = match self.cfg.max_frame_delta {
            Some(max) if frame_delta > max => {
                log::trace!("frame delta {frame_delta} clamped to {max}");
                max
            }
            _ => frame_delta,
        };
        let limit = self.cfg.max_events_per_tick;

        for blenders in [false, true] {
            for slot in self
                .slots
                .iter_mut()
                .filter(|s| (s.kind == AnimationKind::PoseBlend) == blenders)
            {
                tick_slot(slot, frame_delta, &mut self.outputs, limit);
            }
        }

        self.slots.retain(|slot| {
            let finished = slot.animation.is_finished();
            if finished {
                log::debug!("finished {:?}", slot.id);
            }
            !finished
        });
        &self.outputs
    }

    /// Outputs of the latest tick.
    #[inline]
    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    fn index_of(&self, id: AnimationId) -> Result<usize> {
        self.slots
            .iter()
            .position(|s| s.id == id)
            .ok_or(AnimationError::AnimationNotFound { id: id.0 })
    }
}

fn tick_slot(slot: &mut Slot, frame_delta: f32, outputs: &mut Outputs, limit: usize) {
    let id = slot.id;
    let running = slot.animation.tick(frame_delta);

    let iteration = slot.animation.iteration_count();
    if running && iteration != slot.last_iteration {
        outputs.push_event(EngineEvent::AnimationRepeated { id, iteration }, limit);
    }
    slot.last_iteration = iteration;

    if slot.blend_active {
        let still_blending = slot
            .animation
            .as_crossfade()
            .is_some_and(|fade| fade.is_active());
        if !still_blending {
            slot.blend_active = false;
            outputs.push_event(EngineEvent::BlendEnded { blender: id }, limit);
        }
    }

    if slot.animation.is_finished() {
        let name = slot.animation.name().map(str::to_owned);
        outputs.push_event(EngineEvent::AnimationFinished { id, name }, limit);
    }
}

fn pose_source_of(slot: &mut Slot) -> Result<PoseSource<'_>> {
    let name = slot.animation.name().map(str::to_owned);
    if slot.kind != AnimationKind::SkeletonClip {
        return Err(missing_capability(name.as_deref(), "pose snapshots"));
    }
    slot.animation
        .pose_source()
        .ok_or_else(|| missing_capability(name.as_deref(), "pose snapshots"))
}

/// Mutable references to three distinct slice elements.
fn disjoint_mut<T>(items: &mut [T], indices: [usize; 3]) -> Option<[&mut T; 3]> {
    let mut found: [Option<&mut T>; 3] = [None, None, None];
    for (i, item) in items.iter_mut().enumerate() {
        if let Some(pos) = indices.iter().position(|&want| want == i) {
            found[pos] = Some(item);
        }
    }
    let [Some(a), Some(b), Some(c)] = found else {
        return None;
    };
    Some([a, b, c])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disjoint_mut_rejects_repeats() {
        let mut v = vec![1, 2, 3, 4];
        let [a, b, c] = disjoint_mut(&mut v, [3, 0, 2]).unwrap();
        *a += 10;
        *b += 10;
        *c += 10;
        assert_eq!(v, vec![11, 2, 13, 14]);
        assert!(disjoint_mut(&mut v, [1, 1, 2]).is_none());
        assert!(disjoint_mut(&mut v, [0, 1, 9]).is_none());
    }
}
