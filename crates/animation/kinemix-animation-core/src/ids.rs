//! Handles for animations registered with the engine.

use serde::{Deserialize, Serialize};

/// Opaque handle returned by `Engine::start`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnimationId(pub u32);

/// Monotonic allocator; ids are never reused within one engine.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc(&mut self) -> AnimationId {
        let id = AnimationId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}
