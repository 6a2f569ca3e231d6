//! Animation tick engine
//!
//! The engine owns every [`AnimatedObject`], the animation subset and the
//! tick counter. Each call to [`AnimationEngine::tick`] advances the shared
//! frame cursor once and produces exactly one patch per live object in the
//! subset.
//!
//! Cursor convention: the cursor for a tick is `tick_count mod 6` taken
//! before the counter is incremented. The counter starts at 0, so the first
//! tick shows fan frame 0 and a lit blink.

use std::collections::{HashMap, HashSet};
use tracing::trace;

use crate::patch::{PatchBatch, ViewablePatch};
use crate::renderer::ViewableRenderer;
use crate::style::{Color, SpriteAssets, FRAME_CYCLE};
use crate::viewable::{AnimatedObject, BehaviorClass, ViewableId};

/// Summary of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// 1-based number of the tick just run
    pub tick: u64,
    /// Frame cursor used by the tick
    pub cursor: usize,
    /// Patches emitted
    pub patched: usize,
    /// Subset ids that named no live object
    pub skipped: usize,
}

pub struct AnimationEngine {
    objects: Vec<AnimatedObject>,
    index: HashMap<ViewableId, usize>,
    subset: Vec<ViewableId>,
    frames: Vec<String>,
    tick_count: u64,
}

impl AnimationEngine {
    /// Create an engine over `objects`, animating only the ids in `subset`
    ///
    /// Repeated subset ids are collapsed so every object is patched at most
    /// once per tick.
    pub fn new(objects: Vec<AnimatedObject>, subset: Vec<ViewableId>, assets: &SpriteAssets) -> Self {
        let index = objects
            .iter()
            .enumerate()
            .map(|(i, object)| (object.id, i))
            .collect();

        let mut seen = HashSet::with_capacity(subset.len());
        let subset = subset.into_iter().filter(|id| seen.insert(*id)).collect();

        Self {
            objects,
            index,
            subset,
            frames: assets.fan_frames().to_vec(),
            tick_count: 0,
        }
    }

    /// Number of ticks run so far
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn objects(&self) -> &[AnimatedObject] {
        &self.objects
    }

    pub fn subset(&self) -> &[ViewableId] {
        &self.subset
    }

    pub fn object(&self, id: ViewableId) -> Option<&AnimatedObject> {
        self.index.get(&id).map(|&i| &self.objects[i])
    }

    /// Advance one tick and return the patches for the animated subset
    pub fn tick(&mut self) -> PatchBatch {
        let cursor = (self.tick_count % FRAME_CYCLE as u64) as usize;
        self.tick_count += 1;

        let blink_on = if cursor < FRAME_CYCLE / 2 { 1.0 } else { 0.0 };
        let mut patches = Vec::with_capacity(self.subset.len());

        for id in &self.subset {
            let Some(&i) = self.index.get(id) else {
                trace!(viewable = %id, "Skipping unknown viewable");
                continue;
            };
            let object = &mut self.objects[i];
            let patch = match object.behavior {
                BehaviorClass::FanFrame => ViewablePatch::Url(self.frames[cursor].clone()),
                BehaviorClass::Blink => ViewablePatch::Color(Color::new(1.0, blink_on, blink_on)),
                BehaviorClass::Oscillate => ViewablePatch::Position(object.step_oscillation()),
            };
            patches.push((*id, patch));
        }

        patches
    }

    /// Run one tick and hand its patches to the renderer
    pub fn tick_into(&mut self, renderer: &dyn ViewableRenderer) -> TickReport {
        let cursor = (self.tick_count % FRAME_CYCLE as u64) as usize;
        let patches = self.tick();
        renderer.invalidate_viewables(&patches);

        let report = TickReport {
            tick: self.tick_count,
            cursor,
            patched: patches.len(),
            skipped: self.subset.len() - patches.len(),
        };
        trace!(
            tick = report.tick,
            cursor = report.cursor,
            patched = report.patched,
            skipped = report.skipped,
            "Tick complete"
        );
        report
    }
}
