//! Animated sprite viewables built from the sensor registry
//!
//! Each sensor becomes one [`AnimatedObject`] with a dense 1-based id and a
//! behavior class picked by its registry index. The objects are then turned
//! into [`ViewableData`], the batch handed to the renderer.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::sensor::{Position, SensorRecord};
use crate::style::{Color, SpriteAssets, ViewableStyle};

/// Highest step count reached by an oscillating viewable
pub const OSCILLATE_MAX_STEP: i32 = 20;

/// Sprite size used by the reference scene
pub const DEFAULT_SPRITE_SIZE: u32 = 24;

/// Base color shared by every sprite style
pub const STYLE_COLOR: u32 = 0xffffff;

/// Renderer-side identifier of a viewable (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewableId(pub u32);

impl std::fmt::Display for ViewableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-tick animation applied to a viewable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorClass {
    /// Cycles through the fan sprite frames
    FanFrame,
    /// Alternates between white and red
    Blink,
    /// Drifts back and forth from its base position
    Oscillate,
}

impl BehaviorClass {
    const CYCLE: [BehaviorClass; 3] = [
        BehaviorClass::FanFrame,
        BehaviorClass::Blink,
        BehaviorClass::Oscillate,
    ];

    /// Behavior assigned to the object at `index` in registry order
    pub fn for_index(index: usize) -> Self {
        Self::CYCLE[index % Self::CYCLE.len()]
    }
}

/// Fixed per-object drift direction for oscillation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DriftVector {
    pub x: f64,
    pub y: f64,
}

impl DriftVector {
    /// Draw both components independently from uniform [-1, 1]
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            x: rng.gen_range(-1.0..=1.0),
            y: rng.gen_range(-1.0..=1.0),
        }
    }
}

/// Animation state for one sensor viewable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimatedObject {
    pub id: ViewableId,
    /// Base position, never changed by animation
    pub position: Position,
    pub behavior: BehaviorClass,
    pub step_size: i32,
    pub step_count: i32,
    pub drift: DriftVector,
}

impl AnimatedObject {
    /// Advance the triangle wave one step and return the displaced position
    ///
    /// The step count bounces between 0 and [`OSCILLATE_MAX_STEP`]; the
    /// direction flips on the tick that reaches either bound.
    pub fn step_oscillation(&mut self) -> Position {
        self.step_count += self.step_size;
        if self.step_count == 0 || self.step_count == OSCILLATE_MAX_STEP {
            self.step_size = -self.step_size;
        }
        self.offset_position()
    }

    /// Base position displaced by the drift vector scaled by the step count
    pub fn offset_position(&self) -> Position {
        let steps = f64::from(self.step_count);
        Position::new(
            self.position.x + self.drift.x * steps,
            self.position.y + self.drift.y * steps,
            self.position.z,
        )
    }
}

/// Build one animated object per sensor, preserving registry order
pub fn build_animated_objects<R: Rng + ?Sized>(
    records: &[SensorRecord],
    rng: &mut R,
) -> Vec<AnimatedObject> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| AnimatedObject {
            id: ViewableId(index as u32 + 1),
            position: record.position,
            behavior: BehaviorClass::for_index(index),
            step_size: 1,
            step_count: 0,
            drift: DriftVector::random(rng),
        })
        .collect()
}

/// Pick a uniformly random half of the object ids to animate
pub fn select_animation_subset<R: Rng + ?Sized>(
    objects: &[AnimatedObject],
    rng: &mut R,
) -> Vec<ViewableId> {
    let mut ids: Vec<ViewableId> = objects.iter().map(|o| o.id).collect();
    ids.shuffle(rng);
    ids.truncate(objects.len() / 2);
    ids
}

/// A positioned, styled sprite as the renderer ingests it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteViewable {
    pub id: ViewableId,
    pub position: Position,
    /// Index into [`ViewableData::styles`]
    pub style: usize,
}

/// Batch of viewables handed to the renderer in one call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewableData {
    pub sprite_size: u32,
    pub styles: Vec<ViewableStyle>,
    pub viewables: Vec<SpriteViewable>,
    finished: bool,
}

impl ViewableData {
    pub fn new(sprite_size: u32) -> Self {
        Self {
            sprite_size,
            styles: Vec::new(),
            viewables: Vec::new(),
            finished: false,
        }
    }

    /// Register a style and return its index
    pub fn add_style(&mut self, style: ViewableStyle) -> usize {
        self.styles.push(style);
        self.styles.len() - 1
    }

    pub fn add_viewable(&mut self, viewable: SpriteViewable) {
        debug_assert!(!self.finished, "viewable added after finish");
        self.viewables.push(viewable);
    }

    /// Seal the batch; no viewables may be added afterwards
    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn style_of(&self, viewable: &SpriteViewable) -> Option<&ViewableStyle> {
        self.styles.get(viewable.style)
    }
}

impl Default for ViewableData {
    fn default() -> Self {
        Self::new(DEFAULT_SPRITE_SIZE)
    }
}

/// Build the finished renderer batch for a set of animated objects
///
/// Styles are registered in behavior cycle order (fan, motion, worker) so a
/// viewable's style index equals its behavior's position in that cycle.
pub fn generate_viewable_data(
    objects: &[AnimatedObject],
    assets: &SpriteAssets,
    sprite_size: u32,
) -> ViewableData {
    let color = Color::from_hex(STYLE_COLOR);
    let mut data = ViewableData::new(sprite_size);
    let fan = data.add_style(assets.fan_style(color));
    let motion = data.add_style(assets.motion_style(color));
    let worker = data.add_style(assets.worker_style(color));

    for object in objects {
        let style = match object.behavior {
            BehaviorClass::FanFrame => fan,
            BehaviorClass::Blink => motion,
            BehaviorClass::Oscillate => worker,
        };
        data.add_viewable(SpriteViewable {
            id: object.id,
            position: object.position,
            style,
        });
    }

    data.finish();
    data
}
