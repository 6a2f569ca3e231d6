//! Sensorviz Core - Sensor registry, sprite viewables, and animation engine
//!
//! This crate provides the renderer-agnostic pieces of Sensorviz:
//! - Sensor registry with the reference hospital floor layout
//! - Sprite styles and viewable batches for an external renderer
//! - Animation engine that turns ticks into partial viewable patches
//! - Renderer contract implemented by viewer adapters

pub mod engine;
pub mod patch;
pub mod renderer;
pub mod sensor;
pub mod style;
pub mod viewable;

pub use engine::{AnimationEngine, TickReport};
pub use patch::{PatchBatch, ViewablePatch};
pub use renderer::{RenderError, ViewableRenderer};
pub use sensor::{Position, RegistryError, SensorId, SensorRecord, SensorRegistry};
pub use style::{AssetError, Color, SpriteAssets, ViewableStyle, ViewableType, FRAME_CYCLE};
pub use viewable::{
    build_animated_objects, generate_viewable_data, select_animation_subset, AnimatedObject,
    BehaviorClass, DriftVector, SpriteViewable, ViewableData, ViewableId, DEFAULT_SPRITE_SIZE,
};
