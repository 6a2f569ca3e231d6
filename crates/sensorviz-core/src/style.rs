//! Visual styles and sprite assets for sensor viewables

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of frames in the fan animation cycle
pub const FRAME_CYCLE: usize = 6;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AssetError {
    #[error("Fan animation needs exactly {expected} frames, got {actual}")]
    FrameCount { expected: usize, actual: usize },
}

/// RGB color with channels in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);
    pub const RED: Color = Color::new(1.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create from a packed 0xRRGGBB value
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self::new(channel(16), channel(8), channel(0))
    }
}

/// How a viewable is drawn by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewableType {
    Sprite,
}

/// Shared style for a group of viewables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewableStyle {
    pub viewable_type: ViewableType,
    pub color: Color,
    /// Initial sprite image
    pub sprite_url: String,
    /// Images the renderer should load up front
    #[serde(default)]
    pub preloaded: Vec<String>,
}

impl ViewableStyle {
    pub fn sprite(color: Color, sprite_url: impl Into<String>) -> Self {
        Self {
            viewable_type: ViewableType::Sprite,
            color,
            sprite_url: sprite_url.into(),
            preloaded: Vec::new(),
        }
    }

    /// Ask the renderer to preload an extra sprite image
    pub fn preload_sprite(&mut self, url: impl Into<String>) {
        let url = url.into();
        if !self.preloaded.contains(&url) {
            self.preloaded.push(url);
        }
    }
}

/// Sprite images used by the three behavior classes
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteAssets {
    fan_frames: Vec<String>,
    motion: String,
    worker: String,
}

impl SpriteAssets {
    pub fn new(
        fan_frames: Vec<String>,
        motion: impl Into<String>,
        worker: impl Into<String>,
    ) -> Result<Self, AssetError> {
        if fan_frames.len() != FRAME_CYCLE {
            return Err(AssetError::FrameCount {
                expected: FRAME_CYCLE,
                actual: fan_frames.len(),
            });
        }
        Ok(Self {
            fan_frames,
            motion: motion.into(),
            worker: worker.into(),
        })
    }

    /// Fan animation frames, in playback order
    pub fn fan_frames(&self) -> &[String] {
        &self.fan_frames
    }

    pub fn motion(&self) -> &str {
        &self.motion
    }

    pub fn worker(&self) -> &str {
        &self.worker
    }

    /// Fan style: first frame shown, every frame preloaded
    pub fn fan_style(&self, color: Color) -> ViewableStyle {
        let mut style = ViewableStyle::sprite(color, self.fan_frames[0].clone());
        for frame in &self.fan_frames {
            style.preload_sprite(frame.clone());
        }
        style
    }

    pub fn motion_style(&self, color: Color) -> ViewableStyle {
        ViewableStyle::sprite(color, self.motion.clone())
    }

    pub fn worker_style(&self, color: Color) -> ViewableStyle {
        ViewableStyle::sprite(color, self.worker.clone())
    }
}
