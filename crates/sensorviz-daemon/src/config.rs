//! Configuration loading and validation

use anyhow::{bail, Result};
use sensorviz_core::SpriteAssets;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub sensors: SensorsConfig,
}

/// Deployment environment selecting a `[profile.*]` override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Local,
    Dev,
    Stage,
    Prod,
}

impl Environment {
    /// Parse an environment name; anything unrecognized is local development
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "dev" => Self::Dev,
            "stage" => Self::Stage,
            "prod" => Self::Prod,
            _ => Self::Local,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Dev => "dev",
            Self::Stage => "stage",
            Self::Prod => "prod",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Site URLs used by the viewer page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Root URL the page is served from
    #[serde(default = "default_asset_root")]
    pub asset_root: String,
    /// Prefix that relative sprite paths are resolved against
    #[serde(default = "default_asset_url_prefix")]
    pub asset_url_prefix: String,
    /// Viewer runtime location
    #[serde(default = "default_viewer_url")]
    pub viewer_url: String,
    /// Base URL for API calls
    #[serde(default)]
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            asset_root: default_asset_root(),
            asset_url_prefix: default_asset_url_prefix(),
            viewer_url: default_viewer_url(),
            base_url: String::new(),
        }
    }
}

fn default_asset_root() -> String {
    "http://localhost:9081".to_string()
}

fn default_asset_url_prefix() -> String {
    "http://localhost:9081/assets".to_string()
}

fn default_viewer_url() -> String {
    "https://developer.api.autodesk.com/modelderivative/v2/viewers".to_string()
}

impl SiteConfig {
    /// Apply the fields set in an override
    pub fn merged(&self, overrides: &SiteOverride) -> Self {
        Self {
            asset_root: overrides.asset_root.clone().unwrap_or_else(|| self.asset_root.clone()),
            asset_url_prefix: overrides
                .asset_url_prefix
                .clone()
                .unwrap_or_else(|| self.asset_url_prefix.clone()),
            viewer_url: overrides.viewer_url.clone().unwrap_or_else(|| self.viewer_url.clone()),
            base_url: overrides.base_url.clone().unwrap_or_else(|| self.base_url.clone()),
        }
    }

    /// Render the site settings as SCSS variable declarations
    ///
    /// Variable names follow the stylesheet convention (`$assetRoot`,
    /// `$assetUrlPrefix`, `$lmvUrl`, `$baseUrl`), not the field names.
    pub fn to_scss_env(&self) -> String {
        [
            ("assetRoot", &self.asset_root),
            ("assetUrlPrefix", &self.asset_url_prefix),
            ("lmvUrl", &self.viewer_url),
            ("baseUrl", &self.base_url),
        ]
        .iter()
        .map(|(key, value)| format!("${}: '{}'; ", key, value))
        .collect()
    }

    /// Resolve a sprite path against the asset prefix; absolute URLs pass through
    pub fn asset_url(&self, path: &str) -> String {
        if path.contains("://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.asset_url_prefix.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Partial site settings for one environment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteOverride {
    pub asset_root: Option<String>,
    pub asset_url_prefix: Option<String>,
    pub viewer_url: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default)]
    pub dev: Option<SiteOverride>,
    #[serde(default)]
    pub stage: Option<SiteOverride>,
    #[serde(default)]
    pub prod: Option<SiteOverride>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Tick period in milliseconds
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Sprite size in pixels
    #[serde(default = "default_sprite_size")]
    pub sprite_size: u32,
    /// Seed for drift vectors and subset selection (random if unset)
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            sprite_size: default_sprite_size(),
            seed: None,
        }
    }
}

fn default_tick_interval() -> u64 {
    200 // 5 ticks per second
}

fn default_sprite_size() -> u32 {
    sensorviz_core::DEFAULT_SPRITE_SIZE
}

impl AnimationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Sprite image paths, relative to `site.asset_url_prefix` unless absolute
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    #[serde(default = "default_fan_frames")]
    pub fan_frames: Vec<String>,
    #[serde(default = "default_motion")]
    pub motion: String,
    #[serde(default = "default_worker")]
    pub worker: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            fan_frames: default_fan_frames(),
            motion: default_motion(),
            worker: default_worker(),
        }
    }
}

fn default_fan_frames() -> Vec<String> {
    (0..sensorviz_core::FRAME_CYCLE)
        .map(|i| format!("images/fan-{:02}.svg", i))
        .collect()
}

fn default_motion() -> String {
    "images/motion.svg".to_string()
}

fn default_worker() -> String {
    "images/smiley.svg".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Endpoint returning `{"access_token": ...}`; no token is fetched when unset
    #[serde(default)]
    pub token_url: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_token_timeout")]
    pub timeout_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_url: None,
            timeout_secs: default_token_timeout(),
        }
    }
}

fn default_token_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SensorsConfig {
    /// Registry file; the built-in floor layout is used when unset
    #[serde(default)]
    pub path: Option<String>,
}

impl Config {
    /// Site settings with the environment's profile applied
    pub fn site_for(&self, env: Environment) -> SiteConfig {
        let overrides = match env {
            Environment::Local => None,
            Environment::Dev => self.profile.dev.as_ref(),
            Environment::Stage => self.profile.stage.as_ref(),
            Environment::Prod => self.profile.prod.as_ref(),
        };
        match overrides {
            Some(o) => self.site.merged(o),
            None => self.site.clone(),
        }
    }

    /// Sprite assets resolved against the given site
    pub fn sprite_assets(&self, site: &SiteConfig) -> Result<SpriteAssets> {
        let frames = self.assets.fan_frames.iter().map(|f| site.asset_url(f)).collect();
        let assets = SpriteAssets::new(
            frames,
            site.asset_url(&self.assets.motion),
            site.asset_url(&self.assets.worker),
        )?;
        Ok(assets)
    }

    /// Reject settings the animator cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.animation.tick_interval_ms == 0 {
            bail!("animation.tick_interval_ms must be greater than zero");
        }
        if self.animation.sprite_size == 0 {
            bail!("animation.sprite_size must be greater than zero");
        }
        Ok(())
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        config
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Config::default()
    };
    config.validate()?;
    Ok(config)
}
