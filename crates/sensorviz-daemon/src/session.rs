//! Session setup: registry to viewables to a running animator

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sensorviz_core::{
    build_animated_objects, generate_viewable_data, select_animation_subset, AnimationEngine,
    SensorRegistry, ViewableData, ViewableRenderer,
};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::animator::Animator;
use crate::config::{Config, SiteConfig};

/// Viewables and engine ready to hand to a renderer
pub struct Scene {
    pub data: ViewableData,
    pub engine: AnimationEngine,
}

/// Load the configured registry, or the built-in floor layout
pub fn load_registry(config: &Config) -> Result<SensorRegistry> {
    match &config.sensors.path {
        Some(path) => SensorRegistry::load(Path::new(path))
            .with_context(|| format!("Failed to load sensor registry from {}", path)),
        None => Ok(SensorRegistry::builtin()),
    }
}

/// Build viewables and the animation engine for a registry
///
/// A seed makes drift vectors and the animated subset reproducible.
pub fn build_scene(
    config: &Config,
    site: &SiteConfig,
    registry: &SensorRegistry,
    seed: Option<u64>,
) -> Result<Scene> {
    let assets = config.sprite_assets(site)?;
    let mut rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let objects = build_animated_objects(registry.list_sensors(), &mut rng);
    let subset = select_animation_subset(&objects, &mut rng);
    let data = generate_viewable_data(&objects, &assets, config.animation.sprite_size);

    info!(
        sensors = registry.len(),
        animated = subset.len(),
        seeded = seed.is_some(),
        "Scene built"
    );

    Ok(Scene {
        data,
        engine: AnimationEngine::new(objects, subset, &assets),
    })
}

/// A live animation session
pub struct Session {
    animator: Animator,
    viewables: usize,
    animated: usize,
}

impl Session {
    /// Hand the viewables to the renderer and start ticking
    ///
    /// Renderer ingestion failures abort the session before any tick runs.
    pub fn start(
        scene: Scene,
        renderer: Arc<dyn ViewableRenderer>,
        period: Duration,
        max_ticks: Option<u64>,
    ) -> Result<Self> {
        let Scene { data, engine } = scene;
        renderer
            .add_viewables(&data)
            .context("Renderer rejected viewables")?;

        let viewables = data.viewables.len();
        let animated = engine.subset().len();
        let animator = Animator::start(engine, renderer, period, max_ticks);

        Ok(Self {
            animator,
            viewables,
            animated,
        })
    }

    pub fn viewables(&self) -> usize {
        self.viewables
    }

    pub fn animated(&self) -> usize {
        self.animated
    }

    /// Animate until the tick limit or `shutdown` completes; returns the number of ticks run
    pub async fn run_until<F>(self, shutdown: F) -> Result<u64>
    where
        F: Future,
    {
        let engine = self
            .animator
            .run_until(shutdown)
            .await
            .context("Animator task failed")?;
        Ok(engine.tick_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::TracingRenderer;
    use sensorviz_core::{RenderError, ViewableId, ViewablePatch};
    use tempfile::TempDir;

    struct RejectingRenderer;

    impl ViewableRenderer for RejectingRenderer {
        fn add_viewables(&self, _data: &ViewableData) -> Result<(), RenderError> {
            Err(RenderError::Rejected("model not loaded".to_string()))
        }

        fn invalidate_viewables(&self, _patches: &[(ViewableId, ViewablePatch)]) {
            panic!("no patches expected after a rejected batch");
        }
    }

    #[test]
    fn test_build_reference_scene() {
        let config = Config::default();
        let registry = load_registry(&config).unwrap();
        let scene = build_scene(&config, &config.site, &registry, Some(1)).unwrap();

        assert_eq!(scene.data.viewables.len(), 17);
        assert!(scene.data.is_finished());
        assert_eq!(scene.engine.subset().len(), 8);
        assert_eq!(scene.engine.tick_count(), 0);
    }

    #[test]
    fn test_seeded_scene_is_reproducible() {
        let config = Config::default();
        let registry = SensorRegistry::builtin();
        let a = build_scene(&config, &config.site, &registry, Some(99)).unwrap();
        let b = build_scene(&config, &config.site, &registry, Some(99)).unwrap();
        assert_eq!(a.engine.subset(), b.engine.subset());
        assert_eq!(a.engine.objects(), b.engine.objects());
    }

    #[test]
    fn test_empty_registry_scene() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sensors.toml");
        std::fs::write(&path, "").unwrap();

        let mut config = Config::default();
        config.sensors.path = Some(path.display().to_string());
        let registry = load_registry(&config).unwrap();
        let scene = build_scene(&config, &config.site, &registry, None).unwrap();
        assert!(scene.data.viewables.is_empty());
        assert!(scene.engine.subset().is_empty());
    }

    #[test]
    fn test_missing_registry_file() {
        let mut config = Config::default();
        config.sensors.path = Some("/nonexistent/sensors.toml".to_string());
        assert!(load_registry(&config).is_err());
    }

    #[tokio::test]
    async fn test_rejected_viewables_abort_session() {
        let config = Config::default();
        let scene = build_scene(&config, &config.site, &SensorRegistry::builtin(), Some(3)).unwrap();
        let result = Session::start(scene, Arc::new(RejectingRenderer), Duration::from_millis(1), None);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_session_runs_to_tick_limit() {
        let config = Config::default();
        let scene = build_scene(&config, &config.site, &SensorRegistry::builtin(), Some(3)).unwrap();
        let renderer = Arc::new(TracingRenderer::new(None));

        let session =
            Session::start(scene, renderer.clone(), Duration::from_millis(1), Some(5)).unwrap();
        assert_eq!(session.viewables(), 17);
        assert_eq!(session.animated(), 8);

        assert_eq!(session.run_until(std::future::pending::<()>()).await.unwrap(), 5);
        assert_eq!(renderer.viewable_count(), 17);
        assert_eq!(renderer.patch_count(), 40);
    }

    #[tokio::test]
    async fn test_shutdown_ends_unlimited_session() {
        let config = Config::default();
        let scene = build_scene(&config, &config.site, &SensorRegistry::builtin(), Some(3)).unwrap();
        let renderer = Arc::new(TracingRenderer::new(None));

        let session = Session::start(scene, renderer.clone(), Duration::from_millis(2), None).unwrap();
        let ticks = session
            .run_until(tokio::time::sleep(Duration::from_millis(30)))
            .await
            .unwrap();

        assert_eq!(renderer.patch_count(), ticks * 8);
    }
}
