//! Timer-driven animation loop
//!
//! A single tokio task owns the [`AnimationEngine`] and runs one tick per
//! interval. Ticks never overlap: each tick, including handing its patches
//! to the renderer, completes before the next timer await.

use sensorviz_core::{AnimationEngine, ViewableRenderer};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Handle to a running animation loop
pub struct Animator {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<AnimationEngine>,
}

impl Animator {
    /// Spawn the loop; the first tick fires one period after start
    ///
    /// `max_ticks` ends the loop on its own after that many ticks.
    pub fn start(
        mut engine: AnimationEngine,
        renderer: Arc<dyn ViewableRenderer>,
        period: Duration,
        max_ticks: Option<u64>,
    ) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            info!(
                period_ms = period.as_millis() as u64,
                animated = engine.subset().len(),
                "Starting animator"
            );

            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval() completes its first tick immediately
            timer.tick().await;

            loop {
                if max_ticks.is_some_and(|max| engine.tick_count() >= max) {
                    debug!(ticks = engine.tick_count(), "Tick limit reached");
                    break;
                }

                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    _ = timer.tick() => {
                        engine.tick_into(renderer.as_ref());
                    }
                }
            }

            info!(ticks = engine.tick_count(), "Animator stopped");
            engine
        });

        Self { shutdown, task }
    }

    /// Stop the loop and wait for it to exit
    ///
    /// No patch is emitted after this returns. The engine is handed back
    /// for inspection.
    pub async fn stop(self) -> Result<AnimationEngine, tokio::task::JoinError> {
        let _ = self.shutdown.send(true);
        self.task.await
    }

    /// Run until the loop reaches its tick limit or `signal` completes
    ///
    /// When `signal` fires first the loop is stopped the same way as
    /// [`Animator::stop`].
    pub async fn run_until<F>(mut self, signal: F) -> Result<AnimationEngine, tokio::task::JoinError>
    where
        F: Future,
    {
        tokio::select! {
            engine = &mut self.task => return engine,
            _ = signal => {}
        }

        info!("Shutdown requested");
        self.stop().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensorviz_core::{
        build_animated_objects, select_animation_subset, RenderError, SensorRegistry,
        SpriteAssets, ViewableData, ViewableId, ViewablePatch, FRAME_CYCLE,
    };
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingRenderer {
        batches: AtomicUsize,
        patches: AtomicUsize,
    }

    impl ViewableRenderer for CountingRenderer {
        fn add_viewables(&self, _data: &ViewableData) -> Result<(), RenderError> {
            Ok(())
        }

        fn invalidate_viewables(&self, patches: &[(ViewableId, ViewablePatch)]) {
            self.batches.fetch_add(1, Ordering::SeqCst);
            self.patches.fetch_add(patches.len(), Ordering::SeqCst);
        }
    }

    fn engine() -> AnimationEngine {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let registry = SensorRegistry::builtin();
        let objects = build_animated_objects(registry.list_sensors(), &mut rng);
        let subset = select_animation_subset(&objects, &mut rng);
        let frames = (0..FRAME_CYCLE).map(|i| format!("fan-0{}.svg", i)).collect();
        let assets = SpriteAssets::new(frames, "motion.svg", "smiley.svg").unwrap();
        AnimationEngine::new(objects, subset, &assets)
    }

    #[tokio::test]
    async fn test_stop_halts_patches() {
        let renderer = Arc::new(CountingRenderer::default());
        let animator = Animator::start(engine(), renderer.clone(), Duration::from_millis(5), None);

        tokio::time::sleep(Duration::from_millis(60)).await;
        let engine = animator.stop().await.unwrap();

        let batches = renderer.batches.load(Ordering::SeqCst);
        assert!(batches > 0);
        assert_eq!(batches as u64, engine.tick_count());
        assert_eq!(renderer.patches.load(Ordering::SeqCst), batches * 8);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(renderer.batches.load(Ordering::SeqCst), batches);
    }

    #[tokio::test]
    async fn test_tick_limit() {
        let renderer = Arc::new(CountingRenderer::default());
        let animator = Animator::start(engine(), renderer.clone(), Duration::from_millis(2), Some(4));

        let engine = animator.run_until(std::future::pending::<()>()).await.unwrap();
        assert_eq!(engine.tick_count(), 4);
        assert_eq!(renderer.batches.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_signal_stops_tick_limited_loop() {
        let renderer = Arc::new(CountingRenderer::default());
        let animator =
            Animator::start(engine(), renderer.clone(), Duration::from_millis(5), Some(1_000_000));

        let engine = animator
            .run_until(tokio::time::sleep(Duration::from_millis(40)))
            .await
            .unwrap();

        let batches = renderer.batches.load(Ordering::SeqCst);
        assert!(engine.tick_count() < 1_000_000);
        assert_eq!(batches as u64, engine.tick_count());

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(renderer.batches.load(Ordering::SeqCst), batches);
    }

    #[tokio::test]
    async fn test_stop_before_first_tick() {
        let renderer = Arc::new(CountingRenderer::default());
        let animator = Animator::start(engine(), renderer.clone(), Duration::from_secs(60), None);

        let engine = animator.stop().await.unwrap();
        assert_eq!(engine.tick_count(), 0);
        assert_eq!(renderer.batches.load(Ordering::SeqCst), 0);
    }
}
