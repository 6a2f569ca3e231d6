//! Renderer adapter that reports viewables and patches through tracing
//!
//! Stands in for the external viewer. With a JSON sink attached every patch
//! is also written as one JSON line, so the stream can be piped into a
//! viewer bridge.

use sensorviz_core::{RenderError, ViewableData, ViewableId, ViewablePatch, ViewableRenderer};
use serde::Serialize;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::AccessToken;

#[derive(Serialize)]
struct PatchLine<'a> {
    id: ViewableId,
    patch: &'a ViewablePatch,
}

pub struct TracingRenderer {
    token: Option<AccessToken>,
    json_sink: Option<Mutex<Box<dyn Write + Send>>>,
    viewables: AtomicU64,
    patches: AtomicU64,
}

impl TracingRenderer {
    pub fn new(token: Option<AccessToken>) -> Self {
        Self {
            token,
            json_sink: None,
            viewables: AtomicU64::new(0),
            patches: AtomicU64::new(0),
        }
    }

    /// Also write each patch as a JSON line to `sink`
    pub fn with_json_sink(mut self, sink: Box<dyn Write + Send>) -> Self {
        self.json_sink = Some(Mutex::new(sink));
        self
    }

    pub fn has_token(&self) -> bool {
        self.token.as_ref().is_some_and(|t| !t.as_str().is_empty())
    }

    /// Viewables ingested so far
    pub fn viewable_count(&self) -> u64 {
        self.viewables.load(Ordering::Relaxed)
    }

    /// Patches applied so far
    pub fn patch_count(&self) -> u64 {
        self.patches.load(Ordering::Relaxed)
    }

    fn write_json(&self, patches: &[(ViewableId, ViewablePatch)]) {
        let Some(sink) = &self.json_sink else {
            return;
        };
        let Ok(mut sink) = sink.lock() else {
            warn!("Patch sink lock poisoned, dropping patch lines");
            return;
        };
        for (id, patch) in patches {
            let line = PatchLine { id: *id, patch };
            let result = serde_json::to_writer(&mut *sink, &line)
                .map_err(std::io::Error::from)
                .and_then(|_| sink.write_all(b"\n"));
            if let Err(e) = result {
                warn!(error = %e, "Failed to write patch line");
                return;
            }
        }
        if let Err(e) = sink.flush() {
            warn!(error = %e, "Failed to flush patch lines");
        }
    }
}

impl ViewableRenderer for TracingRenderer {
    fn add_viewables(&self, data: &ViewableData) -> Result<(), RenderError> {
        if !data.is_finished() {
            return Err(RenderError::Unfinished);
        }
        self.viewables
            .fetch_add(data.viewables.len() as u64, Ordering::Relaxed);
        info!(
            viewables = data.viewables.len(),
            styles = data.styles.len(),
            sprite_size = data.sprite_size,
            authenticated = self.has_token(),
            "Viewables added"
        );
        Ok(())
    }

    fn invalidate_viewables(&self, patches: &[(ViewableId, ViewablePatch)]) {
        for (id, patch) in patches {
            debug!(viewable = %id, patch = ?patch, "Viewable invalidated");
        }
        self.patches.fetch_add(patches.len() as u64, Ordering::Relaxed);
        self.write_json(patches);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensorviz_core::{Color, Position};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_unfinished_batch_rejected() {
        let renderer = TracingRenderer::new(None);
        let data = ViewableData::new(24);
        assert!(matches!(renderer.add_viewables(&data), Err(RenderError::Unfinished)));

        let mut data = ViewableData::new(24);
        data.finish();
        assert!(renderer.add_viewables(&data).is_ok());
        assert_eq!(renderer.viewable_count(), 0);
    }

    #[test]
    fn test_patches_written_as_json_lines() {
        let buf = SharedBuf::default();
        let renderer =
            TracingRenderer::new(Some(AccessToken::new("t"))).with_json_sink(Box::new(buf.clone()));

        renderer.invalidate_viewables(&[
            (ViewableId(1), ViewablePatch::Url("fan-00.svg".into())),
            (ViewableId(2), ViewablePatch::Color(Color::RED)),
            (ViewableId(3), ViewablePatch::Position(Position::new(1.0, 2.0, 3.0))),
        ]);

        assert_eq!(renderer.patch_count(), 3);
        let output = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], r#"{"id":1,"patch":{"url":"fan-00.svg"}}"#);
        assert_eq!(lines[1], r#"{"id":2,"patch":{"color":{"r":1.0,"g":0.0,"b":0.0}}}"#);
    }

    struct FailingFlush;

    impl Write for FailingFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    struct PanickingSink;

    impl Write for PanickingSink {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            panic!("sink gone");
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_flush_failure_keeps_counting() {
        let renderer = TracingRenderer::new(None).with_json_sink(Box::new(FailingFlush));
        let patch = [(ViewableId(1), ViewablePatch::Url("fan-00.svg".into()))];

        renderer.invalidate_viewables(&patch);
        renderer.invalidate_viewables(&patch);
        assert_eq!(renderer.patch_count(), 2);
    }

    #[test]
    fn test_poisoned_sink_skips_json() {
        let renderer = TracingRenderer::new(None).with_json_sink(Box::new(PanickingSink));
        let patch = [(ViewableId(1), ViewablePatch::Color(Color::WHITE))];

        let poisoned = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            renderer.invalidate_viewables(&patch)
        }));
        assert!(poisoned.is_err());

        // Later batches still count, without touching the sink
        renderer.invalidate_viewables(&patch);
        assert_eq!(renderer.patch_count(), 2);
    }
}
