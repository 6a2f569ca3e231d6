//! Contract with the external viewer that draws the sprites

use thiserror::Error;

use crate::patch::ViewablePatch;
use crate::viewable::{ViewableData, ViewableId};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Renderer rejected viewable batch: {0}")]
    Rejected(String),
    #[error("Viewable batch was not finished before ingestion")]
    Unfinished,
}

/// Renderer collaborator driven by the animation engine
///
/// Implementations get read-only views of viewables and patches; engine
/// state is never exposed mutably.
pub trait ViewableRenderer: Send + Sync {
    /// Ingest a finished batch of positioned, styled viewables
    fn add_viewables(&self, data: &ViewableData) -> Result<(), RenderError>;

    /// Apply one tick's worth of partial updates
    fn invalidate_viewables(&self, patches: &[(ViewableId, ViewablePatch)]);
}
