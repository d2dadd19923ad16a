//! Shared state for the API layer.

use std::sync::Arc;

use crate::pipeline::handwriting::HandwritingPipeline;

/// Request bodies above this are rejected with 413 before reaching a handler.
pub const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// Shared context for all API routes.
#[derive(Clone)]
pub struct ApiContext {
    pub pipeline: Arc<HandwritingPipeline>,
}

impl ApiContext {
    pub fn new(pipeline: Arc<HandwritingPipeline>) -> Self {
        Self { pipeline }
    }
}
