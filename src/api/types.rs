//! Shared state for the API router.

use std::sync::Arc;

use crate::triage::{ResourceStore, TriagePipeline};

/// Handed to every endpoint through `State<ApiContext>`.
#[derive(Clone)]
pub struct ApiContext {
    pub pipeline: Arc<TriagePipeline>,
    /// Same store the pipeline reads capacity from.
    pub resources: Arc<ResourceStore>,
}

impl ApiContext {
    pub fn new(pipeline: Arc<TriagePipeline>, resources: Arc<ResourceStore>) -> Self {
        Self {
            pipeline,
            resources,
        }
    }
}
