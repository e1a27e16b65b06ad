use std::sync::Arc;

use crate::generation::{T5Generator, TextGenerator};
use crate::pipeline::RagPipeline;

pub struct HandlerState<G: TextGenerator = T5Generator> {
    pub pipeline: Arc<RagPipeline<G>>,
}

impl<G: TextGenerator> HandlerState<G> {
    pub fn new(pipeline: Arc<RagPipeline<G>>) -> Self {
        Self { pipeline }
    }
}

impl<G: TextGenerator> Clone for HandlerState<G> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
        }
    }
}
