//! Shared handler state.

use crate::pipeline::AnswerPipeline;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: AnswerPipeline,
}

impl AppState {
    pub fn new(pipeline: AnswerPipeline) -> Self {
        Self { pipeline }
    }
}
