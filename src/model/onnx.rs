//! ONNX Runtime backend.

use ndarray::ArrayD;
use ort::session::Session;
use ort::value::TensorRef;

use crate::error::EngineError;

use super::engine::{GraphFeed, GraphSession, InferenceEngine};

/// Engine backed by ONNX Runtime with default session options.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnnxEngine;

impl InferenceEngine for OnnxEngine {
    fn bind(&self, graph: &[u8]) -> Result<Box<dyn GraphSession>, EngineError> {
        let session = Session::builder()?.commit_from_memory(graph)?;

        tracing::debug!(
            inputs = ?session.inputs.iter().map(|i| i.name.as_str()).collect::<Vec<_>>(),
            outputs = ?session.outputs.iter().map(|o| o.name.as_str()).collect::<Vec<_>>(),
            "ONNX session created"
        );

        Ok(Box::new(OnnxSession { session }))
    }
}

struct OnnxSession {
    session: Session,
}

impl GraphSession for OnnxSession {
    fn run(&mut self, feed: GraphFeed<'_>) -> Result<ArrayD<f32>, EngineError> {
        let image_tensor = TensorRef::from_array_view(feed.image)?;
        let shape_tensor = TensorRef::from_array_view(feed.shape)?;

        let outputs = self.session.run(ort::inputs![
            feed.image_name => image_tensor,
            feed.shape_name => shape_tensor,
        ])?;

        let output = outputs
            .get(feed.output_name)
            .ok_or_else(|| format!("graph has no output named {:?}", feed.output_name))?;

        Ok(output.try_extract_array::<f32>()?.to_owned())
    }
}
