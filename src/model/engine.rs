//! The seam between the marshalling code and an inference backend.

use ndarray::{ArrayD, ArrayView1, ArrayView3};

use crate::error::EngineError;

/// Inputs and the requested output for one session run.
#[derive(Debug, Clone, Copy)]
pub struct GraphFeed<'a> {
    /// Name of the image input.
    pub image_name: &'a str,
    /// `[height, width, 3]` image tensor.
    pub image: ArrayView3<'a, f32>,
    /// Name of the shape input.
    pub shape_name: &'a str,
    /// `[height, width, 3]` shape tensor.
    pub shape: ArrayView1<'a, i32>,
    /// Name of the single output to fetch.
    pub output_name: &'a str,
}

/// Builds sessions from serialized graphs.
pub trait InferenceEngine: Send + Sync {
    /// Construct a session with default options and bind `graph` into it.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph is malformed or cannot be compiled.
    fn bind(&self, graph: &[u8]) -> Result<Box<dyn GraphSession>, EngineError>;
}

/// A live session holding one bound graph.
pub trait GraphSession: Send {
    /// Run the graph on `feed` and return the requested output.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine declines to run or the output is missing.
    fn run(&mut self, feed: GraphFeed<'_>) -> Result<ArrayD<f32>, EngineError>;
}
