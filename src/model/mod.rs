//! Asset stores, the inference engine seam and graph loading.

mod asset;
mod engine;
mod loader;
mod onnx;

pub use asset::{AssetStore, DirAssetStore, MemoryAssetStore};
pub use engine::{GraphFeed, GraphSession, InferenceEngine};
pub use loader::load_graph;
pub use onnx::OnnxEngine;

#[cfg(test)]
pub(crate) use engine::testing;
