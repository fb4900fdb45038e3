//! Graph loading from an asset store.

use crate::error::{Error, Result};

use super::asset::AssetStore;
use super::engine::{GraphSession, InferenceEngine};

/// Read the graph at `path` from `assets` and bind it into a new session.
///
/// The serialized graph is released as soon as the session owns its compiled
/// form.
///
/// # Errors
///
/// Returns [`Error::Asset`] if the path does not resolve and
/// [`Error::GraphBind`] if the engine rejects the graph.
pub fn load_graph(
    engine: &dyn InferenceEngine,
    assets: &dyn AssetStore,
    path: &str,
) -> Result<Box<dyn GraphSession>> {
    tracing::info!("Reading graph from asset: {path}");

    let graph = assets.read(path).map_err(|source| Error::Asset {
        path: path.to_string(),
        source,
    })?;

    tracing::debug!("Read {} bytes, binding graph", graph.len());

    let session = engine.bind(&graph).map_err(|source| Error::GraphBind {
        path: path.to_string(),
        source,
    })?;

    drop(graph);

    Ok(session)
}
