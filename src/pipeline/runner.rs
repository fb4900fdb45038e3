//! The inference service owning the single live session.

use std::sync::{Arc, Mutex, RwLock};

use crate::error::{Error, Result};
use crate::image::ImageSize;
use crate::model::{load_graph, AssetStore, GraphSession, InferenceEngine};

use super::execute::execute;
use super::request::RunRequest;

/// What `initialize` does when a graph is already loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReinitializePolicy {
    /// Always load the requested graph, replacing the live one.
    #[default]
    Always,
    /// Keep the live graph and skip loading.
    SkipIfLoaded,
}

/// Configuration for a [`TensorRunner`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Behavior of repeated `initialize` calls.
    pub reinitialize: ReinitializePolicy,

    /// Graph input receiving the `[height, width, 3]` image tensor.
    pub input_name: String,

    /// Graph input receiving the `[height, width, 3]` shape tensor.
    pub shape_input_name: String,

    /// Graph output decoded into pixels.
    pub output_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reinitialize: ReinitializePolicy::Always,
            input_name: "input".to_string(),
            shape_input_name: "input_shape".to_string(),
            output_name: "output".to_string(),
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a tensor name is empty or the two inputs share a name.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("input_name", &self.input_name),
            ("shape_input_name", &self.shape_input_name),
            ("output_name", &self.output_name),
        ] {
            if value.is_empty() {
                return Err(Error::invalid_parameter(name, "must not be empty"));
            }
        }

        if self.input_name == self.shape_input_name {
            return Err(Error::invalid_parameter(
                "shape_input_name",
                "must differ from input_name",
            ));
        }

        Ok(())
    }
}

/// Result of a successful [`TensorRunner::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// A graph was read and bound.
    Loaded,
    /// A graph was already live and the policy said to keep it.
    AlreadyLoaded,
}

struct LoadedGraph {
    path: String,
    session: Mutex<Box<dyn GraphSession>>,
}

/// Owns one inference session and runs packed-pixel images through it.
///
/// Initialization swaps the session under a write lock. Runs take a snapshot
/// of the live session, so a run that started before a swap finishes on the
/// graph it started with. Runs on the same session are serialized.
pub struct TensorRunner<E> {
    engine: E,
    config: Config,
    live: RwLock<Option<Arc<LoadedGraph>>>,
}

impl<E: InferenceEngine> TensorRunner<E> {
    /// Create a runner with no graph loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn new(engine: E, config: Config) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            engine,
            config,
            live: RwLock::new(None),
        })
    }

    /// The runner's configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load the graph at `path` from `assets` and make it the live session.
    ///
    /// On failure no session is left installed, so later runs fail with
    /// [`Error::NotInitialized`].
    ///
    /// # Errors
    ///
    /// Returns an error if the asset cannot be read or the graph cannot be bound.
    pub fn initialize(&self, assets: &dyn AssetStore, path: &str) -> Result<InitOutcome> {
        if self.config.reinitialize == ReinitializePolicy::SkipIfLoaded {
            if let Some(live) = self.snapshot()? {
                tracing::info!("Compute graph already loaded from {}, skipping", live.path);
                return Ok(InitOutcome::AlreadyLoaded);
            }
        }

        tracing::info!("Loading graph {path}");

        match load_graph(&self.engine, assets, path) {
            Ok(session) => {
                let loaded = Arc::new(LoadedGraph {
                    path: path.to_string(),
                    session: Mutex::new(session),
                });
                *self.live.write().map_err(|_| Error::LockPoisoned)? = Some(loaded);

                tracing::info!("Graph loaded from {path}");
                Ok(InitOutcome::Loaded)
            }
            Err(err) => {
                tracing::error!("Could not create graph from {path}: {err}");
                if self.live.write().map_err(|_| Error::LockPoisoned)?.take().is_some() {
                    tracing::warn!("Previous graph discarded");
                }
                Err(err)
            }
        }
    }

    /// Whether a graph is live.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        matches!(self.snapshot(), Ok(Some(_)))
    }

    /// Asset path of the live graph.
    #[must_use]
    pub fn loaded_graph(&self) -> Option<String> {
        self.snapshot().ok().flatten().map(|live| live.path.clone())
    }

    /// Run `pixels` through the live graph.
    ///
    /// Returns a new buffer of `request.output_size()` opaque pixels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for a zero input size,
    /// [`Error::NotInitialized`] before a successful `initialize`,
    /// [`Error::Allocation`] if the result buffer cannot be reserved,
    /// [`Error::Inference`] if the engine fails and
    /// [`Error::ShapeMismatch`] if the pixels or the output tensor do not fit
    /// the request.
    pub fn run(&self, pixels: &[i32], request: RunRequest) -> Result<Vec<i32>> {
        request.validate()?;
        let live = self.snapshot()?.ok_or(Error::NotInitialized)?;

        let len = request.output_size().pixel_count()?;
        let mut result = Vec::new();
        result
            .try_reserve_exact(len)
            .map_err(|source| Error::Allocation { len, source })?;

        let mut session = live.session.lock().map_err(|_| Error::LockPoisoned)?;
        execute(&mut **session, &self.config, pixels, request, &mut result)?;

        tracing::debug!("Produced {len} pixels");
        Ok(result)
    }

    /// Run with the output size equal to the input size.
    ///
    /// # Errors
    ///
    /// See [`TensorRunner::run`].
    pub fn run_same_size(&self, pixels: &[i32], height: usize, width: usize) -> Result<Vec<i32>> {
        self.run(pixels, RunRequest::new(ImageSize::new(height, width)))
    }

    /// Run with an explicit output size. A zero `out_height` or `out_width`
    /// keeps the matching input dimension.
    ///
    /// # Errors
    ///
    /// See [`TensorRunner::run`].
    pub fn run_resized(
        &self,
        pixels: &[i32],
        height: usize,
        width: usize,
        out_height: usize,
        out_width: usize,
    ) -> Result<Vec<i32>> {
        self.run(
            pixels,
            RunRequest::new(ImageSize::new(height, width))
                .with_output(ImageSize::new(out_height, out_width)),
        )
    }

    /// Drop the live graph. Returns whether one was loaded.
    ///
    /// Runs already holding a snapshot finish normally.
    ///
    /// # Errors
    ///
    /// Returns an error if the session lock is poisoned.
    pub fn dispose(&self) -> Result<bool> {
        let previous = self.live.write().map_err(|_| Error::LockPoisoned)?.take();
        if let Some(ref graph) = previous {
            tracing::info!("Disposed graph {}", graph.path);
        }
        Ok(previous.is_some())
    }

    fn snapshot(&self) -> Result<Option<Arc<LoadedGraph>>> {
        Ok(self.live.read().map_err(|_| Error::LockPoisoned)?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::image::{pack_rgb, unpack_rgb};
    use crate::model::testing::{MockEngine, FAILING_GRAPH, FIXED_GRAPH, IDENTITY_GRAPH};
    use crate::model::MemoryAssetStore;
    use ndarray::Array3;

    fn assets() -> MemoryAssetStore {
        MemoryAssetStore::new()
            .with_asset("identity.onnx", IDENTITY_GRAPH)
            .with_asset("fixed.onnx", FIXED_GRAPH)
            .with_asset("failing.onnx", FAILING_GRAPH)
            .with_asset("corrupt.onnx", b"not a graph".to_vec())
    }

    fn runner(engine: MockEngine) -> TensorRunner<MockEngine> {
        TensorRunner::new(engine, Config::default()).unwrap()
    }

    #[test]
    fn test_identity_preserves_rgb_and_forces_alpha() {
        let runner = runner(MockEngine::default());
        assert_eq!(
            runner.initialize(&assets(), "identity.onnx").unwrap(),
            InitOutcome::Loaded
        );

        let pixels: Vec<i32> = [0x0000_0000_u32, 0x12FF_8001, 0x80AB_CDEF, 0xFFFF_FFFF]
            .iter()
            .map(|&p| p as i32)
            .collect();
        let out = runner.run_same_size(&pixels, 2, 2).unwrap();

        for (&input, &output) in pixels.iter().zip(&out) {
            assert_eq!(unpack_rgb(output), unpack_rgb(input));
            assert_eq!(output as u32 >> 24, 0xFF);
        }
    }

    #[test]
    fn test_output_lengths() {
        let fixed = Array3::<f32>::from_elem((4, 6, 3), 0.25).into_dyn();
        let runner = runner(MockEngine::with_output(fixed));
        runner.initialize(&assets(), "fixed.onnx").unwrap();

        let pixels = vec![0; 24];
        assert_eq!(runner.run_same_size(&pixels, 4, 6).unwrap().len(), 24);

        let resized = runner.run_resized(&pixels, 4, 6, 2, 3).unwrap();
        assert_eq!(resized.len(), 6);
        assert!(resized.iter().all(|&p| p == pack_rgb([64, 64, 64])));
    }

    #[test]
    fn test_clamp_and_rounding_through_runner() {
        let mut fixed = Array3::<f32>::zeros((1, 1, 3));
        fixed[[0, 0, 0]] = 2.0;
        fixed[[0, 0, 1]] = -1.0;
        fixed[[0, 0, 2]] = 127.5 / 255.0;
        let runner = runner(MockEngine::with_output(fixed.into_dyn()));
        runner.initialize(&assets(), "fixed.onnx").unwrap();

        let out = runner.run_same_size(&[0x00FF_FFFF], 1, 1).unwrap();
        assert_eq!(out, vec![pack_rgb([255, 0, 128])]);
    }

    #[test]
    fn test_resized_zero_output_keeps_input_size() {
        let fixed = Array3::<f32>::zeros((4, 6, 3)).into_dyn();
        let runner = runner(MockEngine::with_output(fixed));
        runner.initialize(&assets(), "fixed.onnx").unwrap();

        let pixels = vec![0; 24];
        assert_eq!(runner.run_resized(&pixels, 4, 6, 0, 0).unwrap().len(), 24);
        assert_eq!(runner.run_resized(&pixels, 4, 6, 2, 0).unwrap().len(), 12);
    }

    #[test]
    fn test_zero_input_size_rejected() {
        let runner = runner(MockEngine::default());
        runner.initialize(&assets(), "identity.onnx").unwrap();

        let err = runner.run_same_size(&[], 0, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = runner.run_resized(&[], 0, 6, 2, 3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_undersized_output_tensor() {
        let fixed = Array3::<f32>::zeros((2, 2, 3)).into_dyn();
        let runner = runner(MockEngine::with_output(fixed));
        runner.initialize(&assets(), "fixed.onnx").unwrap();

        let err = runner.run_resized(&[0; 4], 2, 2, 4, 4).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_run_before_initialize() {
        let runner = runner(MockEngine::default());

        let err = runner.run_same_size(&[0; 4], 2, 2).unwrap_err();
        assert!(matches!(err, Error::NotInitialized));
        assert!(!runner.is_initialized());
    }

    #[test]
    fn test_missing_graph_leaves_no_session() {
        let runner = runner(MockEngine::default());
        runner.initialize(&assets(), "identity.onnx").unwrap();

        let err = runner.initialize(&assets(), "missing.onnx").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::GraphLoad);
        assert_eq!(err.status_code(), crate::STATUS_FAILED);

        assert!(!runner.is_initialized());
        let err = runner.run_same_size(&[0; 4], 2, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotInitialized);
    }

    #[test]
    fn test_corrupt_graph() {
        let runner = runner(MockEngine::default());
        let err = runner.initialize(&assets(), "corrupt.onnx").unwrap_err();

        assert!(matches!(err, Error::GraphBind { .. }));
        assert!(runner.loaded_graph().is_none());
    }

    #[test]
    fn test_execution_failure() {
        let runner = runner(MockEngine::default());
        runner.initialize(&assets(), "failing.onnx").unwrap();

        let err = runner.run_same_size(&[0; 4], 2, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Execution);
        // A failed run does not unload the graph
        assert!(runner.is_initialized());
    }

    #[test]
    fn test_pixel_count_mismatch() {
        let runner = runner(MockEngine::default());
        runner.initialize(&assets(), "identity.onnx").unwrap();

        let err = runner.run_same_size(&[0; 5], 2, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_reinitialize_always_reloads() {
        let engine = MockEngine::default();
        let runner = runner(engine.clone());

        runner.initialize(&assets(), "identity.onnx").unwrap();
        runner.initialize(&assets(), "failing.onnx").unwrap();

        assert_eq!(engine.bind_count(), 2);
        assert_eq!(runner.loaded_graph().as_deref(), Some("failing.onnx"));
    }

    #[test]
    fn test_reinitialize_skip_if_loaded() {
        let engine = MockEngine::default();
        let config = Config {
            reinitialize: ReinitializePolicy::SkipIfLoaded,
            ..Config::default()
        };
        let runner = TensorRunner::new(engine.clone(), config).unwrap();

        assert_eq!(
            runner.initialize(&assets(), "identity.onnx").unwrap(),
            InitOutcome::Loaded
        );
        assert_eq!(
            runner.initialize(&assets(), "failing.onnx").unwrap(),
            InitOutcome::AlreadyLoaded
        );

        assert_eq!(engine.bind_count(), 1);
        assert_eq!(runner.loaded_graph().as_deref(), Some("identity.onnx"));
    }

    #[test]
    fn test_dispose() {
        let runner = runner(MockEngine::default());
        runner.initialize(&assets(), "identity.onnx").unwrap();

        assert!(runner.dispose().unwrap());
        assert!(!runner.dispose().unwrap());
        assert!(matches!(
            runner.run_same_size(&[0; 4], 2, 2),
            Err(Error::NotInitialized)
        ));
    }

    #[test]
    fn test_concurrent_runs_and_reload() {
        let runner = Arc::new(runner(MockEngine::default()));
        runner.initialize(&assets(), "identity.onnx").unwrap();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let runner = Arc::clone(&runner);
                std::thread::spawn(move || {
                    let pixels = vec![pack_rgb([i, i, i]); 16];
                    for _ in 0..20 {
                        let out = runner.run_same_size(&pixels, 4, 4).unwrap();
                        assert_eq!(out, pixels);
                    }
                })
            })
            .collect();

        for _ in 0..5 {
            runner.initialize(&assets(), "identity.onnx").unwrap();
        }

        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_invalid_config() {
        let config = Config {
            shape_input_name: "input".to_string(),
            ..Config::default()
        };
        assert!(TensorRunner::new(MockEngine::default(), config).is_err());

        let config = Config {
            output_name: String::new(),
            ..Config::default()
        };
        assert!(TensorRunner::new(MockEngine::default(), config).is_err());
    }
}
