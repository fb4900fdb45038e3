//! # `tensorstyle`
//!
//! Runs image-to-image inference graphs on packed ARGB pixel buffers.
//!
//! A [`TensorRunner`] owns one session. It loads a serialized graph from an
//! [`AssetStore`], then turns `0xAARRGGBB` pixel buffers into `[height, width, 3]`
//! float tensors, runs the graph, and packs the output tensor back into opaque
//! pixels, optionally at a different resolution. On Android the same runner is
//! exposed to `uk.tensorstyle.TensorRunner` through JNI.
//!
//! ## Example
//!
//! ```no_run
//! use tensorstyle::{Config, DirAssetStore, OnnxEngine, TensorRunner};
//!
//! # fn main() -> tensorstyle::Result<()> {
//! let runner = TensorRunner::new(OnnxEngine, Config::default())?;
//! runner.initialize(&DirAssetStore::new("assets"), "style.onnx")?;
//!
//! let pixels = vec![0xFF80_4020_u32 as i32; 64 * 48];
//! let styled = runner.run_same_size(&pixels, 64, 48)?;
//! assert_eq!(styled.len(), 64 * 48);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod image;
pub mod model;
pub mod pipeline;

#[cfg(target_os = "android")]
pub mod android;

pub use error::{Error, ErrorKind, Result, STATUS_FAILED, STATUS_OK};
pub use crate::image::ImageSize;
pub use model::{AssetStore, DirAssetStore, InferenceEngine, MemoryAssetStore, OnnxEngine};
pub use pipeline::{Config, InitOutcome, ReinitializePolicy, RunRequest, TensorRunner};
