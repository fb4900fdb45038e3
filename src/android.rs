//! JNI entry points for `uk.tensorstyle.TensorRunner`.
//!
//! The Java class calls `initTS` once with its `AssetManager` and a graph path,
//! then `execTSGraph` / `execTSGraph2` per frame. Failures are logged to
//! logcat and collapse to `-1` or `null`.

#![allow(non_snake_case)]

use std::ffi::{c_void, CString};
use std::io;
use std::ptr::NonNull;
use std::sync::{Once, OnceLock};

use jni::objects::{JObject, JString};
use jni::sys::{jint, jintArray, jsize};
use jni::JNIEnv;
use ndk_sys::android_LogPriority;
use thiserror::Error;

use crate::error::{Error, STATUS_FAILED, STATUS_OK};
use crate::model::{AssetStore, OnnxEngine};
use crate::pipeline::{Config, RunRequest, TensorRunner};

const LOG_TAG: &str = "TensorStyle";

static RUNNER: OnceLock<TensorRunner<OnnxEngine>> = OnceLock::new();
static LOGGING: Once = Once::new();

#[derive(Error, Debug)]
enum BridgeError {
    #[error("JNI call failed: {0}")]
    Jni(#[from] jni::errors::Error),

    #[error(transparent)]
    Runner(#[from] Error),
}

/// Route `tracing` events to logcat. Called first in every entry point.
fn init_logging() {
    LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_writer(LogcatWriter::default)
            .with_ansi(false)
            .without_time()
            .with_target(false)
            .try_init();
    });
}

fn runner() -> Result<&'static TensorRunner<OnnxEngine>, Error> {
    if let Some(runner) = RUNNER.get() {
        return Ok(runner);
    }

    let runner = TensorRunner::new(OnnxEngine, Config::default())?;
    Ok(RUNNER.get_or_init(|| runner))
}

/// Assets bundled in the APK, read through the NDK asset manager.
///
/// Only valid for the JNI call that produced it.
struct AndroidAssets {
    manager: NonNull<ndk_sys::AAssetManager>,
}

impl AndroidAssets {
    fn from_java(env: &JNIEnv<'_>, asset_manager: JObject<'_>) -> io::Result<Self> {
        // SAFETY: both pointers come from the live JNI call frame.
        let manager = unsafe {
            ndk_sys::AAssetManager_fromJava(
                env.get_native_interface().cast(),
                asset_manager.into_inner().cast(),
            )
        };

        NonNull::new(manager)
            .map(|manager| Self { manager })
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "null AssetManager"))
    }
}

impl AssetStore for AndroidAssets {
    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        let c_path = CString::new(path)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;

        // SAFETY: the manager is valid for this call; the asset is closed below.
        let asset = unsafe {
            ndk_sys::AAssetManager_open(
                self.manager.as_ptr(),
                c_path.as_ptr(),
                ndk_sys::AASSET_MODE_BUFFER as _,
            )
        };
        let asset = NonNull::new(asset).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no asset at {path:?}"))
        })?;

        let result = read_asset(asset);

        // SAFETY: `asset` came from `AAssetManager_open` and is closed exactly once.
        unsafe { ndk_sys::AAsset_close(asset.as_ptr()) };
        result
    }
}

fn read_asset(asset: NonNull<ndk_sys::AAsset>) -> io::Result<Vec<u8>> {
    // SAFETY: the caller holds an open asset for the duration of this call.
    let len = unsafe { ndk_sys::AAsset_getLength64(asset.as_ptr()) };
    let len = usize::try_from(len)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "negative asset length"))?;

    let mut bytes = vec![0u8; len];
    let mut filled = 0;
    while filled < len {
        // SAFETY: the destination is the unfilled tail of `bytes`, exactly
        // `len - filled` bytes long.
        let read = unsafe {
            ndk_sys::AAsset_read(
                asset.as_ptr(),
                bytes[filled..].as_mut_ptr().cast::<c_void>(),
                (len - filled) as _,
            )
        };
        match usize::try_from(read) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(_) => return Err(io::Error::other("asset read failed")),
        }
    }
    bytes.truncate(filled);

    Ok(bytes)
}

#[no_mangle]
pub extern "system" fn Java_uk_tensorstyle_TensorRunner_initTS<'local>(
    env: JNIEnv<'local>,
    _this: JObject<'local>,
    asset_manager: JObject<'local>,
    model: JString<'local>,
) -> jint {
    init_logging();
    match init(&env, asset_manager, model) {
        Ok(()) => STATUS_OK,
        Err(err) => {
            tracing::error!("initTS failed: {err}");
            STATUS_FAILED
        }
    }
}

fn init<'a>(
    env: &JNIEnv<'a>,
    asset_manager: JObject<'a>,
    model: JString<'a>,
) -> Result<(), BridgeError> {
    let model: String = env.get_string(model)?.into();
    let assets = AndroidAssets::from_java(env, asset_manager).map_err(|source| Error::Asset {
        path: model.clone(),
        source,
    })?;

    runner()?.initialize(&assets, &model)?;
    Ok(())
}

#[no_mangle]
pub extern "system" fn Java_uk_tensorstyle_TensorRunner_execTSGraph(
    env: JNIEnv<'_>,
    _this: JObject<'_>,
    image: jintArray,
    height: jint,
    width: jint,
) -> jintArray {
    init_logging();
    exec_or_null(&env, image, height, width, 0, 0)
}

#[no_mangle]
pub extern "system" fn Java_uk_tensorstyle_TensorRunner_execTSGraph2(
    env: JNIEnv<'_>,
    _this: JObject<'_>,
    image: jintArray,
    height: jint,
    width: jint,
    out_height: jint,
    out_width: jint,
) -> jintArray {
    init_logging();
    exec_or_null(&env, image, height, width, out_height, out_width)
}

fn exec_or_null(
    env: &JNIEnv<'_>,
    image: jintArray,
    height: jint,
    width: jint,
    out_height: jint,
    out_width: jint,
) -> jintArray {
    match exec(env, image, height, width, out_height, out_width) {
        Ok(result) => result,
        Err(err) => {
            tracing::error!("execTSGraph failed: {err}");
            std::ptr::null_mut()
        }
    }
}

fn exec(
    env: &JNIEnv<'_>,
    image: jintArray,
    height: jint,
    width: jint,
    out_height: jint,
    out_width: jint,
) -> Result<jintArray, BridgeError> {
    let request = RunRequest::from_raw(height, width, out_height, out_width)?;

    let len = usize::try_from(env.get_array_length(image)?).unwrap_or(0);
    let mut pixels = vec![0; len];
    env.get_int_array_region(image, 0, &mut pixels)?;

    let result = runner()?.run(&pixels, request)?;
    drop(pixels);

    let out_len = jsize::try_from(result.len())
        .map_err(|_| Error::invalid_parameter("output size", "exceeds Java array limits"))?;
    let array = env.new_int_array(out_len)?;
    env.set_int_array_region(array, 0, &result)?;

    tracing::debug!("Returning {out_len} pixels");
    Ok(array)
}

/// Buffers one formatted event and hands it to logcat on drop.
#[derive(Default)]
struct LogcatWriter {
    line: Vec<u8>,
}

impl io::Write for LogcatWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.line.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for LogcatWriter {
    fn drop(&mut self) {
        self.line.retain(|&b| b != 0);
        let priority = if self.line.starts_with(b"ERROR") {
            android_LogPriority::ANDROID_LOG_ERROR
        } else if self.line.starts_with(b" WARN") {
            android_LogPriority::ANDROID_LOG_WARN
        } else {
            android_LogPriority::ANDROID_LOG_INFO
        };

        let (Ok(tag), Ok(msg)) = (CString::new(LOG_TAG), CString::new(std::mem::take(&mut self.line)))
        else {
            return;
        };
        // SAFETY: both strings are NUL-terminated and outlive the call.
        unsafe { ndk_sys::__android_log_write(priority.0 as i32, tag.as_ptr(), msg.as_ptr()) };
    }
}
