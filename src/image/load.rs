//! Image loading utilities.

use std::path::Path;

use image::{DynamicImage, GenericImageView};

use crate::error::{Error, Result};

use super::{pack_rgb, ImageSize};

/// Load an image from disk as a row-major buffer of packed `0xAARRGGBB` pixels.
///
/// This mirrors what an Android `Bitmap.getPixels` call hands to the bridge,
/// so a desktop run sees the same input layout.
///
/// # Errors
///
/// Returns an error if the image cannot be loaded.
pub fn load_pixels<P: AsRef<Path>>(path: P) -> Result<(Vec<i32>, ImageSize)> {
    let path = path.as_ref();

    let img = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;

    let (width, height) = img.dimensions();
    tracing::debug!("Loaded {} ({width}x{height})", path.display());

    Ok((image_to_pixels(&img), ImageSize::new(height as usize, width as usize)))
}

/// Convert a `DynamicImage` to packed pixels with alpha preserved.
#[allow(clippy::cast_possible_wrap)]
fn image_to_pixels(img: &DynamicImage) -> Vec<i32> {
    img.to_rgba8()
        .pixels()
        .map(|p| {
            let [r, g, b, a] = p.0;
            let alpha = u32::from(a) << 24;
            ((pack_rgb([r, g, b]) as u32 & 0x00FF_FFFF) | alpha) as i32
        })
        .collect()
}
