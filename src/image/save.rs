//! Image saving utilities.

use std::path::Path;

use image::{ImageBuffer, Rgb};

use crate::error::{Error, Result};

use super::{unpack_rgb, ImageSize};

/// Save a packed-pixel buffer as an image file.
///
/// Alpha is dropped; decoded pixels are always opaque. The format is inferred
/// from the extension.
///
/// # Arguments
///
/// * `pixels` - Row-major packed pixels
/// * `size` - Dimensions of `pixels`
/// * `path` - Output file path
/// * `quality` - JPEG quality (1-100), ignored for other formats
///
/// # Errors
///
/// Returns an error if the buffer does not match `size` or the image cannot
/// be saved.
pub fn save_pixels<P: AsRef<Path>>(
    pixels: &[i32],
    size: ImageSize,
    path: P,
    quality: u8,
) -> Result<()> {
    let path = path.as_ref();

    let img = pixels_to_image(pixels, size)?;

    // Determine format and save
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png")
        .to_lowercase();

    match extension.as_str() {
        "jpg" | "jpeg" => {
            let mut output = std::fs::File::create(path)?;
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut output, quality);
            img.write_with_encoder(encoder)
                .map_err(|source| Error::ImageSave {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        _ => {
            img.save(path).map_err(|source| Error::ImageSave {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }

    tracing::debug!("Saved {} ({size})", path.display());
    Ok(())
}

/// Convert packed pixels to an RGB image.
fn pixels_to_image(pixels: &[i32], size: ImageSize) -> Result<ImageBuffer<Rgb<u8>, Vec<u8>>> {
    let expected = size.pixel_count()?;
    if pixels.len() != expected {
        return Err(Error::ShapeMismatch {
            expected: format!("{expected} pixels ({size})"),
            actual: format!("{} pixels", pixels.len()),
        });
    }

    let width = u32::try_from(size.width)
        .map_err(|_| Error::invalid_parameter("width", "does not fit in u32"))?;
    let height = u32::try_from(size.height)
        .map_err(|_| Error::invalid_parameter("height", "does not fit in u32"))?;

    let raw: Vec<u8> = pixels.iter().flat_map(|&p| unpack_rgb(p)).collect();

    ImageBuffer::from_raw(width, height, raw).ok_or_else(|| Error::ShapeMismatch {
        expected: format!("{size} RGB buffer"),
        actual: "short buffer".to_string(),
    })
}
