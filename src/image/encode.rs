//! Packed pixels to normalized tensors.

use ndarray::{Array1, Array3};

use crate::error::{Error, Result};

use super::{unpack_rgb, ImageSize, ImageTensor, ShapeTensor, RGB_CHANNELS};

/// Convert a row-major packed-pixel buffer to an HWC tensor.
///
/// Each channel is scaled from [0, 255] to [0, 1]. Alpha is dropped.
///
/// # Errors
///
/// Returns an error if `pixels.len()` is not `height * width`.
pub fn encode_pixels(pixels: &[i32], size: ImageSize) -> Result<ImageTensor> {
    let expected = size.pixel_count()?;
    if pixels.len() != expected {
        return Err(Error::ShapeMismatch {
            expected: format!("{expected} pixels ({size})"),
            actual: format!("{} pixels", pixels.len()),
        });
    }

    let mut tensor = Array3::<f32>::zeros((size.height, size.width, RGB_CHANNELS));

    for (i, &pixel) in pixels.iter().enumerate() {
        let (y, x) = (i / size.width, i % size.width);
        let [r, g, b] = unpack_rgb(pixel);
        tensor[[y, x, 0]] = f32::from(r) / 255.0;
        tensor[[y, x, 1]] = f32::from(g) / 255.0;
        tensor[[y, x, 2]] = f32::from(b) / 255.0;
    }

    Ok(tensor)
}

/// Build the `[height, width, 3]` shape tensor fed as the second input.
///
/// # Errors
///
/// Returns an error if a dimension does not fit in `i32`.
pub fn shape_tensor(size: ImageSize) -> Result<ShapeTensor> {
    let height = i32::try_from(size.height)
        .map_err(|_| Error::invalid_parameter("height", "does not fit in i32"))?;
    let width = i32::try_from(size.width)
        .map_err(|_| Error::invalid_parameter("width", "does not fit in i32"))?;

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let channels = RGB_CHANNELS as i32;

    Ok(Array1::from_vec(vec![height, width, channels]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tensor_shape() {
        let pixels = vec![0; 24];
        let tensor = encode_pixels(&pixels, ImageSize::new(4, 6)).unwrap();

        assert_eq!(tensor.shape(), &[4, 6, 3]);
    }

    #[test]
    fn test_channel_order_and_row_major() {
        // Second row, first column is pure red; alpha must not leak in.
        let mut pixels = vec![0xFF00_0000_u32 as i32; 6];
        pixels[3] = 0x80FF_0000_u32 as i32;
        pixels[1] = 0x0000_00FF;

        let tensor = encode_pixels(&pixels, ImageSize::new(2, 3)).unwrap();

        assert!((tensor[[1, 0, 0]] - 1.0).abs() < f32::EPSILON);
        assert!(tensor[[1, 0, 1]].abs() < f32::EPSILON);
        assert!(tensor[[1, 0, 2]].abs() < f32::EPSILON);
        assert!((tensor[[0, 1, 2]] - 1.0).abs() < f32::EPSILON);
        assert!(tensor[[0, 0, 0]].abs() < f32::EPSILON);
    }

    #[test]
    fn test_normalization_range() {
        let pixels = vec![0x00FF_FFFF, 0x0000_0000, 0x0080_8080, 0x0001_0203];
        let tensor = encode_pixels(&pixels, ImageSize::new(2, 2)).unwrap();

        let min = tensor.iter().copied().fold(f32::INFINITY, f32::min);
        let max = tensor.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        assert!(min.abs() < f32::EPSILON);
        assert!((max - 1.0).abs() < f32::EPSILON);
        assert!((tensor[[1, 0, 0]] - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_length_mismatch() {
        let err = encode_pixels(&[0; 5], ImageSize::new(2, 3)).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_shape_tensor() {
        let shape = shape_tensor(ImageSize::new(4, 6)).unwrap();
        assert_eq!(shape.to_vec(), vec![4, 6, 3]);
    }
}
