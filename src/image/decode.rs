//! Float output tensors back to packed pixels.

use ndarray::{ArrayView3, ArrayViewD, Axis, Ix3};

use crate::error::{Error, Result};

use super::{pack_rgb, ImageSize, RGB_CHANNELS};

/// Convert an HWC output tensor to a freshly allocated packed-pixel buffer.
///
/// See [`decode_pixels_into`] for the conversion rules.
///
/// # Errors
///
/// Returns an error if the tensor cannot cover `size`.
pub fn decode_pixels(output: ArrayViewD<'_, f32>, size: ImageSize) -> Result<Vec<i32>> {
    let mut pixels = Vec::with_capacity(size.pixel_count()?);
    decode_pixels_into(output, size, &mut pixels)?;
    Ok(pixels)
}

/// Append `size.height * size.width` opaque pixels decoded from `output` to `out`.
///
/// Cells are read at `[y, x, 0..3]` in row-major order; the tensor may be
/// larger than `size`, in which case only the top-left region is read. A
/// rank-4 tensor with a leading batch of 1 is accepted.
///
/// # Errors
///
/// Returns an error if the tensor rank is wrong or it is smaller than `size`
/// in any dimension.
pub fn decode_pixels_into(
    output: ArrayViewD<'_, f32>,
    size: ImageSize,
    out: &mut Vec<i32>,
) -> Result<()> {
    let tensor = as_hwc(output)?;
    let (height, width, channels) = tensor.dim();

    if height < size.height || width < size.width || channels < RGB_CHANNELS {
        return Err(Error::ShapeMismatch {
            expected: format!(
                "at least [{}, {}, {RGB_CHANNELS}]",
                size.height, size.width
            ),
            actual: format!("[{height}, {width}, {channels}]"),
        });
    }

    for y in 0..size.height {
        for x in 0..size.width {
            let r = denormalize(tensor[[y, x, 0]]);
            let g = denormalize(tensor[[y, x, 1]]);
            let b = denormalize(tensor[[y, x, 2]]);
            out.push(pack_rgb([r, g, b]));
        }
    }

    Ok(())
}

fn as_hwc(output: ArrayViewD<'_, f32>) -> Result<ArrayView3<'_, f32>> {
    let output = if output.ndim() == 4 && output.shape()[0] == 1 {
        output.index_axis_move(Axis(0), 0)
    } else {
        output
    };

    let shape = output.shape().to_vec();
    output
        .into_dimensionality::<Ix3>()
        .map_err(|_| Error::ShapeMismatch {
            expected: "3D tensor".to_string(),
            actual: format!("{}D tensor {shape:?}", shape.len()),
        })
}

/// Scale a value from [0, 1] to [0, 255], rounding half away from zero and
/// clamping.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn denormalize(value: f32) -> u8 {
    // NaN clamps to NaN and casts to 0
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}
