//! Packed-pixel <-> tensor conversion, plus image file helpers.

mod decode;
mod encode;
mod load;
mod save;

pub use decode::{decode_pixels, decode_pixels_into};
pub use encode::{encode_pixels, shape_tensor};
pub use load::load_pixels;
pub use save::save_pixels;

use ndarray::{Array1, Array3};

use crate::error::{Error, Result};

/// Image tensor in HWC format (height, width, channels).
/// Values are normalized to [0, 1].
pub type ImageTensor = Array3<f32>;

/// The `[height, width, channels]` tensor fed next to the image.
pub type ShapeTensor = Array1<i32>;

/// Number of channels in RGB images.
pub const RGB_CHANNELS: usize = 3;

/// Alpha bits forced on every decoded pixel.
pub const OPAQUE_ALPHA: u32 = 0xFF00_0000;

/// Height and width of a packed-pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub height: usize,
    pub width: usize,
}

impl ImageSize {
    #[must_use]
    pub const fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    /// Build a size from signed boundary values, rejecting non-positive ones.
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is zero or negative.
    pub fn from_raw(height: i32, width: i32) -> Result<Self> {
        let height = positive_dim("height", height)?;
        let width = positive_dim("width", width)?;
        Ok(Self { height, width })
    }

    /// Number of pixels, or an error when the product overflows.
    ///
    /// # Errors
    ///
    /// Returns an error if `height * width` does not fit in `usize`.
    pub fn pixel_count(&self) -> Result<usize> {
        self.height
            .checked_mul(self.width)
            .ok_or_else(|| Error::invalid_parameter("size", format!("{self} overflows")))
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.height, self.width)
    }
}

fn positive_dim(name: &str, value: i32) -> Result<usize> {
    usize::try_from(value)
        .ok()
        .filter(|&v| v > 0)
        .ok_or_else(|| Error::invalid_parameter(name, format!("must be positive, got {value}")))
}

/// Split a packed `0xAARRGGBB` pixel into its red, green and blue bytes.
#[inline]
#[must_use]
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
pub const fn unpack_rgb(pixel: i32) -> [u8; 3] {
    let p = pixel as u32;
    [(p >> 16) as u8, (p >> 8) as u8, p as u8]
}

/// Pack red, green and blue bytes into an opaque `0xFFRRGGBB` pixel.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn pack_rgb(rgb: [u8; 3]) -> i32 {
    (OPAQUE_ALPHA | ((rgb[0] as u32) << 16) | ((rgb[1] as u32) << 8) | rgb[2] as u32) as i32
}
