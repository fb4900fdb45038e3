//! Per-call geometry.

use crate::error::{Error, Result};
use crate::image::ImageSize;

/// Geometry of one run: the input size and an optional output size.
///
/// Without an output size the result has the input's dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunRequest {
    pub input: ImageSize,
    pub output: Option<ImageSize>,
}

impl RunRequest {
    /// Same-resolution request.
    #[must_use]
    pub const fn new(input: ImageSize) -> Self {
        Self {
            input,
            output: None,
        }
    }

    /// Request a different output resolution. A zero dimension keeps the
    /// matching input dimension.
    #[must_use]
    pub const fn with_output(mut self, output: ImageSize) -> Self {
        self.output = Some(output);
        self
    }

    /// Build a request from boundary values.
    ///
    /// A non-positive `out_height` or `out_width` falls back to the matching
    /// input dimension, each independently.
    ///
    /// # Errors
    ///
    /// Returns an error if `height` or `width` is not positive.
    pub fn from_raw(height: i32, width: i32, out_height: i32, out_width: i32) -> Result<Self> {
        let input = ImageSize::from_raw(height, width)?;

        let output = ImageSize {
            height: usize::try_from(out_height)
                .ok()
                .filter(|&h| h > 0)
                .unwrap_or(input.height),
            width: usize::try_from(out_width)
                .ok()
                .filter(|&w| w > 0)
                .unwrap_or(input.width),
        };

        Ok(Self {
            input,
            output: (output != input).then_some(output),
        })
    }

    /// The size of the result buffer.
    ///
    /// Each output dimension left at zero falls back to the input dimension.
    #[must_use]
    pub fn output_size(&self) -> ImageSize {
        let Some(output) = self.output else {
            return self.input;
        };

        ImageSize {
            height: if output.height == 0 { self.input.height } else { output.height },
            width: if output.width == 0 { self.input.width } else { output.width },
        }
    }

    /// Check the input size is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the input height or width is zero.
    pub fn validate(&self) -> Result<()> {
        if self.input.height == 0 {
            return Err(Error::invalid_parameter("height", "must be positive, got 0"));
        }
        if self.input.width == 0 {
            return Err(Error::invalid_parameter("width", "must be positive, got 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_is_input() {
        let request = RunRequest::new(ImageSize::new(4, 6));
        assert_eq!(request.output_size(), ImageSize::new(4, 6));
    }

    #[test]
    fn test_explicit_output() {
        let request = RunRequest::new(ImageSize::new(4, 6)).with_output(ImageSize::new(2, 3));
        assert_eq!(request.output_size(), ImageSize::new(2, 3));
    }

    #[test]
    fn test_from_raw_sentinels() {
        let request = RunRequest::from_raw(4, 6, 0, 0).unwrap();
        assert_eq!(request.output, None);

        let request = RunRequest::from_raw(4, 6, 8, -1).unwrap();
        assert_eq!(request.output_size(), ImageSize::new(8, 6));

        let request = RunRequest::from_raw(4, 6, 0, 12).unwrap();
        assert_eq!(request.output_size(), ImageSize::new(4, 12));
    }

    #[test]
    fn test_zero_output_dims_fall_back() {
        let input = ImageSize::new(4, 6);

        let request = RunRequest::new(input).with_output(ImageSize::new(0, 0));
        assert_eq!(request.output_size(), input);

        let request = RunRequest::new(input).with_output(ImageSize::new(2, 0));
        assert_eq!(request.output_size(), ImageSize::new(2, 6));

        let request = RunRequest::new(input).with_output(ImageSize::new(0, 3));
        assert_eq!(request.output_size(), ImageSize::new(4, 3));
    }

    #[test]
    fn test_validate_rejects_zero_input() {
        assert!(RunRequest::new(ImageSize::new(4, 6)).validate().is_ok());
        assert!(RunRequest::new(ImageSize::new(0, 0)).validate().is_err());
        assert!(RunRequest::new(ImageSize::new(4, 0)).validate().is_err());
    }

    #[test]
    fn test_from_raw_rejects_bad_input() {
        assert!(RunRequest::from_raw(0, 6, 2, 3).is_err());
        assert!(RunRequest::from_raw(4, -6, 0, 0).is_err());
    }
}
