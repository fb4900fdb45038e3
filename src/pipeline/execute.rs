//! One encode / run / decode pass against a bound session.

use crate::error::{Error, Result};
use crate::image;
use crate::model::{GraphFeed, GraphSession};

use super::request::RunRequest;
use super::runner::Config;

/// Encode `pixels`, run `session`, and decode the output into `out`.
///
/// `out` must be empty; it receives exactly `request.output_size()` pixels on
/// success.
///
/// # Errors
///
/// Returns an error if the pixels do not match the request, the engine fails,
/// or the output tensor is too small for the requested size.
pub fn execute(
    session: &mut dyn GraphSession,
    config: &Config,
    pixels: &[i32],
    request: RunRequest,
    out: &mut Vec<i32>,
) -> Result<()> {
    tracing::debug!("Mapping {} input", request.input);
    let image_tensor = image::encode_pixels(pixels, request.input)?;
    let shape_tensor = image::shape_tensor(request.input)?;

    tracing::debug!("Start computing");
    let output = session
        .run(GraphFeed {
            image_name: &config.input_name,
            image: image_tensor.view(),
            shape_name: &config.shape_input_name,
            shape: shape_tensor.view(),
            output_name: &config.output_name,
        })
        .map_err(|source| Error::Inference { source })?;
    tracing::debug!("End computing, output shape {:?}", output.shape());

    image::decode_pixels_into(output.view(), request.output_size(), out)
}
