//! Alpha blending between content and style-aligned features.

use ndarray::Zip;

use crate::error::{Error, Result};

use super::backend::FeatureTensor;

/// Interpolate between style-aligned and original content features.
///
/// Computes `aligned * alpha + content * (1 - alpha)` element-wise. At
/// `alpha == 1.0` the aligned tensor is returned as is, and at `alpha == 0.0`
/// a copy of `content`, so both endpoints are bit-exact. Values outside
/// [0, 1] extrapolate; range checks belong to [`Config::validate`].
///
/// [`Config::validate`]: super::Config::validate
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if the two tensors differ in shape.
#[allow(clippy::float_cmp)]
pub fn blend(aligned: FeatureTensor, content: &FeatureTensor, alpha: f32) -> Result<FeatureTensor> {
    if aligned.dim() != content.dim() {
        return Err(Error::ShapeMismatch {
            expected: format!("{:?}", content.shape()),
            actual: format!("{:?}", aligned.shape()),
        });
    }

    if alpha == 1.0 {
        return Ok(aligned);
    }
    if alpha == 0.0 {
        return Ok(content.clone());
    }

    let mut blended = aligned;
    Zip::from(&mut blended)
        .and(content)
        .for_each(|a, &c| *a = *a * alpha + c * (1.0 - alpha));

    Ok(blended)
}
