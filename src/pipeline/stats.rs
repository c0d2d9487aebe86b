//! Per-channel statistics over feature tensors.

use ndarray::{Array1, ArrayBase, Axis, Data, Dimension, Ix4};

use crate::error::{Error, Result};

/// Mean and population standard deviation of every feature channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelStats {
    /// Arithmetic mean per channel.
    pub mean: Array1<f32>,
    /// Population (biased) standard deviation per channel.
    pub std: Array1<f32>,
}

impl ChannelStats {
    /// Number of channels described.
    #[must_use]
    pub fn channels(&self) -> usize {
        self.mean.len()
    }
}

/// Compute per-channel mean and standard deviation of an NCHW tensor.
///
/// Each (height x width) plane is treated as one population, so the standard
/// deviation divides by `H * W`, not `H * W - 1`. Sums are accumulated in
/// `f64`.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if the tensor is not 4-D, its batch size
/// is not 1, or its spatial planes are empty.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn channel_stats<S, D>(features: &ArrayBase<S, D>) -> Result<ChannelStats>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    let features = features
        .view()
        .into_dimensionality::<Ix4>()
        .map_err(|_| Error::ShapeMismatch {
            expected: "4D tensor".to_string(),
            actual: format!("{}D tensor", features.ndim()),
        })?;

    let (batch, channels, height, width) = features.dim();
    if batch != 1 {
        return Err(Error::ShapeMismatch {
            expected: "batch size 1".to_string(),
            actual: format!("batch size {batch}"),
        });
    }
    if height == 0 || width == 0 {
        return Err(Error::ShapeMismatch {
            expected: "non-empty spatial plane".to_string(),
            actual: format!("{height}x{width} plane"),
        });
    }

    let population = (height * width) as f64;
    let mut mean = Array1::<f32>::zeros(channels);
    let mut std = Array1::<f32>::zeros(channels);

    for (c, plane) in features.index_axis(Axis(0), 0).outer_iter().enumerate() {
        let m = plane.iter().map(|&v| f64::from(v)).sum::<f64>() / population;
        let variance = plane
            .iter()
            .map(|&v| {
                let d = f64::from(v) - m;
                d * d
            })
            .sum::<f64>()
            / population;

        mean[c] = m as f32;
        std[c] = variance.sqrt() as f32;
    }

    Ok(ChannelStats { mean, std })
}
