//! Adaptive Instance Normalization.

use ndarray::Axis;

use crate::error::{Error, Result};

use super::backend::FeatureTensor;
use super::stats::{channel_stats, ChannelStats};

/// Added to the content standard deviation before dividing, so flat channels
/// collapse to the style mean instead of dividing by zero.
pub const EPSILON: f32 = 1e-5;

/// Rewrite the channel statistics of `content` to match those of `style`.
///
/// Every channel plane is renormalized as
/// `(x - content_mean) / (content_std + EPSILON) * style_std + style_mean`.
/// Only the per-channel scalars of `style` are used, so its spatial size may
/// differ from that of `content`. The result is a new tensor with the shape
/// of `content`.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if either tensor has a batch size other
/// than 1 or the channel counts differ.
pub fn align(content: &FeatureTensor, style: &FeatureTensor) -> Result<FeatureTensor> {
    let style_stats = channel_stats(style)?;
    align_to_stats(content, &style_stats)
}

/// Like [`align`], with the style statistics already computed.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if `content` has a batch size other than
/// 1 or its channel count differs from `style`.
pub fn align_to_stats(content: &FeatureTensor, style: &ChannelStats) -> Result<FeatureTensor> {
    let content_stats = channel_stats(content)?;

    if content_stats.channels() != style.channels() {
        return Err(Error::ShapeMismatch {
            expected: format!("{} style channels", content_stats.channels()),
            actual: format!("{} style channels", style.channels()),
        });
    }

    let mut aligned = content.clone();

    for (c, mut plane) in aligned
        .index_axis_mut(Axis(0), 0)
        .outer_iter_mut()
        .enumerate()
    {
        let content_mean = content_stats.mean[c];
        let content_std = content_stats.std[c];
        let style_mean = style.mean[c];
        let style_std = style.std[c];

        plane.mapv_inplace(|v| (v - content_mean) / (content_std + EPSILON) * style_std + style_mean);
    }

    Ok(aligned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    #[allow(clippy::cast_precision_loss)]
    fn wave(shape: (usize, usize, usize, usize), phase: f32, scale: f32) -> FeatureTensor {
        Array4::from_shape_fn(shape, |(_, c, y, x)| {
            let t = (c * 31 + y * 7 + x) as f32;
            (t * 0.37 + phase).sin() * scale * (c as f32 + 1.0) + c as f32 * 2.0
        })
    }

    fn close(actual: f32, expected: f32) -> bool {
        (actual - expected).abs() <= 1e-4 * expected.abs().max(1.0)
    }

    #[test]
    fn test_aligned_matches_style_statistics() {
        let content = wave((1, 4, 6, 5), 0.0, 1.5);
        let style = wave((1, 4, 9, 3), 1.3, 4.0);

        let aligned = align(&content, &style).unwrap();
        let got = channel_stats(&aligned).unwrap();
        let want = channel_stats(&style).unwrap();

        assert_eq!(aligned.dim(), content.dim());
        for c in 0..4 {
            assert!(close(got.mean[c], want.mean[c]), "mean of channel {c}");
            assert!(close(got.std[c], want.std[c]), "std of channel {c}");
        }
    }

    #[test]
    fn test_preserves_normalized_structure() {
        let content = wave((1, 2, 4, 4), 0.5, 2.0);
        let style = wave((1, 2, 3, 3), 2.0, 0.5);

        let aligned = align(&content, &style).unwrap();
        let content_stats = channel_stats(&content).unwrap();
        let aligned_stats = channel_stats(&aligned).unwrap();

        for ((_, c, y, x), &v) in content.indexed_iter() {
            let before = (v - content_stats.mean[c]) / content_stats.std[c];
            let after = (aligned[[0, c, y, x]] - aligned_stats.mean[c]) / aligned_stats.std[c];
            assert!((before - after).abs() < 1e-3);
        }
    }

    #[test]
    fn test_constant_channel_collapses_to_style_mean() {
        let content = Array4::from_elem((1, 1, 3, 3), 5.0_f32);
        let style = Array4::from_shape_vec((1, 1, 1, 4), vec![1.0, 2.0, 3.0, 4.0]).unwrap();

        let aligned = align(&content, &style).unwrap();

        assert!(aligned.iter().all(|&v| (v - 2.5).abs() < 1e-6));
    }

    #[test]
    fn test_content_left_untouched() {
        let content = wave((1, 2, 3, 3), 0.0, 1.0);
        let snapshot = content.clone();
        let style = wave((1, 2, 3, 3), 1.0, 3.0);

        let _ = align(&content, &style).unwrap();

        assert_eq!(content, snapshot);
    }

    #[test]
    fn test_channel_count_mismatch() {
        let content = Array4::<f32>::zeros((1, 3, 2, 2));
        let style = Array4::<f32>::zeros((1, 4, 2, 2));

        assert!(matches!(
            align(&content, &style),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_align_to_cached_stats_matches_align() {
        let content = wave((1, 3, 5, 5), 0.2, 1.0);
        let style = wave((1, 3, 4, 6), 0.9, 2.5);
        let stats = channel_stats(&style).unwrap();

        assert_eq!(
            align(&content, &style).unwrap(),
            align_to_stats(&content, &stats).unwrap()
        );
    }
}
