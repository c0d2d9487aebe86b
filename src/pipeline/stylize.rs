//! Style transfer orchestration: resize, encode, align, blend, decode, restore.

use std::borrow::Cow;

use image::{DynamicImage, GenericImageView};

use crate::error::{Error, Result};
use crate::image::{self as img, MAX_DIMENSION};

use super::adain::align_to_stats;
use super::backend::InferenceBackend;
use super::blend::blend;
use super::stats::{channel_stats, ChannelStats};

/// Configuration for a style transfer session.
#[derive(Debug, Clone)]
pub struct Config {
    /// Style strength (0.0-1.0). 1.0 applies the full style, 0.0 keeps the content features.
    pub alpha: f32,

    /// Longest side of the working image. Larger content images are
    /// downscaled before encoding and restored afterwards.
    pub max_dimension: u32,

    /// Output JPEG quality (1-100).
    pub output_quality: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            max_dimension: MAX_DIMENSION,
            output_quality: 95,
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(Error::InvalidParameter {
                name: "alpha".to_string(),
                reason: "must be between 0.0 and 1.0".to_string(),
            });
        }

        if self.max_dimension == 0 {
            return Err(Error::InvalidParameter {
                name: "max_dimension".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if !(1..=100).contains(&self.output_quality) {
            return Err(Error::InvalidParameter {
                name: "output_quality".to_string(),
                reason: "must be between 1 and 100".to_string(),
            });
        }

        Ok(())
    }
}

/// How a call to [`Stylizer::apply_with_outcome`] ended.
#[derive(Debug)]
pub enum Outcome {
    /// The style was applied.
    Styled,
    /// Styling was not attempted: the content image was empty or no backend is loaded.
    Skipped(Error),
    /// Styling was attempted and failed; the content image was returned.
    Failed(Error),
}

impl Outcome {
    /// Whether the returned image carries the style.
    #[must_use]
    pub fn is_styled(&self) -> bool {
        matches!(self, Self::Styled)
    }

    /// The cause of a pass-through, if any.
    #[must_use]
    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Styled => None,
            Self::Skipped(err) | Self::Failed(err) => Some(err),
        }
    }
}

/// Applies one style image to any number of content images.
///
/// The backend is injected by the caller; `None` stands for a backend that
/// failed to load, in which case every content image passes through
/// unchanged. Style statistics are computed on first use and reused until
/// [`Stylizer::set_style`] replaces the style.
///
/// Calls take `&mut self` and run to completion on the calling thread. To
/// stylize from several threads, give each thread its own `Stylizer` over a
/// [`SharedBackend`](super::SharedBackend).
pub struct Stylizer<B> {
    config: Config,
    backend: Option<B>,
    style: DynamicImage,
    style_stats: Option<ChannelStats>,
}

impl<B: InferenceBackend> Stylizer<B> {
    /// Bind a style image and configuration to a backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the style image is empty.
    pub fn new(backend: Option<B>, style: DynamicImage, config: Config) -> Result<Self> {
        config.validate()?;
        ensure_not_empty(&style, "style")?;

        if backend.is_none() {
            tracing::warn!("No inference backend loaded; images will pass through unchanged");
        }
        tracing::info!(
            "Style bound ({}x{}), alpha {}",
            style.width(),
            style.height(),
            config.alpha
        );

        Ok(Self {
            config,
            backend,
            style,
            style_stats: None,
        })
    }

    /// The session configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The injected backend, if one is loaded.
    #[must_use]
    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    /// Replace the style image, discarding cached style statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the style image is empty.
    pub fn set_style(&mut self, style: DynamicImage) -> Result<()> {
        ensure_not_empty(&style, "style")?;
        self.style = style;
        self.style_stats = None;
        Ok(())
    }

    /// Stylize `content`, returning it unchanged if anything goes wrong.
    ///
    /// The result always has the dimensions and channel count of `content`.
    pub fn apply(&mut self, content: &DynamicImage) -> DynamicImage {
        self.apply_with_outcome(content).0
    }

    /// Like [`Stylizer::apply`], also reporting whether the style was applied.
    pub fn apply_with_outcome(&mut self, content: &DynamicImage) -> (DynamicImage, Outcome) {
        if let Err(err) = self.guard(content) {
            tracing::warn!("Style transfer skipped: {err}");
            return (content.clone(), Outcome::Skipped(err));
        }

        match self.stylize(content) {
            Ok(styled) => (styled, Outcome::Styled),
            Err(err) => {
                tracing::warn!("Style transfer failed, returning content unchanged: {err}");
                (content.clone(), Outcome::Failed(err))
            }
        }
    }

    /// Stylize `content`, surfacing any failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the content image is empty, no backend is loaded,
    /// or any pipeline stage fails.
    pub fn try_apply(&mut self, content: &DynamicImage) -> Result<DynamicImage> {
        self.guard(content)?;
        self.stylize(content)
    }

    fn guard(&self, content: &DynamicImage) -> Result<()> {
        ensure_not_empty(content, "content")?;
        if self.backend.is_none() {
            return Err(Error::BackendUnavailable);
        }
        Ok(())
    }

    fn stylize(&mut self, content: &DynamicImage) -> Result<DynamicImage> {
        let Some(backend) = self.backend.as_mut() else {
            return Err(Error::BackendUnavailable);
        };

        let (width, height) = content.dimensions();
        let working: Cow<'_, DynamicImage> =
            match img::fit_within(width, height, self.config.max_dimension) {
                Some((w, h)) => {
                    tracing::debug!("Downscaling {width}x{height} to {w}x{h}");
                    Cow::Owned(img::downscale_area(content, w, h)?)
                }
                None => Cow::Borrowed(content),
            };

        tracing::info!("Encoding content...");
        let content_feats = backend.encode(&img::image_to_tensor(&working))?;
        tracing::debug!("Content features: {:?}", content_feats.shape());

        let style_stats = match self.style_stats.take() {
            Some(stats) => stats,
            None => {
                tracing::info!("Encoding style...");
                let style_feats = backend.encode(&img::image_to_tensor(&self.style))?;
                tracing::debug!("Style features: {:?}", style_feats.shape());
                channel_stats(&style_feats)?
            }
        };
        let aligned = align_to_stats(&content_feats, &style_stats);
        self.style_stats = Some(style_stats);

        let features = blend(aligned?, &content_feats, self.config.alpha)?;

        tracing::info!("Decoding...");
        let decoded = backend.decode(&features)?;
        let mut stylized = DynamicImage::ImageRgb8(img::tensor_to_image(&decoded)?);

        if stylized.dimensions() != (width, height) {
            tracing::debug!(
                "Restoring {}x{} to {width}x{height}",
                stylized.width(),
                stylized.height()
            );
            stylized = img::resize_to(&stylized, width, height);
        }

        img::match_layout(stylized.into_rgb8(), content)
    }
}

fn ensure_not_empty(image: &DynamicImage, role: &'static str) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::EmptyImage { role });
    }
    Ok(())
}
