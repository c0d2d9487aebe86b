//! Working-size geometry and channel-layout restoration.

use fast_image_resize as fr;
use image::imageops::FilterType;
use image::{
    DynamicImage, GenericImageView, GrayImage, ImageBuffer, Luma, LumaA, RgbImage, Rgba, RgbaImage,
};

use crate::error::{Error, Result};

/// Compute the working size for an image whose sides may exceed `max_dimension`.
///
/// Returns `None` when both sides already fit. Otherwise the longer side is
/// scaled to exactly `max_dimension` and the shorter side keeps the aspect
/// ratio (never below one pixel).
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn fit_within(width: u32, height: u32, max_dimension: u32) -> Option<(u32, u32)> {
    if width <= max_dimension && height <= max_dimension {
        return None;
    }

    let scale = f64::from(max_dimension) / f64::from(width.max(height));
    let scaled = |side: u32| ((f64::from(side) * scale).round() as u32).clamp(1, max_dimension);

    if width >= height {
        Some((max_dimension, scaled(height)))
    } else {
        Some((scaled(width), max_dimension))
    }
}

/// Shrink an image to the working size by area averaging.
///
/// Each output pixel is the mean of the source pixels it covers, so an exact
/// 2x reduction averages every 2x2 block. Only RGB is kept; alpha and luma
/// layouts are restored from the original by [`match_layout`].
///
/// # Errors
///
/// Returns [`Error::Resize`] if the resampler rejects the buffers.
pub fn downscale_area(img: &DynamicImage, width: u32, height: u32) -> Result<DynamicImage> {
    let src = img.to_rgb8();
    let (src_width, src_height) = src.dimensions();

    let src_image =
        fr::images::Image::from_vec_u8(src_width, src_height, src.into_raw(), fr::PixelType::U8x3)
            .map_err(|e| Error::Resize {
                reason: format!("invalid source buffer: {e}"),
            })?;

    let mut dst_image = fr::images::Image::new(width, height, fr::PixelType::U8x3);

    let mut resizer = fr::Resizer::new();
    let options = fr::ResizeOptions::new()
        .resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Box));

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| Error::Resize {
            reason: e.to_string(),
        })?;

    let rgb = RgbImage::from_raw(width, height, dst_image.into_vec()).ok_or_else(|| {
        Error::Resize {
            reason: "resized buffer has unexpected length".to_string(),
        }
    })?;

    Ok(DynamicImage::ImageRgb8(rgb))
}

/// Resize an image to exact dimensions with bilinear interpolation.
#[must_use]
pub fn resize_to(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    img.resize_exact(width, height, FilterType::Triangle)
}

/// Whether the image carries an alpha channel.
#[must_use]
pub fn has_alpha(img: &DynamicImage) -> bool {
    img.color().has_alpha()
}

/// Copy the alpha plane out of an image, if it has one.
#[must_use]
pub fn extract_alpha(img: &DynamicImage) -> Option<GrayImage> {
    if !has_alpha(img) {
        return None;
    }

    let rgba = img.to_rgba8();
    Some(GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        Luma([rgba.get_pixel(x, y)[3]])
    }))
}

/// Combine an RGB image with an alpha plane of the same size.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if the sizes differ.
pub fn attach_alpha(rgb: &RgbImage, alpha: &GrayImage) -> Result<RgbaImage> {
    ensure_same_size(rgb.dimensions(), alpha.dimensions())?;

    Ok(ImageBuffer::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        Rgba([r, g, b, alpha.get_pixel(x, y)[0]])
    }))
}

/// Convert a stylized RGB image to the channel layout of `original`.
///
/// Grayscale originals get a luma result, and any alpha plane is copied
/// unmodified from `original`. The stylized image must already have the
/// original's dimensions.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if the sizes differ.
pub fn match_layout(stylized: RgbImage, original: &DynamicImage) -> Result<DynamicImage> {
    ensure_same_size(stylized.dimensions(), original.dimensions())?;

    let alpha = extract_alpha(original);
    let layout = match (original.color().has_color(), alpha) {
        (true, None) => DynamicImage::ImageRgb8(stylized),
        (true, Some(alpha)) => DynamicImage::ImageRgba8(attach_alpha(&stylized, &alpha)?),
        (false, None) => DynamicImage::ImageLuma8(DynamicImage::ImageRgb8(stylized).to_luma8()),
        (false, Some(alpha)) => {
            let luma = DynamicImage::ImageRgb8(stylized).to_luma8();
            DynamicImage::ImageLumaA8(ImageBuffer::from_fn(luma.width(), luma.height(), |x, y| {
                LumaA([luma.get_pixel(x, y)[0], alpha.get_pixel(x, y)[0]])
            }))
        }
    };

    Ok(layout)
}

fn ensure_same_size(actual: (u32, u32), expected: (u32, u32)) -> Result<()> {
    if actual == expected {
        return Ok(());
    }
    Err(Error::ShapeMismatch {
        expected: format!("{}x{} image", expected.0, expected.1),
        actual: format!("{}x{} image", actual.0, actual.1),
    })
}
