//! Conversion between 8-bit images and encoder/decoder tensors.

use image::{DynamicImage, ImageBuffer, Rgb, RgbImage};
use ndarray::Array4;

use crate::error::{Error, Result};

use super::{ImageTensor, MEAN_OFFSET, RGB_CHANNELS};

/// Convert an image to an encoder input tensor.
///
/// The image is converted to 8-bit RGB, its channels are reordered to BGR,
/// and [`MEAN_OFFSET`] is subtracted. No scaling or resizing is applied.
/// The result has shape (1, 3, height, width).
pub fn image_to_tensor(img: &DynamicImage) -> ImageTensor {
    let rgb = img.to_rgb8();
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);

    let mut tensor = Array4::<f32>::zeros((1, RGB_CHANNELS, height, width));

    for (x, y, pixel) in rgb.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        // BGR channel order
        tensor[[0, 0, y, x]] = f32::from(pixel[2]) - MEAN_OFFSET[0];
        tensor[[0, 1, y, x]] = f32::from(pixel[1]) - MEAN_OFFSET[1];
        tensor[[0, 2, y, x]] = f32::from(pixel[0]) - MEAN_OFFSET[2];
    }

    tensor
}

/// Convert a decoder output tensor back to an 8-bit RGB image.
///
/// The mean offset is added back and values saturate at the `u8` bounds.
/// Only the first image of the batch is used.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the tensor is empty or does not hold
/// three channels.
#[allow(clippy::cast_possible_truncation)]
pub fn tensor_to_image(tensor: &ImageTensor) -> Result<RgbImage> {
    let (batch, channels, height, width) = tensor.dim();

    if batch == 0 || height == 0 || width == 0 {
        return Err(Error::Decode {
            reason: format!("empty tensor of shape {:?}", tensor.shape()),
        });
    }
    if channels != RGB_CHANNELS {
        return Err(Error::Decode {
            reason: format!("expected {RGB_CHANNELS} channels, got {channels}"),
        });
    }

    let (Ok(img_width), Ok(img_height)) = (u32::try_from(width), u32::try_from(height)) else {
        return Err(Error::Decode {
            reason: format!("tensor dimensions {width}x{height} exceed image limits"),
        });
    };

    let img = ImageBuffer::from_fn(img_width, img_height, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let b = denormalize(tensor[[0, 0, y, x]], MEAN_OFFSET[0]);
        let g = denormalize(tensor[[0, 1, y, x]], MEAN_OFFSET[1]);
        let r = denormalize(tensor[[0, 2, y, x]], MEAN_OFFSET[2]);
        Rgb([r, g, b])
    });

    Ok(img)
}

/// Add back the channel offset and saturate into the 8-bit range.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn denormalize(value: f32, offset: f32) -> u8 {
    // Safe: clamped to [0, 255] range before casting
    (value + offset).round().clamp(0.0, 255.0) as u8
}
