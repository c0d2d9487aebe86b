//! Image loading, tensor conversion, geometry, and saving utilities.

mod geometry;
mod load;
mod save;
mod tensor;

pub use geometry::{
    attach_alpha, downscale_area, extract_alpha, fit_within, has_alpha, match_layout, resize_to,
};
pub use load::load_image;
pub use save::save_image;
pub use tensor::{image_to_tensor, tensor_to_image};

use ndarray::Array4;

/// Image tensor in NCHW format (batch, channels, height, width).
/// Channels are in BGR order with the per-channel mean offset subtracted.
pub type ImageTensor = Array4<f32>;

/// Per-channel mean offset subtracted before encoding, in BGR order.
pub const MEAN_OFFSET: [f32; 3] = [103.939, 116.779, 123.68];

/// Longest side, in pixels, of the working image fed to the encoder.
pub const MAX_DIMENSION: u32 = 1024;

/// Number of color channels in encoder input and decoder output.
pub const RGB_CHANNELS: usize = 3;
