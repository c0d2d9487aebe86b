//! Image loading utilities.

use std::path::Path;

use image::DynamicImage;

use crate::error::{Error, Result};

/// Load an image from disk, keeping its channel layout.
///
/// # Errors
///
/// Returns an error if the image cannot be opened or decoded.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path = path.as_ref();

    let img = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(
        "Loaded {} ({}x{}, {:?})",
        path.display(),
        img.width(),
        img.height(),
        img.color()
    );

    Ok(img)
}
