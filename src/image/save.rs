//! Image saving utilities.

use std::path::Path;

use image::DynamicImage;

use crate::error::{Error, Result};

/// Save an image file.
///
/// The format is inferred from the extension. JPEG output is written with
/// the given quality and drops any alpha channel, since JPEG cannot store it.
///
/// # Arguments
///
/// * `img` - Image to save
/// * `path` - Output file path
/// * `quality` - JPEG quality (1-100), ignored for other formats
///
/// # Errors
///
/// Returns an error if the image cannot be saved.
pub fn save_image<P: AsRef<Path>>(img: &DynamicImage, path: P, quality: u8) -> Result<()> {
    let path = path.as_ref();

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png")
        .to_lowercase();

    match extension.as_str() {
        "jpg" | "jpeg" => {
            let mut output = std::fs::File::create(path)?;
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut output, quality);
            let flattened = if img.color().has_color() {
                DynamicImage::ImageRgb8(img.to_rgb8())
            } else {
                DynamicImage::ImageLuma8(img.to_luma8())
            };
            flattened
                .write_with_encoder(encoder)
                .map_err(|source| Error::ImageSave {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        _ => {
            img.save(path).map_err(|source| Error::ImageSave {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }

    tracing::debug!("Saved {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn scratch_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("adain-save-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_png_keeps_alpha() {
        let path = scratch_path("alpha.png");
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 3, Rgba([9, 8, 7, 42])));

        save_image(&img, &path, 95).unwrap();
        let reloaded = image::open(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(reloaded.to_rgba8().get_pixel(1, 1)[3], 42);
    }

    #[test]
    fn test_jpeg_drops_alpha() {
        let path = scratch_path("flat.jpg");
        let img = DynamicImage::ImageRgba8(RgbaImage::new(8, 8));

        save_image(&img, &path, 80).unwrap();
        let reloaded = image::open(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(!reloaded.color().has_alpha());
        assert_eq!((reloaded.width(), reloaded.height()), (8, 8));
    }
}
