//! # adain
//!
//! Arbitrary style transfer with Adaptive Instance Normalization.
//!
//! A content image and a style image are encoded by a VGG encoder. The
//! per-channel mean and standard deviation of the content features are then
//! replaced by those of the style features, optionally blended back toward
//! the content features, and decoded into a stylized image.
//!
//! ## Example
//!
//! ```no_run
//! use adain::{image, Config, ModelLocator, OnnxBackend, Stylizer};
//!
//! # fn main() -> adain::Result<()> {
//! let backend = OnnxBackend::discover(&ModelLocator::default()).ok();
//! let style = image::load_image("style.jpg")?;
//! let mut stylizer = Stylizer::new(backend, style, Config::default())?;
//!
//! let content = image::load_image("photo.png")?;
//! let styled = stylizer.apply(&content);
//! image::save_image(&styled, "styled.png", stylizer.config().output_quality)?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod image;
pub mod model;
pub mod pipeline;

pub use error::{Error, Result};
pub use model::{ModelLocator, ModelType};
pub use pipeline::{Config, InferenceBackend, OnnxBackend, Outcome, SharedBackend, Stylizer};
