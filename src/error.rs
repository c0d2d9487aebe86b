//! Custom error types for adain.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the adain library.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to load an image file.
    #[error("failed to load image from {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to save an image file.
    #[error("failed to save image to {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// An image with zero width or height was supplied.
    #[error("{role} image is empty")]
    EmptyImage { role: &'static str },

    /// A model file was not found in any search directory.
    #[error("model {name} not found (searched: {})", format_paths(.searched))]
    ModelNotFound { name: String, searched: Vec<PathBuf> },

    /// Failed to load an ONNX model.
    #[error("failed to load ONNX model {name}: {source}")]
    ModelLoad {
        name: String,
        #[source]
        source: ort::Error,
    },

    /// The encode/decode capability is not loaded.
    #[error("inference backend is not available")]
    BackendUnavailable,

    /// Model inference failed.
    #[error("model inference failed: {source}")]
    Inference {
        #[source]
        source: ort::Error,
    },

    /// The decoder returned an empty or malformed tensor.
    #[error("decoder produced no usable image: {reason}")]
    Decode { reason: String },

    /// Resampling an image failed.
    #[error("failed to resize image: {reason}")]
    Resize { reason: String },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Shape mismatch in tensor operations.
    #[error("tensor shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias for adain operations.
pub type Result<T> = std::result::Result<T, Error>;
