//! Model discovery and session loading utilities.

use std::path::{Path, PathBuf};

use ort::session::Session;

use crate::error::{Error, Result};

/// Directories searched for model files, relative to the working directory.
pub const SEARCH_DIRS: [&str; 5] = [
    "models",
    "../models",
    "../../models",
    "AI_models",
    "../Resources/AI_models",
];

/// Types of models used in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    /// Normalised VGG-19 encoder - maps images to relu4_1 features.
    Encoder,
    /// AdaIN decoder - maps features back to images.
    Decoder,
}

impl ModelType {
    /// Get the filename for this model type.
    #[must_use]
    pub const fn filename(&self) -> &'static str {
        match self {
            Self::Encoder => "vgg_normalised.onnx",
            Self::Decoder => "decoder.onnx",
        }
    }
}

/// Finds model files in an ordered list of directories.
#[derive(Debug, Clone)]
pub struct ModelLocator {
    search_dirs: Vec<PathBuf>,
}

impl Default for ModelLocator {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ModelLocator {
    /// Create a locator.
    ///
    /// Searches `model_dir` first if given, then [`SEARCH_DIRS`], then the
    /// platform cache directory:
    /// - Windows: `%LOCALAPPDATA%\adain\models`
    /// - Linux: `~/.cache/adain/models`
    /// - macOS: `~/Library/Caches/adain/models`
    #[must_use]
    pub fn new(model_dir: Option<PathBuf>) -> Self {
        let mut search_dirs: Vec<PathBuf> = model_dir.into_iter().collect();
        search_dirs.extend(SEARCH_DIRS.iter().map(PathBuf::from));
        if let Some(cache) = dirs::cache_dir() {
            search_dirs.push(cache.join("adain").join("models"));
        }

        Self { search_dirs }
    }

    /// Create a locator over exactly the given directories.
    #[must_use]
    pub fn with_dirs(search_dirs: Vec<PathBuf>) -> Self {
        Self { search_dirs }
    }

    /// Directories searched, in order.
    #[must_use]
    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// Find the first search directory holding the model file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelNotFound`] if no directory contains it.
    pub fn find(&self, model_type: ModelType) -> Result<PathBuf> {
        self.search_dirs
            .iter()
            .map(|dir| dir.join(model_type.filename()))
            .find(|path| path.is_file())
            .ok_or_else(|| Error::ModelNotFound {
                name: model_type.filename().to_string(),
                searched: self.search_dirs.clone(),
            })
    }

    /// Load an ONNX model session.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be found or loaded.
    pub fn load_session(&self, model_type: ModelType) -> Result<Session> {
        let path = self.find(model_type)?;
        tracing::debug!("Loading {} from {}", model_type.filename(), path.display());
        load_session_from(&path, model_type.filename())
    }
}

fn load_session_from(path: &Path, name: &str) -> Result<Session> {
    Session::builder()
        .map_err(|source| Error::ModelLoad {
            name: name.to_string(),
            source,
        })?
        .commit_from_file(path)
        .map_err(|source| Error::ModelLoad {
            name: name.to_string(),
            source,
        })
}
