//! Encoder/decoder capability used by the style transfer pipeline.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ndarray::Array4;
use ort::session::Session;
use ort::value::Tensor;

use crate::error::{Error, Result};
use crate::image::ImageTensor;
use crate::model::{ModelLocator, ModelType};

/// Feature tensor in NCHW format (1, C, H', W') produced by the encoder.
pub type FeatureTensor = Array4<f32>;

/// Image-to-feature encoder and feature-to-image decoder pair.
///
/// Implementations must be deterministic and keep no state between calls.
/// Methods take `&mut self`, so one backend serves one call at a time; wrap
/// it in a [`SharedBackend`] to share it between threads.
pub trait InferenceBackend {
    /// Encode a mean-subtracted BGR image tensor (1, 3, H, W) into features.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails or the output is not 4-D.
    fn encode(&mut self, image: &ImageTensor) -> Result<FeatureTensor>;

    /// Decode features into a mean-subtracted BGR image tensor (1, 3, H'', W'').
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails or the output is not a usable image.
    fn decode(&mut self, features: &FeatureTensor) -> Result<ImageTensor>;
}

impl<B: InferenceBackend + ?Sized> InferenceBackend for Box<B> {
    fn encode(&mut self, image: &ImageTensor) -> Result<FeatureTensor> {
        (**self).encode(image)
    }

    fn decode(&mut self, features: &FeatureTensor) -> Result<ImageTensor> {
        (**self).decode(features)
    }
}

/// A backend shared between owners, serialized by a mutex.
///
/// The lock is held for the duration of each encode or decode call. Clones
/// refer to the same backend.
pub struct SharedBackend<B> {
    inner: Arc<Mutex<B>>,
}

impl<B> SharedBackend<B> {
    /// Wrap a backend for shared use.
    pub fn new(backend: B) -> Self {
        Self {
            inner: Arc::new(Mutex::new(backend)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, B> {
        // Backends hold no per-call state, so a poisoned lock is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<B> Clone for SharedBackend<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: InferenceBackend> InferenceBackend for SharedBackend<B> {
    fn encode(&mut self, image: &ImageTensor) -> Result<FeatureTensor> {
        self.lock().encode(image)
    }

    fn decode(&mut self, features: &FeatureTensor) -> Result<ImageTensor> {
        self.lock().decode(features)
    }
}

/// ONNX Runtime backend running the VGG encoder and the AdaIN decoder.
pub struct OnnxBackend {
    encoder: Session,
    decoder: Session,
}

impl OnnxBackend {
    /// Build a backend from already loaded sessions.
    #[must_use]
    pub fn new(encoder: Session, decoder: Session) -> Self {
        Self { encoder, decoder }
    }

    /// Locate and load both models.
    ///
    /// # Errors
    ///
    /// Returns an error if either model cannot be found or loaded.
    pub fn discover(locator: &ModelLocator) -> Result<Self> {
        tracing::info!("Loading VGG encoder...");
        let encoder = locator.load_session(ModelType::Encoder)?;

        tracing::info!("Loading decoder...");
        let decoder = locator.load_session(ModelType::Decoder)?;

        tracing::info!("Models loaded successfully");
        Ok(Self::new(encoder, decoder))
    }
}

impl InferenceBackend for OnnxBackend {
    fn encode(&mut self, image: &ImageTensor) -> Result<FeatureTensor> {
        run_first_output(&mut self.encoder, image, "encoder features")
    }

    fn decode(&mut self, features: &FeatureTensor) -> Result<ImageTensor> {
        run_first_output(&mut self.decoder, features, "decoded image").map_err(|err| match err {
            Error::ShapeMismatch { expected, actual } => Error::Decode {
                reason: format!("expected {expected}, got {actual}"),
            },
            other => other,
        })
    }
}

/// Feed `input` as the first session input and read back the first output.
fn run_first_output(
    session: &mut Session,
    input: &Array4<f32>,
    output_name: &str,
) -> Result<Array4<f32>> {
    let input_value =
        Tensor::from_array(input.clone()).map_err(|source| Error::Inference { source })?;

    let outputs = session
        .run(ort::inputs![input_value])
        .map_err(|source| Error::Inference { source })?;

    let output = outputs
        .values()
        .next()
        .ok_or_else(|| Error::ShapeMismatch {
            expected: output_name.to_string(),
            actual: "no output".to_string(),
        })?;

    extract_array4(&output)
}

/// Extract a 4D array from an ONNX value.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn extract_array4(value: &ort::value::ValueRef<'_>) -> Result<Array4<f32>> {
    let (shape_info, data) = value
        .try_extract_tensor::<f32>()
        .map_err(|source| Error::Inference { source })?;

    // Safe: tensor dimensions are always non-negative and within bounds
    let dims: Vec<usize> = shape_info.iter().map(|&x| x as usize).collect();

    if dims.len() != 4 {
        return Err(Error::ShapeMismatch {
            expected: "4D tensor".to_string(),
            actual: format!("{}D tensor", dims.len()),
        });
    }

    Array4::from_shape_vec((dims[0], dims[1], dims[2], dims[3]), data.to_vec()).map_err(|_| {
        Error::ShapeMismatch {
            expected: format!("{dims:?}"),
            actual: "reshape failed".to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    struct CountingBackend {
        calls: Arc<AtomicUsize>,
    }

    impl InferenceBackend for CountingBackend {
        fn encode(&mut self, image: &ImageTensor) -> Result<FeatureTensor> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(image.clone())
        }

        fn decode(&mut self, features: &FeatureTensor) -> Result<ImageTensor> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(features * 2.0)
        }
    }

    #[test]
    fn test_boxed_backend_forwards() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut backend: Box<dyn InferenceBackend> = Box::new(CountingBackend {
            calls: Arc::clone(&calls),
        });

        let features = backend.encode(&Array4::from_elem((1, 3, 2, 2), 1.5)).unwrap();
        let decoded = backend.decode(&features).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(decoded.iter().all(|&v| (v - 3.0).abs() < 1e-6));
    }

    #[test]
    fn test_shared_backend_across_threads() {
        let calls = Arc::new(AtomicUsize::new(0));
        let shared = SharedBackend::new(CountingBackend {
            calls: Arc::clone(&calls),
        });

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let mut backend = shared.clone();
                thread::spawn(move || {
                    #[allow(clippy::cast_precision_loss)]
                    let input = Array4::from_elem((1, 3, 4, 4), i as f32);
                    let features = backend.encode(&input).unwrap();
                    backend.decode(&features).unwrap()
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let decoded = handle.join().unwrap();
            #[allow(clippy::cast_precision_loss)]
            let expected = i as f32 * 2.0;
            assert!(decoded.iter().all(|&v| (v - expected).abs() < 1e-6));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 8);
    }
}
