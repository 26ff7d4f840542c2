//! The opaque inference capability behind the pipeline.
//!
//! The pipeline never knows which model family produced a detection or a
//! transcription. Everything model-specific hides behind [`OcrBackend`],
//! so any concrete backend — an ONNX detector/recogniser pair, a remote
//! inference service, a test stub — can be substituted without touching
//! orchestration, coordinate bookkeeping, or assembly.
//!
//! Backends are shared: one `Arc<dyn OcrBackend>` typically serves every
//! concurrent `extract` call in a process. Implementations must therefore
//! be internally synchronised (or stateless) and tolerate being the
//! bottleneck when `max_concurrent_pages` exceeds what the model can
//! serve; the pipeline applies backpressure by bounding concurrency, never
//! by holding the backend exclusively.

use crate::geometry::Polygon;
use image::RgbImage;
use thiserror::Error;

/// An inference call failed.
///
/// For recognition this is region-scoped and recoverable: the pipeline
/// records an empty span and moves on. For detection it fails the page.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// A candidate text region reported by the detection model.
///
/// Coordinates are in the pixel space of the image handed to
/// [`OcrBackend::detect`]; the pipeline maps them back to original-page
/// space before they appear in any result.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Bounding polygon of the candidate region.
    pub polygon: Polygon,
    /// Detector confidence in [0, 1].
    pub confidence: f32,
}

/// The transcription of one cropped region.
#[derive(Debug, Clone)]
pub struct Recognition {
    /// Recognised text. May be empty when the region held no legible text.
    pub text: String,
    /// Recognition confidence in [0, 1].
    pub confidence: f32,
}

/// The capability set the pipeline requires from a model backend.
///
/// Both methods are synchronous: inference is CPU/GPU-bound and the
/// pipeline always invokes them from `spawn_blocking` workers, mirroring
/// how pdfium rasterisation is kept off the async executor.
pub trait OcrBackend: Send + Sync {
    /// Locate candidate text regions in a preprocessed page image.
    ///
    /// Order is only approximately reading order; final ordering is the
    /// assembler's job. An empty image yields an empty vec, not an error.
    fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>, BackendError>;

    /// Transcribe a single cropped region.
    ///
    /// Must be independent per region: concurrent page workers call this
    /// at the same time for regions of different pages.
    fn recognize(&self, crop: &RgbImage) -> Result<Recognition, BackendError>;

    /// Cheap readiness probe for the transport layer's health endpoint.
    ///
    /// Should return `false` until model weights are loaded and a call to
    /// [`detect`](OcrBackend::detect) would not block on initialisation.
    fn is_ready(&self) -> bool {
        true
    }
}
