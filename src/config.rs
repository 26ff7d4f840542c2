//! Configuration types for document extraction.
//!
//! All pipeline behaviour is controlled through [`ExtractConfig`], built
//! via its [`ExtractConfigBuilder`]. Keeping every knob in one struct
//! makes it trivial to share configs across concurrent extractions and to
//! diff two runs to understand why their outputs differ.

use crate::error::ExtractError;
use crate::progress::ExtractProgress;
use std::fmt;
use std::sync::Arc;

/// Configuration for one document extraction.
///
/// Built via [`ExtractConfig::builder()`] or [`ExtractConfig::default()`].
///
/// # Example
/// ```rust
/// use docr::ExtractConfig;
///
/// let config = ExtractConfig::builder()
///     .dpi(200)
///     .max_concurrent_pages(8)
///     .timeout_secs(60)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractConfig {
    /// Rasterisation DPI for PDF pages. Range: 72–400. Default: 150.
    ///
    /// Higher DPI sharpens small print for the detector at the cost of
    /// memory and per-page latency; 150 is enough for typical body text.
    pub dpi: u32,

    /// Maximum rasterised page dimension (width or height) in pixels.
    /// Default: 2500.
    ///
    /// A safety cap independent of DPI: a 300-DPI render of an A0 poster
    /// would otherwise exhaust memory. Either dimension is capped, the
    /// other scales proportionally.
    pub max_page_pixels: u32,

    /// Longest side of the image handed to the detection model.
    /// Default: 960.
    ///
    /// Pages larger than this are shrunk before detection and the scale
    /// factor recorded, so polygons can be mapped back to page space.
    /// Recognition crops are taken from the full-resolution page, not the
    /// shrunk one.
    pub detect_max_side: u32,

    /// Detections below this confidence are dropped. Range: 0–1.
    /// Default: 0.3.
    ///
    /// The recall/precision trade-off knob: raise it to suppress noise
    /// regions on busy backgrounds, lower it to catch faint text.
    pub min_detection_confidence: f32,

    /// Number of pages processed in parallel. Default: 4.
    ///
    /// Caps resource use under load. Page work is CPU-bound inference, so
    /// values beyond the backend's effective parallelism only add queueing.
    pub max_concurrent_pages: usize,

    /// Overall extraction deadline in seconds. Default: 300.
    ///
    /// When the deadline expires, completed pages are kept, remaining
    /// pages are marked failed, and the document status becomes `partial`.
    pub timeout_secs: u64,

    /// Estimate and correct page skew before detection. Default: true.
    pub deskew: bool,

    /// Minimum estimated skew (degrees) before a rotation is applied.
    /// Default: 0.5.
    ///
    /// Rotating an already-straight page only smears glyph edges, so
    /// estimates below this threshold are ignored.
    pub deskew_min_angle: f32,

    /// Apply a median filter to the detector input. Default: true.
    pub denoise: bool,

    /// Download timeout for URL inputs, in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional per-page progress callback.
    pub progress: Option<Arc<dyn ExtractProgress>>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            dpi: 150,
            max_page_pixels: 2500,
            detect_max_side: 960,
            min_detection_confidence: 0.3,
            max_concurrent_pages: 4,
            timeout_secs: 300,
            deskew: true,
            deskew_min_angle: 0.5,
            denoise: true,
            download_timeout_secs: 120,
            progress: None,
        }
    }
}

// Manual Debug: `progress` holds a trait object with no useful Debug.
impl fmt::Debug for ExtractConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractConfig")
            .field("dpi", &self.dpi)
            .field("max_page_pixels", &self.max_page_pixels)
            .field("detect_max_side", &self.detect_max_side)
            .field("min_detection_confidence", &self.min_detection_confidence)
            .field("max_concurrent_pages", &self.max_concurrent_pages)
            .field("timeout_secs", &self.timeout_secs)
            .field("deskew", &self.deskew)
            .field("deskew_min_angle", &self.deskew_min_angle)
            .field("denoise", &self.denoise)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("progress", &self.progress.as_ref().map(|_| "<dyn ExtractProgress>"))
            .finish()
    }
}

impl ExtractConfig {
    /// Create a new builder for `ExtractConfig`.
    pub fn builder() -> ExtractConfigBuilder {
        ExtractConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractConfig`].
#[derive(Debug)]
pub struct ExtractConfigBuilder {
    config: ExtractConfig,
}

impl ExtractConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_page_pixels(mut self, px: u32) -> Self {
        self.config.max_page_pixels = px.max(100);
        self
    }

    pub fn detect_max_side(mut self, px: u32) -> Self {
        self.config.detect_max_side = px.max(32);
        self
    }

    pub fn min_detection_confidence(mut self, c: f32) -> Self {
        self.config.min_detection_confidence = c.clamp(0.0, 1.0);
        self
    }

    pub fn max_concurrent_pages(mut self, n: usize) -> Self {
        self.config.max_concurrent_pages = n.max(1);
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn deskew(mut self, v: bool) -> Self {
        self.config.deskew = v;
        self
    }

    pub fn deskew_min_angle(mut self, degrees: f32) -> Self {
        self.config.deskew_min_angle = degrees.max(0.0);
        self
    }

    pub fn denoise(mut self, v: bool) -> Self {
        self.config.denoise = v;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress(mut self, callback: Arc<dyn ExtractProgress>) -> Self {
        self.config.progress = Some(callback);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractConfig, ExtractError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(ExtractError::InvalidConfig(format!(
                "DPI must be 72-400, got {}",
                c.dpi
            )));
        }
        if c.max_concurrent_pages == 0 {
            return Err(ExtractError::InvalidConfig(
                "max_concurrent_pages must be >= 1".into(),
            ));
        }
        if c.timeout_secs == 0 {
            return Err(ExtractError::InvalidConfig(
                "timeout_secs must be >= 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&c.min_detection_confidence) {
            return Err(ExtractError::InvalidConfig(format!(
                "min_detection_confidence must be in [0, 1], got {}",
                c.min_detection_confidence
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ExtractConfig::builder().build().unwrap();
        assert_eq!(config.dpi, 150);
        assert_eq!(config.max_concurrent_pages, 4);
        assert!(config.deskew);
    }

    #[test]
    fn setters_clamp_out_of_range_values() {
        let config = ExtractConfig::builder()
            .dpi(10_000)
            .min_detection_confidence(3.0)
            .max_concurrent_pages(0)
            .build()
            .unwrap();
        assert_eq!(config.dpi, 400);
        assert_eq!(config.min_detection_confidence, 1.0);
        assert_eq!(config.max_concurrent_pages, 1);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = ExtractConfig::builder().timeout_secs(0).build();
        assert!(matches!(err, Err(ExtractError::InvalidConfig(_))));
    }

    #[test]
    fn debug_does_not_require_callback_debug() {
        let config = ExtractConfig::default();
        let s = format!("{config:?}");
        assert!(s.contains("max_concurrent_pages"));
    }
}
