//! Media-kind sniffing for submitted document bytes.
//!
//! The transport layer may pass a media-kind hint (a filename extension or
//! a Content-Type header); the hint is trusted only when it is one we know,
//! and the magic bytes are consulted otherwise. Sniffing up front gives the
//! caller a meaningful [`ExtractError::UnsupportedFormat`] instead of a
//! decoder crash deep inside the pipeline.

use crate::error::ExtractError;
use tracing::debug;

/// The recognised kind of a submitted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// A (possibly multi-page) PDF container.
    Pdf,
    Png,
    Jpeg,
    /// Any other raster format the `image` crate can decode.
    OtherRaster,
}

impl MediaKind {
    /// True for single-image kinds that always yield exactly one page.
    pub fn is_raster(self) -> bool {
        !matches!(self, MediaKind::Pdf)
    }
}

/// Determine the media kind of `bytes`, preferring a recognised `hint`.
///
/// # Errors
/// [`ExtractError::UnsupportedFormat`] when neither the hint nor the magic
/// bytes identify a decodable format.
pub fn sniff_media_kind(bytes: &[u8], hint: Option<&str>) -> Result<MediaKind, ExtractError> {
    if let Some(kind) = hint.and_then(kind_from_hint) {
        debug!("Media kind from hint: {:?}", kind);
        return Ok(kind);
    }

    if bytes.starts_with(b"%PDF") {
        return Ok(MediaKind::Pdf);
    }
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Ok(MediaKind::Png);
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Ok(MediaKind::Jpeg);
    }
    if image::guess_format(bytes).is_ok() {
        return Ok(MediaKind::OtherRaster);
    }

    let mut magic = [0u8; 4];
    let n = bytes.len().min(4);
    magic[..n].copy_from_slice(&bytes[..n]);
    Err(ExtractError::UnsupportedFormat {
        detail: "not a PDF or a decodable raster image".into(),
        magic,
    })
}

/// Map a hint string (extension or MIME type) to a media kind.
///
/// Unknown hints return `None` so the magic bytes decide; a wrong but
/// well-meant hint from the caller must not make undecodable bytes pass.
fn kind_from_hint(hint: &str) -> Option<MediaKind> {
    let h = hint.trim().trim_start_matches('.').to_ascii_lowercase();
    // Strip any MIME parameters ("image/png; charset=binary").
    let h = h.split(';').next().unwrap_or(&h).trim();
    match h {
        "pdf" | "application/pdf" => Some(MediaKind::Pdf),
        "png" | "image/png" => Some(MediaKind::Png),
        "jpg" | "jpeg" | "image/jpeg" | "image/jpg" => Some(MediaKind::Jpeg),
        _ => None,
    }
}
