//! Canonical image encoding.
//!
//! Every stored image goes through the same normalization regardless of how
//! the source was encoded: sniff the format, decode (GIF, JPEG, and PNG are
//! the formats the listing hosts serve), flatten to 8-bit RGB, and re-encode
//! as a maximum-quality JPEG. Alpha channels and animation frames beyond the
//! first do not survive, which is the point: downstream consumers see one
//! uniform pixel format.

use image::codecs::jpeg::JpegEncoder;
use thiserror::Error;

/// JPEG quality for canonical re-encoding. Maximum, because the stored copy
/// is the only copy and selection already minimized the download size.
pub const JPEG_QUALITY: u8 = 100;

/// Errors raised while normalizing image bytes.
///
/// Both variants are per-item failures: the pipeline records them in the
/// URL's error artifact and moves on.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The bytes are not a decodable GIF, JPEG, or PNG.
    #[error("cannot decode image: {source}")]
    Decode {
        /// The underlying decoder error.
        #[source]
        source: image::ImageError,
    },

    /// Re-encoding the decoded pixels as JPEG failed.
    #[error("cannot encode canonical JPEG: {source}")]
    Encode {
        /// The underlying encoder error.
        #[source]
        source: image::ImageError,
    },
}

/// Re-encodes arbitrary image bytes into the canonical form.
///
/// The input format is sniffed from the bytes; of animated inputs only the
/// first frame is kept, and any alpha channel is dropped in the flatten to
/// RGB.
///
/// # Errors
///
/// Returns [`EncodeError::Decode`] for malformed or unsupported input and
/// [`EncodeError::Encode`] if the JPEG encoder fails.
pub fn canonical_jpeg(bytes: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|source| EncodeError::Decode { source })?;
    let flattened = decoded.to_rgb8();

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    flattened
        .write_with_encoder(encoder)
        .map_err(|source| EncodeError::Encode { source })?;
    Ok(out)
}
