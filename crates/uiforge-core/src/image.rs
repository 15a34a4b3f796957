//! Mockup image intake.
//!
//! Accepts base64 payloads (optionally with a `data:` URL prefix), sniffs the
//! declared MIME from magic bytes, enforces the decoded-size cap, clamps
//! oversized dimensions to 2048×2048 preserving aspect ratio, and normalizes
//! to PNG for the upstream multimodal API. Pixels are passed through
//! otherwise bit-exact — no recompression beyond the format change.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

use crate::error::RequestError;

/// Maximum pixels on either dimension sent upstream.
const MAX_DIMENSION: u32 = 2048;

/// Image MIME types the service accepts.
const SUPPORTED: [(&str, ImageFormat); 4] = [
    ("image/png", ImageFormat::Png),
    ("image/jpeg", ImageFormat::Jpeg),
    ("image/gif", ImageFormat::Gif),
    ("image/webp", ImageFormat::WebP),
];

/// A validated, normalized mockup image.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    png_bytes: Vec<u8>,
    width: u32,
    height: u32,
    source_mime: &'static str,
    source_len: usize,
}

impl ImageAttachment {
    /// Validate and normalize a base64 image payload.
    ///
    /// `max_decoded_bytes` caps the decoded input size before any pixel work.
    pub fn from_base64(data: &str, max_decoded_bytes: usize) -> Result<Self, RequestError> {
        let raw = strip_data_url_prefix(data);
        // Tolerate whitespace/newlines that clients wrap base64 with.
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

        let bytes = BASE64
            .decode(compact.as_bytes())
            .map_err(|e| RequestError::InvalidImageEncoding {
                message: e.to_string(),
            })?;

        if bytes.len() > max_decoded_bytes {
            return Err(RequestError::ImageTooLarge {
                size: bytes.len(),
                max: max_decoded_bytes,
            });
        }

        let (mime, format) = sniff(&bytes)?;

        let decoded = image::load_from_memory_with_format(&bytes, format).map_err(|e| {
            RequestError::InvalidImageEncoding {
                message: format!("{mime} payload did not decode: {e}"),
            }
        })?;

        let original_within_bounds =
            decoded.width() <= MAX_DIMENSION && decoded.height() <= MAX_DIMENSION;
        let clamped = clamp_dimensions(decoded);
        let (width, height) = (clamped.width(), clamped.height());

        // Already PNG and within bounds: keep the original bytes untouched.
        let png_bytes = if format == ImageFormat::Png && original_within_bounds {
            bytes
        } else {
            let mut out = Cursor::new(Vec::new());
            clamped.write_to(&mut out, ImageFormat::Png).map_err(|e| {
                RequestError::InvalidImageEncoding {
                    message: format!("PNG re-encode failed: {e}"),
                }
            })?;
            out.into_inner()
        };

        tracing::debug!(
            mime,
            width,
            height,
            bytes = png_bytes.len(),
            "image attachment accepted"
        );

        Ok(Self {
            source_len: png_bytes.len(),
            png_bytes,
            width,
            height,
            source_mime: mime,
        })
    }

    /// The normalized payload as a `data:` URL for the chat API.
    pub fn as_data_url(&self) -> String {
        format!("data:image/png;base64,{}", BASE64.encode(&self.png_bytes))
    }

    /// Normalized PNG bytes (cache fingerprinting hashes these).
    pub fn png_bytes(&self) -> &[u8] {
        &self.png_bytes
    }

    /// Width after clamping.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height after clamping.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The MIME type sniffed from the original payload.
    pub fn source_mime(&self) -> &'static str {
        self.source_mime
    }

    /// Size in bytes of the normalized payload.
    pub fn len(&self) -> usize {
        self.source_len
    }

    /// Whether the normalized payload is empty (never, for a valid image).
    pub fn is_empty(&self) -> bool {
        self.source_len == 0
    }
}

/// Strip an optional `data:<mime>;base64,` prefix.
fn strip_data_url_prefix(data: &str) -> &str {
    if data.starts_with("data:") {
        match data.find(',') {
            Some(idx) => &data[idx + 1..],
            None => data,
        }
    } else {
        data
    }
}

/// Sniff the MIME type from magic bytes.
fn sniff(bytes: &[u8]) -> Result<(&'static str, ImageFormat), RequestError> {
    let mime = if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        "image/png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        "image/gif"
    } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        return Err(RequestError::InvalidImage {
            message: "unrecognized magic bytes (expected PNG, JPEG, GIF, or WebP)".to_string(),
        });
    };

    let format = SUPPORTED
        .iter()
        .find(|(m, _)| *m == mime)
        .map(|(_, f)| *f)
        .ok_or_else(|| RequestError::InvalidImage {
            message: format!("unsupported image type: {mime}"),
        })?;

    Ok((mime, format))
}

/// Downscale so neither dimension exceeds [`MAX_DIMENSION`], preserving aspect.
fn clamp_dimensions(img: DynamicImage) -> DynamicImage {
    if img.width() <= MAX_DIMENSION && img.height() <= MAX_DIMENSION {
        img
    } else {
        img.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Triangle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1×1 red pixel PNG.
    const TINY_PNG_B64: &str =
        "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==";

    fn png_b64(width: u32, height: u32) -> String {
        let img = DynamicImage::ImageRgba8(image::RgbaImage::new(width, height));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        BASE64.encode(out.into_inner())
    }

    #[test]
    fn accepts_tiny_png() {
        let img = ImageAttachment::from_base64(TINY_PNG_B64, 5_242_880).unwrap();
        assert_eq!(img.source_mime(), "image/png");
        assert_eq!(img.width(), 1);
        assert_eq!(img.height(), 1);
    }

    #[test]
    fn accepts_data_url_prefix() {
        let data = format!("data:image/png;base64,{TINY_PNG_B64}");
        let img = ImageAttachment::from_base64(&data, 5_242_880).unwrap();
        assert_eq!(img.source_mime(), "image/png");
    }

    #[test]
    fn tolerates_wrapped_base64() {
        let wrapped: String = TINY_PNG_B64
            .as_bytes()
            .chunks(16)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect::<Vec<_>>()
            .join("\n");
        assert!(ImageAttachment::from_base64(&wrapped, 5_242_880).is_ok());
    }

    #[test]
    fn rejects_invalid_base64() {
        let err = ImageAttachment::from_base64("!!!not-base64!!!", 5_242_880).unwrap_err();
        assert!(matches!(err, RequestError::InvalidImageEncoding { .. }));
    }

    #[test]
    fn rejects_unknown_magic() {
        let text = BASE64.encode(b"just some plain text, not an image at all");
        let err = ImageAttachment::from_base64(&text, 5_242_880).unwrap_err();
        assert!(matches!(err, RequestError::InvalidImage { .. }));
    }

    #[test]
    fn rejects_oversize_before_decoding_pixels() {
        let data = png_b64(64, 64);
        let err = ImageAttachment::from_base64(&data, 16).unwrap_err();
        match err {
            RequestError::ImageTooLarge { size, max } => {
                assert!(size > 16);
                assert_eq!(max, 16);
            }
            other => panic!("expected ImageTooLarge, got: {other}"),
        }
    }

    #[test]
    fn clamps_wide_image_preserving_aspect() {
        let data = png_b64(4096, 1024);
        let img = ImageAttachment::from_base64(&data, 64 * 1024 * 1024).unwrap();
        assert_eq!(img.width(), 2048);
        assert_eq!(img.height(), 512);
    }

    #[test]
    fn clamps_tall_image_preserving_aspect() {
        let data = png_b64(1000, 4000);
        let img = ImageAttachment::from_base64(&data, 64 * 1024 * 1024).unwrap();
        assert_eq!(img.height(), 2048);
        assert_eq!(img.width(), 512);
    }

    #[test]
    fn small_image_keeps_dimensions() {
        let data = png_b64(640, 480);
        let img = ImageAttachment::from_base64(&data, 64 * 1024 * 1024).unwrap();
        assert_eq!((img.width(), img.height()), (640, 480));
    }

    #[test]
    fn data_url_round_trip_is_png() {
        let img = ImageAttachment::from_base64(TINY_PNG_B64, 5_242_880).unwrap();
        assert!(img.as_data_url().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn sniffs_jpeg_magic() {
        // Magic alone is enough for sniff(); decoding naturally fails later.
        let err = ImageAttachment::from_base64(
            &BASE64.encode([0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]),
            5_242_880,
        )
        .unwrap_err();
        match err {
            RequestError::InvalidImageEncoding { message } => {
                assert!(message.contains("image/jpeg"));
            }
            other => panic!("expected InvalidImageEncoding, got: {other}"),
        }
    }
}
