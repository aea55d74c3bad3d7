//! Local re-encoding of downloaded originals.
//!
//! Drone and phone photos are often 10+ MB, so a full download is shrunk to a
//! small JPEG before it is returned. Whether the process can decode images is
//! decided at build time by the `reencode` feature.

use crate::error::{GeotagError, Result};
use crate::model::{DownloadedMedia, ThumbnailBytes, DEFAULT_CONTENT_TYPE};

/// Neither side of a re-encoded thumbnail exceeds this many pixels.
pub const DEFAULT_MAX_DIMENSION: u32 = 400;

/// JPEG quality for re-encoded thumbnails.
pub const DEFAULT_JPEG_QUALITY: u8 = 70;

/// How a downloaded original is turned into a thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reencoder {
    /// Decode, shrink to fit `max_dimension`, encode as JPEG.
    #[cfg(feature = "reencode")]
    Jpeg { max_dimension: u32, quality: u8 },
    /// Return the downloaded bytes untouched.
    Passthrough,
}

impl Default for Reencoder {
    fn default() -> Self {
        Self::detect()
    }
}

impl Reencoder {
    /// Best capability compiled into this build.
    pub fn detect() -> Self {
        #[cfg(feature = "reencode")]
        {
            Self::Jpeg {
                max_dimension: DEFAULT_MAX_DIMENSION,
                quality: DEFAULT_JPEG_QUALITY,
            }
        }
        #[cfg(not(feature = "reencode"))]
        {
            Self::Passthrough
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            #[cfg(feature = "reencode")]
            Self::Jpeg { .. } => "jpeg",
            Self::Passthrough => "passthrough",
        }
    }

    /// Turn a full download into thumbnail bytes.
    ///
    /// Passthrough labels the bytes with the content type the download
    /// declared, and only assumes JPEG when none was given.
    pub async fn apply(self, media: DownloadedMedia) -> Result<ThumbnailBytes> {
        match self {
            #[cfg(feature = "reencode")]
            Self::Jpeg {
                max_dimension,
                quality,
            } => {
                let bytes = tokio::task::spawn_blocking(move || {
                    shrink_to_jpeg(&media.bytes, max_dimension, quality)
                })
                .await
                .map_err(|e| GeotagError::ImageError(format!("Re-encode task failed: {e}")))??;
                Ok(ThumbnailBytes::jpeg(bytes))
            }
            Self::Passthrough => {
                let content_type = media
                    .content_type
                    .filter(|ct| !ct.is_empty())
                    .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
                Ok(ThumbnailBytes::new(media.bytes, content_type))
            }
        }
    }
}

/// Decode `bytes`, shrink so neither side exceeds `max_dimension`, and encode
/// as JPEG at `quality`.
///
/// Aspect ratio is preserved and images already within bounds are never
/// enlarged.
#[cfg(feature = "reencode")]
pub fn shrink_to_jpeg(bytes: &[u8], max_dimension: u32, quality: u8) -> Result<Vec<u8>> {
    use image::codecs::jpeg::JpegEncoder;
    use image::imageops::FilterType;
    use image::DynamicImage;
    use std::io::Cursor;

    let img = image::load_from_memory(bytes)
        .map_err(|e| GeotagError::ImageError(format!("Failed to decode image: {e}")))?;

    let img = if img.width() > max_dimension || img.height() > max_dimension {
        img.resize(max_dimension, max_dimension, FilterType::Lanczos3)
    } else {
        img
    };

    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| GeotagError::ImageError(format!("Failed to encode JPEG: {e}")))?;

    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passthrough_keeps_declared_type() {
        let media = DownloadedMedia {
            bytes: vec![0x89, b'P', b'N', b'G'],
            content_type: Some("image/png".into()),
        };
        let thumb = Reencoder::Passthrough.apply(media).await.unwrap();
        assert_eq!(thumb.bytes, vec![0x89, b'P', b'N', b'G']);
        assert_eq!(thumb.content_type, "image/png");
    }

    #[tokio::test]
    async fn test_passthrough_defaults_to_jpeg() {
        let media = DownloadedMedia {
            bytes: vec![1, 2, 3],
            content_type: None,
        };
        let thumb = Reencoder::Passthrough.apply(media).await.unwrap();
        assert_eq!(thumb.content_type, "image/jpeg");
    }

    #[cfg(feature = "reencode")]
    mod jpeg {
        use super::*;
        use image::{ImageBuffer, ImageFormat, Rgba, RgbaImage};

        fn encode_png(width: u32, height: u32) -> Vec<u8> {
            let img: RgbaImage = ImageBuffer::from_fn(width, height, |x, y| {
                Rgba([(x % 256) as u8, (y % 256) as u8, 128, 200])
            });
            let mut buffer = std::io::Cursor::new(Vec::new());
            img.write_to(&mut buffer, ImageFormat::Png).unwrap();
            buffer.into_inner()
        }

        #[test]
        fn test_detect_prefers_jpeg() {
            assert_eq!(
                Reencoder::detect(),
                Reencoder::Jpeg {
                    max_dimension: 400,
                    quality: 70
                }
            );
            assert_eq!(Reencoder::detect().name(), "jpeg");
        }

        #[test]
        fn test_shrink_landscape_keeps_aspect() {
            let jpeg = shrink_to_jpeg(&encode_png(1200, 600), 400, 70).unwrap();
            let out = image::load_from_memory(&jpeg).unwrap();
            assert_eq!(out.width(), 400);
            assert_eq!(out.height(), 200);
            assert_eq!(image::guess_format(&jpeg).unwrap(), ImageFormat::Jpeg);
        }

        #[test]
        fn test_shrink_portrait() {
            let jpeg = shrink_to_jpeg(&encode_png(300, 900), 400, 70).unwrap();
            let out = image::load_from_memory(&jpeg).unwrap();
            assert!(out.width() <= 400);
            assert_eq!(out.height(), 400);
        }

        #[test]
        fn test_small_image_not_enlarged() {
            let jpeg = shrink_to_jpeg(&encode_png(120, 80), 400, 70).unwrap();
            let out = image::load_from_memory(&jpeg).unwrap();
            assert_eq!((out.width(), out.height()), (120, 80));
        }

        #[test]
        fn test_undecodable_bytes_error() {
            let err = shrink_to_jpeg(b"not an image", 400, 70).unwrap_err();
            assert!(matches!(err, GeotagError::ImageError(_)));
        }

        #[tokio::test]
        async fn test_apply_labels_jpeg() {
            let media = DownloadedMedia {
                bytes: encode_png(800, 800),
                content_type: Some("image/png".into()),
            };
            let thumb = Reencoder::detect().apply(media).await.unwrap();
            assert_eq!(thumb.content_type, "image/jpeg");
        }
    }
}
