use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

use crate::cli::OutputFormat;
use crate::error::TransformError;

/// JPEG quality used when the request does not set one
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// A decoded source image together with the container format it came in
pub struct DecodedImage {
    pub image: DynamicImage,
    pub format: ImageFormat,
}

/// Decode an encoded image buffer, sniffing the format from its magic bytes
pub fn decode(bytes: &[u8]) -> Result<DecodedImage, TransformError> {
    let format = image::guess_format(bytes).map_err(TransformError::Decode)?;
    let image =
        image::load_from_memory_with_format(bytes, format).map_err(TransformError::Decode)?;
    Ok(DecodedImage { image, format })
}

/// Pick the output format: the requested one, else the source's, else PNG
pub fn resolve_output_format(requested: Option<OutputFormat>, source: ImageFormat) -> OutputFormat {
    requested
        .or_else(|| OutputFormat::from_image_format(source))
        .unwrap_or(OutputFormat::Png)
}

pub fn validate_quality(quality: Option<u8>) -> Result<(), TransformError> {
    match quality {
        Some(q) if q == 0 || q > 100 => Err(TransformError::invalid(
            "quality",
            format!("must be between 1 and 100, got {}", q),
        )),
        _ => Ok(()),
    }
}

/// Encode an image into `format`
///
/// Quality only applies to JPEG. Other formats are written as 8-bit RGB or
/// RGBA, depending on whether the image carries alpha.
pub fn encode(
    img: &DynamicImage,
    format: OutputFormat,
    quality: Option<u8>,
) -> Result<Vec<u8>, TransformError> {
    validate_quality(quality)?;

    let mut buf = Vec::new();
    match format {
        OutputFormat::Jpg => {
            // JPEG has no alpha channel
            let rgb = img.to_rgb8();
            let encoder =
                JpegEncoder::new_with_quality(&mut buf, quality.unwrap_or(DEFAULT_JPEG_QUALITY));
            rgb.write_with_encoder(encoder)
                .map_err(TransformError::Encode)?;
        }
        other => {
            let normalized = if img.color().has_alpha() {
                DynamicImage::ImageRgba8(img.to_rgba8())
            } else {
                DynamicImage::ImageRgb8(img.to_rgb8())
            };
            normalized
                .write_to(&mut Cursor::new(&mut buf), other.image_format())
                .map_err(TransformError::Encode)?;
        }
    }

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_processing::test_support::create_test_image;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_decode_detects_format() {
        let img = DynamicImage::ImageRgb8(create_test_image(16, 8));
        for format in [OutputFormat::Jpg, OutputFormat::Png, OutputFormat::Bmp] {
            let bytes = encode(&img, format, None).unwrap();
            let decoded = decode(&bytes).unwrap();
            assert_eq!(decoded.format, format.image_format());
            assert_eq!(decoded.image.width(), 16);
            assert_eq!(decoded.image.height(), 8);
        }
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode(b""), Err(TransformError::Decode(_))));
        assert!(matches!(
            decode(b"definitely not an image"),
            Err(TransformError::Decode(_))
        ));
    }

    #[test]
    fn test_jpeg_quality_affects_size() {
        let img = DynamicImage::ImageRgb8(create_test_image(64, 64));
        let low = encode(&img, OutputFormat::Jpg, Some(10)).unwrap();
        let high = encode(&img, OutputFormat::Jpg, Some(95)).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn test_invalid_quality() {
        let img = DynamicImage::ImageRgb8(create_test_image(4, 4));
        assert!(matches!(
            encode(&img, OutputFormat::Jpg, Some(0)),
            Err(TransformError::InvalidParameter { name: "quality", .. })
        ));
        assert!(validate_quality(Some(101)).is_err());
        assert!(validate_quality(Some(100)).is_ok());
        assert!(validate_quality(None).is_ok());
    }

    #[test]
    fn test_png_keeps_alpha() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 40])));
        let bytes = encode(&img, OutputFormat::Png, None).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert!(decoded.image.color().has_alpha());
        assert_eq!(decoded.image.to_rgba8().get_pixel(0, 0), &Rgba([10, 20, 30, 40]));
    }

    #[test]
    fn test_resolve_output_format() {
        assert_eq!(
            resolve_output_format(None, ImageFormat::Jpeg),
            OutputFormat::Jpg
        );
        assert_eq!(
            resolve_output_format(Some(OutputFormat::Png), ImageFormat::Jpeg),
            OutputFormat::Png
        );
        assert_eq!(
            resolve_output_format(None, ImageFormat::Gif),
            OutputFormat::Png
        );
    }
}
