use serde::Deserialize;

use super::{codec, resize};
use crate::cli::{OutputFormat, ResizeStyle};
use crate::error::TransformError;
use crate::utils::debug_println;

/// Options for [`convert`]
///
/// A zero `width` or `height` keeps the source size on that axis; when both
/// are zero the image is only re-encoded.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConvertOptions {
    pub width: u32,
    pub height: u32,
    pub resize_style: ResizeStyle,
    pub quality: Option<u8>,
    pub format: Option<OutputFormat>,
    pub debug: bool,
}

impl ConvertOptions {
    pub fn validate(&self) -> Result<(), TransformError> {
        resize::check_dimensions(self.width, self.height)?;
        codec::validate_quality(self.quality)
    }
}

/// Resize (optionally) and re-encode an image
pub fn convert(src: &[u8], options: &ConvertOptions) -> Result<Vec<u8>, TransformError> {
    options.validate()?;

    let decoded = codec::decode(src)?;
    let format = codec::resolve_output_format(options.format, decoded.format);
    let debug = options.debug;

    debug_println(debug, &format!("format: {:?}", format));
    debug_println(
        debug,
        &format!(
            "original width,height: {}, {}",
            decoded.image.width(),
            decoded.image.height()
        ),
    );

    let image = if options.width > 0 || options.height > 0 {
        debug_println(debug, &format!("resizeStyle: {:?}", options.resize_style));
        let resized = resize::resize(
            &decoded.image,
            options.width,
            options.height,
            options.resize_style,
        )?;
        debug_println(
            debug,
            &format!("resized to: {}, {}", resized.width(), resized.height()),
        );
        resized
    } else {
        decoded.image
    };

    if let Some(quality) = options.quality {
        debug_println(debug, &format!("quality: {}", quality));
    }

    codec::encode(&image, format, options.quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_processing::identify;
    use crate::image_processing::test_support::encoded;

    fn options(width: u32, height: u32) -> ConvertOptions {
        ConvertOptions {
            width,
            height,
            ..ConvertOptions::default()
        }
    }

    #[test]
    fn test_convert_to_square_thumbnail() {
        let src = encoded(320, 200, OutputFormat::Jpg);
        let out = convert(&src, &options(100, 100)).unwrap();

        assert!(!out.is_empty());
        assert_ne!(out, src);

        let info = identify(&out).unwrap();
        assert_eq!((info.width, info.height), (100, 100));
        assert_eq!(info.format, "JPEG");
    }

    #[test]
    fn test_convert_zero_axis_keeps_source_size() {
        let src = encoded(64, 48, OutputFormat::Png);
        let out = convert(&src, &options(32, 0)).unwrap();
        let info = identify(&out).unwrap();
        // aspectfill to 32x48 keeps the full height
        assert_eq!((info.width, info.height), (32, 48));
    }

    #[test]
    fn test_convert_without_size_only_reencodes() {
        let src = encoded(30, 20, OutputFormat::Png);
        let out = convert(
            &src,
            &ConvertOptions {
                format: Some(OutputFormat::Bmp),
                ..ConvertOptions::default()
            },
        )
        .unwrap();
        let info = identify(&out).unwrap();
        assert_eq!((info.width, info.height), (30, 20));
        assert_eq!(info.format, "BMP");
    }

    #[test]
    fn test_convert_aspect_fit() {
        let src = encoded(200, 100, OutputFormat::Png);
        let out = convert(
            &src,
            &ConvertOptions {
                width: 100,
                height: 100,
                resize_style: ResizeStyle::AspectFit,
                ..ConvertOptions::default()
            },
        )
        .unwrap();
        let info = identify(&out).unwrap();
        assert_eq!((info.width, info.height), (100, 50));
        assert_eq!(info.format, "PNG");
    }

    #[test]
    fn test_convert_rejects_oversized_size() {
        let src = encoded(8, 8, OutputFormat::Png);
        let err = convert(&src, &options(4_000_000, 4_000_000)).unwrap_err();
        assert!(matches!(
            err,
            TransformError::InvalidParameter { name: "width", .. }
        ));

        let err = options(16, 20_000).validate().unwrap_err();
        assert!(matches!(
            err,
            TransformError::InvalidParameter { name: "height", .. }
        ));
    }

    #[test]
    fn test_convert_rejects_bad_input() {
        let err = convert(b"GIF89a-broken", &options(10, 10)).unwrap_err();
        assert!(matches!(err, TransformError::Decode(_)));

        let src = encoded(8, 8, OutputFormat::Png);
        let err = convert(
            &src,
            &ConvertOptions {
                quality: Some(0),
                ..ConvertOptions::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::InvalidParameter { .. }));
    }
}
