use serde::Deserialize;

use super::codec;
use crate::cli::OutputFormat;
use crate::error::TransformError;
use crate::utils::debug_println;

/// Options for [`crop`]
///
/// All four geometry values are fractions of the source size in `[0, 1]`.
/// A missing `width`/`height` means the full image size, a missing
/// `top`/`left` means 0.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CropOptions {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub top: Option<f64>,
    pub left: Option<f64>,
    pub quality: Option<u8>,
    pub format: Option<OutputFormat>,
    pub debug: bool,
}

/// Pixel rectangle selected by a crop, already clipped to the image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl CropOptions {
    /// Bottom-right quarter of the image
    pub fn quadrant() -> Self {
        Self {
            width: Some(0.5),
            height: Some(0.5),
            top: Some(0.5),
            left: Some(0.5),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), TransformError> {
        let fractions = [
            ("width", self.width),
            ("height", self.height),
            ("top", self.top),
            ("left", self.left),
        ];

        if fractions.iter().all(|(_, value)| value.is_none()) {
            return Err(TransformError::invalid(
                "width",
                "at least one of width, height, top, left must be set",
            ));
        }

        for (name, value) in fractions {
            if let Some(v) = value {
                if !(0.0..=1.0).contains(&v) {
                    return Err(TransformError::invalid(
                        name,
                        format!("should be a number between 0 and 1, got {}", v),
                    ));
                }
            }
        }

        codec::validate_quality(self.quality)
    }

    /// Translate the fractions into a pixel rectangle on a `cols x rows` image
    pub fn region(&self, cols: u32, rows: u32) -> Result<CropRegion, TransformError> {
        let width = self.width.map_or(cols, |f| (f * cols as f64) as u32);
        let height = self.height.map_or(rows, |f| (f * rows as f64) as u32);
        let top = self.top.map_or(0, |f| (f * rows as f64) as u32);
        let left = self.left.map_or(0, |f| (f * cols as f64) as u32);

        // Clip to the image bounds
        let clipped_width = width.min(cols.saturating_sub(left));
        let clipped_height = height.min(rows.saturating_sub(top));

        if clipped_width == 0 || clipped_height == 0 {
            return Err(TransformError::EmptyRegion {
                width,
                height,
                left,
                top,
                image_width: cols,
                image_height: rows,
            });
        }

        Ok(CropRegion {
            left,
            top,
            width: clipped_width,
            height: clipped_height,
        })
    }
}

/// Crop a proportional region out of an image
pub fn crop(src: &[u8], options: &CropOptions) -> Result<Vec<u8>, TransformError> {
    options.validate()?;

    let decoded = codec::decode(src)?;
    let format = codec::resolve_output_format(options.format, decoded.format);
    let debug = options.debug;

    let (cols, rows) = (decoded.image.width(), decoded.image.height());
    let region = options.region(cols, rows)?;

    debug_println(debug, &format!("format: {:?}", format));
    debug_println(
        debug,
        &format!(
            "crop to: {}, {}, {}, {}",
            region.width, region.height, region.left, region.top
        ),
    );

    let cropped = decoded
        .image
        .crop_imm(region.left, region.top, region.width, region.height);

    debug_println(
        debug,
        &format!("cropped to: {}, {}", cropped.width(), cropped.height()),
    );

    codec::encode(&cropped, format, options.quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_processing::identify;
    use crate::image_processing::test_support::{create_test_image, encoded};
    use image::DynamicImage;

    #[test]
    fn test_quadrant_region() {
        let region = CropOptions::quadrant().region(101, 80).unwrap();
        assert_eq!(
            region,
            CropRegion {
                left: 50,
                top: 40,
                width: 50,
                height: 40
            }
        );
    }

    #[test]
    fn test_region_defaults_and_clipping() {
        // Only left given: full width, clipped at the right edge
        let options = CropOptions {
            left: Some(0.25),
            ..CropOptions::default()
        };
        let region = options.region(100, 60).unwrap();
        assert_eq!(
            region,
            CropRegion {
                left: 25,
                top: 0,
                width: 75,
                height: 60
            }
        );
    }

    #[test]
    fn test_region_outside_image_is_empty() {
        let options = CropOptions {
            top: Some(1.0),
            ..CropOptions::default()
        };
        assert!(matches!(
            options.region(100, 60),
            Err(TransformError::EmptyRegion { .. })
        ));

        let options = CropOptions {
            width: Some(0.0),
            ..CropOptions::default()
        };
        assert!(options.region(100, 60).is_err());
    }

    #[test]
    fn test_validate() {
        assert!(CropOptions::quadrant().validate().is_ok());
        assert!(CropOptions::default().validate().is_err());

        let options = CropOptions {
            top: Some(-0.1),
            ..CropOptions::default()
        };
        match options.validate() {
            Err(TransformError::InvalidParameter { name, .. }) => assert_eq!(name, "top"),
            other => panic!("expected invalid top, got {:?}", other),
        }
    }

    #[test]
    fn test_crop_halves_each_axis() {
        let src = encoded(120, 90, OutputFormat::Jpg);
        let out = crop(&src, &CropOptions::quadrant()).unwrap();
        let info = identify(&out).unwrap();
        assert_eq!((info.width, info.height), (60, 45));
        assert_eq!(info.format, "JPEG");
    }

    #[test]
    fn test_crop_takes_pixels_from_the_region() {
        let img = create_test_image(8, 8);
        let src = codec::encode(&DynamicImage::ImageRgb8(img.clone()), OutputFormat::Png, None)
            .unwrap();
        let out = crop(&src, &CropOptions::quadrant()).unwrap();
        let cropped = codec::decode(&out).unwrap().image.to_rgb8();

        assert_eq!(cropped.dimensions(), (4, 4));
        assert_eq!(cropped.get_pixel(0, 0), img.get_pixel(4, 4));
        assert_eq!(cropped.get_pixel(3, 1), img.get_pixel(7, 5));
    }
}
