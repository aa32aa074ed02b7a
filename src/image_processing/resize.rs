use fast_image_resize::{images::Image, PixelType, ResizeOptions, Resizer};
use image::{DynamicImage, RgbImage, RgbaImage};

use crate::cli::ResizeStyle;
use crate::error::TransformError;

/// Largest width or height a resize may produce
pub const MAX_DIMENSION: u32 = 16384;

/// Reject target sizes above [`MAX_DIMENSION`] before any buffer is allocated
pub fn check_dimensions(width: u32, height: u32) -> Result<(), TransformError> {
    for (name, value) in [("width", width), ("height", height)] {
        if value > MAX_DIMENSION {
            return Err(TransformError::invalid(
                name,
                format!("must be at most {} pixels, got {}", MAX_DIMENSION, value),
            ));
        }
    }
    Ok(())
}

/// Geometry chosen for a resize: an optional centred crop of the source,
/// then a scale to `width x height`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    pub crop: Option<(u32, u32, u32, u32)>,
    pub width: u32,
    pub height: u32,
}

/// Work out the resize geometry for a source image
///
/// A zero target axis takes the source size on that axis.
pub fn plan_resize(
    src_width: u32,
    src_height: u32,
    target_width: u32,
    target_height: u32,
    style: ResizeStyle,
) -> ResizePlan {
    let width = if target_width == 0 { src_width } else { target_width };
    let height = if target_height == 0 { src_height } else { target_height };

    match style {
        ResizeStyle::Fill => ResizePlan {
            crop: None,
            width,
            height,
        },
        ResizeStyle::AspectFit => {
            let scale = (width as f64 / src_width as f64).min(height as f64 / src_height as f64);
            ResizePlan {
                crop: None,
                width: ((src_width as f64 * scale).round() as u32).clamp(1, width),
                height: ((src_height as f64 * scale).round() as u32).clamp(1, height),
            }
        }
        ResizeStyle::AspectFill => {
            // Calculate crop dimensions to maintain aspect ratio
            let target_aspect = width as f64 / height as f64;
            let source_aspect = src_width as f64 / src_height as f64;

            let (crop_width, crop_height) = if source_aspect > target_aspect {
                // Source is wider - crop width
                let new_width = (src_height as f64 * target_aspect).round() as u32;
                (new_width.clamp(1, src_width), src_height)
            } else {
                // Source is taller - crop height
                let new_height = (src_width as f64 / target_aspect).round() as u32;
                (src_width, new_height.clamp(1, src_height))
            };

            let crop = if crop_width == src_width && crop_height == src_height {
                None
            } else {
                let crop_x = (src_width - crop_width) / 2;
                let crop_y = (src_height - crop_height) / 2;
                Some((crop_x, crop_y, crop_width, crop_height))
            };

            ResizePlan {
                crop,
                width,
                height,
            }
        }
    }
}

/// Resize an image following `style`
pub fn resize(
    img: &DynamicImage,
    target_width: u32,
    target_height: u32,
    style: ResizeStyle,
) -> Result<DynamicImage, TransformError> {
    let plan = plan_resize(img.width(), img.height(), target_width, target_height, style);

    let source = match plan.crop {
        Some((x, y, w, h)) => img.crop_imm(x, y, w, h),
        None => img.clone(),
    };

    resize_exact(&source, plan.width, plan.height)
}

/// Resize an image to exact dimensions using high-quality algorithm
pub fn resize_exact(
    img: &DynamicImage,
    width: u32,
    height: u32,
) -> Result<DynamicImage, TransformError> {
    if width == 0 || height == 0 {
        return Err(TransformError::invalid(
            "size",
            format!("target {}x{} has a zero side", width, height),
        ));
    }
    check_dimensions(width, height)?;

    if img.width() == width && img.height() == height {
        return Ok(img.clone());
    }

    if img.color().has_alpha() {
        let src = img.to_rgba8();
        let pixels = resize_pixels(
            src.into_raw(),
            img.width(),
            img.height(),
            width,
            height,
            PixelType::U8x4,
        )?;
        RgbaImage::from_raw(width, height, pixels)
            .map(DynamicImage::ImageRgba8)
            .ok_or_else(|| TransformError::Resize("resized buffer has the wrong length".to_string()))
    } else {
        let src = img.to_rgb8();
        let pixels = resize_pixels(
            src.into_raw(),
            img.width(),
            img.height(),
            width,
            height,
            PixelType::U8x3,
        )?;
        RgbImage::from_raw(width, height, pixels)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| TransformError::Resize("resized buffer has the wrong length".to_string()))
    }
}

fn resize_pixels(
    src_pixels: Vec<u8>,
    src_width: u32,
    src_height: u32,
    width: u32,
    height: u32,
    pixel_type: PixelType,
) -> Result<Vec<u8>, TransformError> {
    let src_image = Image::from_vec_u8(src_width, src_height, src_pixels, pixel_type)
        .map_err(|e| TransformError::Resize(e.to_string()))?;

    let mut dst_image = Image::new(width, height, pixel_type);

    let mut resizer = Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, Some(&ResizeOptions::default()))
        .map_err(|e| TransformError::Resize(e.to_string()))?;

    Ok(dst_image.into_vec())
}
