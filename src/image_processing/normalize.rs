use image::{DynamicImage, Rgb, RgbImage, RgbaImage};
use serde::Deserialize;

use super::codec;
use super::orientation::{apply_orientation, read_exif_orientation};
use crate::cli::OutputFormat;
use crate::error::TransformError;
use crate::utils::debug_println;

/// Share of darkest pixels per channel that is pushed to 0
const BLACK_POINT: f64 = 0.02;
/// Share of brightest pixels per channel that is pushed to 255
const WHITE_POINT: f64 = 0.01;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NormalizeOptions {
    pub quality: Option<u8>,
    pub format: Option<OutputFormat>,
    pub debug: bool,
}

impl NormalizeOptions {
    pub fn validate(&self) -> Result<(), TransformError> {
        codec::validate_quality(self.quality)
    }
}

/// Auto-orient an image from its EXIF tag and stretch its levels
///
/// The re-encoded output carries no metadata, so the orientation is baked
/// into the pixels.
pub fn normalize(src: &[u8], options: &NormalizeOptions) -> Result<Vec<u8>, TransformError> {
    options.validate()?;

    let decoded = codec::decode(src)?;
    let format = codec::resolve_output_format(options.format, decoded.format);
    let debug = options.debug;

    let orientation = read_exif_orientation(src);
    debug_println(
        debug,
        &format!(
            "orientation: {} ({})",
            orientation as u8,
            orientation.description()
        ),
    );

    let upright = apply_orientation(decoded.image, orientation);
    let stretched = stretch_levels(&upright, debug);

    codec::encode(&stretched, format, options.quality)
}

/// Stretch each colour channel so its histogram spans the full 0-255 range
///
/// Alpha is carried over untouched.
pub fn stretch_levels(img: &DynamicImage, debug: bool) -> DynamicImage {
    if img.color().has_alpha() {
        let mut rgba: RgbaImage = img.to_rgba8();
        let luts = channel_luts(rgba.pixels().map(|p| [p[0], p[1], p[2]]), debug);
        for pixel in rgba.pixels_mut() {
            for c in 0..3 {
                pixel[c] = luts[c][pixel[c] as usize];
            }
        }
        DynamicImage::ImageRgba8(rgba)
    } else {
        let rgb: RgbImage = img.to_rgb8();
        let luts = channel_luts(rgb.pixels().map(|p| [p[0], p[1], p[2]]), debug);
        let mut output = RgbImage::new(rgb.width(), rgb.height());
        for (x, y, pixel) in rgb.enumerate_pixels() {
            output.put_pixel(
                x,
                y,
                Rgb([
                    luts[0][pixel[0] as usize],
                    luts[1][pixel[1] as usize],
                    luts[2][pixel[2] as usize],
                ]),
            );
        }
        DynamicImage::ImageRgb8(output)
    }
}

/// Build one lookup table per RGB channel from the channel histograms
fn channel_luts(pixels: impl Iterator<Item = [u8; 3]>, debug: bool) -> [[u8; 256]; 3] {
    let mut histograms = [[0u64; 256]; 3];
    let mut total = 0u64;
    for pixel in pixels {
        for c in 0..3 {
            histograms[c][pixel[c] as usize] += 1;
        }
        total += 1;
    }

    let mut luts = [[0u8; 256]; 3];
    for c in 0..3 {
        let (low, high) = channel_bounds(&histograms[c], total);
        debug_println(debug, &format!("channel {} levels: {}..{}", c, low, high));
        luts[c] = level_lut(low, high);
    }
    luts
}

/// Find the black and white points of a channel histogram
fn channel_bounds(histogram: &[u64; 256], total: u64) -> (u8, u8) {
    let black_cut = (total as f64 * BLACK_POINT) as u64;
    let white_cut = (total as f64 * WHITE_POINT) as u64;

    let mut low = 0usize;
    let mut seen = 0u64;
    for (value, &count) in histogram.iter().enumerate() {
        seen += count;
        if seen > black_cut {
            low = value;
            break;
        }
    }

    let mut high = 255usize;
    seen = 0;
    for (value, &count) in histogram.iter().enumerate().rev() {
        seen += count;
        if seen > white_cut {
            high = value;
            break;
        }
    }

    (low as u8, high as u8)
}

/// Linear map from `low..=high` onto `0..=255`; identity when there is no spread
fn level_lut(low: u8, high: u8) -> [u8; 256] {
    let mut lut = [0u8; 256];
    if high <= low {
        for (value, entry) in lut.iter_mut().enumerate() {
            *entry = value as u8;
        }
        return lut;
    }

    let range = (high - low) as f32;
    for (value, entry) in lut.iter_mut().enumerate() {
        let scaled = (value as f32 - low as f32) * 255.0 / range;
        *entry = scaled.round().clamp(0.0, 255.0) as u8;
    }
    lut
}
