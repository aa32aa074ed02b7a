use serde::Serialize;

use super::codec;
use super::orientation::read_exif_orientation;
use crate::error::TransformError;

/// Basic properties of an encoded image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// Bits per channel
    pub depth: u16,
    /// Upper-case container name, e.g. `JPEG`
    pub format: String,
    /// Raw EXIF orientation value, 0 when absent
    pub orientation: u8,
}

pub fn identify(src: &[u8]) -> Result<ImageInfo, TransformError> {
    let decoded = codec::decode(src)?;
    let color = decoded.image.color();
    let channels = u16::from(color.channel_count()).max(1);

    Ok(ImageInfo {
        width: decoded.image.width(),
        height: decoded.image.height(),
        depth: color.bits_per_pixel() / channels,
        format: format!("{:?}", decoded.format).to_uppercase(),
        orientation: read_exif_orientation(src) as u8,
    })
}
