use exif::{In, Reader, Tag};
use image::DynamicImage;
use std::io::Cursor;

/// Orientation tag (0x0112) of an image, named by where row 0 / column 0 sit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExifOrientation {
    /// Tag missing or out of range
    Undefined = 0,
    TopLeft = 1,
    /// Mirrored left to right
    TopRight = 2,
    /// Upside down
    BottomRight = 3,
    /// Mirrored top to bottom
    BottomLeft = 4,
    /// Transposed across the main diagonal
    LeftTop = 5,
    /// Needs a 90° clockwise turn
    RightTop = 6,
    /// Transposed across the anti-diagonal
    RightBottom = 7,
    /// Needs a 90° counter-clockwise turn
    LeftBottom = 8,
}

impl From<u32> for ExifOrientation {
    fn from(value: u32) -> Self {
        use ExifOrientation::*;
        [TopLeft, TopRight, BottomRight, BottomLeft, LeftTop, RightTop, RightBottom, LeftBottom]
            .into_iter()
            .find(|o| *o as u32 == value)
            .unwrap_or(Undefined)
    }
}

impl ExifOrientation {
    pub fn description(&self) -> &'static str {
        match self {
            ExifOrientation::Undefined => "none",
            ExifOrientation::TopLeft => "upright",
            ExifOrientation::TopRight => "mirrored",
            ExifOrientation::BottomRight => "upside down",
            ExifOrientation::BottomLeft => "mirrored vertically",
            ExifOrientation::LeftTop => "transposed",
            ExifOrientation::RightTop => "rotate 90° clockwise",
            ExifOrientation::RightBottom => "transversed",
            ExifOrientation::LeftBottom => "rotate 90° counter-clockwise",
        }
    }
}

/// Orientation stored in an encoded image's EXIF block
///
/// Images without EXIF, or with an unreadable block, report `Undefined`.
pub fn read_exif_orientation(bytes: &[u8]) -> ExifOrientation {
    Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()
        .and_then(|exif| {
            exif.get_field(Tag::Orientation, In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        })
        .map_or(ExifOrientation::Undefined, ExifOrientation::from)
}

/// Rotate and flip pixels so the image displays upright with no tag
pub fn apply_orientation(img: DynamicImage, orientation: ExifOrientation) -> DynamicImage {
    match orientation {
        ExifOrientation::Undefined | ExifOrientation::TopLeft => img,
        ExifOrientation::TopRight => img.fliph(),
        ExifOrientation::BottomRight => img.rotate180(),
        ExifOrientation::BottomLeft => img.flipv(),
        ExifOrientation::LeftTop => img.rotate90().fliph(),
        ExifOrientation::RightTop => img.rotate90(),
        ExifOrientation::RightBottom => img.rotate270().fliph(),
        ExifOrientation::LeftBottom => img.rotate270(),
    }
}
