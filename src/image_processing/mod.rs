//! In-memory image transforms.
//!
//! Every transform takes the encoded source bytes plus an options record and
//! returns freshly encoded bytes. Nothing here touches the filesystem, so the
//! same source buffer can be shared by any number of concurrent calls.

pub mod codec;
pub mod convert;
pub mod crop;
pub mod identify;
pub mod normalize;
pub mod orientation;
pub mod resize;

use serde::Deserialize;

use crate::cli::Operation;
use crate::error::TransformError;

pub use convert::{convert, ConvertOptions};
pub use crop::{crop, CropOptions};
pub use identify::{identify, ImageInfo};
pub use normalize::{normalize, NormalizeOptions};

/// A single transform request, as carried by a driver job
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "operation", rename_all = "lowercase")]
pub enum Transform {
    Convert(ConvertOptions),
    Crop(CropOptions),
    Normalize(NormalizeOptions),
}

impl Transform {
    pub fn operation(&self) -> Operation {
        match self {
            Transform::Convert(_) => Operation::Convert,
            Transform::Crop(_) => Operation::Crop,
            Transform::Normalize(_) => Operation::Normalize,
        }
    }

    /// Check parameters that can be rejected without decoding the image
    pub fn validate(&self) -> Result<(), TransformError> {
        match self {
            Transform::Convert(options) => options.validate(),
            Transform::Crop(options) => options.validate(),
            Transform::Normalize(options) => options.validate(),
        }
    }

    /// Run the transform against `src`
    pub fn apply(&self, src: &[u8]) -> Result<Vec<u8>, TransformError> {
        match self {
            Transform::Convert(options) => convert(src, options),
            Transform::Crop(options) => crop(src, options),
            Transform::Normalize(options) => normalize(src, options),
        }
    }

    pub fn set_debug(&mut self, debug: bool) {
        match self {
            Transform::Convert(options) => options.debug = debug,
            Transform::Crop(options) => options.debug = debug,
            Transform::Normalize(options) => options.debug = debug,
        }
    }

    /// One-line description used in plans and reports
    pub fn describe(&self) -> String {
        match self {
            Transform::Convert(o) => format!("{}x{} {:?}", o.width, o.height, o.resize_style),
            Transform::Crop(o) => format!(
                "w={} h={} top={} left={}",
                fraction_label(o.width),
                fraction_label(o.height),
                fraction_label(o.top),
                fraction_label(o.left)
            ),
            Transform::Normalize(_) => "auto-orient + stretch".to_string(),
        }
    }
}

fn fraction_label(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{}", v))
}
