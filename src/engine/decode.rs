//! The decode path: bytes in, owned bitmap out.
//!
//! All load flavors funnel through [`decode_memory`] — the caller has
//! already identified the format and checked the read capability, so this
//! is a straight delegation to the engine's decoder, followed by metadata
//! extraction from the same bytes.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};

use super::bitmap::Bitmap;
use super::iptc;
use super::params::LoadOptions;
use super::EngineError;

/// Decode an in-memory file of a known format into a fresh bitmap.
pub fn decode_memory(
    bytes: &[u8],
    format: ImageFormat,
    options: &LoadOptions,
) -> Result<Bitmap, EngineError> {
    let mut reader = ImageReader::with_format(Cursor::new(bytes), format);
    if options.no_limits {
        reader.no_limits();
    }
    let image = reader.decode()?;

    let mut bitmap = Bitmap::from_image(image);
    for (key, value) in iptc::read_iptc(bytes, format) {
        bitmap.metadata_mut().set(
            crate::metadata::MetadataModel::Iptc,
            key,
            crate::metadata::TagValue::Text(value),
        );
    }
    Ok(bitmap)
}
