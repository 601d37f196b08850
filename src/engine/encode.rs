//! The encode path: owned bitmap in, bytes out.
//!
//! Every flavor runs the capability pre-check first — writer support and
//! pixel-kind support, from the codec registry — so a doomed save fails
//! before any byte is written and before any file is created.

use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::ImageFormat;

use super::bitmap::Bitmap;
use super::codecs;
use super::params::SaveOptions;
use super::EngineError;

fn ensure_exportable(bitmap: &Bitmap, format: ImageFormat) -> Result<(), EngineError> {
    let kind = bitmap.pixel_kind();
    if !codecs::can_encode(format, kind) {
        return Err(EngineError::Unsupported(format!(
            "{format:?} cannot encode {kind:?} bitmaps"
        )));
    }
    Ok(())
}

/// Encode into any writer. The writer must seek; some engine encoders
/// backpatch headers.
pub fn encode_to_writer<W: Write + Seek>(
    bitmap: &Bitmap,
    writer: &mut W,
    format: ImageFormat,
    options: &SaveOptions,
) -> Result<(), EngineError> {
    ensure_exportable(bitmap, format)?;
    match format {
        // the one lossy encoder in the compiled set with a quality knob
        ImageFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(writer, options.quality.value() as u8);
            bitmap.image().write_with_encoder(encoder)?;
        }
        _ => bitmap.image().write_to(writer, format)?,
    }
    Ok(())
}

/// Encode to a file. The capability pre-check runs before the file is
/// created, so a rejected save leaves no empty file behind.
pub fn encode_to_path(
    bitmap: &Bitmap,
    path: &Path,
    format: ImageFormat,
    options: &SaveOptions,
) -> Result<(), EngineError> {
    ensure_exportable(bitmap, format)?;
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    encode_to_writer(bitmap, &mut writer, format, options)
}

/// Encode into a fresh in-memory buffer.
pub fn encode_to_memory(
    bitmap: &Bitmap,
    format: ImageFormat,
    options: &SaveOptions,
) -> Result<Vec<u8>, EngineError> {
    let mut cursor = Cursor::new(Vec::new());
    encode_to_writer(bitmap, &mut cursor, format, options)?;
    Ok(cursor.into_inner())
}
