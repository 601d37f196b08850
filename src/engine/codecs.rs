//! Codec capability registry and format identification.
//!
//! The engine's codecs are compiled in through Cargo features; this module
//! is the one place that knows which formats exist, whether they can be
//! read or written, and which pixel kinds each writer accepts. The save
//! path consults it *before* touching the filesystem, so an unexportable
//! save fails without creating a file.
//!
//! Identification checks content signatures first and falls back to the
//! file extension only when the signature is unrecognized, so a mislabeled
//! file resolves to what it actually is.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use image::ImageFormat;

use super::bitmap::PixelKind;

/// How many leading bytes identification reads for signature sniffing.
const SNIFF_LEN: u64 = 64;

/// What one compiled-in codec can do.
#[derive(Debug, Clone, Copy)]
pub struct CodecCaps {
    pub format: ImageFormat,
    /// Pixel kinds the format's writer accepts. Empty for read-only codecs.
    pub writable_kinds: &'static [PixelKind],
}

const EIGHT_AND_SIXTEEN: &[PixelKind] = &[
    PixelKind::L8,
    PixelKind::La8,
    PixelKind::Rgb8,
    PixelKind::Rgba8,
    PixelKind::L16,
    PixelKind::La16,
    PixelKind::Rgb16,
    PixelKind::Rgba16,
];
const RGB_EIGHT: &[PixelKind] = &[PixelKind::Rgb8, PixelKind::Rgba8];

/// The codecs this build carries, with their writer capabilities.
///
/// Kept in sync with the `image` features in Cargo.toml; the runtime
/// registry below additionally filters on what the engine reports as
/// enabled, so a feature change cannot leave a stale entry behind.
const CODEC_TABLE: &[CodecCaps] = &[
    CodecCaps {
        format: ImageFormat::Png,
        writable_kinds: EIGHT_AND_SIXTEEN,
    },
    CodecCaps {
        format: ImageFormat::Jpeg,
        writable_kinds: &[PixelKind::L8, PixelKind::Rgb8],
    },
    CodecCaps {
        format: ImageFormat::Gif,
        writable_kinds: RGB_EIGHT,
    },
    CodecCaps {
        format: ImageFormat::Bmp,
        writable_kinds: RGB_EIGHT,
    },
    CodecCaps {
        format: ImageFormat::Tiff,
        writable_kinds: EIGHT_AND_SIXTEEN,
    },
    CodecCaps {
        format: ImageFormat::WebP,
        writable_kinds: RGB_EIGHT,
    },
];

static REGISTRY: LazyLock<Vec<CodecCaps>> = LazyLock::new(|| {
    CODEC_TABLE
        .iter()
        .copied()
        .filter(|caps| caps.format.reading_enabled() || caps.format.writing_enabled())
        .collect()
});

/// The process-wide codec registry. Initialized once, on first use.
pub fn codec_registry() -> &'static [CodecCaps] {
    &REGISTRY
}

/// Whether the format has a decoder compiled in.
pub fn can_decode(format: ImageFormat) -> bool {
    format.reading_enabled()
}

/// Whether the format has an encoder compiled in that accepts this pixel
/// kind. This is the pre-check every save path runs before encoding.
pub fn can_encode(format: ImageFormat, kind: PixelKind) -> bool {
    if !format.writing_enabled() {
        return false;
    }
    codec_registry()
        .iter()
        .find(|caps| caps.format == format)
        .is_some_and(|caps| caps.writable_kinds.contains(&kind))
}

/// Identify the format of an in-memory file by its content signature.
pub fn identify_memory(bytes: &[u8]) -> Option<ImageFormat> {
    image::guess_format(bytes).ok()
}

/// Identify the format behind a reader by sniffing its leading bytes.
/// Consumes up to [`SNIFF_LEN`] bytes from the reader.
pub fn identify_reader(reader: impl Read) -> Option<ImageFormat> {
    let mut head = Vec::new();
    reader.take(SNIFF_LEN).read_to_end(&mut head).ok()?;
    identify_memory(&head)
}

/// Identify the format of a file on disk: signature first, then the file
/// extension as a fallback for signatureless formats.
pub fn identify_path(path: impl AsRef<Path>) -> Option<ImageFormat> {
    let path = path.as_ref();
    File::open(path)
        .ok()
        .and_then(identify_reader)
        .or_else(|| ImageFormat::from_path(path).ok())
}
