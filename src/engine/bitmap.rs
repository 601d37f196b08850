//! The owned bitmap resource.
//!
//! [`Bitmap`] is the unit of ownership in this crate: one pixel container
//! from the engine plus the side state a bitmap file carries around it
//! (resolution, background color, transparency flag, embedded thumbnail,
//! metadata). A [`Frame`](crate::frame::Frame) holds at most one of these;
//! the engine's three lifecycle capabilities map onto [`Bitmap::allocate`],
//! [`Clone`], and `Drop`.
//!
//! The engine's pixel container never leaves this module boundary — callers
//! see [`PixelKind`], dimensions, and byte views, not the container type.

use image::{DynamicImage, GenericImage, GenericImageView, Rgba};

use super::EngineError;
use crate::metadata::MetadataStore;

/// Default resolution for fresh allocations: 2835 dots/meter ≈ 72 DPI.
pub const DEFAULT_DOTS_PER_METER: u32 = 2835;

/// Pixel layout of a bitmap, mirroring the engine's containers one to one.
///
/// `Unknown` is the neutral value reported by queries on an empty frame; it
/// is never the kind of a held resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PixelKind {
    #[default]
    Unknown,
    L8,
    La8,
    Rgb8,
    Rgba8,
    L16,
    La16,
    Rgb16,
    Rgba16,
    RgbF32,
    RgbaF32,
}

impl PixelKind {
    pub fn bits_per_pixel(self) -> u32 {
        match self {
            PixelKind::Unknown => 0,
            PixelKind::L8 => 8,
            PixelKind::La8 | PixelKind::L16 => 16,
            PixelKind::Rgb8 => 24,
            PixelKind::Rgba8 | PixelKind::La16 => 32,
            PixelKind::Rgb16 => 48,
            PixelKind::Rgba16 => 64,
            PixelKind::RgbF32 => 96,
            PixelKind::RgbaF32 => 128,
        }
    }

    pub fn bytes_per_pixel(self) -> u32 {
        self.bits_per_pixel() / 8
    }

    pub fn channel_count(self) -> u32 {
        match self {
            PixelKind::Unknown => 0,
            PixelKind::L8 | PixelKind::L16 => 1,
            PixelKind::La8 | PixelKind::La16 => 2,
            PixelKind::Rgb8 | PixelKind::Rgb16 | PixelKind::RgbF32 => 3,
            PixelKind::Rgba8 | PixelKind::Rgba16 | PixelKind::RgbaF32 => 4,
        }
    }

    pub fn has_alpha(self) -> bool {
        matches!(
            self,
            PixelKind::La8 | PixelKind::Rgba8 | PixelKind::La16 | PixelKind::Rgba16 | PixelKind::RgbaF32
        )
    }

    /// 8 bits per sample — the kinds direct pixel color access is defined for.
    pub fn is_8bit(self) -> bool {
        matches!(
            self,
            PixelKind::L8 | PixelKind::La8 | PixelKind::Rgb8 | PixelKind::Rgba8
        )
    }

    pub(crate) fn from_color(color: image::ColorType) -> Self {
        match color {
            image::ColorType::L8 => PixelKind::L8,
            image::ColorType::La8 => PixelKind::La8,
            image::ColorType::Rgb8 => PixelKind::Rgb8,
            image::ColorType::Rgba8 => PixelKind::Rgba8,
            image::ColorType::L16 => PixelKind::L16,
            image::ColorType::La16 => PixelKind::La16,
            image::ColorType::Rgb16 => PixelKind::Rgb16,
            image::ColorType::Rgba16 => PixelKind::Rgba16,
            image::ColorType::Rgb32F => PixelKind::RgbF32,
            image::ColorType::Rgba32F => PixelKind::RgbaF32,
            _ => PixelKind::Unknown,
        }
    }
}

/// One owned bitmap: pixels plus file-level side state.
#[derive(Debug, Clone)]
pub struct Bitmap {
    image: DynamicImage,
    dots_per_meter_x: u32,
    dots_per_meter_y: u32,
    background: Option<Rgba<u8>>,
    transparent: bool,
    thumbnail: Option<Box<Bitmap>>,
    metadata: MetadataStore,
}

impl Bitmap {
    /// Allocate a blank bitmap of the given kind and size. Pixels are zeroed
    /// by the engine. Zero dimensions and `Unknown` are rejected.
    pub fn allocate(kind: PixelKind, width: u32, height: u32) -> Result<Bitmap, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::Unsupported(format!(
                "cannot allocate a {width}x{height} bitmap"
            )));
        }
        let image = match kind {
            PixelKind::Unknown => {
                return Err(EngineError::Unsupported(
                    "cannot allocate a bitmap of unknown kind".into(),
                ));
            }
            PixelKind::L8 => DynamicImage::new_luma8(width, height),
            PixelKind::La8 => DynamicImage::new_luma_a8(width, height),
            PixelKind::Rgb8 => DynamicImage::new_rgb8(width, height),
            PixelKind::Rgba8 => DynamicImage::new_rgba8(width, height),
            PixelKind::L16 => DynamicImage::new_luma16(width, height),
            PixelKind::La16 => DynamicImage::new_luma_a16(width, height),
            PixelKind::Rgb16 => DynamicImage::new_rgb16(width, height),
            PixelKind::Rgba16 => DynamicImage::new_rgba16(width, height),
            PixelKind::RgbF32 => DynamicImage::new_rgb32f(width, height),
            PixelKind::RgbaF32 => DynamicImage::new_rgba32f(width, height),
        };
        Ok(Self::from_image(image))
    }

    /// Wrap a freshly produced engine container with default side state.
    pub(crate) fn from_image(image: DynamicImage) -> Bitmap {
        let transparent = image.color().has_alpha();
        Bitmap {
            image,
            dots_per_meter_x: DEFAULT_DOTS_PER_METER,
            dots_per_meter_y: DEFAULT_DOTS_PER_METER,
            background: None,
            transparent,
            thumbnail: None,
            metadata: MetadataStore::new(),
        }
    }

    /// A new bitmap derived from this one by a transform or conversion:
    /// resolution and background carry over, transparency follows the new
    /// pixel layout, thumbnail and metadata do not survive the operation.
    pub(crate) fn derive(&self, image: DynamicImage) -> Bitmap {
        let transparent = image.color().has_alpha();
        Bitmap {
            image,
            dots_per_meter_x: self.dots_per_meter_x,
            dots_per_meter_y: self.dots_per_meter_y,
            background: self.background,
            transparent,
            thumbnail: None,
            metadata: MetadataStore::new(),
        }
    }

    pub(crate) fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub(crate) fn image_mut(&mut self) -> &mut DynamicImage {
        &mut self.image
    }

    // --- information queries ------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel_kind(&self) -> PixelKind {
        PixelKind::from_color(self.image.color())
    }

    /// Bytes per scanline. The engine stores rows tightly packed, so this is
    /// exactly `width * bytes_per_pixel` with no padding.
    pub fn pitch(&self) -> u32 {
        self.width() * self.pixel_kind().bytes_per_pixel()
    }

    /// Total size of the pixel buffer in bytes.
    pub fn byte_size(&self) -> usize {
        self.image.as_bytes().len()
    }

    pub fn is_grayscale(&self) -> bool {
        !self.image.color().has_color()
    }

    // --- pixel and scanline access ------------------------------------------

    /// The whole pixel buffer, rows top to bottom.
    pub fn bytes(&self) -> &[u8] {
        self.image.as_bytes()
    }

    /// One row of the pixel buffer. Row 0 is the top row.
    pub fn scanline(&self, row: u32) -> Option<&[u8]> {
        if row >= self.height() {
            return None;
        }
        let pitch = self.pitch() as usize;
        let start = row as usize * pitch;
        self.bytes().get(start..start + pitch)
    }

    /// Pixel color at (x, y). Defined for 8-bit kinds only, like the
    /// engine's color accessor.
    pub fn pixel_color(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        if !self.pixel_kind().is_8bit() || x >= self.width() || y >= self.height() {
            return None;
        }
        Some(self.image.get_pixel(x, y))
    }

    /// Write a pixel color at (x, y). Same 8-bit and bounds gates as
    /// [`Bitmap::pixel_color`].
    pub fn set_pixel_color(&mut self, x: u32, y: u32, color: Rgba<u8>) -> bool {
        if !self.pixel_kind().is_8bit() || x >= self.width() || y >= self.height() {
            return false;
        }
        self.image.put_pixel(x, y, color);
        true
    }

    // --- resolution ---------------------------------------------------------

    pub fn dots_per_meter_x(&self) -> u32 {
        self.dots_per_meter_x
    }

    pub fn dots_per_meter_y(&self) -> u32 {
        self.dots_per_meter_y
    }

    pub fn set_dots_per_meter_x(&mut self, value: u32) {
        self.dots_per_meter_x = value;
    }

    pub fn set_dots_per_meter_y(&mut self, value: u32) {
        self.dots_per_meter_y = value;
    }

    // --- transparency and background ----------------------------------------

    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    pub fn set_transparent(&mut self, enabled: bool) {
        self.transparent = enabled;
    }

    pub fn background(&self) -> Option<Rgba<u8>> {
        self.background
    }

    pub fn set_background(&mut self, color: Option<Rgba<u8>>) {
        self.background = color;
    }

    // --- embedded thumbnail -------------------------------------------------

    pub fn thumbnail(&self) -> Option<&Bitmap> {
        self.thumbnail.as_deref()
    }

    pub fn set_thumbnail(&mut self, thumbnail: Option<Bitmap>) {
        self.thumbnail = thumbnail.map(Box::new);
    }

    // --- metadata -----------------------------------------------------------

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut MetadataStore {
        &mut self.metadata
    }
}
