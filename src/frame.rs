//! The bitmap resource handle.
//!
//! A [`Frame`] owns at most one [`Bitmap`] and forwards every substantive
//! operation to the engine boundary. It has exactly two states:
//!
//! ```text
//! Empty   --allocate/load/adopt-->  Holding
//! Holding --replace-->              Holding   (resource identity changes)
//! Holding --clear/drop-->           Empty
//! ```
//!
//! There is no intermediate state; loads and saves are atomic from the
//! handle's perspective. The one deliberate wrinkle: the load path releases
//! the held resource *before* attempting the decode, so a failed decode of
//! an identified, readable format leaves the frame Empty rather than
//! keeping the prior image. Loads are replacement by contract; the prior
//! image never survives a load attempt that got as far as the decoder.
//!
//! # The uniform call contract
//!
//! Mutating operations return `bool`: `true` on success, `false` on any
//! failure — empty handle, capability rejection, engine failure. No cause
//! is distinguished at this layer, nothing panics, and a failed mutator
//! other than load has no partial effect. Value-returning queries are total:
//! on an Empty frame they report the neutral value (zero dimensions,
//! [`PixelKind::Unknown`], `None`) instead of failing.
//!
//! # Ownership
//!
//! The held bitmap is exclusively owned. Copying a frame deep-copies the
//! resource through the engine's clone capability; adopting a [`Bitmap`]
//! moves it in. Replacing drops the previous resource exactly once — and
//! since adoption moves, replacing a resource with itself cannot be
//! expressed, so the self-assignment hazard of pointer-based wrappers does
//! not exist here.
//!
//! # The dirty flag
//!
//! Every operation that alters pixel data, size, or associated metadata
//! marks the frame modified. Load marks it unconditionally once the format
//! gate passes — even if the decode then fails. Save never resets it;
//! callers that track save state use [`Frame::set_modified`].

use std::io::{Read, Seek, Write};
use std::path::Path;

use image::imageops::FilterType;
use image::{ImageFormat, Rgba};

use crate::engine::{
    self, Bitmap, Channel, EngineError, LoadOptions, PixelKind, SaveOptions,
};
use crate::metadata::{MetadataModel, Tag, TagValue};

/// Handle owning at most one bitmap resource.
///
/// See the [module docs](self) for the state machine, the call contract,
/// and the dirty-flag rules.
#[derive(Debug, Default)]
pub struct Frame {
    bitmap: Option<Bitmap>,
    modified: bool,
}

impl Frame {
    /// A new, Empty frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// A frame holding a blank allocation, or an Empty frame when any
    /// dimension is zero or the kind is `Unknown`.
    pub fn with_size(kind: PixelKind, width: u32, height: u32) -> Self {
        let mut frame = Self::new();
        if width > 0 && height > 0 {
            frame.set_size(kind, width, height);
        }
        frame
    }

    /// The single choke point through which the held resource changes
    /// identity. Rejects an absent replacement without altering state.
    fn replace(&mut self, new: Option<Bitmap>) -> bool {
        let Some(new) = new else { return false };
        self.bitmap = Some(new);
        self.modified = true;
        true
    }

    fn held(&self) -> Option<&Bitmap> {
        self.bitmap.as_ref()
    }

    // --- lifecycle ----------------------------------------------------------

    /// Replace the held resource with a blank allocation. The previous
    /// resource is released even when the allocation is then rejected.
    pub fn set_size(&mut self, kind: PixelKind, width: u32, height: u32) -> bool {
        self.bitmap = None;
        match Bitmap::allocate(kind, width, height) {
            Ok(bitmap) => {
                self.bitmap = Some(bitmap);
                self.modified = true;
                true
            }
            Err(_) => false,
        }
    }

    /// Release the held resource and mark the frame modified.
    pub fn clear(&mut self) {
        self.bitmap = None;
        self.modified = true;
    }

    /// Whether the frame currently holds a resource.
    pub fn is_valid(&self) -> bool {
        self.bitmap.is_some()
    }

    /// Whether the content changed since the last load, or since the caller
    /// last reset the flag after a save.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    /// Take ownership of an externally produced bitmap, releasing any
    /// previously held resource.
    pub fn adopt(&mut self, bitmap: Bitmap) -> bool {
        self.replace(Some(bitmap))
    }

    // --- information queries ------------------------------------------------

    pub fn width(&self) -> u32 {
        self.held().map_or(0, Bitmap::width)
    }

    pub fn height(&self) -> u32 {
        self.held().map_or(0, Bitmap::height)
    }

    pub fn pixel_kind(&self) -> PixelKind {
        self.held().map_or(PixelKind::Unknown, Bitmap::pixel_kind)
    }

    pub fn bits_per_pixel(&self) -> u32 {
        self.pixel_kind().bits_per_pixel()
    }

    /// Bytes per scanline; rows are tightly packed.
    pub fn pitch(&self) -> u32 {
        self.held().map_or(0, Bitmap::pitch)
    }

    /// Total pixel buffer size in bytes.
    pub fn byte_size(&self) -> usize {
        self.held().map_or(0, Bitmap::byte_size)
    }

    pub fn is_grayscale(&self) -> bool {
        self.held().is_some_and(Bitmap::is_grayscale)
    }

    /// Horizontal resolution in dots per centimeter.
    pub fn horizontal_resolution(&self) -> f64 {
        self.held()
            .map_or(0.0, |b| f64::from(b.dots_per_meter_x()) / 100.0)
    }

    /// Vertical resolution in dots per centimeter.
    pub fn vertical_resolution(&self) -> f64 {
        self.held()
            .map_or(0.0, |b| f64::from(b.dots_per_meter_y()) / 100.0)
    }

    pub fn set_horizontal_resolution(&mut self, value: f64) {
        if let Some(bitmap) = self.bitmap.as_mut() {
            bitmap.set_dots_per_meter_x((value * 100.0 + 0.5) as u32);
        }
    }

    pub fn set_vertical_resolution(&mut self, value: f64) {
        if let Some(bitmap) = self.bitmap.as_mut() {
            bitmap.set_dots_per_meter_y((value * 100.0 + 0.5) as u32);
        }
    }

    // --- pixel and scanline access ------------------------------------------

    /// The whole pixel buffer, or `None` on an Empty frame.
    pub fn pixel_bytes(&self) -> Option<&[u8]> {
        Some(self.held()?.bytes())
    }

    /// One row of pixels, top to bottom. `None` on Empty or past the end.
    pub fn scanline(&self, row: u32) -> Option<&[u8]> {
        self.held()?.scanline(row)
    }

    /// Pixel color at (x, y); 8-bit kinds only.
    pub fn pixel_color(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.held()?.pixel_color(x, y)
    }

    /// Write one pixel. Marks the frame modified before delegating, so a
    /// rejected write on a held resource still counts as a touch.
    pub fn set_pixel_color(&mut self, x: u32, y: u32, color: Rgba<u8>) -> bool {
        let Some(bitmap) = self.bitmap.as_mut() else {
            return false;
        };
        self.modified = true;
        bitmap.set_pixel_color(x, y, color)
    }

    // --- region operations --------------------------------------------------

    /// Copy the sub-rectangle [left, right) × [top, bottom) into a new frame.
    pub fn copy_region(&self, left: u32, top: u32, right: u32, bottom: u32) -> Option<Frame> {
        let bitmap = self.held()?;
        engine::ops::copy_rect(bitmap, left, top, right, bottom)
            .ok()
            .map(Frame::from)
    }

    /// Paste another frame's content at (left, top); alpha 0–255 blends,
    /// 256 and above copies.
    pub fn paste(&mut self, source: &Frame, left: u32, top: u32, alpha: u32) -> bool {
        let (Some(bitmap), Some(src)) = (self.bitmap.as_mut(), source.bitmap.as_ref()) else {
            return false;
        };
        self.modified = true;
        engine::ops::paste(bitmap, src, left, top, alpha).is_ok()
    }

    /// Shrink to the sub-rectangle [left, right) × [top, bottom).
    pub fn crop(&mut self, left: u32, top: u32, right: u32, bottom: u32) -> bool {
        let Some(bitmap) = self.held() else {
            return false;
        };
        let copied = engine::ops::copy_rect(bitmap, left, top, right, bottom).ok();
        self.replace(copied)
    }

    // --- identification, load, save -----------------------------------------

    pub fn load(&mut self, path: impl AsRef<Path>) -> bool {
        self.load_with(path, &LoadOptions::default())
    }

    /// Identify, gate on read capability, then decode. Once the gate passes
    /// the previous resource is released and the frame is marked modified;
    /// a decode failure therefore leaves the frame Empty. When the gate
    /// does not pass (unreadable file, unknown or unreadable format) the
    /// frame is untouched.
    pub fn load_with(&mut self, path: impl AsRef<Path>, options: &LoadOptions) -> bool {
        let path = path.as_ref();
        let Ok(bytes) = std::fs::read(path) else {
            return false;
        };
        let format = engine::identify_memory(&bytes).or_else(|| ImageFormat::from_path(path).ok());
        self.load_identified(&bytes, format, options)
    }

    /// Load from an in-memory file, identified by signature alone.
    pub fn load_from_memory(&mut self, bytes: &[u8]) -> bool {
        self.load_identified(bytes, engine::identify_memory(bytes), &LoadOptions::default())
    }

    /// Load from a reader, draining it first; identification is by
    /// signature alone, as for [`Frame::load_from_memory`].
    pub fn load_from_reader(&mut self, mut reader: impl Read) -> bool {
        let mut bytes = Vec::new();
        if reader.read_to_end(&mut bytes).is_err() {
            return false;
        }
        self.load_from_memory(&bytes)
    }

    fn load_identified(
        &mut self,
        bytes: &[u8],
        format: Option<ImageFormat>,
        options: &LoadOptions,
    ) -> bool {
        let Some(format) = format else {
            return false;
        };
        if !engine::can_decode(format) {
            return false;
        }
        // Past the capability gate the load is destructive: release first,
        // mark modified, then decode.
        self.bitmap = None;
        self.modified = true;
        match engine::decode_memory(bytes, format, options) {
            Ok(bitmap) => {
                self.bitmap = Some(bitmap);
                true
            }
            Err(_) => false,
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> bool {
        self.save_with(path, &SaveOptions::default())
    }

    /// Save to a path, with the format taken from the file extension. The
    /// capability pre-check runs before the file is created; on any failure
    /// nothing is written and the frame is unchanged.
    pub fn save_with(&self, path: impl AsRef<Path>, options: &SaveOptions) -> bool {
        let path = path.as_ref();
        let Some(bitmap) = self.held() else {
            return false;
        };
        let Ok(format) = ImageFormat::from_path(path) else {
            return false;
        };
        engine::encode_to_path(bitmap, path, format, options).is_ok()
    }

    /// Save to a writer in an explicit format.
    pub fn save_to_writer<W: Write + Seek>(&self, writer: &mut W, format: ImageFormat) -> bool {
        let Some(bitmap) = self.held() else {
            return false;
        };
        engine::encode_to_writer(bitmap, writer, format, &SaveOptions::default()).is_ok()
    }

    /// Save to a fresh in-memory buffer in an explicit format.
    pub fn save_to_memory(&self, format: ImageFormat) -> Option<Vec<u8>> {
        engine::encode_to_memory(self.held()?, format, &SaveOptions::default()).ok()
    }

    // --- conversions --------------------------------------------------------

    pub fn convert_to(&mut self, kind: PixelKind) -> bool {
        self.replacing(|bitmap| engine::ops::convert(bitmap, kind))
    }

    pub fn to_grayscale(&mut self) -> bool {
        self.convert_to(PixelKind::L8)
    }

    /// Bilevel split at `t`: grayscale samples at or above become white.
    pub fn threshold(&mut self, t: u8) -> bool {
        self.replacing(|bitmap| engine::ops::threshold(bitmap, t))
    }

    /// Error-diffusion dither down to bilevel L8.
    pub fn dither(&mut self) -> bool {
        self.replacing(engine::ops::dither)
    }

    // --- transparency and background ----------------------------------------

    pub fn is_transparent(&self) -> bool {
        self.held().is_some_and(Bitmap::is_transparent)
    }

    pub fn set_transparent(&mut self, enabled: bool) -> bool {
        let Some(bitmap) = self.bitmap.as_mut() else {
            return false;
        };
        bitmap.set_transparent(enabled);
        self.modified = true;
        true
    }

    pub fn has_background_color(&self) -> bool {
        self.held().is_some_and(|b| b.background().is_some())
    }

    pub fn background_color(&self) -> Option<Rgba<u8>> {
        self.held()?.background()
    }

    /// Set or clear (`None`) the file background color.
    pub fn set_background_color(&mut self, color: Option<Rgba<u8>>) -> bool {
        let Some(bitmap) = self.bitmap.as_mut() else {
            return false;
        };
        bitmap.set_background(color);
        self.modified = true;
        true
    }

    // --- channels -----------------------------------------------------------

    /// Extract one channel as an L8 frame.
    pub fn channel(&self, channel: Channel) -> Option<Frame> {
        engine::ops::get_channel(self.held()?, channel)
            .ok()
            .map(Frame::from)
    }

    /// Overwrite one channel from an L8 frame of the same size.
    pub fn set_channel(&mut self, source: &Frame, channel: Channel) -> bool {
        let (Some(bitmap), Some(src)) = (self.bitmap.as_mut(), source.bitmap.as_ref()) else {
            return false;
        };
        self.modified = true;
        engine::ops::set_channel(bitmap, src, channel).is_ok()
    }

    /// Extract red, green, and blue as three L8 frames.
    pub fn split_channels(&self) -> Option<(Frame, Frame, Frame)> {
        let red = self.channel(Channel::Red)?;
        let green = self.channel(Channel::Green)?;
        let blue = self.channel(Channel::Blue)?;
        Some((red, green, blue))
    }

    /// Rebuild RGB content from three L8 channel frames. An Empty frame
    /// first allocates an `Rgb8` resource sized from the red input alone —
    /// the inputs are deliberately not cross-validated; a mismatched green
    /// or blue simply fails its insertion.
    pub fn combine_channels(&mut self, red: &Frame, green: &Frame, blue: &Frame) -> bool {
        if self.bitmap.is_none() {
            let Ok(allocated) = Bitmap::allocate(PixelKind::Rgb8, red.width(), red.height()) else {
                return false;
            };
            self.bitmap = Some(allocated);
        }
        let mut ok = true;
        ok &= self.set_channel(red, Channel::Red);
        ok &= self.set_channel(green, Channel::Green);
        ok &= self.set_channel(blue, Channel::Blue);
        self.modified = true;
        ok
    }

    // --- transforms ---------------------------------------------------------

    /// Rotate counter-clockwise by a multiple of 90 degrees; other angles
    /// are beyond the engine's rotation capability and fail.
    pub fn rotate(&mut self, degrees: f64) -> bool {
        self.replacing(|bitmap| engine::ops::rotate(bitmap, degrees))
    }

    pub fn flip_horizontal(&mut self) -> bool {
        let Some(bitmap) = self.bitmap.as_mut() else {
            return false;
        };
        self.modified = true;
        engine::ops::flip_horizontal(bitmap);
        true
    }

    pub fn flip_vertical(&mut self) -> bool {
        let Some(bitmap) = self.bitmap.as_mut() else {
            return false;
        };
        self.modified = true;
        engine::ops::flip_vertical(bitmap);
        true
    }

    /// Resample to exactly `width` × `height`.
    pub fn rescale(&mut self, width: u32, height: u32, filter: FilterType) -> bool {
        self.replacing(|bitmap| engine::ops::rescale(bitmap, width, height, filter))
    }

    /// Downsample in place so the longer edge fits `max_size`; never
    /// upscales.
    pub fn make_thumbnail(&mut self, max_size: u32) -> bool {
        self.replacing(|bitmap| engine::ops::make_thumbnail(bitmap, max_size))
    }

    // --- color adjustments --------------------------------------------------

    pub fn invert(&mut self) -> bool {
        let Some(bitmap) = self.bitmap.as_mut() else {
            return false;
        };
        self.modified = true;
        engine::ops::invert(bitmap);
        true
    }

    /// Apply a 256-entry lookup table to the addressed channel(s).
    pub fn adjust_curve(&mut self, lut: &[u8; 256], channel: Channel) -> bool {
        self.editing(|bitmap| engine::ops::apply_curve(bitmap, lut, channel))
    }

    /// Gamma correction; values above 1.0 brighten mid-tones.
    pub fn adjust_gamma(&mut self, gamma: f64) -> bool {
        self.editing(|bitmap| engine::ops::adjust_gamma(bitmap, gamma))
    }

    /// Brightness adjustment in percent of full scale, -100 to 100.
    pub fn adjust_brightness(&mut self, percentage: f64) -> bool {
        self.replacing(|bitmap| engine::ops::adjust_brightness(bitmap, percentage))
    }

    /// Contrast adjustment in percent; positive increases contrast.
    pub fn adjust_contrast(&mut self, percentage: f64) -> bool {
        self.replacing(|bitmap| engine::ops::adjust_contrast(bitmap, percentage))
    }

    /// Brightness, contrast, and gamma in one call, applied in that order.
    /// Reports success only when all three succeed.
    pub fn adjust_brightness_contrast_gamma(
        &mut self,
        brightness: f64,
        contrast: f64,
        gamma: f64,
    ) -> bool {
        if self.bitmap.is_none() {
            return false;
        }
        let mut ok = true;
        ok &= self.adjust_brightness(brightness);
        ok &= self.adjust_contrast(contrast);
        ok &= self.adjust_gamma(gamma);
        ok
    }

    /// 256-bin histogram of the addressed channel; `Channel::Rgb` counts
    /// the grayscale rendition.
    pub fn histogram(&self, channel: Channel) -> Option<[u32; 256]> {
        engine::ops::histogram(self.held()?, channel).ok()
    }

    // --- embedded thumbnail -------------------------------------------------

    pub fn has_thumbnail(&self) -> bool {
        self.held().is_some_and(|b| b.thumbnail().is_some())
    }

    /// Deep copy of the embedded thumbnail, if any.
    pub fn thumbnail(&self) -> Option<Frame> {
        self.held()?.thumbnail().cloned().map(Frame::from)
    }

    /// Attach a deep copy of another frame's content as the embedded
    /// thumbnail. An Empty source clears it.
    pub fn set_thumbnail(&mut self, source: &Frame) -> bool {
        let Some(bitmap) = self.bitmap.as_mut() else {
            return false;
        };
        bitmap.set_thumbnail(source.bitmap.clone());
        self.modified = true;
        true
    }

    pub fn clear_thumbnail(&mut self) -> bool {
        let Some(bitmap) = self.bitmap.as_mut() else {
            return false;
        };
        bitmap.set_thumbnail(None);
        self.modified = true;
        true
    }

    // --- metadata -----------------------------------------------------------

    /// Number of tags under one model; 0 on an Empty frame.
    pub fn metadata_count(&self, model: MetadataModel) -> usize {
        self.held().map_or(0, |b| b.metadata().count(model))
    }

    /// Clone out the tag under (model, key), if any.
    pub fn metadata(&self, model: MetadataModel, key: &str) -> Option<Tag> {
        self.held()?.metadata().get(model, key)
    }

    pub fn set_metadata(
        &mut self,
        model: MetadataModel,
        key: impl Into<String>,
        value: TagValue,
    ) -> bool {
        let Some(bitmap) = self.bitmap.as_mut() else {
            return false;
        };
        bitmap.metadata_mut().set(model, key, value);
        self.modified = true;
        true
    }

    pub fn remove_metadata(&mut self, model: MetadataModel, key: &str) -> bool {
        let Some(bitmap) = self.bitmap.as_mut() else {
            return false;
        };
        let removed = bitmap.metadata_mut().remove(model, key);
        if removed {
            self.modified = true;
        }
        removed
    }

    // --- forwarding helpers -------------------------------------------------

    /// Run a replacing engine operation: compute a new resource from the
    /// held one, then go through [`Frame::replace`]. Failure leaves the
    /// frame untouched.
    fn replacing(
        &mut self,
        op: impl FnOnce(&Bitmap) -> Result<Bitmap, EngineError>,
    ) -> bool {
        let Some(bitmap) = self.held() else {
            return false;
        };
        let produced = op(bitmap).ok();
        self.replace(produced)
    }

    /// Run an in-place engine edit. The frame counts as touched as soon as
    /// the engine is handed the resource, matching the replacing path.
    fn editing(
        &mut self,
        op: impl FnOnce(&mut Bitmap) -> Result<(), EngineError>,
    ) -> bool {
        let Some(bitmap) = self.bitmap.as_mut() else {
            return false;
        };
        self.modified = true;
        op(bitmap).is_ok()
    }
}

impl Clone for Frame {
    /// Deep copy: the resource is cloned through the engine; the copy of a
    /// Holding frame starts out modified, the copy of an Empty frame does
    /// not.
    fn clone(&self) -> Self {
        Frame {
            bitmap: self.bitmap.clone(),
            modified: self.bitmap.is_some(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.replace(source.bitmap.clone());
    }
}

impl From<Bitmap> for Frame {
    /// Take ownership of an externally produced bitmap.
    fn from(bitmap: Bitmap) -> Self {
        let mut frame = Frame::new();
        frame.adopt(bitmap);
        frame
    }
}
