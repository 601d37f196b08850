//! Engine operations over owned bitmaps.
//!
//! Every function here is one delegation target for a `Frame` operation:
//! it validates what the engine can actually do with the bitmap's pixel
//! kind, runs the engine call, and hands back either a derived bitmap (for
//! replacing transforms) or an in-place edit. Nothing in this module knows
//! about handles, dirty flags, or ownership — that is the frame's job.

use image::imageops::{self, ColorMap, FilterType};
use image::{DynamicImage, GenericImage, GenericImageView, GrayImage, Luma, Rgba};

use super::bitmap::{Bitmap, PixelKind};
use super::EngineError;

/// Color channel addressing for split/combine, curves, and histograms.
///
/// `Rgb` addresses all color channels at once where that makes sense
/// (curves, histograms); it is not a valid target for split/combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Rgb,
    Red,
    Green,
    Blue,
    Alpha,
}

impl Channel {
    /// Sample index within an RGBA pixel, for single-channel addressing.
    fn sample_index(self) -> Option<usize> {
        match self {
            Channel::Red => Some(0),
            Channel::Green => Some(1),
            Channel::Blue => Some(2),
            Channel::Alpha => Some(3),
            Channel::Rgb => None,
        }
    }
}

fn unsupported(what: &str, kind: PixelKind) -> EngineError {
    EngineError::Unsupported(format!("{what} is not defined for {kind:?} bitmaps"))
}

// ---------------------------------------------------------------------------
// Region operations
// ---------------------------------------------------------------------------

/// Copy the sub-rectangle [left, right) × [top, bottom) into a new bitmap.
pub fn copy_rect(
    bitmap: &Bitmap,
    left: u32,
    top: u32,
    right: u32,
    bottom: u32,
) -> Result<Bitmap, EngineError> {
    if left >= right || top >= bottom || right > bitmap.width() || bottom > bitmap.height() {
        return Err(EngineError::Unsupported(format!(
            "copy rectangle ({left},{top})-({right},{bottom}) is not inside a {}x{} bitmap",
            bitmap.width(),
            bitmap.height()
        )));
    }
    let cropped = bitmap.image().crop_imm(left, top, right - left, bottom - top);
    Ok(bitmap.derive(cropped))
}

/// Paste `src` into `dst` at (left, top). Alpha 0–255 blends with that
/// constant weight; 256 and above is a plain copy. The source must fit
/// entirely inside the destination.
pub fn paste(
    dst: &mut Bitmap,
    src: &Bitmap,
    left: u32,
    top: u32,
    alpha: u32,
) -> Result<(), EngineError> {
    if !dst.pixel_kind().is_8bit() {
        return Err(unsupported("paste", dst.pixel_kind()));
    }
    if !src.pixel_kind().is_8bit() {
        return Err(unsupported("paste", src.pixel_kind()));
    }
    let fits = left.checked_add(src.width()).is_some_and(|r| r <= dst.width())
        && top.checked_add(src.height()).is_some_and(|b| b <= dst.height());
    if !fits {
        return Err(EngineError::Unsupported(format!(
            "a {}x{} paste at ({left},{top}) does not fit a {}x{} bitmap",
            src.width(),
            src.height(),
            dst.width(),
            dst.height()
        )));
    }

    if alpha >= 256 {
        imageops::replace(dst.image_mut(), src.image(), i64::from(left), i64::from(top));
        return Ok(());
    }

    let weight = alpha;
    for y in 0..src.height() {
        for x in 0..src.width() {
            let s = src.image().get_pixel(x, y).0;
            let d = dst.image().get_pixel(left + x, top + y).0;
            let mut blended = [0u8; 4];
            for i in 0..4 {
                let v = (u32::from(s[i]) * weight + u32::from(d[i]) * (255 - weight) + 127) / 255;
                blended[i] = v as u8;
            }
            dst.image_mut().put_pixel(left + x, top + y, Rgba(blended));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Convert to another pixel kind through the engine's conversion routines.
pub fn convert(bitmap: &Bitmap, kind: PixelKind) -> Result<Bitmap, EngineError> {
    let img = bitmap.image();
    let converted = match kind {
        PixelKind::Unknown => return Err(unsupported("conversion", kind)),
        PixelKind::L8 => DynamicImage::ImageLuma8(img.to_luma8()),
        PixelKind::La8 => DynamicImage::ImageLumaA8(img.to_luma_alpha8()),
        PixelKind::Rgb8 => DynamicImage::ImageRgb8(img.to_rgb8()),
        PixelKind::Rgba8 => DynamicImage::ImageRgba8(img.to_rgba8()),
        PixelKind::L16 => DynamicImage::ImageLuma16(img.to_luma16()),
        PixelKind::La16 => DynamicImage::ImageLumaA16(img.to_luma_alpha16()),
        PixelKind::Rgb16 => DynamicImage::ImageRgb16(img.to_rgb16()),
        PixelKind::Rgba16 => DynamicImage::ImageRgba16(img.to_rgba16()),
        PixelKind::RgbF32 => DynamicImage::ImageRgb32F(img.to_rgb32f()),
        PixelKind::RgbaF32 => DynamicImage::ImageRgba32F(img.to_rgba32f()),
    };
    Ok(bitmap.derive(converted))
}

/// Split a grayscale rendition at `t`: samples at or above become white,
/// the rest black. Output is bilevel L8.
pub fn threshold(bitmap: &Bitmap, t: u8) -> Result<Bitmap, EngineError> {
    let map = SplitPoint { threshold: t };
    let mut gray = bitmap.image().to_luma8();
    for pixel in gray.pixels_mut() {
        map.map_color(pixel);
    }
    Ok(bitmap.derive(DynamicImage::ImageLuma8(gray)))
}

/// Error-diffusion dither of a grayscale rendition down to bilevel L8.
pub fn dither(bitmap: &Bitmap) -> Result<Bitmap, EngineError> {
    let mut gray = bitmap.image().to_luma8();
    imageops::dither(&mut gray, &SplitPoint { threshold: 128 });
    Ok(bitmap.derive(DynamicImage::ImageLuma8(gray)))
}

/// Two-entry color map splitting luma at a threshold. Drives both the
/// plain threshold and the engine's error-diffusion dither.
struct SplitPoint {
    threshold: u8,
}

impl ColorMap for SplitPoint {
    type Color = Luma<u8>;

    fn index_of(&self, color: &Luma<u8>) -> usize {
        usize::from(color.0[0] >= self.threshold)
    }

    fn lookup(&self, index: usize) -> Option<Luma<u8>> {
        match index {
            0 => Some(Luma([0])),
            1 => Some(Luma([255])),
            _ => None,
        }
    }

    fn has_lookup(&self) -> bool {
        true
    }

    fn map_color(&self, color: &mut Luma<u8>) {
        color.0[0] = if color.0[0] >= self.threshold { 255 } else { 0 };
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Rotate counter-clockwise by a multiple of 90 degrees — the engine's
/// rotation capability. Other angles are rejected.
pub fn rotate(bitmap: &Bitmap, degrees: f64) -> Result<Bitmap, EngineError> {
    if !degrees.is_finite() {
        return Err(EngineError::Unsupported(format!(
            "cannot rotate by {degrees} degrees"
        )));
    }
    let img = bitmap.image();
    let turned = match degrees.rem_euclid(360.0) {
        r if r == 0.0 => img.clone(),
        r if r == 90.0 => img.rotate270(),
        r if r == 180.0 => img.rotate180(),
        r if r == 270.0 => img.rotate90(),
        r => {
            return Err(EngineError::Unsupported(format!(
                "rotation is limited to quarter turns, got {r} degrees"
            )));
        }
    };
    Ok(bitmap.derive(turned))
}

pub fn flip_horizontal(bitmap: &mut Bitmap) {
    imageops::flip_horizontal_in_place(bitmap.image_mut());
}

pub fn flip_vertical(bitmap: &mut Bitmap) {
    imageops::flip_vertical_in_place(bitmap.image_mut());
}

/// Resample to exactly `width` × `height` with the given filter.
pub fn rescale(
    bitmap: &Bitmap,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<Bitmap, EngineError> {
    if width == 0 || height == 0 {
        return Err(EngineError::Unsupported(format!(
            "cannot rescale to {width}x{height}"
        )));
    }
    Ok(bitmap.derive(bitmap.image().resize_exact(width, height, filter)))
}

/// Downsample so the longer edge fits `max_size`, preserving aspect ratio.
/// A bitmap that already fits is copied unchanged — this never upscales.
pub fn make_thumbnail(bitmap: &Bitmap, max_size: u32) -> Result<Bitmap, EngineError> {
    if max_size == 0 {
        return Err(EngineError::Unsupported("cannot thumbnail to size 0".into()));
    }
    let img = bitmap.image();
    let thumb = if bitmap.width().max(bitmap.height()) <= max_size {
        img.clone()
    } else {
        img.thumbnail(max_size, max_size)
    };
    Ok(bitmap.derive(thumb))
}

// ---------------------------------------------------------------------------
// Color adjustments
// ---------------------------------------------------------------------------

pub fn invert(bitmap: &mut Bitmap) {
    bitmap.image_mut().invert();
}

/// Brightness adjustment in percent of full scale, -100 to 100.
pub fn adjust_brightness(bitmap: &Bitmap, percentage: f64) -> Result<Bitmap, EngineError> {
    let offset = (percentage.clamp(-100.0, 100.0) / 100.0 * 255.0).round() as i32;
    Ok(bitmap.derive(bitmap.image().brighten(offset)))
}

/// Contrast adjustment in percent; positive increases contrast.
pub fn adjust_contrast(bitmap: &Bitmap, percentage: f64) -> Result<Bitmap, EngineError> {
    Ok(bitmap.derive(bitmap.image().adjust_contrast(percentage as f32)))
}

/// Gamma correction via a lookup curve over all color channels.
/// Values above 1.0 brighten mid-tones. Non-positive gamma is rejected.
pub fn adjust_gamma(bitmap: &mut Bitmap, gamma: f64) -> Result<(), EngineError> {
    if gamma <= 0.0 {
        return Err(EngineError::Unsupported(format!("invalid gamma {gamma}")));
    }
    let exponent = 1.0 / gamma;
    let mut lut = [0u8; 256];
    for (i, entry) in lut.iter_mut().enumerate() {
        let normalized = i as f64 / 255.0;
        *entry = (normalized.powf(exponent) * 255.0 + 0.5).min(255.0) as u8;
    }
    apply_curve(bitmap, &lut, Channel::Rgb)
}

/// Apply a 256-entry lookup table to the addressed channel(s) in place.
/// Defined for 8-bit kinds.
pub fn apply_curve(
    bitmap: &mut Bitmap,
    lut: &[u8; 256],
    channel: Channel,
) -> Result<(), EngineError> {
    let kind = bitmap.pixel_kind();
    if !kind.is_8bit() {
        return Err(unsupported("curve adjustment", kind));
    }
    if channel == Channel::Alpha && !kind.has_alpha() {
        return Err(unsupported("alpha curve adjustment", kind));
    }

    let map = |v: &mut u8| *v = lut[*v as usize];
    match bitmap.image_mut() {
        DynamicImage::ImageLuma8(buf) => {
            // grayscale has a single channel; any color selector addresses it
            if channel == Channel::Alpha {
                return Err(unsupported("alpha curve adjustment", kind));
            }
            for pixel in buf.pixels_mut() {
                map(&mut pixel.0[0]);
            }
        }
        DynamicImage::ImageLumaA8(buf) => {
            let index = if channel == Channel::Alpha { 1 } else { 0 };
            for pixel in buf.pixels_mut() {
                map(&mut pixel.0[index]);
            }
        }
        DynamicImage::ImageRgb8(buf) => {
            for pixel in buf.pixels_mut() {
                apply_to_rgba_samples(&mut pixel.0[..], channel, map);
            }
        }
        DynamicImage::ImageRgba8(buf) => {
            for pixel in buf.pixels_mut() {
                apply_to_rgba_samples(&mut pixel.0[..], channel, map);
            }
        }
        _ => return Err(unsupported("curve adjustment", kind)),
    }
    Ok(())
}

fn apply_to_rgba_samples(samples: &mut [u8], channel: Channel, map: impl Fn(&mut u8)) {
    match channel.sample_index() {
        Some(index) if index < samples.len() => map(&mut samples[index]),
        Some(_) => {}
        None => {
            for sample in samples.iter_mut().take(3) {
                map(sample);
            }
        }
    }
}

/// 256-bin histogram of the addressed channel. `Rgb` counts the grayscale
/// rendition. Defined for 8-bit kinds.
pub fn histogram(bitmap: &Bitmap, channel: Channel) -> Result<[u32; 256], EngineError> {
    let kind = bitmap.pixel_kind();
    if !kind.is_8bit() {
        return Err(unsupported("histogram", kind));
    }
    if channel == Channel::Alpha && !kind.has_alpha() {
        return Err(unsupported("alpha histogram", kind));
    }

    let mut bins = [0u32; 256];
    match channel.sample_index() {
        None => {
            for pixel in bitmap.image().to_luma8().pixels() {
                bins[pixel.0[0] as usize] += 1;
            }
        }
        Some(index) => {
            for pixel in bitmap.image().to_rgba8().pixels() {
                bins[pixel.0[index] as usize] += 1;
            }
        }
    }
    Ok(bins)
}

// ---------------------------------------------------------------------------
// Channel split / combine
// ---------------------------------------------------------------------------

/// Extract one channel as an L8 bitmap. Defined for the RGB 8-bit kinds;
/// the alpha channel additionally requires an alpha kind.
pub fn get_channel(bitmap: &Bitmap, channel: Channel) -> Result<Bitmap, EngineError> {
    let kind = bitmap.pixel_kind();
    if !matches!(kind, PixelKind::Rgb8 | PixelKind::Rgba8) {
        return Err(unsupported("channel extraction", kind));
    }
    let Some(index) = channel.sample_index() else {
        return Err(EngineError::Unsupported(
            "channel extraction needs a single channel".into(),
        ));
    };
    if channel == Channel::Alpha && !kind.has_alpha() {
        return Err(unsupported("alpha extraction", kind));
    }

    let rgba = bitmap.image().to_rgba8();
    let gray = GrayImage::from_fn(bitmap.width(), bitmap.height(), |x, y| {
        Luma([rgba.get_pixel(x, y).0[index]])
    });
    Ok(bitmap.derive(DynamicImage::ImageLuma8(gray)))
}

/// Overwrite one channel of `dst` from an L8 source of the same size.
pub fn set_channel(dst: &mut Bitmap, src: &Bitmap, channel: Channel) -> Result<(), EngineError> {
    let kind = dst.pixel_kind();
    if !matches!(kind, PixelKind::Rgb8 | PixelKind::Rgba8) {
        return Err(unsupported("channel insertion", kind));
    }
    let Some(index) = channel.sample_index() else {
        return Err(EngineError::Unsupported(
            "channel insertion needs a single channel".into(),
        ));
    };
    if channel == Channel::Alpha && !kind.has_alpha() {
        return Err(unsupported("alpha insertion", kind));
    }
    let DynamicImage::ImageLuma8(source) = src.image() else {
        return Err(EngineError::Unsupported(
            "channel source must be an L8 bitmap".into(),
        ));
    };
    if src.width() != dst.width() || src.height() != dst.height() {
        return Err(EngineError::Unsupported(format!(
            "channel source is {}x{}, destination is {}x{}",
            src.width(),
            src.height(),
            dst.width(),
            dst.height()
        )));
    }

    match dst.image_mut() {
        DynamicImage::ImageRgb8(buf) => {
            for (pixel, sample) in buf.pixels_mut().zip(source.pixels()) {
                pixel.0[index] = sample.0[0];
            }
        }
        DynamicImage::ImageRgba8(buf) => {
            for (pixel, sample) in buf.pixels_mut().zip(source.pixels()) {
                pixel.0[index] = sample.0[0];
            }
        }
        _ => return Err(unsupported("channel insertion", kind)),
    }
    Ok(())
}
