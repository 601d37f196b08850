//! End-to-end lifecycle scenarios: allocate → inspect → clear, and the
//! full load/save paths against real files in a temp directory.

use lightbox::{
    Channel, Frame, ImageFormat, MetadataModel, PixelKind, Rgba, identify_path,
};
use tempfile::TempDir;

/// A small frame with recognizable content, for round-trip checks.
fn checkered(width: u32, height: u32) -> Frame {
    let mut frame = Frame::with_size(PixelKind::Rgb8, width, height);
    for y in 0..height {
        for x in 0..width {
            let on = (x + y) % 2 == 0;
            frame.set_pixel_color(
                x,
                y,
                if on {
                    Rgba([255, 255, 255, 255])
                } else {
                    Rgba([0, 0, 64, 255])
                },
            );
        }
    }
    frame
}

#[test]
fn allocate_inspect_clear() {
    let mut frame = Frame::with_size(PixelKind::L8, 16, 16);
    assert!(frame.is_valid());
    assert_eq!(frame.width(), 16);
    assert_eq!(frame.height(), 16);
    assert_eq!(frame.bits_per_pixel(), 8);

    frame.clear();
    assert!(!frame.is_valid());
    assert_eq!(frame.width(), 0);
    assert_eq!(frame.pixel_kind(), PixelKind::Unknown);
}

#[test]
fn save_then_load_round_trip() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("board.png");

    let original = checkered(16, 12);
    assert!(original.save(&path));
    assert!(path.exists());

    let mut loaded = Frame::new();
    assert!(loaded.load(&path));
    assert!(loaded.is_valid());
    assert!(loaded.is_modified(), "a fresh load marks the frame modified");
    assert_eq!((loaded.width(), loaded.height()), (16, 12));
    assert_eq!(loaded.pixel_kind(), PixelKind::Rgb8);
    // PNG is lossless; content survives exactly
    assert_eq!(loaded.pixel_color(0, 0), Some(Rgba([255, 255, 255, 255])));
    assert_eq!(loaded.pixel_color(1, 0), Some(Rgba([0, 0, 64, 255])));
}

#[test]
fn load_nonexistent_path_leaves_frame_untouched() {
    let prior = checkered(8, 8);
    let mut frame = prior.clone();
    frame.set_modified(false);

    assert!(!frame.load("/nonexistent/missing.png"));
    assert!(frame.is_valid());
    assert_eq!((frame.width(), frame.height()), (8, 8));
    assert!(!frame.is_modified());
}

#[test]
fn load_corrupt_file_of_known_format_empties_the_frame() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("broken.png");

    // valid signature, garbage body: passes the capability gate, fails decode
    let mut bytes = checkered(8, 8).save_to_memory(ImageFormat::Png).unwrap();
    bytes.truncate(bytes.len() / 3);
    std::fs::write(&path, &bytes).unwrap();

    let mut frame = checkered(4, 4);
    frame.set_modified(false);

    assert!(!frame.load(&path));
    assert!(!frame.is_valid(), "release-before-load: the prior image is gone");
    assert!(frame.is_modified(), "the gate passed, so the frame was touched");
}

#[test]
fn load_unrecognized_file_leaves_frame_untouched() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("notes.txt");
    std::fs::write(&path, b"not an image at all").unwrap();

    let mut frame = checkered(4, 4);
    assert!(!frame.load(&path));
    assert!(frame.is_valid());
    assert_eq!(frame.width(), 4);
}

#[test]
fn save_rejected_by_capability_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("deep.jpg");

    // JPEG cannot carry 16-bit samples; the pre-check must fire
    let mut frame = checkered(8, 8);
    assert!(frame.convert_to(PixelKind::Rgb16));

    assert!(!frame.save(&path));
    assert!(!path.exists(), "no file is created for a rejected save");
    assert!(frame.is_valid());
    assert_eq!(frame.pixel_kind(), PixelKind::Rgb16);
}

#[test]
fn save_unknown_extension_fails() {
    let tmp = TempDir::new().unwrap();
    let frame = checkered(4, 4);
    assert!(!frame.save(tmp.path().join("image.xyz")));
}

#[test]
fn memory_round_trip_preserves_format_and_content() {
    let original = checkered(10, 10);
    let bytes = original.save_to_memory(ImageFormat::Png).unwrap();
    assert_eq!(lightbox::identify_memory(&bytes), Some(ImageFormat::Png));

    let mut reloaded = Frame::new();
    assert!(reloaded.load_from_memory(&bytes));
    assert_eq!((reloaded.width(), reloaded.height()), (10, 10));
    assert_eq!(reloaded.pixel_color(3, 3), original.pixel_color(3, 3));
}

#[test]
fn reader_load_and_writer_save() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("via-writer.bmp");

    let frame = checkered(6, 6);
    let mut file = std::fs::File::create(&path).unwrap();
    assert!(frame.save_to_writer(&mut file, ImageFormat::Bmp));
    drop(file);

    let mut reloaded = Frame::new();
    let file = std::fs::File::open(&path).unwrap();
    assert!(reloaded.load_from_reader(file));
    assert_eq!((reloaded.width(), reloaded.height()), (6, 6));
}

#[test]
fn identification_trusts_signatures_over_extensions() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("actually-png.jpg");

    let frame = checkered(5, 5);
    let png = frame.save_to_memory(ImageFormat::Png).unwrap();
    std::fs::write(&path, &png).unwrap();

    assert_eq!(identify_path(&path), Some(ImageFormat::Png));

    // and the load decodes it as what it is, despite the extension
    let mut loaded = Frame::new();
    assert!(loaded.load(&path));
    assert_eq!(loaded.pixel_kind(), PixelKind::Rgb8);
}

#[test]
fn jpeg_load_reports_the_files_kind() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("gray.jpg");

    let mut gray = checkered(12, 12);
    assert!(gray.to_grayscale());
    assert!(gray.save(&path));

    let mut loaded = Frame::new();
    assert!(loaded.load(&path));
    assert_eq!(loaded.pixel_kind(), PixelKind::L8);
    assert!(loaded.is_grayscale());
}

#[test]
fn edit_pipeline_on_a_loaded_file() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("source.png");
    let dest = tmp.path().join("processed.png");

    assert!(checkered(32, 16).save(&source));

    let mut frame = Frame::new();
    assert!(frame.load(&source));
    assert!(frame.crop(0, 0, 16, 16));
    assert!(frame.rotate(90.0));
    assert!(frame.flip_horizontal());
    assert!(frame.adjust_brightness(10.0));
    assert!(frame.rescale(8, 8, lightbox::FilterType::Lanczos3));
    assert!(frame.save(&dest));

    let mut result = Frame::new();
    assert!(result.load(&dest));
    assert_eq!((result.width(), result.height()), (8, 8));
}

#[test]
fn channels_survive_a_file_round_trip() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("rgb.png");

    let mut frame = Frame::with_size(PixelKind::Rgb8, 4, 4);
    for y in 0..4 {
        for x in 0..4 {
            frame.set_pixel_color(x, y, Rgba([200, 90, 30, 255]));
        }
    }
    assert!(frame.save(&path));

    let mut loaded = Frame::new();
    assert!(loaded.load(&path));
    let (red, green, blue) = loaded.split_channels().unwrap();
    assert_eq!(red.pixel_color(0, 0), Some(Rgba([200, 200, 200, 255])));
    assert_eq!(green.pixel_color(0, 0), Some(Rgba([90, 90, 90, 255])));
    assert_eq!(blue.pixel_color(0, 0), Some(Rgba([30, 30, 30, 255])));
}

#[test]
fn iptc_metadata_surfaces_after_a_jpeg_load() {
    let tmp = TempDir::new().unwrap();
    let plain = tmp.path().join("plain.jpg");
    let tagged = tmp.path().join("tagged.jpg");

    assert!(checkered(8, 8).save(&plain));

    // splice an APP13/IPTC segment into the encoded JPEG, after SOI
    let bytes = std::fs::read(&plain).unwrap();
    let mut iim = vec![0x1C, 0x02, 0x05, 0x00, 0x05];
    iim.extend_from_slice(b"Title");
    let mut resource = Vec::new();
    resource.extend_from_slice(b"Photoshop 3.0\0");
    resource.extend_from_slice(b"8BIM");
    resource.extend_from_slice(&0x0404u16.to_be_bytes());
    resource.extend_from_slice(&[0x00, 0x00]);
    resource.extend_from_slice(&(iim.len() as u32).to_be_bytes());
    resource.extend_from_slice(&iim);

    let mut spliced = bytes[..2].to_vec();
    spliced.extend_from_slice(&[0xFF, 0xED]);
    spliced.extend_from_slice(&((resource.len() + 2) as u16).to_be_bytes());
    spliced.extend_from_slice(&resource);
    spliced.extend_from_slice(&bytes[2..]);
    std::fs::write(&tagged, &spliced).unwrap();

    let mut frame = Frame::new();
    assert!(frame.load(&tagged));
    assert_eq!(frame.metadata_count(MetadataModel::Iptc), 1);
    let tag = frame.metadata(MetadataModel::Iptc, "ObjectName").unwrap();
    assert_eq!(tag.value.as_text(), Some("Title"));
}

#[test]
fn dirty_flag_audit_across_a_session() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("audit.png");

    let mut frame = checkered(8, 8);
    assert!(frame.is_modified(), "allocation and edits touch the frame");

    assert!(frame.save(&path));
    assert!(frame.is_modified(), "save never resets the flag by itself");
    frame.set_modified(false);

    assert!(frame.save(&path), "saving an unmodified frame is fine");
    assert!(!frame.is_modified());

    assert!(frame.invert());
    assert!(frame.is_modified());

    frame.set_modified(false);
    assert!(frame.load(&path));
    assert!(frame.is_modified(), "load marks unconditionally");
}

#[test]
fn histogram_of_a_loaded_checkerboard() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("board.png");
    assert!(checkered(8, 8).save(&path));

    let mut frame = Frame::new();
    assert!(frame.load(&path));
    let bins = frame.histogram(Channel::Blue).unwrap();
    assert_eq!(bins[255], 32, "half the pixels are white");
    assert_eq!(bins[64], 32, "half carry the dark blue");
}
