//! Minimal IPTC-IIM reader for JPEG and TIFF payloads.
//!
//! Walks IPTC Record 2 (the application record) and surfaces every dataset
//! with a well-known name as a (key, value) pair for the metadata store.
//! Repeatable datasets (Keywords, By-line) are joined into one value.
//!
//! For JPEG: reads from the APP13 marker (Photoshop 8BIM resource 0x0404).
//! For TIFF: reads from IFD tag 33723 (IPTC-NAA, raw IIM bytes), falling
//! back to tag 34377 (Photoshop image resources).

use image::ImageFormat;

/// Record 2 dataset numbers and the keys they surface under.
const DATASET_KEYS: &[(u8, &str)] = &[
    (5, "ObjectName"),
    (25, "Keywords"),
    (55, "DateCreated"),
    (80, "By-line"),
    (90, "City"),
    (101, "Country/PrimaryLocationName"),
    (105, "Headline"),
    (110, "Credit"),
    (116, "CopyrightNotice"),
    (120, "Caption-Abstract"),
    (122, "Writer-Editor"),
];

/// Datasets that may repeat; repeats are joined with `, `.
const REPEATABLE: &[u8] = &[25, 80];

/// Extract IPTC tags from a raw file, dispatching on its identified format.
/// Formats without an IPTC convention yield no tags; so does any parse
/// failure — metadata extraction never fails a load.
pub(crate) fn read_iptc(bytes: &[u8], format: ImageFormat) -> Vec<(String, String)> {
    match format {
        ImageFormat::Jpeg => jpeg_app13_iim(bytes).map(parse_iim).unwrap_or_default(),
        ImageFormat::Tiff => read_from_tiff(bytes),
        _ => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// IPTC-IIM record parsing
// ---------------------------------------------------------------------------

/// Parse raw IPTC-IIM bytes into (key, value) pairs.
///
/// IIM dataset layout:
///   Byte 0:    0x1C (tag marker)
///   Byte 1:    Record number (Record 2 is the application record)
///   Byte 2:    Dataset number (see [`DATASET_KEYS`])
///   Bytes 3-4: Data length (big-endian u16)
///   Bytes 5+:  Data (UTF-8/ASCII string)
fn parse_iim(data: &[u8]) -> Vec<(String, String)> {
    let mut tags: Vec<(String, String)> = Vec::new();
    let mut pos = 0;

    while pos + 5 <= data.len() {
        if data[pos] != 0x1C {
            pos += 1;
            continue;
        }

        let record = data[pos + 1];
        let dataset = data[pos + 2];
        let length = u16::from_be_bytes([data[pos + 3], data[pos + 4]]) as usize;
        pos += 5;

        if pos + length > data.len() {
            break;
        }

        if record == 2 {
            let value = String::from_utf8_lossy(&data[pos..pos + length])
                .trim()
                .to_string();
            if !value.is_empty() {
                if let Some((_, key)) = DATASET_KEYS.iter().find(|(n, _)| *n == dataset) {
                    record_tag(&mut tags, key, value, REPEATABLE.contains(&dataset));
                }
            }
        }

        pos += length;
    }

    tags
}

fn record_tag(tags: &mut Vec<(String, String)>, key: &str, value: String, repeatable: bool) {
    match tags.iter_mut().find(|(k, _)| k == key) {
        Some((_, existing)) if repeatable => {
            existing.push_str(", ");
            existing.push_str(&value);
        }
        // non-repeatable datasets: first occurrence wins
        Some(_) => {}
        None => tags.push((key.to_string(), value)),
    }
}

// ---------------------------------------------------------------------------
// JPEG: APP13 / Photoshop 8BIM
// ---------------------------------------------------------------------------

const PHOTOSHOP_HEADER: &[u8] = b"Photoshop 3.0\0";
const BIM_MARKER: &[u8] = b"8BIM";
const IPTC_RESOURCE_ID: u16 = 0x0404;

/// Find the raw IPTC-IIM bytes inside a JPEG's APP13 segment.
fn jpeg_app13_iim(data: &[u8]) -> Option<&[u8]> {
    let mut pos = 0;
    while pos + 4 < data.len() {
        if data[pos] == 0xFF && data[pos + 1] == 0xED {
            let seg_len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
            let seg_start = pos + 4;
            let seg_end = (pos + 2 + seg_len).min(data.len());
            if let Some(iim) = iim_resource(&data[seg_start..seg_end]) {
                return Some(iim);
            }
        }

        // Advance marker-wise where possible, byte-wise otherwise
        if data[pos] == 0xFF && pos + 3 < data.len() && data[pos + 1] != 0x00 {
            let marker = data[pos + 1];
            // SOS means entropy-coded data starts; nothing to find past it
            if marker == 0xDA {
                break;
            }
            if marker == 0xD8 || marker == 0xD9 || (0xD0..=0xD7).contains(&marker) {
                pos += 2;
            } else {
                let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
                pos += 2 + len;
            }
        } else {
            pos += 1;
        }
    }
    None
}

/// Pull the IPTC-IIM bytes out of a Photoshop 8BIM resource block.
fn iim_resource(segment: &[u8]) -> Option<&[u8]> {
    let data = segment.strip_prefix(PHOTOSHOP_HEADER).unwrap_or(segment);

    let mut pos = 0;
    while pos + 12 <= data.len() {
        // Each resource: "8BIM" (4) + id (2) + pascal string + len (4) + data
        if &data[pos..pos + 4] != BIM_MARKER {
            pos += 1;
            continue;
        }
        pos += 4;

        if pos + 2 > data.len() {
            break;
        }
        let resource_id = u16::from_be_bytes([data[pos], data[pos + 1]]);
        pos += 2;

        // Pascal string: 1 length byte + string, padded to even total
        if pos >= data.len() {
            break;
        }
        let pascal_len = data[pos] as usize;
        pos += 1 + pascal_len + ((1 + pascal_len) % 2);

        if pos + 4 > data.len() {
            break;
        }
        let res_len =
            u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as usize;
        pos += 4;

        if pos + res_len > data.len() {
            break;
        }
        if resource_id == IPTC_RESOURCE_ID {
            return Some(&data[pos..pos + res_len]);
        }

        pos += res_len + (res_len % 2);
    }

    None
}

// ---------------------------------------------------------------------------
// TIFF: IFD tags 33723 / 34377
// ---------------------------------------------------------------------------

fn read_from_tiff(data: &[u8]) -> Vec<(String, String)> {
    if data.len() < 8 {
        return Vec::new();
    }

    let big_endian = match &data[0..2] {
        b"MM" => true,
        b"II" => false,
        _ => return Vec::new(),
    };

    let read_u16 = |offset: usize| -> u16 {
        let b = [data[offset], data[offset + 1]];
        if big_endian {
            u16::from_be_bytes(b)
        } else {
            u16::from_le_bytes(b)
        }
    };
    let read_u32 = |offset: usize| -> u32 {
        let b = [
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ];
        if big_endian {
            u32::from_be_bytes(b)
        } else {
            u32::from_le_bytes(b)
        }
    };

    if read_u16(2) != 42 {
        return Vec::new();
    }

    // Entry counts are values, not bytes; total bytes = count * type size.
    let type_size = |typ: u16| -> usize {
        match typ {
            1 | 2 | 6 | 7 => 1, // BYTE, ASCII, SBYTE, UNDEFINED
            3 | 8 => 2,         // SHORT, SSHORT
            4 | 9 | 11 => 4,    // LONG, SLONG, FLOAT
            5 | 10 | 12 => 8,   // RATIONAL, SRATIONAL, DOUBLE
            _ => 1,
        }
    };

    let mut ifd_offset = read_u32(4) as usize;

    while ifd_offset > 0 && ifd_offset + 2 < data.len() {
        let entry_count = read_u16(ifd_offset) as usize;
        let entries_start = ifd_offset + 2;

        for i in 0..entry_count {
            let entry = entries_start + i * 12;
            if entry + 12 > data.len() {
                return Vec::new();
            }

            let tag = read_u16(entry);
            let typ = read_u16(entry + 2);
            let count = read_u32(entry + 4) as usize;
            let byte_len = count * type_size(typ);
            let value_offset = read_u32(entry + 8) as usize;

            if value_offset + byte_len > data.len() {
                continue;
            }
            let payload = &data[value_offset..value_offset + byte_len];

            // 33723: IPTC-NAA, raw IIM bytes
            if tag == 33723 {
                let tags = parse_iim(payload);
                if !tags.is_empty() {
                    return tags;
                }
            }
            // 34377: Photoshop image resources wrapping the same IIM bytes
            if tag == 34377 {
                if let Some(iim) = iim_resource(payload) {
                    let tags = parse_iim(iim);
                    if !tags.is_empty() {
                        return tags;
                    }
                }
            }
        }

        let next = entries_start + entry_count * 12;
        if next + 4 <= data.len() {
            ifd_offset = read_u32(next) as usize;
        } else {
            break;
        }
    }

    Vec::new()
}
