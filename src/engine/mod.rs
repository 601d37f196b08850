//! The boundary to the imaging engine.
//!
//! Everything that touches the `image` crate lives under this module. The
//! split mirrors what a handle needs from an engine:
//!
//! | Module | Role |
//! |--------|------|
//! | [`bitmap`] | The owned resource: pixels plus file-level side state |
//! | [`codecs`] | Codec capability registry and format identification |
//! | [`decode`] | Bytes → bitmap, including metadata extraction |
//! | [`encode`] | Bitmap → bytes, gated by the capability pre-check |
//! | [`ops`] | Transforms, conversions, channels, curves, histograms |
//! | [`params`] | Load/save option words |
//!
//! Engine failures carry structured detail as [`EngineError`]; the `Frame`
//! layer above collapses them into its uniform boolean contract.

use thiserror::Error;

pub mod bitmap;
pub mod codecs;
pub mod decode;
pub mod encode;
pub(crate) mod iptc;
pub mod ops;
pub mod params;

pub use bitmap::{Bitmap, PixelKind, DEFAULT_DOTS_PER_METER};
pub use codecs::{
    can_decode, can_encode, codec_registry, identify_memory, identify_path, identify_reader,
    CodecCaps,
};
pub use decode::decode_memory;
pub use encode::{encode_to_memory, encode_to_path, encode_to_writer};
pub use ops::Channel;
pub use params::{LoadOptions, Quality, SaveOptions};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("engine call failed: {0}")]
    Engine(#[from] image::ImageError),
    #[error("unsupported: {0}")]
    Unsupported(String),
}
