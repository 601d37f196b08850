//! # Lightbox
//!
//! An owned bitmap handle over the pure-Rust `image` stack. A [`Frame`]
//! holds at most one bitmap at a time — like a slide on a lightbox — and
//! exposes typed load/inspect/transform/save operations that all delegate
//! to the imaging engine behind one boundary module.
//!
//! ```no_run
//! use lightbox::{Frame, PixelKind};
//!
//! let mut frame = Frame::new();
//! if frame.load("photo.jpg") {
//!     frame.make_thumbnail(400);
//!     frame.to_grayscale();
//!     frame.save("thumb.png");
//! }
//!
//! // or build content from scratch
//! let mut canvas = Frame::with_size(PixelKind::Rgb8, 64, 64);
//! canvas.invert();
//! ```
//!
//! # Architecture: a handle over an engine
//!
//! The crate is two layers with one boundary between them:
//!
//! ```text
//! Frame      ownership, dirty flag, the uniform bool/neutral-value contract
//!   │
//! engine     Bitmap resource, codec registry, decode/encode, pixel ops
//!   │
//! image      the actual codecs, resamplers, and color conversions
//! ```
//!
//! All pixel intelligence — decoders, encoders, resampling filters, color
//! conversion — is the engine's. What this crate adds is the lifecycle
//! contract: a frame owns exactly one resource, every content change funnels
//! through a single replace primitive, queries on an empty frame are total,
//! and failures surface as plain `false`/`None` rather than panics or error
//! enums. See the [`frame`] module docs for the exact rules.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`frame`] | The resource handle and its forwarding operation surface |
//! | [`engine`] | The boundary to the `image` crate: resources, codecs, ops |
//! | [`metadata`] | (model, key) → tag association carried by each bitmap |
//!
//! # Design Decisions
//!
//! ## Booleans at the rim, structured errors at the boundary
//!
//! Engine calls return `Result<_, EngineError>` internally — I/O detail and
//! the engine's own error text are preserved there. The public operation
//! surface deliberately collapses all of it to success/failure: this handle
//! is glue, every operation is a single forwarded call, and the only thing
//! a caller can do about a failure is not use the result. Queries never
//! fail at all; an empty frame reports zero dimensions and unknown kind.
//!
//! ## Destructive loads
//!
//! `load` releases the held resource once the format is identified and
//! readable, before the decode runs. A failed decode leaves the frame
//! empty, not holding the prior image. Loads are replacement by contract;
//! keeping the old resource alive through the decode would double peak
//! memory on every reload.
//!
//! ## The codec registry is the only capability oracle
//!
//! Which formats exist, which can be written, and which pixel kinds each
//! writer accepts lives in one table consulted before any encode. Saves
//! that would fail inside the engine fail up front instead, without
//! creating a file.

pub mod engine;
pub mod frame;
pub mod metadata;

pub use engine::{
    Bitmap, Channel, CodecCaps, EngineError, LoadOptions, PixelKind, Quality, SaveOptions,
    can_decode, can_encode, codec_registry, identify_memory, identify_path, identify_reader,
};
pub use frame::Frame;
pub use metadata::{MetadataModel, MetadataStore, Tag, TagValue};

// Engine types that appear in the public operation surface.
pub use image::imageops::FilterType;
pub use image::{ImageFormat, Rgba};
