#![no_std]
#![cfg_attr(docs_rs, feature(doc_cfg))]
#![warn(missing_docs)]

//! The pixel row core of an MNG / PNG / JNG decoder.
//!
//! Everything here happens *after* a row has been decompressed and
//! unfiltered: turning raw rows into a canonical RGBA form, drawing them onto
//! a canvas in one of many pixel layouts, storing them in image buffers,
//! applying MNG delta images, and promoting buffers to other formats.
//!
//! The usual entry point is a [`Session`], which steps through the rows of
//! one image (Adam7 interlaced or not) and sends each row where it needs to
//! go. The pieces it uses are all public too, for callers who want to drive
//! them directly.
//!
//! ## Cargo Features
//! * `delta` (default): MNG delta image support.
//! * `promote` (default): image buffer promotion.
//! * `jng` (default): storing JPEG color rows and JNG alpha rows.
//!
//! ## Logging
//! The [log](https://docs.rs/log) crate is used for diagnostics: `debug`
//! when an image starts or a buffer is promoted, `trace` as interlace passes
//! change, and `warn` when a row can't be handled.

extern crate alloc;

#[cfg(target_pointer_width = "16")]
compile_error!("this crate assumes 32-bit or bigger pointers!");

pub mod error;
pub use error::*;

pub mod formats;
pub use formats::*;

pub mod bit_depth_changes;
pub use bit_depth_changes::*;

pub mod codec;
pub use codec::*;

pub mod canonical;
pub use canonical::*;

pub mod image_buffer;
pub use image_buffer::*;

pub mod canonicalize;
pub use canonicalize::*;

pub mod interlace;
pub use interlace::*;

pub mod store;
pub use store::*;

pub mod compose;
pub use compose::*;

pub mod canvas;
pub use canvas::*;

pub mod composite;
pub use composite::*;

pub mod bitmap;
pub use bitmap::*;

pub mod session;
pub use session::*;

#[cfg(feature = "delta")]
#[cfg_attr(docs_rs, doc(cfg(feature = "delta")))]
pub mod delta;
#[cfg(feature = "delta")]
pub use delta::*;

#[cfg(feature = "promote")]
#[cfg_attr(docs_rs, doc(cfg(feature = "promote")))]
pub mod promote;
#[cfg(feature = "promote")]
pub use promote::*;

#[cfg(feature = "jng")]
#[cfg_attr(docs_rs, doc(cfg(feature = "jng")))]
pub mod jng;
#[cfg(feature = "jng")]
pub use jng::*;
