//! vitrine-media: turns uploaded bytes into stored image assets.
//!
//! The [`ImageProcessor`] owns the uploads directory. It either optimizes an
//! upload (decode, bound the width, re-encode as JPEG under a `.jpg` name) or
//! stores it verbatim. Either way the file gets a timestamp-prefixed name and
//! the caller gets back the public `/uploads/...` path for the record.

mod naming;
mod processor;
mod upload;

pub use naming::{sanitize_file_name, unique_file_name, unique_jpeg_file_name};
pub use processor::{
    optimize, ImageProcessor, StoredImage, JPEG_QUALITY, MAX_WIDTH, PUBLIC_PREFIX,
};
pub use upload::{Upload, UploadData};
