//! linetour-export: Raster rendering and encoding (sans-IO)
//!
//! Draws sampled points and a tour onto a canvas of the source image's
//! dimensions and encodes it to bytes. Writing those bytes to disk is
//! left to the caller.

pub mod raster;

pub use raster::{
    DEFAULT_FILE_NAME, DEFAULT_FORMAT, ExportError, RasterStyle, encode, render_result,
    render_tour,
};
