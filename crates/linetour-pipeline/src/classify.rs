//! Image decoding and binary foreground/background classification.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces a
//! [`BinaryGrid`] marking every dark pixel as foreground.
//!
//! This is the first step in the pipeline: raw bytes in, `BinaryGrid` out.

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::types::{Dimensions, PipelineError};

/// Decode raw image bytes into an RGB raster.
///
/// Supports whatever formats the `image` crate is built with. Any alpha
/// channel is discarded.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<RgbImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgb8())
}

/// Returns `true` when a pixel counts as foreground ("dark").
///
/// A single channel at or below `threshold` is enough.
#[must_use]
pub const fn is_foreground(rgb: [u8; 3], threshold: u8) -> bool {
    rgb[0] <= threshold || rgb[1] <= threshold || rgb[2] <= threshold
}

/// A 2D boolean grid with the exact dimensions of its source image.
///
/// `true` marks a foreground pixel. Built once by [`classify`] and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryGrid {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl BinaryGrid {
    /// Build a grid from a predicate evaluated at every coordinate.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    /// Grid width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Grid dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }

    /// Whether `(x, y)` is foreground. Out-of-bounds coordinates are
    /// background.
    #[must_use]
    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.cells[y as usize * self.width as usize + x as usize]
    }

    /// Number of foreground cells.
    #[must_use]
    pub fn foreground_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }
}

/// Classify every pixel of `image` as foreground or background.
#[must_use = "returns the classified grid"]
pub fn classify(image: &RgbImage, threshold: u8) -> BinaryGrid {
    BinaryGrid::from_fn(image.width(), image.height(), |x, y| {
        is_foreground(image.get_pixel(x, y).0, threshold)
    })
}
