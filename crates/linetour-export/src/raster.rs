//! Raster rendering of a tour drawing.
//!
//! Draws the sampled points as 1px dots on a blank canvas with the source
//! image's dimensions, then strokes the selected tour as one connected
//! polyline over them. `tiny-skia` handles anti-aliasing and sub-pixel
//! positioning; the result is returned as an `image::RgbImage` ready for
//! encoding.

use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};
use linetour_pipeline::{Dimensions, Point, StagedResult};
use serde::{Deserialize, Serialize};
use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

/// File name used when the caller does not choose one.
pub const DEFAULT_FILE_NAME: &str = "drawnImage.png";

/// Encoding used when the caller does not choose one.
pub const DEFAULT_FORMAT: ImageFormat = ImageFormat::Png;

/// Errors that can occur while rendering or encoding a drawing.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The canvas could not be created (zero width or height).
    #[error("cannot create a {width}x{height} canvas")]
    Canvas {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// The tour refers to a point that does not exist.
    #[error("tour refers to point {index} but only {points} points exist")]
    TourIndex {
        /// Offending index.
        index: usize,
        /// Number of available points.
        points: usize,
    },

    /// The style cannot be drawn with.
    #[error("invalid raster style: {0}")]
    Style(String),

    /// Encoding the raster failed.
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
}

/// Visual settings for the rendered drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterStyle {
    /// Anti-alias the tour lines. Dots are always drawn aliased.
    pub anti_alias: bool,
    /// Stroke width of tour lines in pixels.
    pub line_width: f32,
    /// Canvas fill color.
    pub background: [u8; 3],
    /// Dot and line color.
    pub ink: [u8; 3],
}

impl RasterStyle {
    /// Default stroke width.
    pub const DEFAULT_LINE_WIDTH: f32 = 1.0;

    /// Check the style for values the renderer would silently skip.
    ///
    /// A width of zero is allowed and draws a hairline.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Style`] when `line_width` is negative or not
    /// finite.
    pub fn validate(&self) -> Result<(), ExportError> {
        if !self.line_width.is_finite() || self.line_width < 0.0 {
            return Err(ExportError::Style(format!(
                "line width must be a finite, non-negative number, got {}",
                self.line_width,
            )));
        }
        Ok(())
    }
}

impl Default for RasterStyle {
    fn default() -> Self {
        Self {
            anti_alias: true,
            line_width: Self::DEFAULT_LINE_WIDTH,
            background: [255, 255, 255],
            ink: [0, 0, 0],
        }
    }
}

/// Render a pipeline result: all sampled points plus its best tour.
///
/// # Errors
///
/// See [`render_tour`].
pub fn render_result(result: &StagedResult, style: &RasterStyle) -> Result<RgbImage, ExportError> {
    render_tour(&result.points, result.best_order(), result.dimensions, style)
}

/// Render `points` as dots and `order` as a connected polyline.
///
/// One segment is drawn per consecutive pair of `order`, in order, so a
/// closed tour (last index equal to the first) includes its closing edge.
/// An empty `order` draws the dots only; no points gives a blank canvas.
///
/// # Errors
///
/// Returns [`ExportError::Style`] for an unusable style,
/// [`ExportError::Canvas`] if either dimension is zero and
/// [`ExportError::TourIndex`] if `order` names a missing point.
#[allow(clippy::cast_precision_loss)]
pub fn render_tour(
    points: &[Point],
    order: &[usize],
    dimensions: Dimensions,
    style: &RasterStyle,
) -> Result<RgbImage, ExportError> {
    style.validate()?;
    let Dimensions { width, height } = dimensions;
    let mut pixmap = Pixmap::new(width, height).ok_or(ExportError::Canvas { width, height })?;

    let [br, bg, bb] = style.background;
    pixmap.fill(tiny_skia::Color::from_rgba8(br, bg, bb, 255));

    let [ir, ig, ib] = style.ink;
    let mut paint = Paint::default();
    paint.set_color_rgba8(ir, ig, ib, 255);

    // 1x1 dots exactly covering each sampled pixel.
    paint.anti_alias = false;
    for p in points {
        if let Some(rect) = Rect::from_xywh(p.x as f32, p.y as f32, 1.0, 1.0) {
            pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }
    }

    let mut pb = PathBuilder::new();
    for (i, &index) in order.iter().enumerate() {
        let p = points.get(index).ok_or(ExportError::TourIndex {
            index,
            points: points.len(),
        })?;
        // Pixel centers, so a 1px line lands on the dots.
        let (x, y) = (p.x as f32 + 0.5, p.y as f32 + 0.5);
        if i == 0 {
            pb.move_to(x, y);
        } else {
            pb.line_to(x, y);
        }
    }

    // Empty or zero-extent paths have nothing to stroke.
    if let Some(path) = pb.finish() {
        let stroke = Stroke {
            width: style.line_width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        paint.anti_alias = style.anti_alias;
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    Ok(pixmap_to_rgb(&pixmap, style.background))
}

/// Convert a premultiplied pixmap to a straight RGB image.
///
/// Fully transparent pixels take the background color.
#[allow(clippy::cast_possible_truncation)]
fn pixmap_to_rgb(pixmap: &Pixmap, background: [u8; 3]) -> RgbImage {
    let data = pixmap.data();
    let mut img = RgbImage::new(pixmap.width(), pixmap.height());
    for (i, pixel) in img.pixels_mut().enumerate() {
        let off = i * 4;
        let a = data[off + 3];
        if a == 0 {
            *pixel = Rgb(background);
        } else {
            // Un-premultiply: channel = premultiplied * 255 / alpha.
            let r = u16::from(data[off]) * 255 / u16::from(a);
            let g = u16::from(data[off + 1]) * 255 / u16::from(a);
            let b = u16::from(data[off + 2]) * 255 / u16::from(a);
            *pixel = Rgb([r as u8, g as u8, b as u8]);
        }
    }
    img
}

/// Encode a rendered drawing in `format`.
///
/// # Errors
///
/// Returns [`ExportError::Encode`] if the format is not supported by the
/// enabled `image` codecs or encoding fails.
pub fn encode(image: &RgbImage, format: ImageFormat) -> Result<Vec<u8>, ExportError> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, format)?;
    Ok(buf.into_inner())
}
