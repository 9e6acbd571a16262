//! Integration test: run synthetic images through the full pipeline and
//! render the best tour to PNG.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use image::{ImageEncoder, Rgb, RgbImage};
use linetour_export::{DEFAULT_FORMAT, RasterStyle, encode, render_result};
use linetour_pipeline::PipelineConfig;
use rand_xoshiro::Xoshiro256PlusPlus;
use rand_xoshiro::rand_core::SeedableRng;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

fn png_bytes(img: &RgbImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
    buf
}

/// Dark ring on a light background.
fn ring(width: u32, height: u32) -> RgbImage {
    let cx = f64::from(width) / 2.0;
    let cy = f64::from(height) / 2.0;
    let outer = f64::from(width.min(height)) * 0.45;
    let inner = outer * 0.6;
    RgbImage::from_fn(width, height, |x, y| {
        let r = (f64::from(x) - cx).hypot(f64::from(y) - cy);
        if (inner..=outer).contains(&r) {
            Rgb([30, 60, 90])
        } else {
            Rgb([200, 210, 220])
        }
    })
}

#[test]
fn ring_pipeline_to_png() {
    let source = ring(96, 64);
    let bytes = png_bytes(&source);
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(0x5eed);

    let result = linetour_pipeline::process(&bytes, &PipelineConfig::default(), &mut rng)
        .expect("pipeline should succeed");

    eprintln!(
        "Pipeline produced {} points, best length {:.3}",
        result.points.len(),
        result.best_length(),
    );
    assert!(!result.points.is_empty(), "expected points on the ring");

    // Every point lies on the coarse grid and on a dark source pixel.
    for p in &result.points {
        assert_eq!(p.x % 4, 0);
        assert_eq!(p.y % 4, 0);
        assert_ne!(*source.get_pixel(p.x, p.y), Rgb([200, 210, 220]));
    }

    let drawing = render_result(&result, &RasterStyle::default()).unwrap();
    assert_eq!(drawing.dimensions(), source.dimensions());

    let encoded = encode(&drawing, DEFAULT_FORMAT).unwrap();
    let decoded = image::load_from_memory(&encoded).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (96, 64));

    // Each tour vertex carries its dot.
    for &index in result.best_order() {
        let p = result.points[index];
        assert_eq!(*decoded.get_pixel(p.x, p.y), Rgb([0, 0, 0]));
    }
}

#[test]
fn blank_image_renders_blank_drawing() {
    let source = RgbImage::from_pixel(20, 12, Rgb([250, 250, 250]));
    let bytes = png_bytes(&source);
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);

    let result = linetour_pipeline::process(&bytes, &PipelineConfig::default(), &mut rng).unwrap();
    assert!(result.points.is_empty());
    assert!(result.best.is_none());
    assert!(result.best_order().is_empty());

    let drawing = render_result(&result, &RasterStyle::default()).unwrap();
    assert_eq!(drawing.dimensions(), (20, 12));
    assert!(drawing.pixels().all(|p| *p == WHITE));
}
