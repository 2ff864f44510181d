//! End-to-end tests against a real PhantomJS install.
//!
//! Gated behind the `E2E_ENABLED` environment variable so they do not run in
//! CI unless explicitly requested. The renderer is located the same way the
//! library does it (`SVG2PNG_RENDERER`, then `PATH`).
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture
//!
//! Output images land in `target/e2e-output/` for manual inspection.

use std::path::PathBuf;
use svg2png::{convert, convert_sync, ConversionOptions, Converter, ImageFormat};

// ── Test helpers ─────────────────────────────────────────────────────────────

const RED_SQUARE: &[u8] = br##"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="30">
  <rect width="40" height="30" fill="#ff0000"/>
</svg>"##;

fn output_dir() -> PathBuf {
    let d = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("target/e2e-output");
    std::fs::create_dir_all(&d).ok();
    d
}

/// Skip this test if E2E_ENABLED is not set *or* no renderer is installed.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        if !svg2png::renderer_auto::is_renderer_available() {
            println!("SKIP — no phantomjs found");
            println!("       Install it or set SVG2PNG_RENDERER=/path/to/phantomjs");
            return;
        }
    }};
}

fn dimensions(bytes: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory(bytes).expect("renderer produced a decodable image");
    (img.width(), img.height())
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_png_natural_size() {
    e2e_skip_unless_ready!();

    let png = convert(RED_SQUARE, &ConversionOptions::default())
        .await
        .expect("png conversion");

    assert_eq!(image::guess_format(&png).unwrap(), image::ImageFormat::Png);
    assert_eq!(dimensions(&png), (40, 30));

    let pixel = image::load_from_memory(&png).unwrap().to_rgba8();
    let p = pixel.get_pixel(20, 15);
    assert!(p[0] > 200 && p[1] < 50 && p[2] < 50, "expected red, got {p:?}");

    std::fs::write(output_dir().join("red_square.png"), &png).ok();
}

#[test]
fn test_jpg_resized_sync() {
    e2e_skip_unless_ready!();

    let options = ConversionOptions::builder()
        .format(ImageFormat::Jpg)
        .width(80)
        .height(60)
        .build()
        .unwrap();
    let jpg = convert_sync(RED_SQUARE, &options).expect("jpg conversion");

    assert_eq!(image::guess_format(&jpg).unwrap(), image::ImageFormat::Jpeg);
    assert_eq!(dimensions(&jpg), (80, 60));

    std::fs::write(output_dir().join("red_square_80x60.jpg"), &jpg).ok();
}

#[tokio::test]
async fn test_relative_image_resolves_against_filename() {
    e2e_skip_unless_ready!();

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("inner.svg"), RED_SQUARE).unwrap();
    let outer = br#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="40" height="30">
  <image xlink:href="inner.svg" width="40" height="30"/>
</svg>"#;
    let outer_path = dir.path().join("outer.svg");
    std::fs::write(&outer_path, outer).unwrap();

    let converter = Converter::from_env().expect("renderer located");
    let png = converter
        .convert_path(&outer_path, &ConversionOptions::default())
        .await
        .expect("conversion with relative reference");

    assert_eq!(dimensions(&png), (40, 30));
}

#[tokio::test]
async fn test_malformed_svg_reports_renderer_message() {
    e2e_skip_unless_ready!();

    let err = convert(b"<svg", &ConversionOptions::default())
        .await
        .unwrap_err();

    assert!(err.is_render_error(), "got: {err}");
    assert!(!err.to_string().is_empty());
}
