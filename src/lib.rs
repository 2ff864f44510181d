//! # svg2png
//!
//! Rasterise SVG documents to PNG or JPG by handing them to a headless
//! browser (PhantomJS by default) and reading the image back.
//!
//! ## Why an external renderer?
//!
//! Browsers are the reference implementation for SVG: CSS, web fonts,
//! `<foreignObject>` and scripting all behave exactly as they do on a web page.
//! This crate keeps the browser at arm's length, one short-lived process per
//! conversion, and only owns the plumbing: options validation, the process
//! exchange, and turning the renderer's output into bytes or a clear error.
//!
//! ## Pipeline Overview
//!
//! ```text
//! SVG bytes + ConversionOptions
//!  │
//!  ├─ 1. Options  validate, filename → file:// URL, default the format
//!  ├─ 2. Invoke   <renderer> [<script>] '<json options>', SVG on stdin
//!  └─ 3. Decode   "data:image/png;base64,…" on stdout → image bytes
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use svg2png::{convert, ConversionOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Renderer located via SVG2PNG_RENDERER, then PATH.
//!     let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="8"/>"#;
//!     let png = convert(svg, &ConversionOptions::default()).await?;
//!     std::fs::write("out.png", png)?;
//!     Ok(())
//! }
//! ```
//!
//! A blocking API ([`convert_sync`], [`Converter::convert_sync`]) is available
//! for callers without an async runtime.
//!
//! ## Logging
//!
//! The library emits [`tracing`] events (`info` per conversion, `debug` for
//! the argument vector and byte counts) and never installs a subscriber.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod pipeline;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionOptions, ConversionOptionsBuilder, ImageFormat, RendererConfig,
    RendererConfigBuilder, DEFAULT_CHUNK_SIZE,
};
pub use convert::{convert, convert_sync, Converter};
pub use error::Svg2PngError;
pub use pipeline::options::EffectiveOptions;
pub use renderer_auto;
