//! Configuration types for SVG rasterisation.
//!
//! Two structs, two lifetimes:
//!
//! * [`ConversionOptions`] — per call: where the SVG lives (`filename` or
//!   `url`, used to resolve relative references), the output [`ImageFormat`],
//!   and optional sizing passed through to the renderer.
//! * [`RendererConfig`] — per [`crate::Converter`]: which executable to run,
//!   which converter script to hand it, and how to talk to it.
//!
//! Both have builders that validate in `build()`.

use crate::error::Svg2PngError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Bytes written to the renderer's stdin per write call.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

// ── Image format ─────────────────────────────────────────────────────────

/// Output image format requested from the renderer.
///
/// Parsing is case-insensitive (`"png"`, `"Png"`, `"PNG"` all work), both
/// through [`FromStr`] and when deserialising; the wire form sent to the
/// renderer is always upper-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum ImageFormat {
    /// Lossless PNG. (default)
    #[default]
    Png,
    /// JPEG, labelled `jpg` on the wire.
    Jpg,
}

impl ImageFormat {
    /// Upper-case name used in the renderer's JSON options.
    pub const fn as_str(self) -> &'static str {
        match self {
            ImageFormat::Png => "PNG",
            ImageFormat::Jpg => "JPG",
        }
    }

    /// The prefix the renderer writes before the base64 payload.
    pub const fn data_uri_prefix(self) -> &'static str {
        match self {
            ImageFormat::Png => "data:image/png;base64,",
            ImageFormat::Jpg => "data:image/jpg;base64,",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageFormat {
    type Err = Svg2PngError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_uppercase();
        match normalized.as_str() {
            "PNG" => Ok(ImageFormat::Png),
            "JPG" => Ok(ImageFormat::Jpg),
            _ => Err(Svg2PngError::UnsupportedFormat { format: normalized }),
        }
    }
}

impl TryFrom<String> for ImageFormat {
    type Error = Svg2PngError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// ── Per-call options ─────────────────────────────────────────────────────

/// Options for a single conversion.
///
/// # Example
/// ```rust
/// use svg2png::{ConversionOptions, ImageFormat};
///
/// let options = ConversionOptions::builder()
///     .filename("drawings/logo.svg")
///     .format_name("jpg")
///     .width(256)
///     .build()
///     .unwrap();
/// assert_eq!(options.format, Some(ImageFormat::Jpg));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOptions {
    /// Local path the SVG was read from. Sent to the renderer as a `file://`
    /// URL so relative `href`s resolve. Mutually exclusive with `url`.
    pub filename: Option<PathBuf>,

    /// URL the SVG was fetched from. Mutually exclusive with `filename`.
    pub url: Option<String>,

    /// Output format. Default: PNG.
    pub format: Option<ImageFormat>,

    /// Output width in pixels. Default: the SVG's intrinsic width.
    pub width: Option<u32>,

    /// Output height in pixels. Default: the SVG's intrinsic height.
    pub height: Option<u32>,
}

impl ConversionOptions {
    /// Create a new builder for `ConversionOptions`.
    pub fn builder() -> ConversionOptionsBuilder {
        ConversionOptionsBuilder::default()
    }

    /// The format that will actually be requested.
    pub fn effective_format(&self) -> ImageFormat {
        self.format.unwrap_or_default()
    }
}

/// Builder for [`ConversionOptions`].
#[derive(Debug, Default)]
pub struct ConversionOptionsBuilder {
    options: ConversionOptions,
    format_name: Option<String>,
}

impl ConversionOptionsBuilder {
    pub fn filename(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.filename = Some(path.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.options.url = Some(url.into());
        self
    }

    pub fn format(mut self, format: ImageFormat) -> Self {
        self.options.format = Some(format);
        self.format_name = None;
        self
    }

    /// Set the format by name; validated case-insensitively in `build()`.
    /// An empty name means "use the default".
    pub fn format_name(mut self, name: impl Into<String>) -> Self {
        self.format_name = Some(name.into());
        self
    }

    pub fn width(mut self, px: u32) -> Self {
        self.options.width = Some(px);
        self
    }

    pub fn height(mut self, px: u32) -> Self {
        self.options.height = Some(px);
        self
    }

    /// Build the options, validating constraints.
    pub fn build(mut self) -> Result<ConversionOptions, Svg2PngError> {
        if self.options.filename.is_some() && self.options.url.is_some() {
            return Err(Svg2PngError::ConflictingSource);
        }
        if let Some(name) = self.format_name.take() {
            self.options.format = if name.is_empty() {
                None
            } else {
                Some(name.parse()?)
            };
        }
        if self.options.width == Some(0) || self.options.height == Some(0) {
            return Err(Svg2PngError::InvalidConfig(
                "width and height must be ≥ 1 pixel".into(),
            ));
        }
        Ok(self.options)
    }
}

// ── Renderer configuration ───────────────────────────────────────────────

/// How to run the external renderer.
///
/// Built via [`RendererConfig::builder()`] for an explicit executable, or
/// [`RendererConfig::from_env()`] to locate PhantomJS and the bundled
/// converter script automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererConfig {
    /// Renderer executable, e.g. `/usr/local/bin/phantomjs`.
    pub executable: PathBuf,

    /// Script passed as the first argument for script-driven renderers.
    /// `None` runs the executable with the JSON options as its only argument.
    pub script: Option<PathBuf>,

    /// Kill the renderer after this many seconds. Default: no limit.
    pub timeout_secs: Option<u64>,

    /// Stdin write granularity in bytes. Default: 1024.
    pub chunk_size: usize,
}

impl RendererConfig {
    /// A config for `executable` with every other field at its default.
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            script: None,
            timeout_secs: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Create a new builder for the given executable.
    pub fn builder(executable: impl Into<PathBuf>) -> RendererConfigBuilder {
        RendererConfigBuilder {
            config: Self::new(executable),
        }
    }

    /// Locate PhantomJS and the bundled converter script.
    ///
    /// See [`renderer_auto`] for the search order and environment overrides.
    pub fn from_env() -> Result<Self, Svg2PngError> {
        let executable = renderer_auto::find_renderer()?;
        let script = renderer_auto::ensure_converter_script()?;
        Ok(Self {
            script: Some(script),
            ..Self::new(executable)
        })
    }

    /// Check the constraints [`RendererConfigBuilder::build`] enforces.
    ///
    /// The fields are public, so the renderer invocation re-checks them
    /// before spawning anything.
    pub fn validate(&self) -> Result<(), Svg2PngError> {
        if self.executable.as_os_str().is_empty() {
            return Err(Svg2PngError::InvalidConfig(
                "renderer executable path is empty".into(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(Svg2PngError::InvalidConfig(
                "chunk size must be ≥ 1 byte".into(),
            ));
        }
        if self.timeout_secs == Some(0) {
            return Err(Svg2PngError::InvalidConfig(
                "timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`RendererConfig`].
#[derive(Debug)]
pub struct RendererConfigBuilder {
    config: RendererConfig,
}

impl RendererConfigBuilder {
    pub fn script(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.script = Some(path.into());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = Some(secs);
        self
    }

    pub fn chunk_size(mut self, bytes: usize) -> Self {
        self.config.chunk_size = bytes;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RendererConfig, Svg2PngError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parse_is_case_insensitive() {
        assert_eq!("png".parse::<ImageFormat>().unwrap(), ImageFormat::Png);
        assert_eq!("pNg".parse::<ImageFormat>().unwrap(), ImageFormat::Png);
        assert_eq!("JpG".parse::<ImageFormat>().unwrap(), ImageFormat::Jpg);
    }

    #[test]
    fn format_parse_rejects_others() {
        for bad in ["jpeg", "gif", " png", "svg"] {
            let err = bad.parse::<ImageFormat>().unwrap_err();
            assert!(err.is_configuration_error(), "{bad}: {err}");
        }
    }

    #[test]
    fn format_prefixes() {
        assert_eq!(ImageFormat::Png.data_uri_prefix(), "data:image/png;base64,");
        assert_eq!(ImageFormat::Jpg.data_uri_prefix(), "data:image/jpg;base64,");
    }

    #[test]
    fn format_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&ImageFormat::Jpg).unwrap(), "\"JPG\"");
    }

    #[test]
    fn format_deserializes_case_insensitively() {
        let options: ConversionOptions = serde_json::from_str(r#"{"format":"png"}"#).unwrap();
        assert_eq!(options.format, Some(ImageFormat::Png));
        let options: ConversionOptions = serde_json::from_str(r#"{"format":"Jpg"}"#).unwrap();
        assert_eq!(options.format, Some(ImageFormat::Jpg));
    }

    #[test]
    fn format_deserialize_rejects_others() {
        let err = serde_json::from_str::<ConversionOptions>(r#"{"format":"jpeg"}"#).unwrap_err();
        assert!(err.to_string().contains("Invalid file format 'JPEG'"), "got: {err}");
    }

    #[test]
    fn options_default_to_png() {
        assert_eq!(ConversionOptions::default().effective_format(), ImageFormat::Png);
    }

    #[test]
    fn builder_rejects_filename_and_url() {
        let err = ConversionOptions::builder()
            .filename("a.svg")
            .url("https://example.com/a.svg")
            .build()
            .unwrap_err();
        assert!(matches!(err, Svg2PngError::ConflictingSource));
    }

    #[test]
    fn builder_empty_format_name_means_default() {
        let options = ConversionOptions::builder().format_name("").build().unwrap();
        assert_eq!(options.format, None);
        assert_eq!(options.effective_format(), ImageFormat::Png);
    }

    #[test]
    fn builder_bad_format_name() {
        let err = ConversionOptions::builder()
            .format_name("bmp")
            .build()
            .unwrap_err();
        assert!(matches!(err, Svg2PngError::UnsupportedFormat { ref format } if format == "BMP"));
    }

    #[test]
    fn builder_rejects_zero_size() {
        assert!(ConversionOptions::builder().width(0).build().is_err());
    }

    #[test]
    fn renderer_builder_defaults() {
        let config = RendererConfig::builder("/usr/bin/phantomjs").build().unwrap();
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.timeout_secs, None);
        assert_eq!(config.script, None);
    }

    #[test]
    fn renderer_builder_validation() {
        assert!(RendererConfig::builder("").build().is_err());
        assert!(RendererConfig::builder("x").chunk_size(0).build().is_err());
        assert!(RendererConfig::builder("x").timeout_secs(0).build().is_err());
    }

    #[test]
    fn validate_catches_fields_edited_after_build() {
        let mut config = RendererConfig::builder("/usr/bin/phantomjs").build().unwrap();
        assert!(config.validate().is_ok());
        config.chunk_size = 0;
        assert!(matches!(config.validate(), Err(Svg2PngError::InvalidConfig(_))));
    }
}
