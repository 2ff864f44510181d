//! Conversion entry points.
//!
//! [`Converter`] holds a [`RendererConfig`] and runs one renderer process per
//! call. Every call validates its options first: a bad call fails before
//! anything is spawned.
//!
//! The free functions [`convert`] and [`convert_sync`] locate the renderer
//! with [`RendererConfig::from_env`] on each call; construct a `Converter`
//! once when converting many documents or when the renderer lives somewhere
//! unusual.

use crate::config::{ConversionOptions, RendererConfig};
use crate::error::Svg2PngError;
use crate::pipeline::options::{renderer_args, EffectiveOptions};
use crate::pipeline::{decode, invoke};
use std::ffi::OsString;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Converts SVG documents by driving an external renderer.
///
/// Cheap to clone; holds no process or connection state.
///
/// # Example
/// ```rust,no_run
/// use svg2png::{ConversionOptions, Converter, ImageFormat, RendererConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = RendererConfig::builder("/usr/local/bin/phantomjs")
///     .script("/opt/svg2png/converter.js")
///     .timeout_secs(30)
///     .build()?;
/// let converter = Converter::new(config);
///
/// let svg = std::fs::read("logo.svg")?;
/// let options = ConversionOptions::builder().format(ImageFormat::Png).build()?;
/// let png = converter.convert(&svg, &options).await?;
/// std::fs::write("logo.png", png)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Converter {
    config: RendererConfig,
}

impl Converter {
    /// A converter that runs the renderer described by `config`.
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// A converter for the PhantomJS install found on this machine.
    pub fn from_env() -> Result<Self, Svg2PngError> {
        RendererConfig::from_env().map(Self::new)
    }

    /// The renderer configuration in use.
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Convert `source` (SVG markup) to image bytes without blocking.
    ///
    /// # Errors
    /// - configuration errors for bad `options` (nothing is spawned)
    /// - launch errors when the renderer cannot be started
    /// - render errors carrying the renderer's own message
    /// - [`Svg2PngError::Timeout`] when `timeout_secs` elapses
    pub async fn convert(
        &self,
        source: &[u8],
        options: &ConversionOptions,
    ) -> Result<Vec<u8>, Svg2PngError> {
        let effective = prepare(source, options)?;
        self.render(source, &effective).await
    }

    /// Blocking counterpart of [`Converter::convert`].
    ///
    /// Must not be called from inside an async task; use
    /// `tokio::task::spawn_blocking` there, or the async method.
    pub fn convert_sync(
        &self,
        source: &[u8],
        options: &ConversionOptions,
    ) -> Result<Vec<u8>, Svg2PngError> {
        let effective = prepare(source, options)?;
        self.render_blocking(source, &effective)
    }

    /// Read an SVG file and convert it.
    ///
    /// When `options` names neither a `filename` nor a `url`, `path` is used
    /// as the filename so relative references inside the SVG resolve.
    pub async fn convert_path(
        &self,
        path: impl AsRef<Path>,
        options: &ConversionOptions,
    ) -> Result<Vec<u8>, Svg2PngError> {
        let path = path.as_ref();
        let source = tokio::fs::read(path)
            .await
            .map_err(|source| Svg2PngError::SourceReadFailed {
                path: path.to_path_buf(),
                source,
            })?;

        let mut options = options.clone();
        if options.filename.is_none() && options.url.is_none() {
            options.filename = Some(path.to_path_buf());
        }

        self.convert(&source, &options).await
    }

    /// Convert `source` and write the image to `output_path`.
    ///
    /// Uses atomic write (temp file + rename) to prevent partial files.
    /// Returns the number of bytes written.
    pub async fn convert_to_file(
        &self,
        source: &[u8],
        output_path: impl AsRef<Path>,
        options: &ConversionOptions,
    ) -> Result<usize, Svg2PngError> {
        let image = self.convert(source, options).await?;
        let path = output_path.as_ref();
        let write_err = |source: std::io::Error| Svg2PngError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = Path::new(&tmp_name);

        tokio::fs::write(tmp_path, &image).await.map_err(write_err)?;
        tokio::fs::rename(tmp_path, path).await.map_err(write_err)?;

        info!("Wrote {} bytes to {}", image.len(), path.display());
        Ok(image.len())
    }

    async fn render(
        &self,
        source: &[u8],
        effective: &EffectiveOptions,
    ) -> Result<Vec<u8>, Svg2PngError> {
        let args = self.args(source, effective)?;
        let start = Instant::now();
        let output = invoke::run(&self.config, &args, source).await?;
        finish(&output, effective, start)
    }

    fn render_blocking(
        &self,
        source: &[u8],
        effective: &EffectiveOptions,
    ) -> Result<Vec<u8>, Svg2PngError> {
        let args = self.args(source, effective)?;
        let start = Instant::now();
        let output = invoke::run_blocking(&self.config, &args, source)?;
        finish(&output, effective, start)
    }

    fn args(
        &self,
        source: &[u8],
        effective: &EffectiveOptions,
    ) -> Result<Vec<OsString>, Svg2PngError> {
        info!(
            "Rendering {} bytes of SVG as {} with {}",
            source.len(),
            effective.format,
            self.config.executable.display()
        );
        renderer_args(&self.config, effective)
    }
}

/// Convert SVG markup using the renderer found by [`RendererConfig::from_env`].
///
/// Options are validated before the renderer is looked up.
pub async fn convert(source: &[u8], options: &ConversionOptions) -> Result<Vec<u8>, Svg2PngError> {
    let effective = prepare(source, options)?;
    Converter::from_env()?.render(source, &effective).await
}

/// Blocking counterpart of [`convert`].
pub fn convert_sync(source: &[u8], options: &ConversionOptions) -> Result<Vec<u8>, Svg2PngError> {
    let effective = prepare(source, options)?;
    Converter::from_env()?.render_blocking(source, &effective)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// All validation that must pass before a process is spawned.
fn prepare(source: &[u8], options: &ConversionOptions) -> Result<EffectiveOptions, Svg2PngError> {
    if source.is_empty() {
        return Err(Svg2PngError::EmptySource);
    }
    EffectiveOptions::resolve(options)
}

fn finish(
    output: &invoke::ProcessOutput,
    effective: &EffectiveOptions,
    start: Instant,
) -> Result<Vec<u8>, Svg2PngError> {
    let image = decode::decode_output(output, effective.format)?;
    info!(
        "Rendered {} image: {} bytes in {}ms",
        effective.format,
        image.len(),
        start.elapsed().as_millis()
    );
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_converter() -> Converter {
        Converter::new(RendererConfig::new("/definitely/not/a/renderer"))
    }

    #[test]
    fn empty_source_fails_before_spawn() {
        let err = unreachable_converter()
            .convert_sync(b"", &ConversionOptions::default())
            .unwrap_err();
        assert!(matches!(err, Svg2PngError::EmptySource));
    }

    #[test]
    fn conflicting_options_fail_before_spawn() {
        let options = ConversionOptions {
            filename: Some("a.svg".into()),
            url: Some("file:///a.svg".into()),
            ..Default::default()
        };
        let err = unreachable_converter()
            .convert_sync(b"<svg/>", &options)
            .unwrap_err();
        // a launch error here would mean a spawn was attempted
        assert!(err.is_configuration_error(), "got: {err}");
    }

    #[tokio::test]
    async fn free_convert_validates_before_locating_renderer() {
        let options = ConversionOptions {
            filename: Some("a.svg".into()),
            url: Some("file:///a.svg".into()),
            ..Default::default()
        };
        let err = convert(b"<svg/>", &options).await.unwrap_err();
        assert!(matches!(err, Svg2PngError::ConflictingSource));
    }

    #[tokio::test]
    async fn convert_path_reports_missing_file() {
        let err = unreachable_converter()
            .convert_path("/definitely/not/here.svg", &ConversionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Svg2PngError::SourceReadFailed { .. }));
    }

    #[test]
    fn converter_exposes_config() {
        let converter = unreachable_converter();
        assert_eq!(
            converter.config().executable,
            Path::new("/definitely/not/a/renderer")
        );
    }
}
