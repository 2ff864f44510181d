//! Effective options: the normalised value actually sent to the renderer.
//!
//! The caller's [`ConversionOptions`] is never modified. Resolution builds a
//! fresh [`EffectiveOptions`] in which `filename` has been replaced by a
//! `file://` URL and the format has been defaulted.

use crate::config::{ConversionOptions, ImageFormat, RendererConfig};
use crate::error::Svg2PngError;
use serde::Serialize;
use std::ffi::OsString;
use std::path::Path;
use tracing::debug;
use url::Url;

/// Validated options, serialised as the renderer's JSON argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub format: ImageFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl EffectiveOptions {
    /// Validate `options` and derive the effective value.
    pub fn resolve(options: &ConversionOptions) -> Result<Self, Svg2PngError> {
        let url = match (&options.filename, &options.url) {
            (Some(_), Some(_)) => return Err(Svg2PngError::ConflictingSource),
            (Some(path), None) => Some(file_url(path)?),
            (None, url) => url.clone(),
        };

        if options.width == Some(0) || options.height == Some(0) {
            return Err(Svg2PngError::InvalidConfig(
                "width and height must be ≥ 1 pixel".into(),
            ));
        }

        Ok(Self {
            url,
            format: options.effective_format(),
            width: options.width,
            height: options.height,
        })
    }

    /// The single JSON argument handed to the renderer.
    pub fn to_json(&self) -> Result<String, Svg2PngError> {
        serde_json::to_string(self)
            .map_err(|e| Svg2PngError::InvalidConfig(format!("options are not serialisable: {e}")))
    }
}

/// Convert a local path into a `file://` URL, resolving relative paths
/// against the current directory.
pub fn file_url(path: &Path) -> Result<String, Svg2PngError> {
    let invalid = || Svg2PngError::InvalidFilename {
        path: path.to_path_buf(),
    };
    let absolute = std::path::absolute(path).map_err(|_| invalid())?;
    Url::from_file_path(&absolute)
        .map(String::from)
        .map_err(|()| invalid())
}

/// Build `[<script>] <json>` for the renderer.
pub fn renderer_args(
    config: &RendererConfig,
    effective: &EffectiveOptions,
) -> Result<Vec<OsString>, Svg2PngError> {
    let json = effective.to_json()?;
    debug!("Renderer options: {}", json);

    let mut args = Vec::with_capacity(2);
    if let Some(ref script) = config.script {
        args.push(script.clone().into_os_string());
    }
    args.push(OsString::from(json));
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_becomes_file_url() {
        let options = ConversionOptions {
            filename: Some("/tmp/drawing.svg".into()),
            ..Default::default()
        };
        let effective = EffectiveOptions::resolve(&options).unwrap();
        assert_eq!(effective.url.as_deref(), Some("file:///tmp/drawing.svg"));
        // the caller's value is untouched
        assert!(options.url.is_none());
        assert!(options.filename.is_some());
    }

    #[test]
    fn relative_filename_is_absolutised() {
        let options = ConversionOptions {
            filename: Some("drawing.svg".into()),
            ..Default::default()
        };
        let url = EffectiveOptions::resolve(&options).unwrap().url.unwrap();
        assert!(url.starts_with("file:///"), "got: {url}");
        assert!(url.ends_with("/drawing.svg"), "got: {url}");
    }

    #[test]
    fn spaces_are_percent_encoded() {
        let url = file_url(Path::new("/tmp/my drawing.svg")).unwrap();
        assert_eq!(url, "file:///tmp/my%20drawing.svg");
    }

    #[test]
    fn conflicting_source_is_rejected() {
        let options = ConversionOptions {
            filename: Some("a.svg".into()),
            url: Some("https://example.com/a.svg".into()),
            ..Default::default()
        };
        assert!(matches!(
            EffectiveOptions::resolve(&options),
            Err(Svg2PngError::ConflictingSource)
        ));
    }

    #[test]
    fn json_omits_absent_fields() {
        let effective = EffectiveOptions::resolve(&ConversionOptions::default()).unwrap();
        assert_eq!(effective.to_json().unwrap(), r#"{"format":"PNG"}"#);
    }

    #[test]
    fn json_carries_url_format_and_size() {
        let options = ConversionOptions {
            url: Some("https://example.com/a.svg".into()),
            format: Some(ImageFormat::Jpg),
            width: Some(64),
            height: Some(32),
            ..Default::default()
        };
        let json = EffectiveOptions::resolve(&options).unwrap().to_json().unwrap();
        assert_eq!(
            json,
            r#"{"url":"https://example.com/a.svg","format":"JPG","width":64,"height":32}"#
        );
    }

    #[test]
    fn script_precedes_json() {
        let config = RendererConfig {
            script: Some("/opt/converter.js".into()),
            ..RendererConfig::new("/usr/bin/phantomjs")
        };
        let effective = EffectiveOptions::resolve(&ConversionOptions::default()).unwrap();
        let args = renderer_args(&config, &effective).unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(args[0], OsString::from("/opt/converter.js"));
        assert_eq!(args[1], OsString::from(r#"{"format":"PNG"}"#));
    }

    #[test]
    fn no_script_means_json_only() {
        let config = RendererConfig::new("/usr/bin/renderer");
        let effective = EffectiveOptions::resolve(&ConversionOptions::default()).unwrap();
        assert_eq!(renderer_args(&config, &effective).unwrap().len(), 1);
    }
}
