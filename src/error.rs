//! Error types for the svg2png library.
//!
//! Every failure surfaces as one [`Svg2PngError`]. The variants fall into
//! three families that callers usually want to treat differently:
//!
//! * **Configuration**: the options were rejected before any process was
//!   spawned ([`Svg2PngError::is_configuration_error`]). Fix the call.
//! * **Launch**: the renderer could not be found or started
//!   ([`Svg2PngError::is_launch_error`]). Fix the environment.
//! * **Render**: the renderer ran but did not hand back an image
//!   ([`Svg2PngError::is_render_error`]). The message is the renderer's own.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the svg2png library.
#[derive(Debug, Error)]
pub enum Svg2PngError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// Both `filename` and `url` were supplied.
    #[error("Cannot specify both filename and url options")]
    ConflictingSource,

    /// The requested output format is not PNG or JPG.
    #[error("Invalid file format '{format}' specified. Must be png or jpg.")]
    UnsupportedFormat { format: String },

    /// `filename` could not be turned into a `file://` URL.
    #[error("Cannot convert filename '{path}' to a file URL")]
    InvalidFilename { path: PathBuf },

    /// The source buffer was empty.
    #[error("SVG source is empty")]
    EmptySource,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Launch errors ─────────────────────────────────────────────────────
    /// No renderer executable could be located.
    #[error(transparent)]
    RendererNotFound(#[from] renderer_auto::RendererAutoError),

    /// The renderer process could not be spawned.
    #[error("Failed to launch renderer '{program}': {source}")]
    LaunchFailed {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Render errors ─────────────────────────────────────────────────────
    /// The renderer reported an error (its own message, trimmed).
    #[error("{message}")]
    RenderFailed { message: String },

    /// The renderer exited without writing anything.
    #[error("No data received from the renderer process")]
    NoData,

    /// The data-URI prefix matched but the payload is not valid base64.
    #[error("Renderer returned an undecodable image payload: {reason}")]
    InvalidPayload { reason: String },

    /// The renderer did not finish within the configured timeout.
    #[error("Renderer timed out after {secs}s\nIncrease RendererConfig::timeout_secs or check the SVG for external resources that never load.")]
    Timeout { secs: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Talking to the child process failed.
    #[error("Renderer I/O failed while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Could not read the SVG source file.
    #[error("Failed to read SVG file '{path}': {source}")]
    SourceReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output image file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Svg2PngError {
    /// The options were rejected; no process was spawned.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::ConflictingSource
                | Self::UnsupportedFormat { .. }
                | Self::InvalidFilename { .. }
                | Self::EmptySource
                | Self::InvalidConfig(_)
        )
    }

    /// The renderer could not be found or started.
    pub fn is_launch_error(&self) -> bool {
        matches!(self, Self::RendererNotFound(_) | Self::LaunchFailed { .. })
    }

    /// The renderer ran but produced no usable image.
    pub fn is_render_error(&self) -> bool {
        matches!(
            self,
            Self::RenderFailed { .. } | Self::NoData | Self::InvalidPayload { .. }
        )
    }
}
