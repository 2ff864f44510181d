//! Output decoding: captured renderer streams → image bytes.
//!
//! The renderer signals success only through stdout content; its exit status
//! is never consulted. Precedence:
//!
//! 1. stdout starts with the format's data-URI prefix → base64-decode the rest
//! 2. stdout is non-empty → it is the error message
//! 3. stderr is non-empty → it is the error message
//! 4. nothing at all → [`Svg2PngError::NoData`]

use crate::config::ImageFormat;
use crate::error::Svg2PngError;
use crate::pipeline::invoke::ProcessOutput;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// Interpret the renderer's output for the requested `format`.
pub fn decode_output(output: &ProcessOutput, format: ImageFormat) -> Result<Vec<u8>, Svg2PngError> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    debug!(
        "Renderer exited with {:?}: {} bytes stdout, {} bytes stderr",
        output.status,
        stdout.len(),
        output.stderr.len()
    );

    if let Some(payload) = stdout.strip_prefix(format.data_uri_prefix()) {
        return decode_payload(payload);
    }

    if !stdout.is_empty() {
        return Err(Svg2PngError::RenderFailed {
            message: clean_message(&stdout),
        });
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
        return Err(Svg2PngError::RenderFailed {
            message: clean_message(&stderr),
        });
    }

    Err(Svg2PngError::NoData)
}

fn decode_payload(payload: &str) -> Result<Vec<u8>, Svg2PngError> {
    // A trailing newline from the renderer's print call is not part of the payload.
    let payload = payload.trim_end();
    if payload.is_empty() {
        return Err(Svg2PngError::InvalidPayload {
            reason: "empty payload after data-URI prefix".into(),
        });
    }

    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| Svg2PngError::InvalidPayload {
            reason: e.to_string(),
        })?;
    debug!("Decoded image → {} bytes", bytes.len());
    Ok(bytes)
}

/// Strip carriage returns and surrounding whitespace.
fn clean_message(text: &str) -> String {
    text.replace('\r', "").trim().to_string()
}
