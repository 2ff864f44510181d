//! Pipeline stages for one SVG → image conversion.
//!
//! Each submodule implements exactly one step of the exchange with the
//! external renderer. A call runs them once, in order; nothing is shared
//! between calls.
//!
//! ## Data Flow
//!
//! ```text
//! ConversionOptions ──▶ options ──▶ invoke ──▶ decode ──▶ Vec<u8>
//!                      (validate,  (spawn,    (data-URI
//!                       JSON argv)  stdin)     → bytes)
//! ```
//!
//! 1. [`options`] — validate the caller's options and derive the immutable
//!    [`options::EffectiveOptions`] plus the renderer's argument vector
//! 2. [`invoke`]  — spawn the renderer, stream the SVG to its stdin in
//!    chunks, collect stdout/stderr; async (`tokio::process`) and blocking
//!    (`std::process`) flavours share the same contract
//! 3. [`decode`]  — turn the captured streams into image bytes or the
//!    renderer's own error message

pub mod decode;
pub mod invoke;
pub mod options;
