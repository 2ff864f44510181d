//! # renderer-auto
//!
//! Locate the [PhantomJS](https://phantomjs.org/) renderer used by `svg2png`
//! and materialise the converter script it runs, so callers never have to
//! hard-code either path.
//!
//! ## How it works
//!
//! [`find_renderer`] tries, in order:
//!
//! 1. `SVG2PNG_RENDERER` — an explicit path to the executable.
//! 2. Every directory on `PATH`.
//! 3. Well-known install locations (a local `phantomjs-prebuilt` npm install,
//!    `/usr/local/bin`, `/opt/homebrew/bin`, `/usr/bin`).
//!
//! and fails with [`RendererAutoError::NotFound`] listing everything it
//! searched. The first successful lookup is memoised for the process.
//!
//! [`ensure_converter_script`] writes the script embedded in this crate to
//! `~/.cache/svg2png/converter-{VERSION}/converter.js` (rewriting it when the
//! on-disk copy is stale) unless `SVG2PNG_CONVERTER_SCRIPT` points elsewhere.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use renderer_auto::{ensure_converter_script, find_renderer};
//!
//! let phantomjs = find_renderer().expect("PhantomJS unavailable");
//! let script = ensure_converter_script().expect("cache dir not writable");
//! println!("{} {}", phantomjs.display(), script.display());
//! ```
//!
//! ## Environment variable overrides
//!
//! - `SVG2PNG_RENDERER` — path to the renderer executable.
//! - `SVG2PNG_CONVERTER_SCRIPT` — path to a custom converter script.
//! - `SVG2PNG_CACHE_DIR` — override the default cache directory.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Version tag of the embedded converter script; part of the cache path.
pub const CONVERTER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Explicit renderer executable.
pub const RENDERER_ENV: &str = "SVG2PNG_RENDERER";

/// Explicit converter script.
pub const SCRIPT_ENV: &str = "SVG2PNG_CONVERTER_SCRIPT";

/// Cache root override.
pub const CACHE_DIR_ENV: &str = "SVG2PNG_CACHE_DIR";

const CONVERTER_SCRIPT: &str = include_str!("../assets/converter.js");

const SCRIPT_FILE_NAME: &str = "converter.js";

/// Install locations checked after `PATH`, relative entries resolved
/// against the current directory.
const WELL_KNOWN_DIRS: &[&str] = &[
    "node_modules/phantomjs-prebuilt/lib/phantom/bin",
    "node_modules/.bin",
    "/usr/local/bin",
    "/opt/homebrew/bin",
    "/usr/bin",
];

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by renderer-auto operations.
#[derive(Error, Debug)]
pub enum RendererAutoError {
    /// No renderer executable could be found.
    #[error(
        "Renderer executable '{name}' not found.\n\
Searched:\n{searched}\n\
Install PhantomJS or set SVG2PNG_RENDERER=/path/to/phantomjs."
    )]
    NotFound { name: &'static str, searched: String },

    /// Could not create or navigate the local cache directory.
    #[error("Cache directory error for '{path}': {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the converter script failed.
    #[error("Failed to write converter script to '{path}': {source}")]
    ScriptWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ── Singleton path caches ────────────────────────────────────────────────────

static RESOLVED_RENDERER: OnceLock<PathBuf> = OnceLock::new();
static RESOLVED_SCRIPT: OnceLock<PathBuf> = OnceLock::new();

// ── Public API ───────────────────────────────────────────────────────────────

/// File name of the renderer executable on this platform.
pub fn renderer_file_name() -> &'static str {
    if cfg!(windows) {
        "phantomjs.exe"
    } else {
        "phantomjs"
    }
}

/// The converter script shipped with this crate.
pub fn converter_script_source() -> &'static str {
    CONVERTER_SCRIPT
}

/// Returns the per-version cache directory for the converter script.
///
/// Default locations:
/// - **macOS**: `~/Library/Caches/svg2png/converter-{VERSION}/`
/// - **Linux**: `~/.cache/svg2png/converter-{VERSION}/`
/// - **Windows**: `%LOCALAPPDATA%\svg2png\converter-{VERSION}\`
///
/// Override by setting `SVG2PNG_CACHE_DIR`.
pub fn converter_cache_dir() -> PathBuf {
    if let Ok(override_dir) = std::env::var(CACHE_DIR_ENV) {
        return PathBuf::from(override_dir).join(format!("converter-{CONVERTER_VERSION}"));
    }

    let base = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir);

    base.join("svg2png").join(format!("converter-{CONVERTER_VERSION}"))
}

/// Returns `true` if a renderer executable can be found without error.
pub fn is_renderer_available() -> bool {
    find_renderer().is_ok()
}

/// Locates the renderer executable.
///
/// # Thread safety
///
/// Safe to call from multiple threads; the search runs at most a handful of
/// times before the result is memoised.
pub fn find_renderer() -> Result<PathBuf, RendererAutoError> {
    if let Some(path) = RESOLVED_RENDERER.get() {
        return Ok(path.clone());
    }

    let env_override = std::env::var_os(RENDERER_ENV);
    if let Some(ref p) = env_override {
        let p = Path::new(p);
        if !p.as_os_str().is_empty() && !is_executable_file(p) {
            // Fall through: an unusable override should not mask a working install.
            eprintln!(
                "renderer-auto: {RENDERER_ENV} '{}' is not an executable file; searching PATH …",
                p.display()
            );
        }
    }

    let cwd = std::env::current_dir().unwrap_or_default();
    let candidates = search_candidates(env_override, std::env::var_os("PATH"), &cwd);
    let path = locate(&candidates)?;

    let _ = RESOLVED_RENDERER.set(path.clone());
    Ok(path)
}

/// Ensures the converter script exists on disk and returns its path.
///
/// - If `SVG2PNG_CONVERTER_SCRIPT` is set (and the file exists), that path
///   is used as-is.
/// - Otherwise the embedded script is written to [`converter_cache_dir`],
///   replacing any copy whose contents differ.
pub fn ensure_converter_script() -> Result<PathBuf, RendererAutoError> {
    if let Some(path) = RESOLVED_SCRIPT.get() {
        return Ok(path.clone());
    }

    if let Ok(env_path) = std::env::var(SCRIPT_ENV) {
        let p = PathBuf::from(env_path);
        if p.is_file() {
            let _ = RESOLVED_SCRIPT.set(p.clone());
            return Ok(p);
        }
        eprintln!(
            "renderer-auto: {SCRIPT_ENV} '{}' not found; using the bundled converter",
            p.display()
        );
    }

    let path = write_script_into(&converter_cache_dir())?;
    let _ = RESOLVED_SCRIPT.set(path.clone());
    Ok(path)
}

// ── Internal helpers ─────────────────────────────────────────────────────────

/// Build the ordered list of paths to probe.
fn search_candidates(
    env_override: Option<OsString>,
    path_var: Option<OsString>,
    cwd: &Path,
) -> Vec<PathBuf> {
    let name = renderer_file_name();
    let mut candidates = Vec::new();

    if let Some(p) = env_override.filter(|v| !v.is_empty()) {
        candidates.push(PathBuf::from(p));
    }

    if let Some(paths) = path_var {
        candidates.extend(std::env::split_paths(&paths).map(|dir| dir.join(name)));
    }

    for dir in WELL_KNOWN_DIRS {
        let dir = Path::new(dir);
        let dir = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            cwd.join(dir)
        };
        candidates.push(dir.join(name));
    }

    candidates
}

fn locate(candidates: &[PathBuf]) -> Result<PathBuf, RendererAutoError> {
    if let Some(found) = candidates.iter().find(|p| is_executable_file(p)) {
        return Ok(found.clone());
    }

    let searched = candidates
        .iter()
        .map(|p| format!("  {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(RendererAutoError::NotFound {
        name: renderer_file_name(),
        searched,
    })
}

#[cfg(unix)]
fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable_file(path: &Path) -> bool {
    path.is_file()
}

/// Write the embedded script into `dir`, skipping the write when an
/// identical copy is already there.
fn write_script_into(dir: &Path) -> Result<PathBuf, RendererAutoError> {
    let script_path = dir.join(SCRIPT_FILE_NAME);

    if let Ok(existing) = std::fs::read_to_string(&script_path) {
        if existing == CONVERTER_SCRIPT {
            return Ok(script_path);
        }
    }

    std::fs::create_dir_all(dir).map_err(|source| RendererAutoError::CacheDir {
        path: dir.to_path_buf(),
        source,
    })?;

    // Readers must never observe a partially written script.
    let tmp_path = dir.join(format!("{SCRIPT_FILE_NAME}.{}.tmp", std::process::id()));
    std::fs::write(&tmp_path, CONVERTER_SCRIPT).map_err(|source| {
        RendererAutoError::ScriptWrite {
            path: tmp_path.clone(),
            source,
        }
    })?;
    std::fs::rename(&tmp_path, &script_path).map_err(|source| RendererAutoError::ScriptWrite {
        path: script_path.clone(),
        source,
    })?;

    Ok(script_path)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
