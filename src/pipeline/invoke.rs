//! Renderer invocation: spawn, feed stdin, collect output.
//!
//! ## Why write stdin concurrently with reading?
//!
//! Pipes have a small kernel buffer (64 KiB on Linux). A renderer that starts
//! writing before it has consumed all of its input would stall on a full
//! stdout while we stall on a full stdin. Both flavours therefore feed stdin
//! alongside output collection: the async path joins the two futures, the
//! blocking path uses dedicated threads.
//!
//! Stdin is written in `RendererConfig::chunk_size` slices and then closed;
//! the closed pipe is the renderer's end-of-input signal. A renderer that
//! exits without reading its input (broken pipe) is not an error here; the
//! output streams decide the outcome in [`crate::pipeline::decode`].
//!
//! ## Process groups
//!
//! Renderers are often wrappers (the npm `phantomjs` shim is a Node script
//! that spawns the real binary). On Unix the renderer is started in its own
//! process group and a timeout kills the whole group, so no descendant is
//! left holding the output pipes. The blocking flavour additionally never
//! waits for its I/O threads once the deadline has passed.

use crate::config::RendererConfig;
use crate::error::Svg2PngError;
use std::ffi::OsString;
use std::io;
#[cfg(unix)]
use std::os::unix::process::CommandExt as _;
use std::process::{ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Poll interval for the blocking timeout loop.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Everything the renderer produced during one call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Exit code, `None` when terminated by a signal.
    pub status: Option<i32>,
}

impl From<std::process::Output> for ProcessOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            stdout: output.stdout,
            stderr: output.stderr,
            status: output.status.code(),
        }
    }
}

// ── Async ────────────────────────────────────────────────────────────────

/// Run the renderer on a tokio runtime.
///
/// The child is spawned with `kill_on_drop`, and its process group is killed
/// when the returned future is dropped early or the configured timeout hits.
pub async fn run(
    config: &RendererConfig,
    args: &[OsString],
    source: &[u8],
) -> Result<ProcessOutput, Svg2PngError> {
    config.validate()?;

    let mut command = tokio::process::Command::new(&config.executable);
    command
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    command.process_group(0);

    let mut child = command.spawn().map_err(|source| Svg2PngError::LaunchFailed {
        program: config.executable.clone(),
        source,
    })?;
    debug!("Spawned renderer pid={:?}", child.id());
    let group = GroupGuard::new(child.id());

    let stdin = child.stdin.take().ok_or_else(|| missing_pipe("stdin"))?;
    let chunk_size = config.chunk_size;

    let exchange = async move {
        let (fed, output) = tokio::join!(
            feed_stdin(stdin, source, chunk_size),
            child.wait_with_output()
        );
        check_fed(fed)?;
        let output = output.map_err(|source| Svg2PngError::Io {
            context: "waiting for the renderer",
            source,
        })?;
        Ok::<_, Svg2PngError>(ProcessOutput::from(output))
    };

    let output = match config.timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), exchange)
            .await
            .map_err(|_| {
                warn!("Renderer exceeded {}s; killing its process group", secs);
                Svg2PngError::Timeout { secs }
            })?,
        None => exchange.await,
    }?;

    group.disarm();
    Ok(output)
}

async fn feed_stdin(
    mut stdin: tokio::process::ChildStdin,
    source: &[u8],
    chunk_size: usize,
) -> io::Result<usize> {
    for chunk in source.chunks(chunk_size) {
        stdin.write_all(chunk).await?;
    }
    stdin.shutdown().await?;
    Ok(source.len())
}

// ── Blocking ─────────────────────────────────────────────────────────────

/// Run the renderer, blocking the calling thread until it exits.
///
/// Stdin and both output pipes are serviced by detached threads that own
/// their data. After a timeout they are not joined: a descendant that
/// escaped the group kill may keep a pipe open indefinitely.
pub fn run_blocking(
    config: &RendererConfig,
    args: &[OsString],
    source: &[u8],
) -> Result<ProcessOutput, Svg2PngError> {
    config.validate()?;

    let mut command = std::process::Command::new(&config.executable);
    command
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    command.process_group(0);

    let mut child = command.spawn().map_err(|source| Svg2PngError::LaunchFailed {
        program: config.executable.clone(),
        source,
    })?;
    debug!("Spawned renderer pid={}", child.id());

    let stdin = child.stdin.take().ok_or_else(|| missing_pipe("stdin"))?;
    let mut stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
    let mut stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;
    let chunk_size = config.chunk_size;
    let source = source.to_vec();

    let feeder = std::thread::spawn(move || feed_stdin_blocking(stdin, &source, chunk_size));
    let out_reader = std::thread::spawn(move || read_to_end(&mut stdout));
    let err_reader = std::thread::spawn(move || read_to_end(&mut stderr));

    let status = wait_blocking(&mut child, config.timeout_secs)?;

    check_fed(join(feeder))?;
    let stdout = join(out_reader).map_err(|source| Svg2PngError::Io {
        context: "reading renderer stdout",
        source,
    })?;
    let stderr = join(err_reader).map_err(|source| Svg2PngError::Io {
        context: "reading renderer stderr",
        source,
    })?;

    Ok(ProcessOutput {
        stdout,
        stderr,
        status: status.code(),
    })
}

fn feed_stdin_blocking(
    mut stdin: std::process::ChildStdin,
    source: &[u8],
    chunk_size: usize,
) -> io::Result<usize> {
    use std::io::Write;
    for chunk in source.chunks(chunk_size) {
        stdin.write_all(chunk)?;
    }
    stdin.flush()?;
    Ok(source.len())
}

fn read_to_end(reader: &mut impl io::Read) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf)
}

fn wait_blocking(
    child: &mut std::process::Child,
    timeout_secs: Option<u64>,
) -> Result<ExitStatus, Svg2PngError> {
    let wait_err = |source: io::Error| Svg2PngError::Io {
        context: "waiting for the renderer",
        source,
    };

    let Some(secs) = timeout_secs else {
        return child.wait().map_err(wait_err);
    };

    let deadline = Instant::now() + Duration::from_secs(secs);
    loop {
        if let Some(status) = child.try_wait().map_err(wait_err)? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            warn!("Renderer exceeded {}s; killing its process group", secs);
            // Group first: the leader's pid names the group until it is reaped.
            kill_group(child.id());
            let _ = child.kill();
            let _ = child.wait();
            return Err(Svg2PngError::Timeout { secs });
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

fn join<T>(handle: JoinHandle<io::Result<T>>) -> io::Result<T> {
    handle
        .join()
        .unwrap_or_else(|_| Err(io::Error::other("renderer I/O thread panicked")))
}

// ── Shared ───────────────────────────────────────────────────────────────

/// Kills the renderer's process group on drop unless disarmed.
struct GroupGuard {
    pgid: Option<u32>,
}

impl GroupGuard {
    fn new(pid: Option<u32>) -> Self {
        Self { pgid: pid }
    }

    fn disarm(mut self) {
        self.pgid = None;
    }
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_group(pgid);
        }
    }
}

/// SIGKILL every process in the group led by `pgid`.
#[cfg(unix)]
fn kill_group(pgid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    // SAFETY: killpg takes plain integers; an empty group only yields ESRCH.
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
        debug!("killpg({}) failed: {}", pgid, io::Error::last_os_error());
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: u32) {}

fn check_fed(fed: io::Result<usize>) -> Result<(), Svg2PngError> {
    match fed {
        Ok(n) => {
            debug!("Wrote {} bytes to renderer stdin", n);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            warn!("Renderer closed stdin before reading all input");
            Ok(())
        }
        Err(source) => Err(Svg2PngError::Io {
            context: "writing SVG to renderer stdin",
            source,
        }),
    }
}

fn missing_pipe(name: &'static str) -> Svg2PngError {
    Svg2PngError::Io {
        context: "capturing renderer pipes",
        source: io::Error::other(format!("{name} was not piped")),
    }
}
