use crate::config::EngineConfig;
use crate::foundation::error::{AssemblyError, AssemblyResult};
use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

/// Captured result of one finished encoder process.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Last `max_lines` non-empty lines of stderr, joined with `" | "`.
    pub fn stderr_tail(&self, max_lines: usize) -> String {
        let text = String::from_utf8_lossy(&self.stderr);
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let start = lines.len().saturating_sub(max_lines);
        lines[start..].join(" | ")
    }

    pub fn describe_exit(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Shared cancellation flag for an in-flight `create_video` call.
///
/// Cloning shares the flag; cancelling kills the running encoder at its next poll.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Seam between the engine and the external encoder binary.
///
/// Implementations run one encoder invocation to completion. Spawn and wait failures are
/// reported as [`AssemblyError::Render`]; a cancelled run returns [`AssemblyError::Cancelled`].
/// A non-zero exit is not an error at this level: callers inspect [`ProcessOutput`].
pub trait EncoderRunner: Send + Sync {
    /// Human-readable program name used in log and error messages.
    fn program(&self) -> String;

    fn run(&self, args: &[OsString], cancel: &CancelToken) -> AssemblyResult<ProcessOutput>;
}

/// Runs the system `ffmpeg` (or another configured binary).
#[derive(Clone, Debug)]
pub struct FfmpegRunner {
    program: PathBuf,
    poll_interval: Duration,
}

impl FfmpegRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            poll_interval: Duration::from_millis(50),
        }
    }

    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self::new(&cfg.encoder_path).with_poll_interval(cfg.poll_interval())
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl EncoderRunner for FfmpegRunner {
    fn program(&self) -> String {
        self.program.display().to_string()
    }

    fn run(&self, args: &[OsString], cancel: &CancelToken) -> AssemblyResult<ProcessOutput> {
        if cancel.is_cancelled() {
            return Err(AssemblyError::Cancelled);
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        tracing::debug!(program = %self.program.display(), argc = args.len(), "spawning encoder");
        let child = cmd.spawn().map_err(|e| {
            AssemblyError::render(format!(
                "failed to spawn '{}' (is it installed and on PATH?): {e}",
                self.program.display()
            ))
        })?;
        let mut guard = ChildGuard::new(child);

        let stdout_drain = drain(guard.child.stdout.take());
        let stderr_drain = drain(guard.child.stderr.take());

        let exit_code = loop {
            if cancel.is_cancelled() {
                guard.kill_and_reap();
                // Grandchildren may still hold the pipes open; the drains are detached.
                drop(stdout_drain);
                drop(stderr_drain);
                tracing::warn!(program = %self.program.display(), "encoder cancelled");
                return Err(AssemblyError::Cancelled);
            }
            match guard.child.try_wait() {
                Ok(Some(status)) => {
                    guard.reaped = true;
                    break status.code();
                }
                Ok(None) => std::thread::sleep(self.poll_interval),
                Err(e) => {
                    return Err(AssemblyError::render(format!(
                        "failed to wait for '{}': {e}",
                        self.program.display()
                    )));
                }
            }
        };

        Ok(ProcessOutput {
            exit_code,
            stdout: join_drain(stdout_drain, "stdout")?,
            stderr: join_drain(stderr_drain, "stderr")?,
        })
    }
}

/// Owns a spawned child and kills/reaps it unless it was already waited on.
struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        Self {
            child,
            reaped: false,
        }
    }

    fn kill_and_reap(&mut self) {
        if self.reaped {
            return;
        }
        let _ = self.child.kill();
        let _ = self.child.wait();
        self.reaped = true;
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        self.kill_and_reap();
    }
}

type Drain = Option<JoinHandle<std::io::Result<Vec<u8>>>>;

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Drain {
    pipe.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut bytes = Vec::new();
            pipe.read_to_end(&mut bytes)?;
            Ok(bytes)
        })
    })
}

fn join_drain(handle: Drain, stream: &str) -> AssemblyResult<Vec<u8>> {
    match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| AssemblyError::render(format!("encoder {stream} drain thread panicked")))?
            .map_err(|e| AssemblyError::render(format!("encoder {stream} read failed: {e}"))),
        None => Ok(Vec::new()),
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> AssemblyResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../tests/unit/process.rs"]
mod tests;
