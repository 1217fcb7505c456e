use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use crate::encode::command::FfmpegCommand;
use crate::foundation::error::{ShotreelError, ShotreelResult};

/// Oldest ffmpeg release whose bitstreams the pinned hashes were recorded with.
pub const MIN_FFMPEG_VERSION: (u32, u32) = (6, 1);
/// Wall-clock budget for one encoder invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);
/// Characters of stderr kept on failure.
pub const STDERR_TAIL_CHARS: usize = 3000;

const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(20);
const FAILURE_PREFIX_TOKENS: usize = 8;
const TIMEOUT_PREFIX_TOKENS: usize = 6;

/// Environment variable overriding the encoder executable.
pub const ENV_FFMPEG: &str = "SHOTREEL_FFMPEG";
/// Environment variable overriding [`DEFAULT_TIMEOUT`], in whole seconds.
pub const ENV_FFMPEG_TIMEOUT_SECS: &str = "SHOTREEL_FFMPEG_TIMEOUT_SECS";

/// How to find and bound the encoder.
#[derive(Clone, Debug)]
pub struct EncoderOpts {
    /// Executable name or path.
    pub program: PathBuf,
    /// Per-invocation wall-clock limit.
    pub timeout: Duration,
    /// Versions below this only warn.
    pub min_version: (u32, u32),
}

impl Default for EncoderOpts {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            timeout: DEFAULT_TIMEOUT,
            min_version: MIN_FFMPEG_VERSION,
        }
    }
}

impl EncoderOpts {
    /// Defaults, overridden by `SHOTREEL_FFMPEG` / `SHOTREEL_FFMPEG_TIMEOUT_SECS` when set.
    pub fn from_env() -> ShotreelResult<Self> {
        let mut opts = Self::default();
        if let Some(program) = std::env::var_os(ENV_FFMPEG).filter(|v| !v.is_empty()) {
            opts.program = PathBuf::from(program);
        }
        if let Ok(raw) = std::env::var(ENV_FFMPEG_TIMEOUT_SECS) {
            let secs = raw.trim().parse::<u64>().map_err(|e| {
                ShotreelError::validation(format!("{ENV_FFMPEG_TIMEOUT_SECS}='{raw}': {e}"))
            })?;
            if secs == 0 {
                return Err(ShotreelError::validation(format!(
                    "{ENV_FFMPEG_TIMEOUT_SECS} must be non-zero"
                )));
            }
            opts.timeout = Duration::from_secs(secs);
        }
        Ok(opts)
    }
}

/// Exit status and captured streams of a finished child.
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Run `cmd` to completion in its own process group, bounded by `timeout`.
///
/// On timeout the whole group is killed before the error is returned.
pub fn run_ffmpeg(cmd: &FfmpegCommand, timeout: Duration) -> ShotreelResult<ProcessOutput> {
    tracing::debug!(command = %cmd.display_prefix(10), "running encoder");

    let mut command = Command::new(cmd.program());
    command
        .args(cmd.get_args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt as _;
        command.process_group(0);
    }

    let mut child = command.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ShotreelError::encoder_not_found(format!(
                "'{}' not found; install ffmpeg >= {}.{} (e.g. `apt install ffmpeg`) or set {ENV_FFMPEG}",
                cmd.program().to_string_lossy(),
                MIN_FFMPEG_VERSION.0,
                MIN_FFMPEG_VERSION.1,
            ))
        } else {
            ShotreelError::Other(anyhow::anyhow!(
                "failed to spawn '{}': {e}",
                cmd.program().to_string_lossy()
            ))
        }
    })?;

    let stdout_drain = spawn_drain(child.stdout.take());
    let stderr_drain = spawn_drain(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                let now = Instant::now();
                if now >= deadline {
                    kill_process_group(&mut child);
                    let _ = child.wait();
                    let _ = join_drain(stdout_drain);
                    let _ = join_drain(stderr_drain);
                    return Err(ShotreelError::EncoderTimeout {
                        timeout_s: timeout.as_secs(),
                        command: cmd.display_prefix(TIMEOUT_PREFIX_TOKENS),
                    });
                }
                std::thread::sleep(POLL_INTERVAL.min(deadline - now));
            }
            Err(e) => {
                kill_process_group(&mut child);
                let _ = child.wait();
                return Err(ShotreelError::Other(anyhow::anyhow!(
                    "failed to wait for encoder: {e}"
                )));
            }
        }
    };

    let stdout = join_drain(stdout_drain)?;
    let stderr = join_drain(stderr_drain)?;

    if !status.success() {
        let stderr_text = String::from_utf8_lossy(&stderr);
        return Err(ShotreelError::EncoderFailed {
            status: status.to_string(),
            command: cmd.display_prefix(FAILURE_PREFIX_TOKENS),
            stderr_tail: tail_chars(&stderr_text, STDERR_TAIL_CHARS).to_string(),
        });
    }

    tracing::debug!("encoder finished");
    Ok(ProcessOutput {
        status,
        stdout,
        stderr,
    })
}

type Drain = Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>;

fn spawn_drain<R: Read + Send + 'static>(pipe: Option<R>) -> Drain {
    pipe.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut bytes = Vec::new();
            pipe.read_to_end(&mut bytes)?;
            Ok(bytes)
        })
    })
}

fn join_drain(drain: Drain) -> ShotreelResult<Vec<u8>> {
    match drain {
        Some(handle) => {
            let bytes = handle
                .join()
                .map_err(|_| anyhow::anyhow!("encoder output drain thread panicked"))?
                .map_err(|e| anyhow::anyhow!("failed to read encoder output: {e}"))?;
            Ok(bytes)
        }
        None => Ok(Vec::new()),
    }
}

#[cfg(unix)]
fn kill_process_group(child: &mut Child) {
    // The child leads its own group (process_group(0)), so its pid is the pgid.
    let target = format!("-{}", child.id());
    let killed = Command::new("kill")
        .args(["-KILL", "--", target.as_str()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match killed {
        Ok(status) if status.success() => {}
        Ok(status) => {
            tracing::debug!(%status, "process group already gone");
            let _ = child.kill();
        }
        Err(e) => {
            tracing::warn!(error = %e, "could not kill encoder process group");
            let _ = child.kill();
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(child: &mut Child) {
    let _ = child.kill();
}

/// Last `n` characters of `s`.
pub fn tail_chars(s: &str, n: usize) -> &str {
    let count = s.chars().count();
    if count <= n {
        return s;
    }
    let (offset, _) = s.char_indices().nth(count - n).unwrap_or((0, ' '));
    &s[offset..]
}

/// Version token from `ffmpeg -version` output (`"ffmpeg version X ..."` → `X`).
///
/// Falls back to the whole first line for unexpected banners.
pub fn parse_version_banner(stdout: &str) -> Option<String> {
    let first = stdout.lines().next()?;
    let mut parts = first.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some("ffmpeg"), Some("version"), Some(v)) => Some(v.to_string()),
        _ => Some(first.to_string()),
    }
}

/// Leading `MAJOR.MINOR` of a version string, if it starts with one.
pub fn parse_major_minor(version: &str) -> Option<(u32, u32)> {
    let (major, rest) = version.split_once('.')?;
    let minor = rest
        .split(|c: char| !c.is_ascii_digit())
        .next()
        .filter(|m| !m.is_empty())?;
    if major.is_empty() || !major.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((major.parse().ok()?, minor.parse().ok()?))
}

/// Probe the installed encoder and return its version string.
pub fn ffmpeg_version(opts: &EncoderOpts) -> ShotreelResult<String> {
    let mut cmd = FfmpegCommand::new(&opts.program);
    cmd.arg("-version");
    let out = match run_ffmpeg(&cmd, VERSION_PROBE_TIMEOUT.min(opts.timeout)) {
        Ok(out) => out,
        Err(e @ ShotreelError::EncoderNotFound(_)) => return Err(e),
        Err(e) => {
            return Err(ShotreelError::encoder_not_found(format!(
                "'{} -version' failed: {e}",
                opts.program.display()
            )));
        }
    };
    let stdout = String::from_utf8_lossy(&out.stdout);
    parse_version_banner(&stdout).ok_or_else(|| {
        ShotreelError::encoder_not_found(format!(
            "'{} -version' printed nothing",
            opts.program.display()
        ))
    })
}

/// Ensure the encoder runs, warning when it is older than `opts.min_version`.
pub fn validate_ffmpeg(opts: &EncoderOpts) -> ShotreelResult<String> {
    let version = ffmpeg_version(opts)?;
    if let Some(found) = parse_major_minor(&version)
        && found < opts.min_version
    {
        tracing::warn!(
            version = %version,
            minimum = %format!("{}.{}", opts.min_version.0, opts.min_version.1),
            "ffmpeg is below the minimum version; pinned render hashes may not match"
        );
    }
    Ok(version)
}

/// Return `true` when `program -version` can be invoked successfully.
pub fn is_ffmpeg_available(opts: &EncoderOpts) -> bool {
    Command::new(&opts.program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/runner.rs"]
mod tests;
