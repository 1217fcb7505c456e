use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::foundation::error::{ShotreelError, ShotreelResult};
use crate::profile::ProfileSettings;

/// Video codec used for every render.
pub const VIDEO_CODEC: &str = "libx264";
/// Audio codec used when a music bed is mapped.
pub const AUDIO_CODEC: &str = "aac";
/// Output pixel format.
pub const PIXEL_FORMAT: &str = "yuv420p";

/// An executable plus its argument vector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FfmpegCommand {
    program: OsString,
    args: Vec<OsString>,
}

impl FfmpegCommand {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            args: Vec::new(),
        }
    }

    pub fn arg(&mut self, arg: impl AsRef<OsStr>) -> &mut Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for a in args {
            self.arg(a);
        }
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Program and arguments as lossy UTF-8 strings.
    pub fn to_lossy_vec(&self) -> Vec<String> {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|s| s.to_string_lossy().into_owned())
            .collect()
    }

    /// First `n` tokens (program included), followed by ` ...` when truncated.
    pub fn display_prefix(&self, n: usize) -> String {
        let tokens = self.to_lossy_vec();
        let mut out = tokens
            .iter()
            .take(n)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        if tokens.len() > n {
            out.push_str(" ...");
        }
        out
    }
}

/// One still image shown for `duration_ms`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StillInput {
    pub path: PathBuf,
    pub duration_ms: u64,
}

/// Everything needed to build the concat encode.
#[derive(Clone, Debug)]
pub struct ConcatJob<'a> {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub stills: &'a [StillInput],
    pub music: Option<&'a Path>,
    pub profile: &'a ProfileSettings,
    pub out_path: &'a Path,
}

/// `{ms / 1000:.6}`, the form used for `-t` durations.
pub fn format_seconds(ms: u64) -> String {
    format!("{:.6}", ms as f64 / 1000.0)
}

/// Scale/pad/fps chain per input, then a video-only concat into `[vout]`.
pub fn concat_filter_graph(inputs: usize, width: u32, height: u32, fps: u32) -> String {
    let mut parts = (0..inputs)
        .map(|i| {
            format!(
                "[{i}:v]scale={width}:{height}:force_original_aspect_ratio=decrease,\
                 pad={width}:{height}:(ow-iw)/2:(oh-ih)/2:black,setsar=1,fps={fps}[v{i}]"
            )
        })
        .collect::<Vec<_>>();
    let labels = (0..inputs).map(|i| format!("[v{i}]")).collect::<String>();
    parts.push(format!("{labels}concat=n={inputs}:v=1:a=0[vout]"));
    parts.join(";")
}

/// Build the deterministic stills-to-MP4 command.
pub fn build_concat_command(program: &OsStr, job: &ConcatJob<'_>) -> ShotreelResult<FfmpegCommand> {
    if job.stills.is_empty() {
        return Err(ShotreelError::validation(
            "cannot encode a video with no shots",
        ));
    }
    let n = job.stills.len();
    let fps = job.fps.to_string();

    let mut cmd = FfmpegCommand::new(program);
    cmd.arg("-y");
    for still in job.stills {
        cmd.args(["-loop", "1", "-framerate", fps.as_str(), "-t"])
            .arg(format_seconds(still.duration_ms))
            .arg("-i")
            .arg(&still.path);
    }
    if let Some(music) = job.music {
        cmd.arg("-i").arg(music);
    }

    cmd.arg("-filter_complex")
        .arg(concat_filter_graph(n, job.width, job.height, job.fps))
        .args(["-map", "[vout]"]);

    match job.music {
        Some(_) => {
            let total_ms = job.stills.iter().map(|s| s.duration_ms).sum::<u64>();
            cmd.arg("-map")
                .arg(format!("{n}:a"))
                .arg("-t")
                .arg(format_seconds(total_ms))
                .args(["-c:a", AUDIO_CODEC, "-flags:a", "+bitexact"]);
        }
        None => {
            cmd.arg("-an");
        }
    }

    // Bit-exact flags and stripped metadata keep the container reproducible.
    cmd.args(["-c:v", VIDEO_CODEC, "-crf"])
        .arg(job.profile.crf.to_string())
        .arg("-preset")
        .arg(&job.profile.preset)
        .args(["-pix_fmt", PIXEL_FORMAT, "-r"])
        .arg(&fps)
        .args([
            "-fflags",
            "+bitexact",
            "-flags:v",
            "+bitexact",
            "-map_metadata",
            "-1",
            "-movflags",
            "+faststart",
        ])
        .arg(job.out_path);
    Ok(cmd)
}

/// `ffmpeg -i {video} -f framemd5 -`.
pub fn build_framemd5_command(program: &OsStr, video: &Path) -> FfmpegCommand {
    let mut cmd = FfmpegCommand::new(program);
    cmd.arg("-i").arg(video).args(["-f", "framemd5", "-"]);
    cmd
}

#[cfg(test)]
#[path = "../../tests/unit/encode/command.rs"]
mod tests;
