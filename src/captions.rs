//! SubRip caption track built from the manifest's voice-over lines.

use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::ShotreelResult;
use crate::model::AssetManifest;

/// Shortest on-screen time for a cue.
pub const MIN_CUE_DURATION_MS: u64 = 1_000;
/// Minimum gap between the end of one cue and the start of the next.
pub const MIN_CUE_GAP_MS: u64 = 40;

/// One caption entry, in absolute milliseconds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptionCue {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

/// Collect, floor, order and space the cues for `manifest`.
pub fn build_cues(manifest: &AssetManifest) -> Vec<CaptionCue> {
    let mut cues = Vec::new();
    let mut shot_start_ms = 0u64;

    for shot in &manifest.shots {
        for line in &shot.vo_lines {
            if line.text.trim().is_empty() {
                continue;
            }
            let (start_ms, mut end_ms) = if line.spans_whole_shot() {
                (shot_start_ms, shot_start_ms + shot.duration_ms)
            } else {
                (
                    shot_start_ms + line.timeline_in_ms,
                    shot_start_ms + line.timeline_out_ms,
                )
            };
            if end_ms < start_ms + MIN_CUE_DURATION_MS {
                end_ms = start_ms + MIN_CUE_DURATION_MS;
            }
            let text = if line.speaker_id.is_empty() {
                line.text.clone()
            } else {
                format!("{}: {}", line.speaker_id, line.text)
            };
            cues.push(CaptionCue {
                start_ms,
                end_ms,
                text,
            });
        }
        shot_start_ms += shot.duration_ms;
    }

    // Stable: lines starting together keep manifest order.
    cues.sort_by_key(|c| c.start_ms);

    let mut prev_end: Option<u64> = None;
    for cue in &mut cues {
        if let Some(prev_end) = prev_end
            && cue.start_ms < prev_end + MIN_CUE_GAP_MS
        {
            cue.start_ms = prev_end + MIN_CUE_GAP_MS;
            cue.end_ms = cue.end_ms.max(cue.start_ms + MIN_CUE_DURATION_MS);
        }
        prev_end = Some(cue.end_ms);
    }
    cues
}

/// Serialize cues as SRT. No cues yields an empty string.
pub fn render_srt(cues: &[CaptionCue]) -> String {
    if cues.is_empty() {
        return String::new();
    }
    let blocks = cues
        .iter()
        .enumerate()
        .map(|(i, c)| {
            format!(
                "{}\n{} --> {}\n{}",
                i + 1,
                format_timestamp(c.start_ms),
                format_timestamp(c.end_ms),
                c.text
            )
        })
        .collect::<Vec<_>>();
    let mut out = blocks.join("\n\n");
    out.push('\n');
    out
}

/// SRT text for `manifest`.
pub fn build_srt(manifest: &AssetManifest) -> String {
    render_srt(&build_cues(manifest))
}

/// Write the SRT sidecar (possibly empty) and return its text.
pub fn write_srt(manifest: &AssetManifest, path: &Path) -> ShotreelResult<String> {
    let srt = build_srt(manifest);
    std::fs::write(path, &srt)
        .with_context(|| format!("failed to write captions '{}'", path.display()))?;
    Ok(srt)
}

/// `HH:MM:SS,mmm`.
pub fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

#[cfg(test)]
#[path = "../tests/unit/captions.rs"]
mod tests;
