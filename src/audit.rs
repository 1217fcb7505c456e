//! Determinism checks: render the same inputs twice and compare, plus a built-in self-check.

use std::path::Path;

use anyhow::Context as _;
use serde_json::Value;

use crate::encode::runner::EncoderOpts;
use crate::fingerprint::diff_json;
use crate::foundation::error::{ShotreelError, ShotreelResult};
use crate::model::{AssetManifest, RenderAudit, RenderFingerprint, RenderPlan, Shot};
use crate::renderer::{FINGERPRINT_FILE, PreviewRenderer, RENDER_OUTPUT_FILE, RendererOpts};

/// Result fields expected to differ between otherwise identical runs.
pub const RENDER_OUTPUT_SKIP_FIELDS: [&str; 5] = [
    "rendered_at",
    "video_uri",
    "captions_uri",
    "audio_stems_uri",
    "outputs",
];

/// SHA-256 of an empty caption track.
pub const EMPTY_SRT_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// `asset_manifest_ref` recorded for the built-in fixture.
pub const FIXTURE_ASSET_MANIFEST_REF: &str = "file:///asset_manifest.json";

const FIXTURE_TIMING_LOCK: &str = "sha256:test-timing-lock-abc123";

/// Profiles the self-check knows reference hashes for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FixtureProfile {
    Preview,
    High,
}

impl FixtureProfile {
    /// Profile name written into the fixture plan.
    pub fn plan_profile(self) -> &'static str {
        match self {
            Self::Preview => "preview_local",
            Self::High => "high",
        }
    }

    /// Reference `mp4_sha256` recorded with ffmpeg 6.1 / libx264.
    pub fn pinned_mp4_sha256(self) -> &'static str {
        match self {
            Self::Preview => "b4a44e354dc6e8808a94a59b7bd402e0496e3d1489223a20a92132a7c8ecd6a9",
            Self::High => "5e41afd474b4d812d3bcabb226f3effea0f6cdce277eaba48d6d5d2fce0dcaf8",
        }
    }
}

/// One 2 s shot, no assets, no lines, 1280x720 at 24 fps.
pub fn minimal_fixture(plan_profile: &str) -> (AssetManifest, RenderPlan) {
    let manifest = AssetManifest::new(
        "dry-m",
        "dry-p",
        "file:///sl.json",
        FIXTURE_TIMING_LOCK,
        vec![Shot::new("s1", 2_000)],
    );
    let plan = RenderPlan::new(
        "dry-pl",
        "dry-p",
        plan_profile,
        "file:///render_plan.json",
        FIXTURE_TIMING_LOCK,
    );
    (manifest, plan)
}

/// Render `manifest`/`plan` twice into fresh temp dirs and diff the results.
///
/// `opts.dry_run` picks the mode: dry runs compare `render_output.json` only; full runs go
/// through [`PreviewRenderer::verify`] and also compare the fingerprints.
pub fn audit_render(
    manifest: &AssetManifest,
    plan: &RenderPlan,
    opts: &RendererOpts,
) -> ShotreelResult<RenderAudit> {
    let first = tempfile::tempdir().context("failed to create audit directory")?;
    let second = tempfile::tempdir().context("failed to create audit directory")?;

    for dir in [first.path(), second.path()] {
        let renderer = PreviewRenderer::new(manifest.clone(), plan.clone(), dir, opts.clone())?;
        if opts.dry_run {
            renderer.render()?;
        } else {
            renderer.verify()?;
        }
    }

    let mut diff_fields = Vec::new();
    let a = read_json(&first.path().join(RENDER_OUTPUT_FILE))?;
    let b = read_json(&second.path().join(RENDER_OUTPUT_FILE))?;
    diff_fields.extend(
        diff_json(&a, &b, &RENDER_OUTPUT_SKIP_FIELDS)
            .into_iter()
            .map(|f| format!("render_output.{f}")),
    );

    if !opts.dry_run {
        let a = read_json(&first.path().join(FINGERPRINT_FILE))?;
        let b = read_json(&second.path().join(FINGERPRINT_FILE))?;
        diff_fields.extend(
            diff_json(&a, &b, &[])
                .into_iter()
                .map(|f| format!("render_fingerprint.{f}")),
        );
    }

    let audit = RenderAudit::from_diff(diff_fields);
    if !audit.passed() {
        tracing::warn!(fields = ?audit.diff_fields, "renders are not deterministic");
    }
    Ok(audit)
}

/// [`audit_render`] over JSON files; records the manifest's absolute `file://` URI.
pub fn audit_render_files(
    plan_path: &Path,
    manifest_path: &Path,
    opts: &RendererOpts,
) -> ShotreelResult<RenderAudit> {
    let manifest = AssetManifest::from_path(manifest_path)?;
    let plan = RenderPlan::from_path(plan_path)?;
    let mut opts = opts.clone();
    opts.asset_manifest_ref = manifest_file_uri(manifest_path)?;
    audit_render(&manifest, &plan, &opts)
}

/// `file://` URI of a manifest's absolute path.
pub fn manifest_file_uri(path: &Path) -> ShotreelResult<String> {
    let abs = std::fs::canonicalize(path)
        .with_context(|| format!("failed to resolve '{}'", path.display()))?;
    Ok(format!("file://{}", abs.display()))
}

/// Outcome of [`self_check`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelfCheckReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub fingerprint: Option<RenderFingerprint>,
}

impl SelfCheckReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Verify the built-in fixture twice and compare against reference hashes.
///
/// Fingerprint bytes must match between runs and captions must hash as empty. A
/// different `mp4_sha256` is a warning, or an error when `strict`.
pub fn self_check(
    profile: FixtureProfile,
    strict: bool,
    encoder: &EncoderOpts,
) -> ShotreelResult<SelfCheckReport> {
    let (manifest, plan) = minimal_fixture(profile.plan_profile());
    let opts = RendererOpts {
        asset_manifest_ref: FIXTURE_ASSET_MANIFEST_REF.to_string(),
        encoder: encoder.clone(),
        ..RendererOpts::default()
    };

    let first = tempfile::tempdir().context("failed to create self-check directory")?;
    let second = tempfile::tempdir().context("failed to create self-check directory")?;
    let mut runs = Vec::with_capacity(2);
    for dir in [first.path(), second.path()] {
        PreviewRenderer::new(manifest.clone(), plan.clone(), dir, opts.clone())?.verify()?;
        let path = dir.join(FINGERPRINT_FILE);
        runs.push(
            std::fs::read(&path).with_context(|| format!("failed to read '{}'", path.display()))?,
        );
    }

    let mut report = SelfCheckReport::default();
    if runs[0] != runs[1] {
        report
            .errors
            .push("fingerprint JSON bytes differ between runs".to_string());
    }

    let fp: RenderFingerprint = serde_json::from_slice(&runs[0])
        .map_err(|e| ShotreelError::serde(format!("parse {FINGERPRINT_FILE}: {e}")))?;

    let pinned = profile.pinned_mp4_sha256();
    if fp.mp4_sha256 != pinned {
        let msg = format!(
            "mp4_sha256 mismatch: expected {pinned}, got {}",
            fp.mp4_sha256
        );
        if strict {
            report.errors.push(msg);
        } else {
            report.warnings.push(msg);
        }
    }
    if fp.srt_sha256 != EMPTY_SRT_SHA256 {
        report.errors.push(format!(
            "srt_sha256 mismatch: expected {EMPTY_SRT_SHA256}, got {}",
            fp.srt_sha256
        ));
    }
    report.fingerprint = Some(fp);
    Ok(report)
}

fn read_json(path: &Path) -> ShotreelResult<Value> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read '{}'", path.display()))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ShotreelError::serde(format!("parse '{}': {e}", path.display())))
}

#[cfg(test)]
#[path = "../tests/unit/audit.rs"]
mod tests;
