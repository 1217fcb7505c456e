//! The render orchestrator: validation, dry runs, full renders and fingerprinting.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{SecondsFormat, Utc};
use tracing::info;

use crate::captions::write_srt;
use crate::encode::command::{ConcatJob, StillInput, VIDEO_CODEC, build_concat_command};
use crate::encode::runner::{EncoderOpts, run_ffmpeg, validate_ffmpeg};
use crate::fingerprint::extract_frame_hashes;
use crate::foundation::error::{ShotreelError, ShotreelResult};
use crate::foundation::hash::{
    CanonicalHasher, canonical_hash, derive_output_id, sha256_file, sha256_text,
};
use crate::model::output::{RENDER_OUTPUT_SCHEMA_ID, RENDER_OUTPUT_SCHEMA_VERSION, RENDERER_KIND};
use crate::model::{
    ArtifactKind, AssetManifest, EffectiveSettings, Lineage, OutputArtifact, OutputHashes,
    Producer, Provenance, RenderFingerprint, RenderOutput, RenderPlan, write_pretty_json,
};
use crate::profile::{ProfileRegistry, ResolvedProfile};
use crate::resolve::{AssetResolver, resolve_music};

/// Result document name inside the output directory.
pub const RENDER_OUTPUT_FILE: &str = "render_output.json";
/// Fingerprint document name inside the output directory.
pub const FINGERPRINT_FILE: &str = "render_fingerprint.json";
/// Encoded video name inside the output directory.
pub const VIDEO_FILE: &str = "output.mp4";
/// Caption sidecar name inside the output directory.
pub const CAPTIONS_FILE: &str = "output.srt";
/// Placeholder cache directory inside the output directory.
pub const PLACEHOLDER_DIR: &str = ".placeholders";
/// Stands in for wall-clock and encoder-version fields in dry-run output.
pub const DRY_RUN_SENTINEL: &str = "dry-run";

/// Construction options for [`PreviewRenderer`].
#[derive(Clone, Debug, Default)]
pub struct RendererOpts {
    /// Validate and compute settings without invoking the encoder or writing media.
    pub dry_run: bool,
    /// Caller correlation id. Defaults to the derived output id.
    pub request_id: Option<String>,
    /// Back-reference to the source manifest, recorded verbatim.
    pub asset_manifest_ref: String,
    pub encoder: EncoderOpts,
    pub profiles: ProfileRegistry,
}

/// Renders one (manifest, plan) pair into an output directory.
///
/// All invariants are checked at construction, so a built renderer only fails on I/O or
/// encoder problems.
#[derive(Debug)]
pub struct PreviewRenderer {
    manifest: AssetManifest,
    plan: RenderPlan,
    output_dir: PathBuf,
    opts: RendererOpts,
    profile: ResolvedProfile,
    manifest_hash: String,
    plan_hash: String,
    derived_id: String,
    request_id: String,
    encoder_version: String,
}

impl PreviewRenderer {
    /// Validate inputs and prepare a renderer.
    ///
    /// Fails before any subprocess on an unknown profile, a timing-lock mismatch, or bad
    /// frame geometry. Outside dry-run mode the encoder is probed here too.
    pub fn new(
        manifest: AssetManifest,
        plan: RenderPlan,
        output_dir: impl Into<PathBuf>,
        opts: RendererOpts,
    ) -> ShotreelResult<Self> {
        let profile = opts.profiles.resolve(&plan.profile)?;
        if manifest.timing_lock_hash != plan.timing_lock_hash {
            return Err(ShotreelError::validation(format!(
                "timing_lock_hash mismatch between asset manifest ('{}') and render plan ('{}'); \
                 both must come from the same shot list",
                manifest.timing_lock_hash, plan.timing_lock_hash
            )));
        }
        plan.validate()?;

        let manifest_hash = canonical_hash(&manifest)?;
        let plan_hash = canonical_hash(&plan)?;
        let derived_id = derive_output_id(&manifest_hash, &plan_hash);
        let request_id = opts
            .request_id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| derived_id.clone());

        let encoder_version = if opts.dry_run {
            DRY_RUN_SENTINEL.to_string()
        } else {
            validate_ffmpeg(&opts.encoder)?
        };

        Ok(Self {
            manifest,
            plan,
            output_dir: output_dir.into(),
            opts,
            profile,
            manifest_hash,
            plan_hash,
            derived_id,
            request_id,
            encoder_version,
        })
    }

    /// Load the manifest and plan from JSON files, then [`new`](Self::new).
    pub fn from_files(
        manifest_path: impl AsRef<Path>,
        plan_path: impl AsRef<Path>,
        output_dir: impl Into<PathBuf>,
        opts: RendererOpts,
    ) -> ShotreelResult<Self> {
        let manifest = AssetManifest::from_path(manifest_path)?;
        let plan = RenderPlan::from_path(plan_path)?;
        Self::new(manifest, plan, output_dir, opts)
    }

    pub fn manifest(&self) -> &AssetManifest {
        &self.manifest
    }

    pub fn plan(&self) -> &RenderPlan {
        &self.plan
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn profile(&self) -> &ResolvedProfile {
        &self.profile
    }

    /// `sha256("{manifest_hash}:{plan_hash}")`.
    pub fn output_id(&self) -> &str {
        &self.derived_id
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn manifest_hash(&self) -> &str {
        &self.manifest_hash
    }

    pub fn plan_hash(&self) -> &str {
        &self.plan_hash
    }

    /// Detected encoder version, or the dry-run sentinel.
    pub fn encoder_version(&self) -> &str {
        &self.encoder_version
    }

    /// Encoder parameters this renderer would use.
    pub fn effective_settings(&self) -> EffectiveSettings {
        self.effective_settings_for(resolve_music(&self.manifest).is_some())
    }

    fn effective_settings_for(&self, has_music: bool) -> EffectiveSettings {
        EffectiveSettings {
            resolution: self.plan.resolution.to_string(),
            fps: self.plan.fps.to_string(),
            audio_rate: if has_music { "aac" } else { "none" }.to_string(),
            encoder: VIDEO_CODEC.to_string(),
            crf: Some(self.profile.settings.crf.to_string()),
            preset: Some(self.profile.settings.preset.clone()),
            profile: Some(self.profile.name.clone()),
        }
    }

    /// SHA-256 over canonical plan, manifest and `effective`, in that order.
    pub fn inputs_digest(&self, effective: &EffectiveSettings) -> ShotreelResult<String> {
        let mut h = CanonicalHasher::new();
        h.update(&self.plan)?;
        h.update(&self.manifest)?;
        h.update(effective)?;
        Ok(h.finish())
    }

    /// Produce the result document (and, outside dry-run mode, the media files).
    ///
    /// A dry run writes only `render_output.json`, byte-identical across calls.
    #[tracing::instrument(
        name = "render",
        skip_all,
        fields(project = %self.manifest.project_id, dry_run = self.opts.dry_run)
    )]
    pub fn render(&self) -> ShotreelResult<RenderOutput> {
        if self.opts.dry_run {
            let out = self.dry_run_output()?;
            self.persist(RENDER_OUTPUT_FILE, &out)?;
            info!("dry run complete; wrote {RENDER_OUTPUT_FILE} only");
            return Ok(out);
        }
        self.render_full()
    }

    /// Render (or reuse an existing render) and write a timestamp-free fingerprint.
    #[tracing::instrument(name = "verify", skip_all, fields(project = %self.manifest.project_id))]
    pub fn verify(&self) -> ShotreelResult<RenderFingerprint> {
        if self.opts.dry_run {
            return Err(ShotreelError::validation(
                "verify() requires a renderer constructed with dry_run = false",
            ));
        }
        self.ensure_output_dir()?;

        let inputs_digest = self.dry_run_output()?.inputs_digest;

        let video_path = self.output_dir.join(VIDEO_FILE);
        let (mp4_sha256, srt_sha256) = if video_path.exists() {
            info!(video = %video_path.display(), "reusing existing render");
            self.existing_hashes(&video_path)?
        } else {
            let out = self.render_full()?;
            let srt = out
                .hashes
                .captions_sha256
                .unwrap_or_else(|| sha256_text(""));
            (out.hashes.video_sha256, srt)
        };

        let frame_hashes = extract_frame_hashes(&self.opts.encoder, &video_path)?;
        let fp = RenderFingerprint {
            inputs_digest,
            mp4_sha256,
            srt_sha256,
            frame_hashes,
        };
        self.persist(FINGERPRINT_FILE, &fp)?;
        info!(frames = fp.frame_hashes.len(), "wrote {FINGERPRINT_FILE}");
        Ok(fp)
    }

    fn dry_run_output(&self) -> ShotreelResult<RenderOutput> {
        let effective = self.effective_settings();
        let inputs_digest = self.inputs_digest(&effective)?;
        Ok(RenderOutput {
            schema_version: RENDER_OUTPUT_SCHEMA_VERSION.to_string(),
            schema_id: RENDER_OUTPUT_SCHEMA_ID.to_string(),
            output_id: self.derived_id.clone(),
            request_id: self.request_id.clone(),
            render_plan_ref: self.plan.asset_manifest_ref.clone(),
            asset_manifest_ref: self.opts.asset_manifest_ref.clone(),
            video_uri: None,
            captions_uri: None,
            audio_stems_uri: None,
            hashes: OutputHashes {
                video_sha256: String::new(),
                captions_sha256: None,
                audio_stems_sha256: None,
            },
            provenance: self.provenance(DRY_RUN_SENTINEL.to_string(), DRY_RUN_SENTINEL, 0),
            lineage: self.lineage(),
            outputs: Vec::new(),
            effective_settings: Some(effective),
            inputs_digest,
            producer: Producer::default(),
        })
    }

    fn render_full(&self) -> ShotreelResult<RenderOutput> {
        if self.manifest.shots.is_empty() {
            return Err(ShotreelError::validation(
                "asset manifest has no shots to render",
            ));
        }
        self.ensure_output_dir()?;
        let placeholder_dir = self.output_dir.join(PLACEHOLDER_DIR);
        std::fs::create_dir_all(&placeholder_dir).with_context(|| {
            format!("failed to create '{}'", placeholder_dir.display())
        })?;

        info!(
            encoder = %self.encoder_version,
            shots = self.manifest.shots.len(),
            "rendering"
        );

        let mut resolver = AssetResolver::new(&self.plan, &placeholder_dir);
        let visuals = resolver.resolve_all(&self.manifest.shots)?;
        let stills = visuals
            .into_iter()
            .zip(&self.manifest.shots)
            .map(|(v, shot)| StillInput {
                path: v.path,
                duration_ms: shot.duration_ms,
            })
            .collect::<Vec<_>>();

        let music = resolve_music(&self.manifest);
        let video_path = self.output_dir.join(VIDEO_FILE);
        let job = ConcatJob {
            width: self.plan.resolution.width,
            height: self.plan.resolution.height,
            fps: self.plan.fps,
            stills: &stills,
            music: music.as_deref(),
            profile: &self.profile.settings,
            out_path: &video_path,
        };
        let cmd = build_concat_command(self.opts.encoder.program.as_os_str(), &job)?;
        run_ffmpeg(&cmd, self.opts.encoder.timeout)?;

        let captions_path = self.output_dir.join(CAPTIONS_FILE);
        let srt = write_srt(&self.manifest, &captions_path)?;

        let video_sha256 = sha256_file(&video_path)?;
        let captions_sha256 = sha256_text(&srt);
        let video_abs = absolute(&video_path)?;
        let captions_abs = absolute(&captions_path)?;

        let effective = self.effective_settings_for(music.is_some());
        let inputs_digest = self.inputs_digest(&effective)?;
        let placeholder_count = resolver.placeholder_count();
        let out = RenderOutput {
            schema_version: RENDER_OUTPUT_SCHEMA_VERSION.to_string(),
            schema_id: RENDER_OUTPUT_SCHEMA_ID.to_string(),
            output_id: self.derived_id.clone(),
            request_id: self.request_id.clone(),
            render_plan_ref: self.plan.asset_manifest_ref.clone(),
            asset_manifest_ref: self.opts.asset_manifest_ref.clone(),
            video_uri: Some(file_uri(&video_abs)),
            captions_uri: Some(file_uri(&captions_abs)),
            audio_stems_uri: None,
            hashes: OutputHashes {
                video_sha256: video_sha256.clone(),
                captions_sha256: Some(captions_sha256.clone()),
                audio_stems_sha256: None,
            },
            provenance: self.provenance(
                Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false),
                &self.encoder_version,
                placeholder_count,
            ),
            lineage: self.lineage(),
            outputs: vec![
                OutputArtifact {
                    kind: ArtifactKind::Video,
                    path: video_abs.display().to_string(),
                    sha256: video_sha256,
                },
                OutputArtifact {
                    kind: ArtifactKind::Captions,
                    path: captions_abs.display().to_string(),
                    sha256: captions_sha256,
                },
            ],
            effective_settings: Some(effective),
            inputs_digest,
            producer: Producer::default(),
        };

        self.persist(RENDER_OUTPUT_FILE, &out)?;
        info!(
            video = %video_path.display(),
            placeholders = placeholder_count,
            "render complete"
        );
        Ok(out)
    }

    /// Hashes for a video that already exists in the output directory.
    fn existing_hashes(&self, video_path: &Path) -> ShotreelResult<(String, String)> {
        let persisted = self.output_dir.join(RENDER_OUTPUT_FILE);
        if persisted.exists() {
            let doc: RenderOutput = crate::model::load_document(&persisted, "render output")?;
            if doc.has_video() && doc.output_id == self.derived_id {
                let srt = doc
                    .hashes
                    .captions_sha256
                    .unwrap_or_else(|| sha256_text(""));
                return Ok((doc.hashes.video_sha256, srt));
            }
        }

        // No matching full-render record; hash what is on disk.
        let video = sha256_file(video_path)?;
        let captions_path = self.output_dir.join(CAPTIONS_FILE);
        let srt = if captions_path.exists() {
            std::fs::read_to_string(&captions_path)
                .with_context(|| format!("failed to read '{}'", captions_path.display()))?
        } else {
            write_srt(&self.manifest, &captions_path)?
        };
        Ok((video, sha256_text(&srt)))
    }

    fn provenance(&self, rendered_at: String, encoder: &str, placeholders: u32) -> Provenance {
        Provenance {
            render_profile: self.profile.name.clone(),
            timing_lock_hash: self.plan.timing_lock_hash.clone(),
            rendered_at,
            ffmpeg_version: encoder.to_string(),
            placeholder_count: placeholders,
            renderer: RENDERER_KIND.to_string(),
        }
    }

    fn lineage(&self) -> Lineage {
        Lineage {
            asset_manifest_hash: self.manifest_hash.clone(),
            render_plan_hash: self.plan_hash.clone(),
        }
    }

    fn ensure_output_dir(&self) -> ShotreelResult<()> {
        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!(
                "failed to create output directory '{}'",
                self.output_dir.display()
            )
        })?;
        Ok(())
    }

    fn persist<T: serde::Serialize>(&self, name: &str, doc: &T) -> ShotreelResult<()> {
        self.ensure_output_dir()?;
        write_pretty_json(&self.output_dir.join(name), doc)
    }
}

fn absolute(path: &Path) -> ShotreelResult<PathBuf> {
    Ok(std::fs::canonicalize(path)
        .with_context(|| format!("failed to resolve '{}'", path.display()))?)
}

fn file_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}
