use serde::{Deserialize, Serialize};

/// `schema_version` written on every [`RenderOutput`].
pub const RENDER_OUTPUT_SCHEMA_VERSION: &str = "0.0.1";
/// `schema_id` written on every [`RenderOutput`].
pub const RENDER_OUTPUT_SCHEMA_ID: &str = "RenderOutput";
/// Producer name recorded on outputs.
pub const PRODUCER_NAME: &str = "PreviewRenderer";
/// Producer version recorded on outputs.
pub const PRODUCER_VERSION: &str = "0.0.1";
/// Provenance `renderer` tag.
pub const RENDERER_KIND: &str = "video";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputHashes {
    /// Empty in dry-run output.
    pub video_sha256: String,
    pub captions_sha256: Option<String>,
    pub audio_stems_sha256: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub render_profile: String,
    pub timing_lock_hash: String,
    pub rendered_at: String,
    pub ffmpeg_version: String,
    pub placeholder_count: u32,
    pub renderer: String,
}

/// Hashes of the exact input documents that produced an output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lineage {
    pub asset_manifest_hash: String,
    pub render_plan_hash: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Video,
    Captions,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputArtifact {
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    pub path: String,
    pub sha256: String,
}

/// Concrete encoder parameters a render used (or would use).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveSettings {
    /// `"{width}x{height}"`.
    pub resolution: String,
    pub fps: String,
    /// `"aac"` with music, `"none"` without.
    pub audio_rate: String,
    pub encoder: String,
    pub crf: Option<String>,
    pub preset: Option<String>,
    pub profile: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
}

impl Default for Producer {
    fn default() -> Self {
        Self {
            name: PRODUCER_NAME.to_string(),
            version: PRODUCER_VERSION.to_string(),
        }
    }
}

/// Result document of one render call. Written once, never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOutput {
    pub schema_version: String,
    pub schema_id: String,
    pub output_id: String,
    pub request_id: String,
    pub render_plan_ref: String,
    pub asset_manifest_ref: String,
    pub video_uri: Option<String>,
    pub captions_uri: Option<String>,
    pub audio_stems_uri: Option<String>,
    pub hashes: OutputHashes,
    pub provenance: Provenance,
    pub lineage: Lineage,
    pub outputs: Vec<OutputArtifact>,
    pub effective_settings: Option<EffectiveSettings>,
    pub inputs_digest: String,
    pub producer: Producer,
}

impl RenderOutput {
    /// `true` when the document came from a full render (a video hash is present).
    pub fn has_video(&self) -> bool {
        !self.hashes.video_sha256.is_empty()
    }
}

/// Timestamp-free determinism record of a full render.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderFingerprint {
    pub inputs_digest: String,
    pub mp4_sha256: String,
    pub srt_sha256: String,
    pub frame_hashes: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Pass,
    Fail,
}

/// Verdict of rendering the same inputs twice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderAudit {
    pub status: AuditStatus,
    pub diff_fields: Vec<String>,
}

impl RenderAudit {
    /// Build a verdict from the list of differing paths.
    pub fn from_diff(mut diff_fields: Vec<String>) -> Self {
        diff_fields.sort();
        let status = if diff_fields.is_empty() {
            AuditStatus::Pass
        } else {
            AuditStatus::Fail
        };
        Self {
            status,
            diff_fields,
        }
    }

    pub fn passed(&self) -> bool {
        self.status == AuditStatus::Pass
    }
}
