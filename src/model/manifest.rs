use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::foundation::error::ShotreelResult;

/// Role of the primary full-frame visual of a shot.
pub const ROLE_BACKGROUND: &str = "background";
/// Role of a character layer.
pub const ROLE_CHARACTER: &str = "character";
/// Role of a prop layer.
pub const ROLE_PROP: &str = "prop";

fn default_schema_version() -> String {
    "1.0.0".to_string()
}

fn default_role() -> String {
    ROLE_BACKGROUND.to_string()
}

fn default_license_type() -> String {
    "proprietary_cleared".to_string()
}

/// One spoken voice-over line inside a shot.
///
/// `timeline_in_ms` / `timeline_out_ms` are offsets from the start of the shot; both zero means
/// the line spans the whole shot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoLine {
    pub line_id: String,
    pub speaker_id: String,
    pub text: String,
    #[serde(default)]
    pub emotion: String,
    #[serde(default)]
    pub pacing_tags: Vec<String>,
    #[serde(default)]
    pub audio_uri: Option<String>,
    #[serde(default)]
    pub timeline_in_ms: u64,
    #[serde(default)]
    pub timeline_out_ms: u64,
}

impl VoLine {
    /// Untimed line spoken by `speaker_id`.
    pub fn new(
        line_id: impl Into<String>,
        speaker_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            line_id: line_id.into(),
            speaker_id: speaker_id.into(),
            text: text.into(),
            emotion: String::new(),
            pacing_tags: Vec::new(),
            audio_uri: None,
            timeline_in_ms: 0,
            timeline_out_ms: 0,
        }
    }

    /// Set explicit in/out offsets relative to the shot start.
    pub fn with_timing(mut self, in_ms: u64, out_ms: u64) -> Self {
        self.timeline_in_ms = in_ms;
        self.timeline_out_ms = out_ms;
        self
    }

    /// `true` when neither offset was set.
    pub fn spans_whole_shot(&self) -> bool {
        self.timeline_in_ms == 0 && self.timeline_out_ms == 0
    }
}

/// A visual candidate for a shot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualAsset {
    pub asset_id: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub asset_uri: Option<String>,
    #[serde(default = "default_license_type")]
    pub license_type: String,
    #[serde(default)]
    pub placeholder: bool,
}

impl VisualAsset {
    pub fn new(asset_id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            asset_id: asset_id.into(),
            role: role.into(),
            asset_uri: None,
            license_type: default_license_type(),
            placeholder: false,
        }
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.asset_uri = Some(uri.into());
        self
    }

    pub fn is_background(&self) -> bool {
        self.role == ROLE_BACKGROUND
    }
}

/// Sound effect cue. Carried through untouched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SfxItem {
    pub sfx_id: String,
    pub description: String,
    #[serde(default)]
    pub audio_uri: Option<String>,
    #[serde(default)]
    pub timeline_in_ms: u64,
}

/// One timed segment of the output video.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shot {
    pub shot_id: String,
    pub duration_ms: u64,
    #[serde(default)]
    pub visual_assets: Vec<VisualAsset>,
    #[serde(default)]
    pub vo_lines: Vec<VoLine>,
    #[serde(default)]
    pub sfx: Vec<SfxItem>,
    #[serde(default)]
    pub music_mood: String,
}

impl Shot {
    pub fn new(shot_id: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            shot_id: shot_id.into(),
            duration_ms,
            visual_assets: Vec::new(),
            vo_lines: Vec::new(),
            sfx: Vec::new(),
            music_mood: String::new(),
        }
    }

    pub fn with_visual(mut self, asset: VisualAsset) -> Self {
        self.visual_assets.push(asset);
        self
    }

    pub fn with_line(mut self, line: VoLine) -> Self {
        self.vo_lines.push(line);
        self
    }
}

/// Time-locked list of shots with their assets and spoken lines.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetManifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub manifest_id: String,
    pub project_id: String,
    pub shotlist_ref: String,
    pub timing_lock_hash: String,
    pub shots: Vec<Shot>,
    #[serde(default)]
    pub music_uri: Option<String>,
}

impl AssetManifest {
    pub fn new(
        manifest_id: impl Into<String>,
        project_id: impl Into<String>,
        shotlist_ref: impl Into<String>,
        timing_lock_hash: impl Into<String>,
        shots: Vec<Shot>,
    ) -> Self {
        Self {
            schema_version: default_schema_version(),
            manifest_id: manifest_id.into(),
            project_id: project_id.into(),
            shotlist_ref: shotlist_ref.into(),
            timing_lock_hash: timing_lock_hash.into(),
            shots,
            music_uri: None,
        }
    }

    /// Parse a manifest from JSON.
    pub fn from_reader<R: std::io::Read>(r: R) -> ShotreelResult<Self> {
        super::parse_document(r, "asset manifest")
    }

    /// Parse a manifest from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> ShotreelResult<Self> {
        super::load_document(path.as_ref(), "asset manifest")
    }

    /// Sum of all shot durations.
    pub fn total_duration_ms(&self) -> u64 {
        self.shots.iter().map(|s| s.duration_ms).sum()
    }
}
