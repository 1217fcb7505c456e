use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{ShotreelError, ShotreelResult};

/// Default placeholder background color.
pub const DEFAULT_PLACEHOLDER_COLOR: &str = "#1a1a2e";
/// Default placeholder font.
pub const DEFAULT_PLACEHOLDER_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";
/// Default placeholder font size in pixels.
pub const DEFAULT_PLACEHOLDER_FONT_SIZE: u32 = 36;

fn default_schema_version() -> String {
    "1.0.0".to_string()
}

fn default_profile() -> String {
    "preview_local".to_string()
}

fn default_fps() -> u32 {
    24
}

/// Output frame size. Omitted fields take the 1280x720 defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
    pub aspect: String,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            aspect: "16:9".to_string(),
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// How placeholders look when no real visual resolves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub placeholder_color: String,
    pub placeholder_font_path: String,
    pub placeholder_font_size: u32,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            placeholder_color: DEFAULT_PLACEHOLDER_COLOR.to_string(),
            placeholder_font_path: DEFAULT_PLACEHOLDER_FONT.to_string(),
            placeholder_font_size: DEFAULT_PLACEHOLDER_FONT_SIZE,
        }
    }
}

/// Render parameters paired with an [`AssetManifest`](super::AssetManifest).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderPlan {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub plan_id: String,
    pub project_id: String,
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default = "default_fps")]
    pub fps: u32,
    pub asset_manifest_ref: String,
    pub timing_lock_hash: String,
    /// asset id -> URI overrides.
    #[serde(default)]
    pub asset_resolutions: BTreeMap<String, String>,
    /// VO line id -> audio URI.
    #[serde(default)]
    pub audio_resolutions: BTreeMap<String, String>,
    #[serde(default)]
    pub fallback: FallbackConfig,
}

impl RenderPlan {
    /// Plan with default resolution, fps and fallback.
    pub fn new(
        plan_id: impl Into<String>,
        project_id: impl Into<String>,
        profile: impl Into<String>,
        asset_manifest_ref: impl Into<String>,
        timing_lock_hash: impl Into<String>,
    ) -> Self {
        Self {
            schema_version: default_schema_version(),
            plan_id: plan_id.into(),
            project_id: project_id.into(),
            profile: profile.into(),
            resolution: Resolution::default(),
            fps: default_fps(),
            asset_manifest_ref: asset_manifest_ref.into(),
            timing_lock_hash: timing_lock_hash.into(),
            asset_resolutions: BTreeMap::new(),
            audio_resolutions: BTreeMap::new(),
            fallback: FallbackConfig::default(),
        }
    }

    /// Parse a plan from JSON.
    pub fn from_reader<R: std::io::Read>(r: R) -> ShotreelResult<Self> {
        super::parse_document(r, "render plan")
    }

    /// Parse a plan from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> ShotreelResult<Self> {
        super::load_document(path.as_ref(), "render plan")
    }

    /// Check frame geometry and rate.
    pub fn validate(&self) -> ShotreelResult<()> {
        if self.fps == 0 {
            return Err(ShotreelError::validation("render plan fps must be non-zero"));
        }
        let Resolution { width, height, .. } = self.resolution;
        if width == 0 || height == 0 {
            return Err(ShotreelError::validation(
                "render plan width/height must be non-zero",
            ));
        }
        if !width.is_multiple_of(2) || !height.is_multiple_of(2) {
            return Err(ShotreelError::validation(format!(
                "render plan resolution {width}x{height} must be even (required for yuv420p mp4 output)"
            )));
        }
        Ok(())
    }
}
