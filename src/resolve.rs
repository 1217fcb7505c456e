//! Picks one still image per shot, substituting placeholders for missing visuals.

use std::path::{Path, PathBuf};

use crate::foundation::error::ShotreelResult;
use crate::model::{AssetManifest, RenderPlan, Shot};
use crate::placeholder::{PlaceholderSpec, generate_placeholder};

/// `file://` assets at or below this size are treated as stubs by [`is_stub_asset`].
pub const STUB_ASSET_MAX_BYTES: u64 = 100;

const FILE_SCHEME: &str = "file://";

/// Map a `file://` URI or bare path to a local path.
///
/// Returns `None` for an empty URI or a `file://` URI with no path component.
pub fn resolve_uri(uri: &str) -> Option<PathBuf> {
    if uri.is_empty() {
        return None;
    }
    let Some(rest) = uri.strip_prefix(FILE_SCHEME) else {
        return Some(PathBuf::from(uri));
    };
    // `file://host/path`: the authority is dropped.
    let path = match rest.find('/') {
        Some(0) => rest,
        Some(i) => &rest[i..],
        None => return None,
    };
    let path = path.split(['?', '#']).next().unwrap_or(path);
    Some(PathBuf::from(path))
}

/// Existing local music track for `manifest`, if any.
pub fn resolve_music(manifest: &AssetManifest) -> Option<PathBuf> {
    let uri = manifest.music_uri.as_deref().filter(|u| !u.is_empty())?;
    match resolve_uri(uri) {
        Some(path) if path.exists() => Some(path),
        _ => {
            tracing::warn!(music_uri = uri, "music track not found; rendering without audio");
            None
        }
    }
}

/// `true` for a `file://` asset that exists but is too small to be real media.
pub fn is_stub_asset(uri: &str) -> bool {
    if !uri.starts_with(FILE_SCHEME) {
        return false;
    }
    resolve_uri(uri)
        .and_then(|p| std::fs::metadata(p).ok())
        .is_some_and(|m| m.is_file() && m.len() <= STUB_ASSET_MAX_BYTES)
}

/// Number of visual assets in `manifest` whose effective URI is a stub.
pub fn count_stub_assets(manifest: &AssetManifest, plan: &RenderPlan) -> usize {
    manifest
        .shots
        .iter()
        .flat_map(|s| &s.visual_assets)
        .filter_map(|a| candidate_uri(plan, &a.asset_id, a.asset_uri.as_deref()))
        .filter(|uri| is_stub_asset(uri))
        .count()
}

fn candidate_uri<'a>(
    plan: &'a RenderPlan,
    asset_id: &str,
    manifest_uri: Option<&'a str>,
) -> Option<&'a str> {
    plan.asset_resolutions
        .get(asset_id)
        .map(String::as_str)
        .filter(|u| !u.is_empty())
        .or(manifest_uri.filter(|u| !u.is_empty()))
}

/// Where a shot's still came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VisualSource {
    Asset { asset_id: String },
    Placeholder,
}

/// The still image chosen for one shot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShotVisual {
    pub shot_id: String,
    pub path: PathBuf,
    pub source: VisualSource,
}

/// Resolves shot visuals against a plan, generating cached placeholders into
/// `placeholder_dir` when nothing usable exists.
pub struct AssetResolver<'a> {
    plan: &'a RenderPlan,
    placeholder_dir: PathBuf,
    placeholder_count: u32,
}

impl<'a> AssetResolver<'a> {
    pub fn new(plan: &'a RenderPlan, placeholder_dir: impl Into<PathBuf>) -> Self {
        Self {
            plan,
            placeholder_dir: placeholder_dir.into(),
            placeholder_count: 0,
        }
    }

    /// Placeholders substituted so far.
    pub fn placeholder_count(&self) -> u32 {
        self.placeholder_count
    }

    /// One visual per shot, in shot order.
    pub fn resolve_all(&mut self, shots: &[Shot]) -> ShotreelResult<Vec<ShotVisual>> {
        shots.iter().map(|s| self.resolve_shot(s)).collect()
    }

    /// Best visual for `shot`. Missing files never fail; they become placeholders.
    pub fn resolve_shot(&mut self, shot: &Shot) -> ShotreelResult<ShotVisual> {
        let mut candidates = shot.visual_assets.iter().collect::<Vec<_>>();
        candidates.sort_by_key(|a| !a.is_background());

        for asset in candidates {
            let Some(uri) = candidate_uri(self.plan, &asset.asset_id, asset.asset_uri.as_deref())
            else {
                continue;
            };
            if let Some(path) = resolve_uri(uri)
                && path.exists()
            {
                return Ok(ShotVisual {
                    shot_id: shot.shot_id.clone(),
                    path,
                    source: VisualSource::Asset {
                        asset_id: asset.asset_id.clone(),
                    },
                });
            }
        }

        self.placeholder_count += 1;
        tracing::debug!(shot_id = %shot.shot_id, "no visual asset found; generating placeholder");
        let path = generate_placeholder(&self.placeholder_spec(shot))?;
        Ok(ShotVisual {
            shot_id: shot.shot_id.clone(),
            path,
            source: VisualSource::Placeholder,
        })
    }

    fn placeholder_spec(&self, shot: &Shot) -> PlaceholderSpec {
        let fb = &self.plan.fallback;
        let mut spec = PlaceholderSpec::new(
            shot.shot_id.clone(),
            self.plan.resolution.width,
            self.plan.resolution.height,
        )
        .color(fb.placeholder_color.clone())
        .cache_dir(&self.placeholder_dir);
        spec.font_size = fb.placeholder_font_size;
        let font = Path::new(&fb.placeholder_font_path);
        if font.exists() {
            spec.font_path = Some(font.to_path_buf());
        }
        spec
    }
}

#[cfg(test)]
#[path = "../tests/unit/resolve.rs"]
mod tests;
