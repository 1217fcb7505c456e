//! Named encoder quality presets and their aliases.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{ShotreelError, ShotreelResult};

/// Presets accepted by libx264.
pub const X264_PRESETS: [&str; 10] = [
    "ultrafast",
    "superfast",
    "veryfast",
    "faster",
    "fast",
    "medium",
    "slow",
    "slower",
    "veryslow",
    "placebo",
];

const MAX_CRF: u8 = 51;

/// Encoder parameters for one profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSettings {
    pub crf: u8,
    pub preset: String,
}

impl ProfileSettings {
    pub fn new(crf: u8, preset: impl Into<String>) -> Self {
        Self {
            crf,
            preset: preset.into(),
        }
    }
}

/// A profile after alias normalization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedProfile {
    /// Canonical name.
    pub name: String,
    pub settings: ProfileSettings,
}

/// Immutable profile table plus alias map.
///
/// Loaded once and passed to the renderer at construction; nothing mutates it afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, ProfileSettings>,
    #[serde(default)]
    aliases: BTreeMap<String, String>,
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        let profiles = BTreeMap::from([
            ("preview".to_string(), ProfileSettings::new(28, "medium")),
            ("high".to_string(), ProfileSettings::new(18, "slow")),
        ]);
        let aliases = BTreeMap::from([("preview_local".to_string(), "preview".to_string())]);
        Self { profiles, aliases }
    }
}

impl ProfileRegistry {
    /// Build a registry, checking that every alias targets a known profile.
    pub fn new(
        profiles: BTreeMap<String, ProfileSettings>,
        aliases: BTreeMap<String, String>,
    ) -> ShotreelResult<Self> {
        let registry = Self { profiles, aliases };
        registry.validate()?;
        Ok(registry)
    }

    /// Parse a registry from JSON.
    pub fn from_reader<R: std::io::Read>(r: R) -> ShotreelResult<Self> {
        let registry: Self = crate::model::parse_document(r, "profile registry")?;
        registry.validate()?;
        Ok(registry)
    }

    /// Parse a registry from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> ShotreelResult<Self> {
        let registry: Self = crate::model::load_document(path.as_ref(), "profile registry")?;
        registry.validate()?;
        Ok(registry)
    }

    fn validate(&self) -> ShotreelResult<()> {
        if self.profiles.is_empty() {
            return Err(ShotreelError::validation(
                "profile registry must define at least one profile",
            ));
        }
        for (name, settings) in &self.profiles {
            if settings.crf > MAX_CRF {
                return Err(ShotreelError::validation(format!(
                    "profile '{name}': crf {} is out of range 0..={MAX_CRF}",
                    settings.crf
                )));
            }
            if !X264_PRESETS.contains(&settings.preset.as_str()) {
                return Err(ShotreelError::validation(format!(
                    "profile '{name}': unknown x264 preset '{}'",
                    settings.preset
                )));
            }
        }
        for (alias, target) in &self.aliases {
            if !self.profiles.contains_key(target) {
                return Err(ShotreelError::validation(format!(
                    "profile alias '{alias}' points at unknown profile '{target}'"
                )));
            }
        }
        Ok(())
    }

    /// Map an alias to its canonical name; other names pass through unchanged.
    pub fn canonical_name<'a>(&'a self, raw: &'a str) -> &'a str {
        self.aliases.get(raw).map(String::as_str).unwrap_or(raw)
    }

    /// Resolve `raw` (canonical name or alias) to its settings.
    pub fn resolve(&self, raw: &str) -> ShotreelResult<ResolvedProfile> {
        let name = self.canonical_name(raw);
        let Some(settings) = self.profiles.get(name) else {
            let supported = self.names().collect::<Vec<_>>().join(", ");
            let aliases = self
                .aliases
                .keys()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ShotreelError::validation(format!(
                "unsupported render profile '{raw}' (supported: {supported}; aliases: {aliases})"
            )));
        };
        Ok(ResolvedProfile {
            name: name.to_string(),
            settings: settings.clone(),
        })
    }

    /// Canonical profile names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}

#[cfg(test)]
#[path = "../tests/unit/profile.rs"]
mod tests;
