//! Input and output documents exchanged with the renderer.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::foundation::error::{ShotreelError, ShotreelResult};

pub mod manifest;
pub mod output;
pub mod plan;

pub use manifest::{AssetManifest, SfxItem, Shot, VisualAsset, VoLine};
pub use output::{
    ArtifactKind, AuditStatus, EffectiveSettings, Lineage, OutputArtifact, OutputHashes, Producer,
    Provenance, RenderAudit, RenderFingerprint, RenderOutput,
};
pub use plan::{FallbackConfig, RenderPlan, Resolution};

pub(crate) fn parse_document<T: DeserializeOwned, R: std::io::Read>(
    r: R,
    what: &str,
) -> ShotreelResult<T> {
    serde_json::from_reader(r)
        .map_err(|e| ShotreelError::validation(format!("parse {what} JSON: {e}")))
}

pub(crate) fn load_document<T: DeserializeOwned>(path: &Path, what: &str) -> ShotreelResult<T> {
    if !path.exists() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        return Err(ShotreelError::validation(format!(
            "missing required input: {name}"
        )));
    }
    let f = File::open(path).map_err(|e| {
        ShotreelError::validation(format!("open {what} JSON '{}': {e}", path.display()))
    })?;
    parse_document(BufReader::new(f), what)
}

/// Write `doc` as pretty-printed JSON (two-space indent, trailing newline omitted).
pub fn write_pretty_json<T: Serialize + ?Sized>(path: &Path, doc: &T) -> ShotreelResult<()> {
    use anyhow::Context as _;

    let text = serde_json::to_string_pretty(doc)
        .map_err(|e| ShotreelError::serde(format!("serialize '{}': {e}", path.display())))?;
    std::fs::write(path, text)
        .with_context(|| format!("failed to write '{}'", path.display()))?;
    Ok(())
}
