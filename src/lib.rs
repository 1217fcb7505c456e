//! Deterministic local preview renderer.
//!
//! Turns an [`AssetManifest`] (shots, visuals, voice-over lines, music) and a [`RenderPlan`]
//! (profile, resolution, fps) into an H.264 MP4, an SRT caption sidecar and a
//! `render_output.json` result document. Identical inputs produce identical hashes, which the
//! [`audit`] module checks by rendering twice.
#![forbid(unsafe_code)]

mod foundation;

pub mod audit;
pub mod captions;
pub mod encode;
pub mod fingerprint;
pub mod model;
pub mod placeholder;
pub mod profile;
pub mod renderer;
pub mod resolve;

pub use audit::{FixtureProfile, SelfCheckReport, audit_render, audit_render_files, self_check};
pub use encode::EncoderOpts;
pub use foundation::error::{ShotreelError, ShotreelResult};
pub use foundation::hash::{
    canonical_hash, canonical_json, derive_output_id, sha256_file, sha256_text,
};
pub use model::{
    AssetManifest, AuditStatus, RenderAudit, RenderFingerprint, RenderOutput, RenderPlan,
};
pub use profile::{ProfileRegistry, ProfileSettings};
pub use renderer::{PreviewRenderer, RendererOpts};
