use super::*;
use crate::model::VisualAsset;
use crate::model::manifest::{ROLE_BACKGROUND, ROLE_CHARACTER};

fn plan() -> RenderPlan {
    let mut plan = RenderPlan::new("pl", "p", "preview_local", "file:///plan.json", "lock");
    plan.resolution.width = 64;
    plan.resolution.height = 36;
    plan.fallback.placeholder_font_path = "/nonexistent/font.ttf".to_string();
    plan
}

fn file_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}

#[test]
fn uri_forms() {
    assert_eq!(resolve_uri(""), None);
    assert_eq!(resolve_uri("file:///tmp/a.png"), Some(PathBuf::from("/tmp/a.png")));
    assert_eq!(
        resolve_uri("file://localhost/tmp/a.png"),
        Some(PathBuf::from("/tmp/a.png"))
    );
    assert_eq!(resolve_uri("file:///tmp/a.png?v=2"), Some(PathBuf::from("/tmp/a.png")));
    assert_eq!(resolve_uri("relative/a.png"), Some(PathBuf::from("relative/a.png")));
    assert_eq!(resolve_uri("file://host-only"), None);
}

#[test]
fn background_is_preferred_over_earlier_character() {
    let dir = tempfile::tempdir().unwrap();
    let bg = dir.path().join("bg.png");
    let ch = dir.path().join("ch.png");
    std::fs::write(&bg, b"bg").unwrap();
    std::fs::write(&ch, b"ch").unwrap();

    let shot = Shot::new("s1", 1000)
        .with_visual(VisualAsset::new("c", ROLE_CHARACTER).with_uri(file_uri(&ch)))
        .with_visual(VisualAsset::new("b", ROLE_BACKGROUND).with_uri(file_uri(&bg)));
    let plan = plan();
    let mut r = AssetResolver::new(&plan, dir.path().join(".placeholders"));
    let v = r.resolve_shot(&shot).unwrap();
    assert_eq!(v.path, bg);
    assert_eq!(
        v.source,
        VisualSource::Asset {
            asset_id: "b".to_string()
        }
    );
    assert_eq!(r.placeholder_count(), 0);
}

#[test]
fn missing_background_falls_through_to_next_candidate() {
    let dir = tempfile::tempdir().unwrap();
    let ch = dir.path().join("ch.png");
    std::fs::write(&ch, b"ch").unwrap();

    let shot = Shot::new("s1", 1000)
        .with_visual(VisualAsset::new("b", ROLE_BACKGROUND).with_uri("file:///nope/bg.png"))
        .with_visual(VisualAsset::new("c", ROLE_CHARACTER).with_uri(ch.display().to_string()));
    let plan = plan();
    let mut r = AssetResolver::new(&plan, dir.path().join(".placeholders"));
    assert_eq!(r.resolve_shot(&shot).unwrap().path, ch);
}

#[test]
fn plan_resolution_overrides_manifest_uri() {
    let dir = tempfile::tempdir().unwrap();
    let resolved = dir.path().join("resolved.png");
    std::fs::write(&resolved, b"x").unwrap();

    let mut plan = plan();
    plan.asset_resolutions
        .insert("b".to_string(), file_uri(&resolved));
    plan.asset_resolutions.insert("e".to_string(), String::new());

    let shot = Shot::new("s1", 1000)
        .with_visual(VisualAsset::new("b", ROLE_BACKGROUND).with_uri("file:///nope.png"));
    let mut r = AssetResolver::new(&plan, dir.path().join(".placeholders"));
    assert_eq!(r.resolve_shot(&shot).unwrap().path, resolved);

    // Empty override falls back to the manifest URI.
    let shot = Shot::new("s2", 1000)
        .with_visual(VisualAsset::new("e", ROLE_BACKGROUND).with_uri(file_uri(&resolved)));
    assert_eq!(r.resolve_shot(&shot).unwrap().path, resolved);
}

#[test]
fn unresolved_shots_get_cached_placeholders_and_are_counted() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join(".placeholders");
    let plan = plan();
    let shots = vec![
        Shot::new("s1", 1000),
        Shot::new("s2", 1000)
            .with_visual(VisualAsset::new("a", ROLE_BACKGROUND).with_uri("file:///missing.png")),
    ];
    let mut r = AssetResolver::new(&plan, &cache);
    let visuals = r.resolve_all(&shots).unwrap();
    assert_eq!(visuals.len(), 2);
    assert_eq!(r.placeholder_count(), 2);
    for v in &visuals {
        assert_eq!(v.source, VisualSource::Placeholder);
        assert!(v.path.starts_with(&cache));
        assert!(v.path.exists());
    }
    assert_ne!(visuals[0].path, visuals[1].path);
}

#[test]
fn stub_assets_are_small_local_files() {
    let dir = tempfile::tempdir().unwrap();
    let tiny = dir.path().join("tiny.png");
    let big = dir.path().join("big.png");
    std::fs::write(&tiny, [0u8; 100]).unwrap();
    std::fs::write(&big, [0u8; 101]).unwrap();

    assert!(is_stub_asset(&file_uri(&tiny)));
    assert!(!is_stub_asset(&file_uri(&big)));
    assert!(!is_stub_asset("file:///does/not/exist.png"));
    assert!(!is_stub_asset(&tiny.display().to_string()));

    let mut m = AssetManifest::new("m", "p", "sl", "lock", vec![
        Shot::new("s1", 1000)
            .with_visual(VisualAsset::new("t", ROLE_BACKGROUND).with_uri(file_uri(&tiny)))
            .with_visual(VisualAsset::new("b", ROLE_CHARACTER).with_uri(file_uri(&big))),
    ]);
    let mut plan = plan();
    assert_eq!(count_stub_assets(&m, &plan), 1);

    plan.asset_resolutions.insert("b".to_string(), file_uri(&tiny));
    assert_eq!(count_stub_assets(&m, &plan), 2);

    m.shots.clear();
    assert_eq!(count_stub_assets(&m, &plan), 0);
}

#[test]
fn music_must_exist_locally() {
    let dir = tempfile::tempdir().unwrap();
    let track = dir.path().join("bed.wav");
    std::fs::write(&track, b"RIFF").unwrap();

    let mut m = AssetManifest::new("m", "p", "sl", "lock", vec![]);
    assert_eq!(resolve_music(&m), None);
    m.music_uri = Some("file:///no/such/track.wav".to_string());
    assert_eq!(resolve_music(&m), None);
    m.music_uri = Some(file_uri(&track));
    assert_eq!(resolve_music(&m), Some(track));
}

#[test]
fn oversized_fallback_font_still_yields_a_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let mut plan = plan();
    plan.fallback.placeholder_font_size = u32::MAX;
    let mut r = AssetResolver::new(&plan, dir.path());
    let visuals = r.resolve_all(&[Shot::new("s1", 1000)]).unwrap();
    assert_eq!(r.placeholder_count(), 1);
    assert!(visuals[0].path.is_file());
}
