use super::*;

fn decode(path: &Path) -> image::RgbImage {
    image::open(path).unwrap().to_rgb8()
}

#[test]
fn cache_key_is_sixteen_hex_chars_of_the_joined_tuple() {
    let key = cache_key("s1", 1280, 720, "#1a1a2e");
    assert_eq!(key.len(), 16);
    assert_eq!(key, &sha256_text("s1|1280|720|#1a1a2e")[..16]);
    assert_ne!(key, cache_key("s2", 1280, 720, "#1a1a2e"));
    assert_ne!(key, cache_key("s1", 1280, 720, "#000000"));
}

#[test]
fn hex_colors_parse_with_or_without_hash() {
    assert_eq!(parse_hex_color("#1a1a2e"), Some([26, 26, 46]));
    assert_eq!(parse_hex_color("FF8000"), Some([255, 128, 0]));
    assert_eq!(parse_hex_color("#abc"), None);
    assert_eq!(parse_hex_color("#gg0000"), None);
    assert_eq!(parse_hex_color(""), None);
}

#[test]
fn image_has_requested_size_and_background() {
    let dir = tempfile::tempdir().unwrap();
    let path = generate_placeholder(
        &PlaceholderSpec::new("s1", 320, 180).output_path(dir.path().join("p.png")),
    )
    .unwrap();
    let img = decode(&path);
    assert_eq!(img.dimensions(), (320, 180));
    assert_eq!(img.get_pixel(0, 0).0, [26, 26, 46]);
    assert_eq!(img.get_pixel(319, 179).0, [26, 26, 46]);
    assert!(
        img.pixels().any(|p| p.0 == TEXT_RGB),
        "label pixels should be drawn"
    );
}

#[test]
fn same_inputs_produce_identical_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let a = generate_placeholder(
        &PlaceholderSpec::new("shot_007", 256, 144).output_path(dir.path().join("a.png")),
    )
    .unwrap();
    let b = generate_placeholder(
        &PlaceholderSpec::new("shot_007", 256, 144).output_path(dir.path().join("b.png")),
    )
    .unwrap();
    assert_eq!(std::fs::read(a).unwrap(), std::fs::read(b).unwrap());
}

#[test]
fn different_shots_produce_different_bytes() {
    let a = render_png(&PlaceholderSpec::new("SHOT_AAA", 256, 144)).unwrap();
    let b = render_png(&PlaceholderSpec::new("SHOT_BBB", 256, 144)).unwrap();
    assert_ne!(a, b);
}

#[test]
fn cached_file_is_reused_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let spec = PlaceholderSpec::new("s1", 128, 72).cache_dir(dir.path());
    let first = generate_placeholder(&spec).unwrap();
    assert_eq!(
        first.file_name().unwrap().to_string_lossy(),
        format!("placeholder_{}.png", cache_key("s1", 128, 72, "#1a1a2e"))
    );
    let mtime = std::fs::metadata(&first).unwrap().modified().unwrap();

    std::thread::sleep(std::time::Duration::from_millis(20));
    let second = generate_placeholder(&spec).unwrap();
    assert_eq!(first, second);
    assert_eq!(std::fs::metadata(&second).unwrap().modified().unwrap(), mtime);
}

#[test]
fn output_path_wins_over_cache_dir() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("explicit.png");
    let got = generate_placeholder(
        &PlaceholderSpec::new("s1", 64, 64)
            .cache_dir(dir.path().join("cache"))
            .output_path(&out),
    )
    .unwrap();
    assert_eq!(got, out);
    assert!(!dir.path().join("cache").exists());
}

#[test]
fn missing_destination_is_an_error() {
    let err = generate_placeholder(&PlaceholderSpec::new("s1", 64, 64)).unwrap_err();
    assert!(matches!(err, ShotreelError::Placeholder(_)));
    assert!(err.to_string().contains("output_path or cache_dir"));
}

#[test]
fn invalid_color_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = generate_placeholder(
        &PlaceholderSpec::new("s1", 64, 64)
            .color("not-a-color")
            .output_path(dir.path().join("p.png")),
    )
    .unwrap();
    assert_eq!(decode(&path).get_pixel(0, 0).0, FALLBACK_RGB);
}

#[test]
fn custom_color_and_label_are_used() {
    let dir = tempfile::tempdir().unwrap();
    let path = generate_placeholder(
        &PlaceholderSpec::new("s1", 200, 100)
            .color("#336699")
            .label("MISSING ART")
            .output_path(dir.path().join("p.png")),
    )
    .unwrap();
    assert_eq!(decode(&path).get_pixel(0, 0).0, [0x33, 0x66, 0x99]);

    let default_label = render_png(&PlaceholderSpec::new("s1", 200, 100).color("#336699")).unwrap();
    assert_ne!(std::fs::read(&path).unwrap(), default_label);
}

#[test]
fn unreadable_font_uses_builtin_glyphs() {
    let with_missing_font =
        render_png(&PlaceholderSpec::new("s1", 160, 90).font("/nonexistent/font.ttf", 36)).unwrap();
    let builtin = render_png(&PlaceholderSpec::new("s1", 160, 90)).unwrap();
    assert_eq!(with_missing_font, builtin);
}

#[test]
fn truetype_font_renders_when_available() {
    let font = Path::new(crate::model::plan::DEFAULT_PLACEHOLDER_FONT);
    if !font.exists() {
        return;
    }
    let a = render_png(&PlaceholderSpec::new("s1", 320, 180).font(font, 36)).unwrap();
    let b = render_png(&PlaceholderSpec::new("s1", 320, 180).font(font, 36)).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, render_png(&PlaceholderSpec::new("s1", 320, 180)).unwrap());
}

#[test]
fn zero_sized_image_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    assert!(
        generate_placeholder(&PlaceholderSpec::new("s1", 0, 10).cache_dir(dir.path())).is_err()
    );
}

#[test]
fn existing_output_path_is_returned_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("explicit.png");
    std::fs::write(&out, b"already here").unwrap();

    let got = generate_placeholder(&PlaceholderSpec::new("s1", 64, 64).output_path(&out)).unwrap();
    assert_eq!(got, out);
    assert_eq!(std::fs::read(&out).unwrap(), b"already here");
}

#[test]
fn huge_font_size_is_bounded_by_the_frame() {
    let dir = tempfile::tempdir().unwrap();
    let mut spec = PlaceholderSpec::new("s1", 64, 36).output_path(dir.path().join("p.png"));
    spec.font_size = 4_000_000_000;
    let path = generate_placeholder(&spec).unwrap();
    assert_eq!(decode(&path).dimensions(), (64, 36));

    let clamped = render_png(&PlaceholderSpec::new("s1", 64, 36).font("/nonexistent/font.ttf", 36))
        .unwrap();
    let huge = render_png(
        &PlaceholderSpec::new("s1", 64, 36).font("/nonexistent/font.ttf", u32::MAX),
    )
    .unwrap();
    assert_eq!(clamped, huge);
}

#[test]
fn huge_font_size_with_truetype_font() {
    let font = Path::new(crate::model::plan::DEFAULT_PLACEHOLDER_FONT);
    if !font.exists() {
        return;
    }
    let png = render_png(&PlaceholderSpec::new("s1", 64, 36).font(font, u32::MAX)).unwrap();
    assert!(!png.is_empty());
}
