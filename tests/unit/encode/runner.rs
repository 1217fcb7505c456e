use super::*;

#[test]
fn version_banner_token() {
    let out = "ffmpeg version 6.1.1-3ubuntu5 Copyright (c) 2000-2023 the FFmpeg developers\nbuilt with gcc";
    assert_eq!(parse_version_banner(out).as_deref(), Some("6.1.1-3ubuntu5"));
    assert_eq!(
        parse_version_banner("something else entirely").as_deref(),
        Some("something else entirely")
    );
    assert_eq!(parse_version_banner(""), None);
}

#[test]
fn major_minor_prefix() {
    assert_eq!(parse_major_minor("6.1.1-3ubuntu5"), Some((6, 1)));
    assert_eq!(parse_major_minor("7.0"), Some((7, 0)));
    assert_eq!(parse_major_minor("4.4.2-0ubuntu0.22.04.1"), Some((4, 4)));
    assert_eq!(parse_major_minor("n6.1"), None);
    assert_eq!(parse_major_minor("N-112345-gdeadbeef"), None);
    assert!(parse_major_minor("5.1").unwrap() < MIN_FFMPEG_VERSION);
    assert!(parse_major_minor("6.1").unwrap() >= MIN_FFMPEG_VERSION);
}

#[test]
fn tail_keeps_last_chars_on_char_boundaries() {
    assert_eq!(tail_chars("abc", 5), "abc");
    assert_eq!(tail_chars("abcdef", 3), "def");
    assert_eq!(tail_chars("ééééé", 2), "éé");
}

#[test]
fn defaults() {
    let opts = EncoderOpts::default();
    assert_eq!(opts.program, PathBuf::from("ffmpeg"));
    assert_eq!(opts.timeout, Duration::from_secs(600));
    assert_eq!(opts.min_version, (6, 1));
}

#[test]
fn missing_binary_is_not_found() {
    let cmd = FfmpegCommand::new("shotreel-definitely-not-an-encoder");
    let err = run_ffmpeg(&cmd, Duration::from_secs(5)).unwrap_err();
    assert!(matches!(err, ShotreelError::EncoderNotFound(_)), "{err}");

    let opts = EncoderOpts {
        program: PathBuf::from("shotreel-definitely-not-an-encoder"),
        ..EncoderOpts::default()
    };
    assert!(!is_ffmpeg_available(&opts));
    assert!(matches!(
        validate_ffmpeg(&opts).unwrap_err(),
        ShotreelError::EncoderNotFound(_)
    ));
}

#[cfg(unix)]
#[test]
fn nonzero_exit_carries_stderr_tail() {
    let mut cmd = FfmpegCommand::new("sh");
    cmd.args(["-c", "echo 'Unknown encoder libx264' >&2; exit 3"]);
    let err = run_ffmpeg(&cmd, Duration::from_secs(10)).unwrap_err();
    match err {
        ShotreelError::EncoderFailed {
            status,
            command,
            stderr_tail,
        } => {
            assert!(status.contains('3'), "{status}");
            assert!(command.starts_with("sh -c"), "{command}");
            assert!(stderr_tail.contains("Unknown encoder libx264"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[cfg(unix)]
#[test]
fn long_stderr_is_truncated() {
    let mut cmd = FfmpegCommand::new("sh");
    cmd.args(["-c", "i=0; while [ $i -lt 500 ]; do echo 0123456789 >&2; i=$((i+1)); done; exit 1"]);
    match run_ffmpeg(&cmd, Duration::from_secs(10)).unwrap_err() {
        ShotreelError::EncoderFailed { stderr_tail, .. } => {
            assert_eq!(stderr_tail.chars().count(), STDERR_TAIL_CHARS);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[cfg(unix)]
#[test]
fn success_captures_stdout() {
    let mut cmd = FfmpegCommand::new("sh");
    cmd.args(["-c", "printf 'a\\nb\\n'"]);
    let out = run_ffmpeg(&cmd, Duration::from_secs(10)).unwrap();
    assert!(out.status.success());
    assert_eq!(out.stdout, b"a\nb\n");
}

#[cfg(unix)]
#[test]
fn timeout_kills_the_whole_group() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("survived");
    // The background grandchild would create the marker if it outlived the kill.
    let script = format!(
        "(sleep 2; touch '{}') & sleep 30",
        marker.display()
    );
    let mut cmd = FfmpegCommand::new("sh");
    cmd.args(["-c", script.as_str()]);

    let started = Instant::now();
    let err = run_ffmpeg(&cmd, Duration::from_millis(300)).unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(
        matches!(err, ShotreelError::EncoderTimeout { .. }),
        "unexpected error: {err}"
    );

    std::thread::sleep(Duration::from_millis(2_500));
    assert!(!marker.exists(), "grandchild outlived the process group kill");
}
