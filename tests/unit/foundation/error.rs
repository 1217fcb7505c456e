use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ShotreelError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        ShotreelError::encoder_not_found("x")
            .to_string()
            .contains("encoder not found:")
    );
    assert!(
        ShotreelError::placeholder("x")
            .to_string()
            .contains("placeholder error:")
    );
    assert!(
        ShotreelError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn encoder_failure_carries_command_and_stderr() {
    let err = ShotreelError::EncoderFailed {
        status: "exit status: 1".to_string(),
        command: "ffmpeg -y -loop 1".to_string(),
        stderr_tail: "Unknown encoder 'libx264'".to_string(),
    };
    let msg = err.to_string();
    assert!(msg.contains("exit status: 1"));
    assert!(msg.contains("ffmpeg -y -loop 1"));
    assert!(msg.contains("Unknown encoder"));
}

#[test]
fn encoder_family_is_distinguishable() {
    assert!(ShotreelError::encoder_not_found("ffmpeg").is_encoder_error());
    assert!(
        ShotreelError::EncoderTimeout {
            timeout_s: 3,
            command: "ffmpeg".to_string(),
        }
        .is_encoder_error()
    );
    assert!(!ShotreelError::validation("x").is_encoder_error());
    assert!(!ShotreelError::placeholder("x").is_encoder_error());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ShotreelError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
