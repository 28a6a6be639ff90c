use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ReelError::resource("x")
            .to_string()
            .contains("resource unavailable:")
    );
    assert!(
        ReelError::source_not_ready("x")
            .to_string()
            .contains("source not ready:")
    );
    assert!(
        ReelError::invalid_overlay("x")
            .to_string()
            .contains("invalid overlay:")
    );
    assert!(
        ReelError::encoding("x")
            .to_string()
            .contains("encoding failure:")
    );
    assert!(
        ReelError::validation("x")
            .to_string()
            .contains("validation error:")
    );
}

#[test]
fn kinds_match_variants() {
    assert_eq!(ReelError::Cancelled.kind(), ErrorKind::Cancelled);
    assert_eq!(
        ReelError::CaptureInProgress.kind(),
        ErrorKind::CaptureInProgress
    );
    assert_eq!(
        ReelError::source_not_ready("t").kind(),
        ErrorKind::SourceNotReady
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ReelError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert_eq!(err.kind(), ErrorKind::Other);
}
