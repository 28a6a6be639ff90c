use super::*;

#[test]
fn ff_ratio_parsing() {
    assert_eq!(parse_ff_ratio("30000/1001"), Some((30000, 1001)));
    assert_eq!(parse_ff_ratio("25"), Some((25, 1)));
    assert_eq!(parse_ff_ratio("0/0"), None);
    assert_eq!(parse_ff_ratio("abc"), None);
}

#[test]
fn pcm_bytes_and_duration() {
    let pcm = AudioPcm {
        sample_rate: 4,
        channels: 2,
        interleaved_f32: vec![0.0, 1.0, -1.0, 0.5, 0.0, 0.0, 0.0, 0.0],
    };
    let bytes = pcm.to_f32le_bytes();
    assert_eq!(bytes.len(), 32);
    assert_eq!(&bytes[4..8], &1.0f32.to_le_bytes());
    assert!((pcm.duration_sec() - 1.0).abs() < 1e-12);
}

#[cfg(not(feature = "media-ffmpeg"))]
#[test]
fn probe_requires_feature() {
    let err = probe_video(Path::new("x.mp4")).unwrap_err();
    assert_eq!(
        err.kind(),
        crate::foundation::error::ErrorKind::ResourceUnavailable
    );
}
