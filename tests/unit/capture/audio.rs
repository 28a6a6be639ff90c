use super::*;

fn pcm(frames: usize) -> AudioPcm {
    AudioPcm {
        sample_rate: 8_000,
        channels: 2,
        interleaved_f32: vec![0.25; frames * 2],
    }
}

#[test]
fn tap_writes_f32le_and_removes_file_on_drop() {
    let dir = tempfile::tempdir().unwrap();
    let tap = AudioTap::from_pcm_in(dir.path(), &pcm(4_000)).unwrap();
    let path = tap.path().to_path_buf();
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 4_000 * 2 * 4);
    assert!((tap.duration_sec() - 0.5).abs() < 1e-9);

    let cfg = tap.input_config();
    assert_eq!(cfg.path, path);
    assert_eq!((cfg.sample_rate, cfg.channels), (8_000, 2));

    drop(tap);
    assert!(!path.exists());
}

#[test]
fn taps_get_distinct_files() {
    let dir = tempfile::tempdir().unwrap();
    let a = AudioTap::from_pcm_in(dir.path(), &pcm(1)).unwrap();
    let b = AudioTap::from_pcm_in(dir.path(), &pcm(1)).unwrap();
    assert_ne!(a.path(), b.path());
}

#[test]
fn invalid_pcm_or_directory_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let mut bad = pcm(1);
    bad.channels = 0;
    assert_eq!(
        AudioTap::from_pcm_in(dir.path(), &bad).unwrap_err().kind(),
        crate::foundation::error::ErrorKind::ResourceUnavailable
    );
    let missing = dir.path().join("missing");
    assert!(AudioTap::from_pcm_in(&missing, &pcm(1)).is_err());
}
