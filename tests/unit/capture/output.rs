use super::*;

fn stream() -> EncodedStream {
    EncodedStream {
        chunks: vec![b"ab".to_vec(), b"cd".to_vec()],
        mime: "video/webm",
        extension: "webm",
    }
}

#[test]
fn artifact_assembles_chunks_with_default_name() {
    let a = CaptureArtifact::from_stream(stream(), DEFAULT_ARTIFACT_STEM);
    assert_eq!(a.bytes, b"abcd");
    assert_eq!(a.mime, "video/webm");
    assert_eq!(a.file_name, "processed_video.webm");
}

#[test]
fn file_output_saves_under_dir_and_respects_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let a = CaptureArtifact::from_stream(stream(), "clip");
    let mut out = FileOutput::in_dir(dir.path().join("nested"));
    let path = out.deliver(&a).unwrap().unwrap();
    assert_eq!(path, dir.path().join("nested/clip.webm"));
    assert_eq!(std::fs::read(&path).unwrap(), b"abcd");

    let mut strict = FileOutput::at(&path).overwrite(false);
    assert!(strict.deliver(&a).is_err());
    let mut lenient = FileOutput::at(&path);
    assert!(lenient.deliver(&a).is_ok());
}

#[test]
fn memory_output_clones_share_the_slot() {
    let out = MemoryOutput::new();
    let mut writer = out.clone();
    let a = CaptureArtifact::from_stream(stream(), "x");
    assert_eq!(writer.deliver(&a).unwrap(), None);
    assert_eq!(out.artifacts().len(), 1);
    assert_eq!(out.take_last(), Some(a));
    assert!(out.artifacts().is_empty());
}
