use super::*;

#[test]
fn flatten_premul_alpha_0_returns_bg() {
    let src = vec![0u8, 0, 0, 0];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_premul_alpha_255_is_identity() {
    let src = vec![1u8, 2, 3, 255];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn flatten_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &[0u8; 4], [0, 0, 0, 255]).is_err());
}

#[test]
fn container_parses_and_describes_itself() {
    assert_eq!("webm".parse::<Container>().unwrap(), Container::WebM);
    assert_eq!(" MP4 ".parse::<Container>().unwrap(), Container::Mp4);
    assert!("avi".parse::<Container>().is_err());
    assert_eq!(Container::default(), Container::WebM);
    assert_eq!(Container::WebM.mime(), "video/webm");
    assert_eq!(Container::Mp4.extension(), "mp4");
}

#[test]
fn mp4_output_is_fragmented_for_pipe_delivery() {
    for with_audio in [true, false] {
        let args = Container::Mp4.codec_args(with_audio);
        assert!(args.contains(&"frag_keyframe+empty_moov"));
        assert_eq!(args.contains(&"-an"), !with_audio);
    }
}

#[test]
fn command_pads_odd_dimensions_and_maps_audio() {
    let sink = FfmpegSink::new(FfmpegSinkOpts::new(Container::WebM));
    let cfg = SinkConfig {
        width: 5,
        height: 4,
        fps: Fps::new(30, 1).unwrap(),
        audio: Some(crate::encode::sink::AudioInputConfig {
            path: PathBuf::from("tap.f32le"),
            sample_rate: 48_000,
            channels: 2,
        }),
    };
    let cmd = sink.build_command(&cfg).unwrap();
    let args: Vec<String> = cmd
        .get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    assert!(args.iter().any(|a| a.starts_with("pad=")));
    assert!(args.iter().any(|a| a == "1:a:0"));
    assert!(args.iter().any(|a| a == "30/1"));
    assert_eq!(args.last().map(String::as_str), Some("pipe:1"));
}

#[test]
fn command_rejects_zero_rate_audio() {
    let sink = FfmpegSink::new(FfmpegSinkOpts::new(Container::Mp4));
    let cfg = SinkConfig {
        width: 4,
        height: 4,
        fps: Fps::new(30, 1).unwrap(),
        audio: Some(crate::encode::sink::AudioInputConfig {
            path: PathBuf::from("tap.f32le"),
            sample_rate: 0,
            channels: 2,
        }),
    };
    assert!(sink.build_command(&cfg).is_err());
}

#[test]
fn push_before_begin_is_an_encoding_failure() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(Container::WebM));
    let err = sink
        .push_frame(FrameIndex(0), &FrameRGBA::black(2, 2))
        .unwrap_err();
    assert_eq!(
        err.kind(),
        crate::foundation::error::ErrorKind::EncodingFailure
    );
    assert!(sink.end().is_err());
    sink.abort();
}

#[test]
fn sibling_ffprobe_is_found_next_to_ffmpeg() {
    let dir = tempfile::tempdir().unwrap();
    let ffmpeg = dir.path().join("ffmpeg");
    assert_eq!(sibling_ffprobe(&ffmpeg), None);
    std::fs::write(dir.path().join("ffprobe"), b"").unwrap();
    assert_eq!(sibling_ffprobe(&ffmpeg), Some(dir.path().join("ffprobe")));
    assert_eq!(sibling_ffprobe(Path::new("ffmpeg")), None);
}

#[test]
fn ensure_parent_dir_creates_nested_directories() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("a/b/out.webm");
    ensure_parent_dir(&out).unwrap();
    assert!(dir.path().join("a/b").is_dir());
    ensure_parent_dir(Path::new("bare.webm")).unwrap();
}

#[test]
fn encodes_webm_when_ffmpeg_is_available() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(Container::WebM));
    sink.begin(SinkConfig {
        width: 16,
        height: 16,
        fps: Fps::new(10, 1).unwrap(),
        audio: None,
    })
    .unwrap();
    let mut frame = FrameRGBA::black(16, 16);
    frame.premultiplied = true;
    let pushed = (0..5).try_for_each(|i| sink.push_frame(FrameIndex(i), &frame));
    let ended = sink.end();
    if pushed.is_err() {
        assert!(ended.is_err());
        return;
    }
    match ended {
        Ok(stream) => {
            assert_eq!(stream.mime, "video/webm");
            let bytes = stream.into_bytes();
            assert_eq!(bytes.get(..4), Some(&[0x1A, 0x45, 0xDF, 0xA3][..]));
        }
        // Minimal ffmpeg builds may lack libvpx.
        Err(e) => assert!(e.to_string().contains("ffmpeg exited"), "{e}"),
    }
}
