use super::*;

fn cfg() -> SinkConfig {
    SinkConfig {
        width: 2,
        height: 1,
        fps: Fps::new(30, 1).unwrap(),
        audio: None,
    }
}

#[test]
fn in_memory_sink_collects_frames_in_order() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg()).unwrap();
    let frame = FrameRGBA::black(2, 1);
    sink.push_frame(FrameIndex(0), &frame).unwrap();
    sink.push_frame(FrameIndex(1), &frame).unwrap();
    let out = sink.end().unwrap();
    assert_eq!(out.chunks.len(), 2);
    assert_eq!(out.len(), 16);
    assert_eq!(sink.frames().len(), 2);
    assert_eq!(sink.config().unwrap().width, 2);
}

#[test]
fn in_memory_sink_rejects_out_of_order_and_unstarted_pushes() {
    let mut sink = InMemorySink::new();
    let frame = FrameRGBA::black(2, 1);
    assert!(sink.push_frame(FrameIndex(0), &frame).is_err());

    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(3), &frame).unwrap();
    assert!(sink.push_frame(FrameIndex(3), &frame).is_err());
    assert!(sink.push_frame(FrameIndex(2), &frame).is_err());
}

#[test]
fn abort_clears_the_session() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg()).unwrap();
    sink.abort();
    assert!(sink.was_aborted());
    assert!(sink.end().is_err());
}

#[test]
fn encoded_stream_concatenates_chunks() {
    let s = EncodedStream {
        chunks: vec![vec![1, 2], vec![], vec![3]],
        mime: "video/webm",
        extension: "webm",
    };
    assert!(!s.is_empty());
    assert_eq!(s.into_bytes(), vec![1, 2, 3]);
    assert!(EncodedStream::default().is_empty());
}
