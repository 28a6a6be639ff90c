use super::*;
use crate::capture::clock::ManualClock;

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new())
}

const CANVAS: Canvas = Canvas {
    width: 4,
    height: 2,
};

#[test]
fn playback_advances_only_while_playing() {
    let c = clock();
    let mut p = Playback::new(c.clone(), 2.0);
    c.advance(Duration::from_secs(1));
    assert_eq!(p.position(), 0.0);

    p.play();
    c.advance(Duration::from_millis(500));
    assert!((p.position() - 0.5).abs() < 1e-9);
    assert!(p.is_playing());

    p.pause();
    c.advance(Duration::from_secs(5));
    assert!((p.position() - 0.5).abs() < 1e-9);

    p.play();
    c.advance(Duration::from_secs(5));
    assert_eq!(p.position(), 2.0);
    assert!(p.is_ended());
    assert!(!p.is_playing());
}

#[test]
fn playback_seek_clamps_and_keeps_play_state() {
    let c = clock();
    let mut p = Playback::new(c.clone(), 3.0);
    p.seek(10.0);
    assert_eq!(p.position(), 3.0);
    p.seek(f64::NAN);
    assert_eq!(p.position(), 0.0);
    p.play();
    p.seek(1.0);
    c.advance(Duration::from_millis(250));
    assert!((p.position() - 1.25).abs() < 1e-9);
}

#[test]
fn degenerate_durations_end_immediately() {
    for d in [f64::NAN, -1.0, 0.0] {
        let p = Playback::new(clock(), d);
        assert!(p.is_ended());
    }
}

#[test]
fn synthetic_frames_follow_playback_slots() {
    let c = clock();
    let mut s = SyntheticSource::new(CANVAS, 1.0, c.clone()).with_fps(Fps::new(10, 1).unwrap());
    s.rewind().unwrap();
    assert!(s.is_ready());
    let first = s.current_frame().unwrap().pixel(0, 0).unwrap();
    assert_eq!(&first[..3], &SyntheticSource::slot_rgb(0));

    s.play();
    c.advance(Duration::from_millis(350));
    let f = s.current_frame().unwrap();
    assert!(!f.premultiplied);
    assert_eq!(f.pixel(3, 1).unwrap(), {
        let [r, g, b] = SyntheticSource::slot_rgb(3);
        [r, g, b, 255]
    });
}

#[test]
fn readiness_delay_counts_from_rewind() {
    let c = clock();
    let mut s = SyntheticSource::new(CANVAS, 1.0, c.clone())
        .with_ready_delay(Duration::from_millis(100));
    c.advance(Duration::from_secs(1));
    s.rewind().unwrap();
    assert!(!s.is_ready());
    c.advance(Duration::from_millis(100));
    assert!(s.is_ready());

    let mut never = SyntheticSource::new(CANVAS, 1.0, c.clone()).never_ready();
    never.rewind().unwrap();
    c.advance(Duration::from_secs(60));
    assert!(!never.is_ready());
}

#[test]
fn rewind_resets_position_and_pauses() {
    let c = clock();
    let mut s = SyntheticSource::new(CANVAS, 1.0, c.clone());
    s.play();
    c.advance(Duration::from_secs(2));
    assert!(s.is_ended());
    s.rewind().unwrap();
    assert_eq!(s.current_time(), 0.0);
    assert!(!s.is_playing());
    assert!(!s.is_ended());
}

#[test]
fn tone_source_opens_a_tap_and_silent_source_does_not() {
    let c = clock();
    let mut silent = SyntheticSource::new(CANVAS, 0.5, c.clone());
    assert!(silent.open_audio_tap().unwrap().is_none());

    let mut toned = SyntheticSource::new(CANVAS, 0.5, c).with_tone(440.0);
    let tap = toned.open_audio_tap().unwrap().unwrap();
    assert_eq!(tap.sample_rate(), TAP_SAMPLE_RATE);
    assert_eq!(tap.channels(), TAP_CHANNELS);
    assert!((tap.duration_sec() - 0.5).abs() < 1e-6);
    let path = tap.path().to_path_buf();
    assert!(path.exists());
    drop(tap);
    assert!(!path.exists());
}

#[test]
fn tone_on_unbounded_source_is_rejected() {
    let mut toned = SyntheticSource::new(CANVAS, f64::INFINITY, clock()).with_tone(440.0);
    let err = toned.open_audio_tap().unwrap_err();
    assert_eq!(
        err.kind(),
        crate::foundation::error::ErrorKind::ResourceUnavailable
    );
}
