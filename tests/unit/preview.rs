use super::*;
use crate::capture::clock::ManualClock;
use crate::capture::source::SyntheticSource;
use crate::foundation::core::Canvas;
use crate::overlay::document::LiveOverlays;
use std::time::Duration;

const CANVAS: Canvas = Canvas {
    width: 32,
    height: 16,
};

fn session(duration: f64) -> PreviewSession {
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new());
    let source = SyntheticSource::new(CANVAS, duration, Arc::clone(&clock))
        .with_fps(Fps::new(10, 1).unwrap());
    PreviewSession::new(
        Box::new(source),
        Arc::new(LiveOverlays::default()),
        Arc::new(OverlayAssets::new()),
        clock,
    )
    .unwrap()
    .with_refresh(Fps::new(10, 1).unwrap())
}

#[test]
fn render_frame_composites_over_the_current_source_frame() {
    let mut s = session(1.0);
    let frame = s.render_frame(0.0, &OverlaySet::default(), false).unwrap();
    let [r, g, b] = SyntheticSource::slot_rgb(0);
    assert_eq!(frame.pixel(5, 5), Some([r, g, b, 255]));
    assert!(frame.premultiplied);

    let with_grid = s.render_frame(0.0, &OverlaySet::default(), true).unwrap();
    assert!(with_grid.pixel(0, 5).unwrap()[0] > r);
}

#[test]
fn run_presents_frames_at_playback_time_until_break() {
    let mut s = session(1.0);
    let signal = PlaybackSignal::new(SignalState::Playing);
    let mut times = Vec::new();
    let n = s
        .run(&signal, |t, frame| {
            assert_eq!(frame.width, CANVAS.width);
            times.push(t);
            if times.len() == 5 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .unwrap();
    assert_eq!(n, 5);
    for (i, t) in times.iter().enumerate() {
        assert!((t - i as f64 * 0.1).abs() < 1e-9, "{times:?}");
    }
    assert!(!s.source_mut().is_playing());
}

#[test]
fn stopped_signal_presents_nothing() {
    let mut s = session(1.0);
    let signal = PlaybackSignal::new(SignalState::Stopped);
    signal.play();
    assert_eq!(signal.state(), SignalState::Stopped);
    assert_eq!(s.run(&signal, |_, _| ControlFlow::Continue(())).unwrap(), 0);
}

#[test]
fn run_suspends_at_end_and_restarts_on_play() {
    let mut s = session(0.2);
    let signal = PlaybackSignal::new(SignalState::Playing);
    let times = Mutex::new(Vec::new());

    std::thread::scope(|scope| {
        scope.spawn(|| {
            let wait_paused = || {
                for _ in 0..5_000 {
                    if signal.state() == SignalState::Paused {
                        return;
                    }
                    std::thread::sleep(Duration::from_millis(1));
                }
            };
            wait_paused();
            signal.play();
            wait_paused();
            signal.stop();
        });

        let n = s
            .run(&signal, |t, _| {
                times.lock().unwrap().push(t);
                ControlFlow::Continue(())
            })
            .unwrap();
        assert_eq!(n, 4);
    });

    let times = times.into_inner().unwrap();
    assert_eq!(times.len(), 4);
    assert!(times[0].abs() < 1e-9 && times[2].abs() < 1e-9, "{times:?}");
    assert!((times[1] - 0.1).abs() < 1e-9 && (times[3] - 0.1).abs() < 1e-9);
}
